//! Lookup operations
//!
//! Each operation composes one or more lookup API queries into one answer:
//! - `hostname.rs` - hostname → addresses → subnets
//! - `tags.rs` - tags, tag name → id, tag → addresses
//!
//! The functions in the submodules run against any [`PhpIpamClientTrait`]
//! implementation. The functions in this module are the operation surface for
//! host tooling: each call resolves the configuration, authenticates a fresh
//! [`PhpIpamSession`], runs its queries through it and drops it. Nothing is
//! shared between calls.
//!
//! [`PhpIpamClientTrait`]: crate::PhpIpamClientTrait

mod hostname;
mod tags;

pub use hostname::addresses_by_hostname;
pub use tags::{addresses_by_tag, tag_id, tags, MISSING_IP_KEY, TAGS_RESOURCE};

use crate::client::PhpIpamSession;
use crate::common::cidr::Cidr;
use crate::config::ConfigSource;
use crate::error::PhpIpamError;
use crate::models::{HostAddresses, Tag, TagId, TaggedAddresses};

/// Get the IP address(es) associated to a hostname
///
/// An optional CIDR restricts the result to addresses inside that network.
/// An invalid CIDR is rejected before any request is made.
pub async fn get(
    source: &dyn ConfigSource,
    hostname: &str,
    cidr: Option<&str>,
) -> Result<HostAddresses, PhpIpamError> {
    let network = cidr.map(str::parse::<Cidr>).transpose()?;
    let session = PhpIpamSession::from_source(source).await?;
    addresses_by_hostname(&session, hostname, network.as_ref()).await
}

/// Get the list of all address tags
pub async fn get_tags(source: &dyn ConfigSource) -> Result<Vec<Tag>, PhpIpamError> {
    let session = PhpIpamSession::from_source(source).await?;
    tags(&session).await
}

/// Get the tag id that corresponds to a tag name
pub async fn get_tag_id(source: &dyn ConfigSource, tag: &str) -> Result<Option<TagId>, PhpIpamError> {
    let session = PhpIpamSession::from_source(source).await?;
    tag_id(&session, tag).await
}

/// Get the IP addresses carrying a tag, optionally leaving out gateways
pub async fn get_addrs_by_tag(
    source: &dyn ConfigSource,
    tag: &str,
    exclude_gateway: bool,
) -> Result<Option<TaggedAddresses>, PhpIpamError> {
    let session = PhpIpamSession::from_source(source).await?;
    addresses_by_tag(&session, tag, exclude_gateway).await
}
