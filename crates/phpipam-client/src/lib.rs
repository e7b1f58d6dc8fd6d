//! phpIPAM REST API Client
//!
//! A Rust client for the phpIPAM `lookup` API application. It manages the
//! token session and answers four questions: which addresses belong to a
//! hostname, which tags exist, which id a tag has, and which addresses carry
//! a tag.
//!
//! # Example
//!
//! ```no_run
//! use phpipam_client::{lookup, YamlFileSource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Reads the `phpipam` section of /etc/salt/master
//! let source = YamlFileSource::default();
//!
//! // Addresses of a host, with netmask and subnet description
//! let addresses = lookup::get(&source, "web01.mydomain.com", None).await?;
//!
//! // Addresses tagged "Used", gateways left out
//! let used = lookup::get_addrs_by_tag(&source, "Used", true).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Several queries can share one session:
//!
//! ```no_run
//! use phpipam_client::{lookup, PhpIpamConfig, PhpIpamSession};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PhpIpamConfig::new("https://ipam.mydomain.com", "read_api_user", "xxxxx")?;
//! let session = PhpIpamSession::connect(config).await?;
//!
//! let tags = lookup::tags(&session).await?;
//! let raw = session.query("subnets/5").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod common;
pub mod config;
pub mod error;
pub mod lookup;
pub mod models;
#[path = "trait.rs"]
pub mod client_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::PhpIpamSession;
pub use common::cidr::Cidr;
pub use config::{ConfigSource, Credentials, EnvSource, PhpIpamConfig, YamlFileSource};
pub use error::PhpIpamError;
pub use models::*;
pub use client_trait::PhpIpamClientTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockPhpIpamClient;
