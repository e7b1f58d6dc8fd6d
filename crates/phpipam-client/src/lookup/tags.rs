//! Tag name → tag id → tagged addresses lookups

use crate::client_trait::PhpIpamClientTrait;
use crate::common::{collection, is_empty_result};
use crate::error::PhpIpamError;
use crate::models::{AddressRecord, Tag, TagId, TaggedAddress, TaggedAddresses};
use serde_json::Value;
use tracing::debug;

/// Resource listing every address tag
pub const TAGS_RESOURCE: &str = "addresses/tags/";

/// `details` key used for a tagged record that carries no IP
pub const MISSING_IP_KEY: &str = "null";

/// List all address tags, in the order phpIPAM returns them
///
/// Each tag is returned with the fields phpIPAM sent, unchanged.
pub async fn tags<C>(client: &C) -> Result<Vec<Tag>, PhpIpamError>
where
    C: PhpIpamClientTrait + ?Sized,
{
    let data = client.query(TAGS_RESOURCE).await?;
    collection(data)
}

/// Resolve a tag name to its identifier
///
/// The first tag whose name matches exactly wins.
///
/// # Returns
/// * `Ok(Some(TagId))` - The tag exists
/// * `Ok(None)` - No tag has that name
/// * `Err(PhpIpamError)` - If the query fails
pub async fn tag_id<C>(client: &C, tag: &str) -> Result<Option<TagId>, PhpIpamError>
where
    C: PhpIpamClientTrait + ?Sized,
{
    let found = tags(client)
        .await?
        .into_iter()
        .find(|t| t.name.as_deref() == Some(tag))
        .map(|t| TagId {
            tag: tag.to_string(),
            tag_id: t.id(),
        });

    if found.is_none() {
        debug!("Tag {} not found in phpIPAM", tag);
    }
    Ok(found)
}

/// List the addresses carrying a tag
///
/// With `exclude_gateway`, empty records and records flagged `is_gateway`
/// are left out; records without the flag are kept.
///
/// # Returns
/// * `Ok(Some(TaggedAddresses))` - The tag exists (its address list may be empty)
/// * `Ok(None)` - No tag with that name, or the tag has no id
/// * `Err(PhpIpamError)` - If a query fails
pub async fn addresses_by_tag<C>(
    client: &C,
    tag: &str,
    exclude_gateway: bool,
) -> Result<Option<TaggedAddresses>, PhpIpamError>
where
    C: PhpIpamClientTrait + ?Sized,
{
    let Some(id) = tag_id(client, tag)
        .await?
        .and_then(|t| t.tag_id)
        .filter(|id| !id.is_empty())
    else {
        return Ok(None);
    };

    let resource = format!("addresses/tags/{}/addresses/", urlencoding::encode(&id));
    let entries: Vec<Value> = collection(client.query(&resource).await?)?;

    let mut tagged = TaggedAddresses {
        tag: tag.to_string(),
        ..Default::default()
    };

    for entry in entries {
        let populated = !is_empty_result(&entry);
        let record: AddressRecord = if populated {
            serde_json::from_value(entry)?
        } else {
            AddressRecord::default()
        };

        if exclude_gateway && (!populated || record.is_gateway.unwrap_or(false)) {
            continue;
        }

        let key = record
            .ip
            .clone()
            .unwrap_or_else(|| MISSING_IP_KEY.to_string());
        tagged.details.insert(
            key,
            TaggedAddress {
                description: record.description,
                hostname: record.hostname,
                is_gateway: record.is_gateway,
            },
        );
        tagged.ip_addrs.push(record.ip);
    }

    debug!(
        "Tag {} (id {}) carries {} addresses",
        tag,
        id,
        tagged.ip_addrs.len()
    );
    Ok(Some(tagged))
}
