//! Hostname → address → subnet lookup

use crate::client_trait::PhpIpamClientTrait;
use crate::common::cidr::Cidr;
use crate::common::{collection, is_empty_result};
use crate::error::PhpIpamError;
use crate::models::{AddressRecord, HostAddress, HostAddresses, SubnetRecord};
use tracing::debug;

/// Resolve a hostname to its address records and their subnet details
///
/// phpIPAM's hostname search matches substrings, so only records whose
/// `hostname` equals `hostname` exactly are kept. Records without an IP or a
/// subnet, and records whose subnet cannot be found, are dropped. When
/// `network` is given, addresses outside it are dropped too.
///
/// # Returns
/// * `Ok(HostAddresses)` - Surviving records keyed by their index in the
///   search result; empty if the hostname is unknown
/// * `Err(PhpIpamError)` - If a query fails
pub async fn addresses_by_hostname<C>(
    client: &C,
    hostname: &str,
    network: Option<&Cidr>,
) -> Result<HostAddresses, PhpIpamError>
where
    C: PhpIpamClientTrait + ?Sized,
{
    let resource = format!(
        "addresses/search_hostname_partial/{}",
        urlencoding::encode(hostname)
    );
    let data = client.query(&resource).await?;

    let mut found = HostAddresses::new();
    if is_empty_result(&data) {
        debug!("Hostname {} not found in phpIPAM", hostname);
        return Ok(found);
    }

    let records: Vec<AddressRecord> = collection(data)?;
    for (index, record) in records.into_iter().enumerate() {
        if record.hostname.as_deref() != Some(hostname) {
            continue;
        }
        let (Some(ip), Some(subnet_id)) = (non_empty(record.ip), non_empty(record.subnet_id)) else {
            continue;
        };

        if let Some(network) = network {
            if !network.contains_str(&ip) {
                debug!("Skipping {} for {}: outside {}", ip, hostname, network);
                continue;
            }
        }

        let subnet_data = client
            .query(&format!("subnets/{}", urlencoding::encode(&subnet_id)))
            .await?;
        if is_empty_result(&subnet_data) {
            debug!("Skipping {} for {}: subnet {} not found", ip, hostname, subnet_id);
            continue;
        }
        let subnet: SubnetRecord = serde_json::from_value(subnet_data)?;

        found.insert(
            index.to_string(),
            HostAddress {
                ipv4: ip,
                netmask: subnet.netmask().map(str::to_string),
                description: subnet.description,
                subnet_id,
            },
        );
    }

    Ok(found)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
