//! Integration tests for the phpIPAM client
//!
//! These tests require a running phpIPAM instance with the `lookup` API
//! application enabled. Set PHPIPAM_URL, PHPIPAM_USER and PHPIPAM_PASSWORD
//! (and PHPIPAM_VERIFY for a private CA) to run.

use phpipam_client::{lookup, ConfigSource, EnvSource, PhpIpamSession};

#[tokio::test]
#[ignore] // Requires running phpIPAM instance
async fn test_session_creation() {
    let source = EnvSource::from_process();
    source.load().expect("PHPIPAM_* environment variables must be set");

    let session = PhpIpamSession::from_source(&source)
        .await
        .expect("Failed to authenticate");

    assert!(!session.token().await.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_get_tags() {
    let source = EnvSource::from_process();

    let tags = lookup::get_tags(&source).await.expect("Failed to list tags");

    println!("Found {} tags", tags.len());
    for tag in &tags {
        println!("  {:?} -> {:?}", tag.name, tag.id);
    }
}

#[tokio::test]
#[ignore]
async fn test_tag_round_trip() {
    let source = EnvSource::from_process();

    // phpIPAM ships with "Offline", "Used", "Reserved" and "DHCP" tags
    let tag = lookup::get_tag_id(&source, "Used")
        .await
        .expect("Failed to resolve tag")
        .expect("Tag 'Used' should exist on a default install");
    assert!(tag.tag_id.is_some());

    let tagged = lookup::get_addrs_by_tag(&source, "Used", true)
        .await
        .expect("Failed to list tagged addresses")
        .expect("Tag 'Used' should exist on a default install");

    println!("Tag 'Used' carries {} non-gateway addresses", tagged.ip_addrs.len());
}

#[tokio::test]
#[ignore]
async fn test_get_hostname() {
    let source = EnvSource::from_process();
    let hostname = std::env::var("PHPIPAM_TEST_HOSTNAME")
        .expect("PHPIPAM_TEST_HOSTNAME environment variable must be set");

    let found = lookup::get(&source, &hostname, None)
        .await
        .expect("Failed to look up hostname");

    for (index, address) in &found {
        println!("{}: {} {:?} ({:?})", index, address.ipv4, address.netmask, address.description);
    }
}
