//! End-to-end tests for the lookup operations
//!
//! Each operation reads its configuration, authenticates and queries a
//! wiremock server standing in for phpIPAM.

use phpipam_client::{lookup, EnvSource, PhpIpamError, YamlFileSource};
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Salt master file in a private directory, so no stray `master.d` is read
struct MasterConfig {
    dir: TempDir,
}

impl MasterConfig {
    fn path(&self) -> PathBuf {
        self.dir.path().join("master")
    }
}

fn master_config(server: &MockServer) -> MasterConfig {
    let config = MasterConfig {
        dir: tempfile::tempdir().unwrap(),
    };
    std::fs::write(
        config.path(),
        format!(
            "log_level: warning\nphpipam:\n  url: {}\n  auth:\n    user: 'read_api_user'\n    password: 'xxxxx'\n",
            server.uri()
        ),
    )
    .unwrap();
    config
}

/// Every operation authenticates exactly once
async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/lookup/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "token": "abc", "expires": "2999-01-01 00:00:00" }
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_data(server: &MockServer, resource: &str, data: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/lookup/{}", resource)))
        .and(header("token", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
        .mount(server)
        .await;
}

async fn mount_tags(server: &MockServer) {
    mount_data(
        server,
        "addresses/tags/",
        json!([
            { "id": "1", "type": "Online" },
            { "id": "2", "type": "Offline" },
            { "id": "3", "type": "Used" }
        ]),
    )
    .await;
}

#[tokio::test]
async fn test_get_hostname() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_data(
        &server,
        "addresses/search_hostname_partial/h",
        json!([
            { "ip": "10.0.20.9", "hostname": "h2", "subnetId": "5" },
            { "ip": "10.0.20.5", "hostname": "h", "subnetId": "5", "is_gateway": "0" }
        ]),
    )
    .await;
    mount_data(
        &server,
        "subnets/5",
        json!({
            "id": "5",
            "subnet": "10.0.20.0",
            "mask": "24",
            "description": "DMZ",
            "calculation": { "Subnet netmask": "255.255.255.0" }
        }),
    )
    .await;

    let config = master_config(&server);
    let found = lookup::get(&YamlFileSource::new(config.path()), "h", None)
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&found).unwrap(),
        json!({
            "1": {
                "ipv4": "10.0.20.5",
                "netmask": "255.255.255.0",
                "description": "DMZ",
                "subnet_id": "5"
            }
        })
    );
}

#[tokio::test]
async fn test_get_unknown_hostname() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/lookup/addresses/search_hostname_partial/nope"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "success": false,
            "message": "Address not found"
        })))
        .mount(&server)
        .await;

    let config = master_config(&server);
    let found = lookup::get(&YamlFileSource::new(config.path()), "nope", None)
        .await
        .unwrap();

    assert!(found.is_empty());
}

#[tokio::test]
async fn test_get_with_invalid_cidr_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = master_config(&server);
    let err = lookup::get(&YamlFileSource::new(config.path()), "h", Some("10.0.20.0/40"))
        .await
        .unwrap_err();

    assert!(matches!(err, PhpIpamError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_get_with_cidr_skips_other_networks() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_data(
        &server,
        "addresses/search_hostname_partial/h",
        json!([
            { "ip": "192.168.1.7", "hostname": "h", "subnetId": "9" },
            { "ip": "10.0.20.5", "hostname": "h", "subnetId": "5" }
        ]),
    )
    .await;
    mount_data(&server, "subnets/5", json!({ "description": "DMZ" })).await;
    Mock::given(method("GET"))
        .and(path("/api/lookup/subnets/9"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = master_config(&server);
    let found = lookup::get(&YamlFileSource::new(config.path()), "h", Some("10.0.20.0/24"))
        .await
        .unwrap();

    assert_eq!(found.keys().collect::<Vec<_>>(), vec!["1"]);
    assert_eq!(found["1"].ipv4, "10.0.20.5");
    assert_eq!(found["1"].netmask, None);
}

#[tokio::test]
async fn test_get_tags() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_tags(&server).await;

    let config = master_config(&server);
    let tags = lookup::get_tags(&YamlFileSource::new(config.path()))
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&tags).unwrap(),
        json!([
            { "id": "1", "type": "Online" },
            { "id": "2", "type": "Offline" },
            { "id": "3", "type": "Used" }
        ])
    );
}

#[tokio::test]
async fn test_get_tags_passes_numeric_ids_through() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    let tags = json!([{ "id": 1, "type": "Online", "locked": "No" }]);
    mount_data(&server, "addresses/tags/", tags.clone()).await;

    let config = master_config(&server);
    let found = lookup::get_tags(&YamlFileSource::new(config.path()))
        .await
        .unwrap();

    assert_eq!(serde_json::to_value(&found).unwrap(), tags);
}

#[tokio::test]
async fn test_configuration_from_master_drop_in() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_tags(&server).await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("master"), "interface: 0.0.0.0\n").unwrap();
    std::fs::create_dir(dir.path().join("master.d")).unwrap();
    std::fs::write(
        dir.path().join("master.d/phpipam.conf"),
        format!(
            "phpipam:\n  url: {}\n  auth:\n    user: 'read_api_user'\n    password: 'xxxxx'\n",
            server.uri()
        ),
    )
    .unwrap();

    let tags = lookup::get_tags(&YamlFileSource::new(dir.path().join("master")))
        .await
        .unwrap();

    assert_eq!(tags.len(), 3);
}

#[tokio::test]
async fn test_get_tag_id() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_tags(&server).await;

    let config = master_config(&server);
    let tag = lookup::get_tag_id(&YamlFileSource::new(config.path()), "Offline")
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&tag).unwrap(),
        json!({ "tag": "Offline", "tag_id": "2" })
    );
}

#[tokio::test]
async fn test_get_addrs_by_tag() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_tags(&server).await;
    mount_data(
        &server,
        "addresses/tags/3/addresses/",
        json!([
            { "ip": "10.0.0.1", "hostname": "gw", "is_gateway": "1", "description": "router" },
            { "ip": "10.0.0.5", "hostname": "web01", "is_gateway": "0", "description": "web" },
            { "ip": "10.0.0.5", "hostname": "web01b", "description": "web again" }
        ]),
    )
    .await;

    let config = master_config(&server);
    let tagged = lookup::get_addrs_by_tag(&YamlFileSource::new(config.path()), "Used", true)
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&tagged).unwrap(),
        json!({
            "details": {
                "10.0.0.5": { "description": "web again", "hostname": "web01b", "is_gateway": null }
            },
            "ip_addrs": ["10.0.0.5", "10.0.0.5"],
            "tag": "Used"
        })
    );
}

#[tokio::test]
async fn test_get_addrs_by_unknown_tag() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    mount_tags(&server).await;

    let config = master_config(&server);
    let tagged = lookup::get_addrs_by_tag(&YamlFileSource::new(config.path()), "Reserved", false)
        .await
        .unwrap();

    assert!(tagged.is_none());
}

#[tokio::test]
async fn test_missing_configuration() {
    let source = EnvSource::from_vars([("PHPIPAM_URL", "http://127.0.0.1:9")]);

    let err = lookup::get_tags(&source).await.unwrap_err();

    assert!(matches!(err, PhpIpamError::Configuration(_)));
}

#[tokio::test]
async fn test_operations_are_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/lookup/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "token": "abc" }
        })))
        .expect(2)
        .mount(&server)
        .await;
    mount_tags(&server).await;

    let config = master_config(&server);
    let source = YamlFileSource::new(config.path());
    let first = lookup::get_tag_id(&source, "Used").await.unwrap();
    let second = lookup::get_tag_id(&source, "Used").await.unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
