//! phpIPAM lookup CLI
//!
//! Runs one lookup operation against phpIPAM and prints the result as JSON on
//! stdout. Logs go to stderr (`RUST_LOG` controls the level).
//!
//! ```text
//! phpipam-lookup get web01.mydomain.com
//! phpipam-lookup get web01.mydomain.com 10.0.20.0/24
//! phpipam-lookup get-tags
//! phpipam-lookup get-tag-id Offline
//! phpipam-lookup get-addrs-by-tag Used --exclude-gateway
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use phpipam_client::config::DEFAULT_CONFIG_FILE;
use phpipam_client::{lookup, ConfigSource, EnvSource, YamlFileSource};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Parser)]
#[command(name = "phpipam-lookup", version, about = "Look up addresses and tags in phpIPAM")]
struct Cli {
    /// Configuration file holding the `phpipam` section (drop-ins in the
    /// sibling `master.d/` are read too)
    #[arg(long, env = "PHPIPAM_CONFIG", default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Read PHPIPAM_URL, PHPIPAM_USER and PHPIPAM_PASSWORD instead of the configuration file
    #[arg(long, global = true)]
    from_env: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// IP address(es) associated to a hostname, optionally restricted to a CIDR
    Get { hostname: String, cidr: Option<String> },
    /// All address tags
    GetTags,
    /// Tag id that corresponds to a tag name
    GetTagId { tag: String },
    /// IP addresses carrying a tag
    GetAddrsByTag {
        tag: String,
        /// Leave out addresses flagged as gateway
        #[arg(long)]
        exclude_gateway: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let source: Box<dyn ConfigSource> = if cli.from_env {
        Box::new(EnvSource::from_process())
    } else {
        Box::new(YamlFileSource::new(&cli.config))
    };
    debug!("Configuration source: {:?}", source);

    let output = run(cli.command, source.as_ref()).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Run one operation; "not found" prints as `{}`
async fn run(command: Command, source: &dyn ConfigSource) -> Result<Value> {
    let output = match command {
        Command::Get { hostname, cidr } => {
            info!("Looking up hostname {}", hostname);
            let found = lookup::get(source, &hostname, cidr.as_deref())
                .await
                .with_context(|| format!("Failed to look up hostname {}", hostname))?;
            serde_json::to_value(found)?
        }
        Command::GetTags => {
            let tags = lookup::get_tags(source).await.context("Failed to list tags")?;
            serde_json::to_value(tags)?
        }
        Command::GetTagId { tag } => {
            let id = lookup::get_tag_id(source, &tag)
                .await
                .with_context(|| format!("Failed to resolve tag {}", tag))?;
            id.map_or_else(empty, serde_json::to_value)?
        }
        Command::GetAddrsByTag { tag, exclude_gateway } => {
            let tagged = lookup::get_addrs_by_tag(source, &tag, exclude_gateway)
                .await
                .with_context(|| format!("Failed to list addresses tagged {}", tag))?;
            tagged.map_or_else(empty, serde_json::to_value)?
        }
    };

    Ok(output)
}

fn empty() -> serde_json::Result<Value> {
    Ok(Value::Object(serde_json::Map::new()))
}
