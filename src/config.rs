// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command-line configuration.
//!
//! Global flags select the libvirt connection, the storage pool used for
//! volumes and the network used for DNS. Pool and network accept a name or a
//! UUID.
//!
//! Desired record files are JSON lists of record sets:
//!
//! ```json
//! [
//!   {"type": "A", "name": "web.local-1.internal.", "values": ["10.11.12.5"]},
//!   {"type": "CNAME", "name": "www.local-1.internal.", "values": ["web.local-1.internal."]}
//! ]
//! ```

use crate::constants::{
    DEFAULT_BIND_ADDRESS, DEFAULT_HTTP_PORT, DEFAULT_IMAGE_POOL, DEFAULT_LIBVIRT_URI,
    DEFAULT_NETWORK,
};
use crate::dns::{DnsRecords, RecordQuery, RecordSet};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "libvirt-aws")]
#[command(version)]
#[command(about = "Volume and DNS APIs backed by libvirt pools, domains and networks")]
pub struct Cli {
    /// libvirt connection URI
    #[arg(long, global = true, default_value = DEFAULT_LIBVIRT_URI)]
    pub libvirt_uri: String,

    /// Storage pool holding volumes (name or UUID)
    #[arg(long, global = true, default_value = DEFAULT_IMAGE_POOL)]
    pub libvirt_image_pool: String,

    /// Network holding DNS records and addresses (name or UUID)
    #[arg(long, global = true, default_value = DEFAULT_NETWORK)]
    pub libvirt_network: String,

    /// Apply network updates to the running network only
    #[arg(long, global = true)]
    pub transient_updates: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the network's DNS records
    Records(RecordsArgs),
    /// Print the edits that would reconcile the network to a record file
    Diff(RecordsFileArgs),
    /// Reconcile the network to a record file
    Apply(RecordsFileArgs),
    /// List the volumes of the image pool
    Volumes,
    /// List the domains a volume is attached to
    Attachments {
        /// Volume name
        volume: String,
    },
    /// Describe the network's addressing and DNS domain
    Network,
    /// Serve the HTTP API
    Serve(ServeArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct RecordsArgs {
    /// Only records inside this zone
    #[arg(long)]
    pub zone: Option<String>,

    /// Leave out records inside this zone (repeatable)
    #[arg(long = "exclude-zone")]
    pub exclude_zones: Vec<String>,

    /// Include the zone's SOA and NS records
    #[arg(long)]
    pub include_soa_ns: bool,

    /// Keep address records of names that also carry a CNAME
    #[arg(long)]
    pub include_eager_cname: bool,
}

impl RecordsArgs {
    #[must_use]
    pub fn to_query(&self) -> RecordQuery {
        let mut query = RecordQuery::new();
        if let Some(zone) = &self.zone {
            query = query.zone(zone.as_str());
        }
        for zone in &self.exclude_zones {
            query = query.exclude_zone(zone.as_str());
        }
        if self.include_soa_ns {
            query = query.with_soa_ns();
        }
        if self.include_eager_cname {
            query = query.with_eager_cname();
        }
        query
    }
}

#[derive(Debug, Clone, Args)]
pub struct RecordsFileArgs {
    /// JSON file holding the desired record sets
    #[arg(long, short)]
    pub file: PathBuf,

    /// Only replace records inside this zone
    #[arg(long)]
    pub zone: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, default_value = DEFAULT_BIND_ADDRESS)]
    pub bind_to: IpAddr,

    /// TCP port to listen on
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT)]
    pub port: u16,
}

impl ServeArgs {
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_to, self.port)
    }
}

/// Load desired record sets from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON list of
/// record sets.
pub fn load_record_sets(path: &Path) -> Result<DnsRecords> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read record file {}", path.display()))?;
    let sets: Vec<RecordSet> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse record file {}", path.display()))?;
    Ok(sets.into_iter().collect())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
