// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Backend driving a libvirt daemon through the `virsh` command line.
//!
//! Every call spawns one `virsh -q -c <uri> ...` process. Lookups that fail
//! with a "not found" message are mapped to [`LookupError`]; other failures
//! are reported as [`BackendError`].

use super::{Backend, ObjectId, ObjectRef, UpdateOperation};
use crate::constants::VIRSH_COMMAND;
use crate::dns::NetworkSection;
use crate::errors::{BackendError, Error, LookupError, Result};
use tokio::process::Command;
use tracing::{debug, warn};

/// [`Backend`] implementation on top of `virsh`.
#[derive(Debug, Clone)]
pub struct VirshBackend {
    uri: String,
    persist_updates: bool,
}

impl VirshBackend {
    /// Backend for the daemon at `uri`. Network updates affect both the live
    /// and the persistent definition.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            persist_updates: true,
        }
    }

    /// Only apply network updates to the live definition.
    #[must_use]
    pub fn with_transient_updates(mut self, transient: bool) -> Self {
        self.persist_updates = !transient;
        self
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Run virsh with `args` and return its standard output.
    async fn run(&self, args: &[&str]) -> Result<String> {
        let command = format!("{VIRSH_COMMAND} {}", args.join(" "));
        debug!(uri = %self.uri, command = %command, "Running virsh");

        let output = Command::new(VIRSH_COMMAND)
            .arg("-q")
            .arg("-c")
            .arg(&self.uri)
            .args(args)
            .output()
            .await
            .map_err(|e| BackendError::Unavailable {
                reason: format!("failed to run {VIRSH_COMMAND}: {e}"),
            })?;

        if !output.status.success() {
            return Err(BackendError::CommandFailed {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn info(&self, subcommand: &str, id: &ObjectId) -> Result<ObjectRef> {
        let id = id.to_string();
        let output = self.run(&[subcommand, &id]).await?;
        parse_info(subcommand, &output)
    }
}

#[async_trait::async_trait]
impl Backend for VirshBackend {
    async fn ping(&self) -> Result<()> {
        self.run(&["uri"]).await.map(|_| ()).map_err(|e| match e {
            Error::Backend(BackendError::CommandFailed { stderr, .. }) => {
                BackendError::Unavailable { reason: stderr }.into()
            }
            other => other,
        })
    }

    async fn lookup_pool(&self, id: &ObjectId) -> Result<ObjectRef> {
        self.info("pool-info", id).await.map_err(|e| {
            not_found(e, || LookupError::PoolNotFound {
                pool: id.to_string(),
            })
        })
    }

    async fn lookup_network(&self, id: &ObjectId) -> Result<ObjectRef> {
        self.info("net-info", id).await.map_err(|e| {
            not_found(e, || LookupError::NetworkNotFound {
                network: id.to_string(),
            })
        })
    }

    async fn list_volumes(&self, pool: &str) -> Result<Vec<String>> {
        let output = self.run(&["vol-list", "--pool", pool]).await.map_err(|e| {
            not_found(e, || LookupError::PoolNotFound {
                pool: pool.to_string(),
            })
        })?;
        Ok(parse_volume_list(&output))
    }

    async fn volume_xml(&self, pool: &str, volume: &str) -> Result<String> {
        self.run(&["vol-dumpxml", "--pool", pool, volume])
            .await
            .map_err(|e| {
                not_found(e, || LookupError::VolumeNotFound {
                    pool: pool.to_string(),
                    volume: volume.to_string(),
                })
            })
    }

    async fn list_domains(&self) -> Result<Vec<String>> {
        let output = self.run(&["list", "--all", "--name"]).await?;
        Ok(parse_names(&output))
    }

    async fn domain_xml(&self, domain: &str) -> Result<String> {
        self.run(&["dumpxml", domain]).await.map_err(|e| {
            not_found(e, || LookupError::DomainNotFound {
                domain: domain.to_string(),
            })
        })
    }

    async fn network_xml(&self, network: &str) -> Result<String> {
        self.run(&["net-dumpxml", network]).await.map_err(|e| {
            not_found(e, || LookupError::NetworkNotFound {
                network: network.to_string(),
            })
        })
    }

    async fn update_network(
        &self,
        network: &str,
        operation: UpdateOperation,
        section: NetworkSection,
        xml: &str,
    ) -> Result<()> {
        let mut args = vec![
            "net-update",
            network,
            operation.as_str(),
            section.as_str(),
            xml,
            "--live",
        ];
        if self.persist_updates {
            args.push("--config");
        }

        match self.run(&args).await {
            Ok(_) => Ok(()),
            Err(Error::Backend(BackendError::CommandFailed { stderr, .. })) => {
                warn!(network = %network, operation = %operation, section = %section, error = %stderr, "Network update rejected");
                Err(BackendError::UpdateRejected {
                    network: network.to_string(),
                    section: section.to_string(),
                    reason: stderr,
                }
                .into())
            }
            Err(e) => Err(e),
        }
    }
}

/// Map a failed command whose message reports a missing object to a lookup error.
fn not_found(err: Error, lookup: impl FnOnce() -> LookupError) -> Error {
    match &err {
        Error::Backend(BackendError::CommandFailed { stderr, .. })
            if stderr.to_ascii_lowercase().contains("not found") =>
        {
            lookup().into()
        }
        _ => err,
    }
}

/// Parse `pool-info`/`net-info` output (`Name:` and `UUID:` lines).
pub(crate) fn parse_info(command: &str, output: &str) -> Result<ObjectRef> {
    let field = |label: &str| {
        output.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            (key.trim() == label).then(|| value.trim().to_string())
        })
    };

    match (field("Name"), field("UUID")) {
        (Some(name), Some(uuid)) => Ok(ObjectRef { name, uuid }),
        _ => Err(BackendError::InvalidOutput {
            command: command.to_string(),
            reason: "missing Name or UUID line".to_string(),
        }
        .into()),
    }
}

/// One name per non-empty line.
pub(crate) fn parse_names(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// First column of `vol-list` rows (header and separator lines skipped).
pub(crate) fn parse_volume_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.trim_start().starts_with('-'))
        .filter_map(|line| line.split_whitespace().next())
        .filter(|name| *name != "Name")
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
#[path = "virsh_tests.rs"]
mod virsh_tests;
