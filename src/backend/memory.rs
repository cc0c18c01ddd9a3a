// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory simulated platform.
//!
//! Holds pools, volumes, domains and networks as XML descriptions and applies
//! network updates the way the platform does: host entries are keyed by
//! address, adding an entry that already exists and deleting one that does not
//! are both rejected, and every accepted edit re-serializes the network XML so
//! the next describe sees a new description.
//!
//! TXT entries are matched on name and value, so a name can carry several
//! values.

use super::{Backend, ObjectId, ObjectRef, UpdateOperation};
use crate::dns::{DnsConfig, HostEntry, NetworkSection, SrvEntry, TxtEntry};
use crate::errors::{BackendError, LookupError, Result};
use crate::resources::network::NetworkXml;
use crate::resources::{Domain, FromXml, Volume};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

/// One accepted network update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedUpdate {
    pub network: String,
    pub operation: UpdateOperation,
    pub section: NetworkSection,
    pub xml: String,
}

#[derive(Debug, Default)]
struct PoolState {
    uuid: String,
    volumes: BTreeMap<String, String>,
}

#[derive(Debug)]
struct NetworkState {
    uuid: String,
    xml: String,
}

#[derive(Debug, Default)]
struct State {
    pools: BTreeMap<String, PoolState>,
    domains: BTreeMap<String, String>,
    networks: BTreeMap<String, NetworkState>,
    updates: Vec<AppliedUpdate>,
    failing_pings: usize,
}

/// [`Backend`] implementation backed by in-process state.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<State>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty storage pool.
    #[must_use]
    pub fn with_pool(mut self, name: &str, uuid: &str) -> Self {
        self.state.get_mut().pools.insert(
            name.to_string(),
            PoolState {
                uuid: uuid.to_string(),
                volumes: BTreeMap::new(),
            },
        );
        self
    }

    /// Add a volume description to an existing pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool is unknown or the XML is not a volume.
    pub fn with_volume(mut self, pool: &str, xml: &str) -> Result<Self> {
        let volume = Volume::from_xml(xml)?;
        let state = self.state.get_mut();
        let pool_state = state
            .pools
            .get_mut(pool)
            .ok_or_else(|| LookupError::PoolNotFound {
                pool: pool.to_string(),
            })?;
        pool_state.volumes.insert(volume.name, xml.to_string());
        Ok(self)
    }

    /// Add a domain description.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML is not a domain.
    pub fn with_domain(mut self, xml: &str) -> Result<Self> {
        let domain = Domain::from_xml(xml)?;
        self.state
            .get_mut()
            .domains
            .insert(domain.name, xml.to_string());
        Ok(self)
    }

    /// Add a network description.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML is not a network.
    pub fn with_network(mut self, xml: &str) -> Result<Self> {
        let raw = NetworkXml::parse(xml)?;
        self.state.get_mut().networks.insert(
            raw.name.clone(),
            NetworkState {
                uuid: raw.uuid.trim().to_string(),
                xml: xml.to_string(),
            },
        );
        Ok(self)
    }

    /// Make the next `count` pings fail as if the daemon were down.
    #[must_use]
    pub fn with_unavailable_pings(mut self, count: usize) -> Self {
        self.state.get_mut().failing_pings = count;
        self
    }

    /// Every accepted network update, oldest first.
    pub async fn updates(&self) -> Vec<AppliedUpdate> {
        self.state.read().await.updates.clone()
    }

    /// Replace a domain description, as if it had been redefined.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML is not a domain.
    pub async fn define_domain(&self, xml: &str) -> Result<()> {
        let domain = Domain::from_xml(xml)?;
        self.state
            .write()
            .await
            .domains
            .insert(domain.name, xml.to_string());
        Ok(())
    }
}

fn find<T>(
    objects: &BTreeMap<String, T>,
    id: &ObjectId,
    uuid: impl Fn(&T) -> &str,
) -> Option<ObjectRef> {
    objects.iter().find_map(|(name, object)| {
        let candidate = ObjectRef {
            name: name.clone(),
            uuid: uuid(object).to_string(),
        };
        id.matches(&candidate).then_some(candidate)
    })
}

fn parse_fragment<T: DeserializeOwned>(
    network: &str,
    section: NetworkSection,
    xml: &str,
) -> Result<T> {
    quick_xml::de::from_str(xml).map_err(|e| {
        BackendError::UpdateRejected {
            network: network.to_string(),
            section: section.to_string(),
            reason: format!("invalid fragment: {e}"),
        }
        .into()
    })
}

/// Apply one edit to a list of entries.
///
/// `same` decides which existing entry an incoming fragment refers to.
fn edit<T>(
    entries: &mut Vec<T>,
    entry: T,
    operation: UpdateOperation,
    same: impl Fn(&T, &T) -> bool,
) -> std::result::Result<(), &'static str> {
    let position = entries.iter().position(|existing| same(existing, &entry));
    match (operation, position) {
        (UpdateOperation::AddLast, None) => {
            entries.push(entry);
            Ok(())
        }
        (UpdateOperation::AddLast, Some(_)) => Err("a matching entry already exists"),
        (UpdateOperation::Delete, Some(index)) => {
            entries.remove(index);
            Ok(())
        }
        (UpdateOperation::Delete, None) => Err("no matching entry to delete"),
    }
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    async fn ping(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if state.failing_pings > 0 {
            state.failing_pings -= 1;
            return Err(BackendError::Unavailable {
                reason: "simulated connection failure".to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn lookup_pool(&self, id: &ObjectId) -> Result<ObjectRef> {
        let state = self.state.read().await;
        find(&state.pools, id, |pool| pool.uuid.as_str()).ok_or_else(|| {
            LookupError::PoolNotFound {
                pool: id.to_string(),
            }
            .into()
        })
    }

    async fn lookup_network(&self, id: &ObjectId) -> Result<ObjectRef> {
        let state = self.state.read().await;
        find(&state.networks, id, |network| network.uuid.as_str()).ok_or_else(|| {
            LookupError::NetworkNotFound {
                network: id.to_string(),
            }
            .into()
        })
    }

    async fn list_volumes(&self, pool: &str) -> Result<Vec<String>> {
        let state = self.state.read().await;
        let pool_state = state.pools.get(pool).ok_or_else(|| LookupError::PoolNotFound {
            pool: pool.to_string(),
        })?;
        Ok(pool_state.volumes.keys().cloned().collect())
    }

    async fn volume_xml(&self, pool: &str, volume: &str) -> Result<String> {
        let state = self.state.read().await;
        let pool_state = state.pools.get(pool).ok_or_else(|| LookupError::PoolNotFound {
            pool: pool.to_string(),
        })?;
        pool_state.volumes.get(volume).cloned().ok_or_else(|| {
            LookupError::VolumeNotFound {
                pool: pool.to_string(),
                volume: volume.to_string(),
            }
            .into()
        })
    }

    async fn list_domains(&self) -> Result<Vec<String>> {
        Ok(self.state.read().await.domains.keys().cloned().collect())
    }

    async fn domain_xml(&self, domain: &str) -> Result<String> {
        self.state
            .read()
            .await
            .domains
            .get(domain)
            .cloned()
            .ok_or_else(|| {
                LookupError::DomainNotFound {
                    domain: domain.to_string(),
                }
                .into()
            })
    }

    async fn network_xml(&self, network: &str) -> Result<String> {
        self.state
            .read()
            .await
            .networks
            .get(network)
            .map(|state| state.xml.clone())
            .ok_or_else(|| {
                LookupError::NetworkNotFound {
                    network: network.to_string(),
                }
                .into()
            })
    }

    async fn update_network(
        &self,
        network: &str,
        operation: UpdateOperation,
        section: NetworkSection,
        xml: &str,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let network_state =
            state
                .networks
                .get_mut(network)
                .ok_or_else(|| LookupError::NetworkNotFound {
                    network: network.to_string(),
                })?;

        let mut raw = NetworkXml::parse(&network_state.xml)?;
        let dns: &mut DnsConfig = raw.dns.get_or_insert_with(DnsConfig::default);

        let outcome = match section {
            NetworkSection::DnsHost => {
                let entry: HostEntry = parse_fragment(network, section, xml)?;
                edit(&mut dns.hosts, entry, operation, |a, b| a.ip == b.ip)
            }
            NetworkSection::DnsTxt => {
                let entry: TxtEntry = parse_fragment(network, section, xml)?;
                edit(&mut dns.txt, entry, operation, |a, b| a == b)
            }
            NetworkSection::DnsSrv => {
                let entry: SrvEntry = parse_fragment(network, section, xml)?;
                edit(&mut dns.srv, entry, operation, |a, b| a == b)
            }
        };
        if let Err(reason) = outcome {
            return Err(BackendError::UpdateRejected {
                network: network.to_string(),
                section: section.to_string(),
                reason: reason.to_string(),
            }
            .into());
        }

        network_state.xml = raw.to_xml()?;
        debug!(network = %network, operation = %operation, section = %section, "Simulated network update applied");
        state.updates.push(AppliedUpdate {
            network: network.to_string(),
            operation,
            section,
            xml: xml.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
