// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Connection session: backend access, entity caches and DNS changes.
//!
//! A [`Session`] is shared by every request of the process. It holds no
//! per-request state: every describe fetches a fresh XML snapshot and maps it
//! to a cached view, and every DNS change re-reads the network before diffing.
//!
//! # DNS change serialization
//!
//! Reading the current records, computing the diff and applying it are three
//! separate backend round trips. Two writers interleaving them on one network
//! would each diff against a state the other is about to change. Changes to
//! one network are therefore serialized through a per-network async lock;
//! reads are never blocked.

use crate::backend::{Backend, ObjectId, ObjectRef, UpdateOperation};
use crate::constants::CHANGE_STATUS_INSYNC;
use crate::dns::{in_zone, read_records, DnsDiff, DnsRecords, RecordQuery};
use crate::entity_cache::EntityCaches;
use crate::errors::{Error, LookupError, Result};
use crate::metrics::{
    record_dns_diff_error, record_dns_diff_success, record_error, record_network_update,
};
use crate::resources::{Domain, Network, Volume, VolumeAttachment};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcome of an applied DNS change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeInfo {
    /// Unique change id
    pub id: String,
    /// Always `INSYNC`: changes are applied before the call returns
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    /// The fragments that were applied
    pub diff: DnsDiff,
}

impl ChangeInfo {
    fn new(diff: DnsDiff) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: CHANGE_STATUS_INSYNC.to_string(),
            submitted_at: Utc::now(),
            diff,
        }
    }
}

/// Pool and network resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connected {
    pub pool: ObjectRef,
    pub network: ObjectRef,
}

/// Shared access to one backend connection.
pub struct Session {
    backend: Arc<dyn Backend>,
    caches: EntityCaches,
    network_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("caches", &self.caches)
            .field("locked_networks", &self.network_locks.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            caches: EntityCaches::default(),
            network_locks: DashMap::new(),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    #[must_use]
    pub fn caches(&self) -> &EntityCaches {
        &self.caches
    }

    /// Resolve a pool by name or UUID.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::PoolNotFound`] if no pool matches.
    pub async fn resolve_pool(&self, id: &ObjectId) -> Result<ObjectRef> {
        self.backend.lookup_pool(id).await
    }

    /// Resolve a network by name or UUID.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NetworkNotFound`] if no network matches.
    pub async fn resolve_network(&self, id: &ObjectId) -> Result<ObjectRef> {
        self.backend.lookup_network(id).await
    }

    /// Wait for the backend and resolve the pool and network.
    ///
    /// Transient failures (daemon down, command failures) are retried forever
    /// with a fixed `delay`. A pool or network that does not exist is permanent
    /// and returned immediately.
    ///
    /// # Errors
    ///
    /// Returns the first non-transient error.
    pub async fn connect_with_retry(
        &self,
        pool: &ObjectId,
        network: &ObjectId,
        delay: Duration,
    ) -> Result<Connected> {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            match self.connect_once(pool, network).await {
                Ok(connected) => {
                    info!(
                        attempt,
                        pool = %connected.pool.name,
                        network = %connected.network.name,
                        "Connected to backend"
                    );
                    return Ok(connected);
                }
                Err(e) if e.is_transient() => {
                    warn!(attempt, error = %e, retry_in = ?delay, "Backend not ready, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn connect_once(&self, pool: &ObjectId, network: &ObjectId) -> Result<Connected> {
        self.backend.ping().await?;
        Ok(Connected {
            pool: self.resolve_pool(pool).await?,
            network: self.resolve_network(network).await?,
        })
    }

    /// Describe one volume by name without listing the pool.
    pub async fn describe_volume(&self, pool: &str, volume: &str) -> Result<Arc<Volume>> {
        let xml = self.backend.volume_xml(pool, volume).await?;
        self.caches.volumes.get_or_parse(&xml)
    }

    /// Every volume of a pool.
    pub async fn get_all_volumes(&self, pool: &str) -> Result<Vec<Arc<Volume>>> {
        let names = self.backend.list_volumes(pool).await?;
        try_join_all(names.iter().map(|name| self.describe_volume(pool, name))).await
    }

    /// Find a volume by scanning the pool.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::VolumeNotFound`] if no volume of the pool has
    /// that name.
    pub async fn get_volume(&self, pool: &str, name: &str) -> Result<Arc<Volume>> {
        self.get_all_volumes(pool)
            .await?
            .into_iter()
            .find(|volume| volume.name == name)
            .ok_or_else(|| {
                LookupError::VolumeNotFound {
                    pool: pool.to_string(),
                    volume: name.to_string(),
                }
                .into()
            })
    }

    /// Every defined domain.
    ///
    /// A domain undefined between the listing and its describe is skipped.
    pub async fn get_all_domains(&self) -> Result<Vec<Arc<Domain>>> {
        let names = self.backend.list_domains().await?;
        let described = try_join_all(names.iter().map(|name| async move {
            match self.backend.domain_xml(name).await {
                Ok(xml) => self.caches.domains.get_or_parse(&xml).map(Some),
                Err(Error::Lookup(LookupError::DomainNotFound { .. })) => {
                    debug!(domain = %name, "Domain disappeared while listing");
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        }))
        .await?;
        Ok(described.into_iter().flatten().collect())
    }

    /// Every attachment of a volume, scanning the disks of every domain.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::VolumeNotFound`] if the volume does not exist.
    pub async fn get_vol_attachments(
        &self,
        pool: &str,
        volume: &str,
    ) -> Result<Vec<VolumeAttachment>> {
        let volume = self.get_volume(pool, volume).await?;
        let domains = self.get_all_domains().await?;
        Ok(domains
            .iter()
            .flat_map(|domain| domain.attachments_of(pool, &volume.name).collect::<Vec<_>>())
            .collect())
    }

    /// Fresh view of a network.
    pub async fn describe_network(&self, network: &str) -> Result<Arc<Network>> {
        let xml = self.backend.network_xml(network).await?;
        self.caches.networks.get_or_parse(&xml)
    }

    /// Read view of a network's DNS records.
    pub async fn get_dns_records(&self, network: &str, query: &RecordQuery) -> Result<DnsRecords> {
        self.describe_network(network).await?.get_dns_records(query)
    }

    /// Edits that would turn a network's records into `desired`.
    pub async fn get_dns_diff(&self, network: &str, desired: &DnsRecords) -> Result<DnsDiff> {
        let view = self.describe_network(network).await?;
        timed_diff(&view, desired)
    }

    /// Reconcile a network's records to `desired` and apply the edits.
    ///
    /// Deletions are applied in order, then additions. The first rejected
    /// edit aborts the change; edits already applied stay applied.
    ///
    /// # Errors
    ///
    /// Returns the diff error (nothing applied) or the first backend error.
    pub async fn apply_dns_records(
        &self,
        network: &str,
        desired: &DnsRecords,
    ) -> Result<ChangeInfo> {
        let lock = self.network_lock(network);
        let _guard = lock.lock().await;

        let result = self.apply_locked(network, desired).await;
        if let Err(e) = &result {
            record_error("apply_dns_records", e.status_reason());
        }
        result
    }

    /// Replace the records inside `zone` with `records`, keeping every record
    /// outside it. Without a zone, `records` replaces everything.
    pub async fn replace_zone_records(
        &self,
        network: &str,
        zone: Option<&str>,
        records: &DnsRecords,
    ) -> Result<ChangeInfo> {
        let lock = self.network_lock(network);
        let _guard = lock.lock().await;

        let result = match self.zone_desired(network, zone, records).await {
            Ok(desired) => self.apply_locked(network, &desired).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            record_error("replace_zone_records", e.status_reason());
        }
        result
    }

    /// Desired state of the whole network when `records` replaces the
    /// contents of `zone`.
    ///
    /// Records outside the zone are skipped.
    pub async fn zone_desired(
        &self,
        network: &str,
        zone: Option<&str>,
        records: &DnsRecords,
    ) -> Result<DnsRecords> {
        let Some(zone) = zone else {
            return Ok(records.clone());
        };
        let view = self.describe_network(network).await?;
        let mut desired = read_records(view.records(), &RecordQuery::new().exclude_zone(zone));
        for (key, values) in records.iter() {
            if !in_zone(&key.name, zone) {
                warn!(record = %key, zone = %zone, "Skipping record outside the zone");
                continue;
            }
            desired.values_mut(key.clone()).extend(values.iter().cloned());
        }
        Ok(desired)
    }

    async fn apply_locked(&self, network: &str, desired: &DnsRecords) -> Result<ChangeInfo> {
        let view = self.describe_network(network).await?;
        let diff = timed_diff(&view, desired)?;

        if diff.is_empty() {
            debug!(network = %network, "DNS records already in sync");
            return Ok(ChangeInfo::new(diff));
        }

        for (operation, fragments) in [
            (UpdateOperation::Delete, &diff.deleted),
            (UpdateOperation::AddLast, &diff.added),
        ] {
            for fragment in fragments {
                self.backend
                    .update_network(network, operation, fragment.section, &fragment.xml)
                    .await?;
                record_network_update(fragment.section.as_str(), operation.as_str());
            }
        }

        info!(
            network = %network,
            deleted = diff.deleted.len(),
            added = diff.added.len(),
            "Applied DNS changes"
        );
        Ok(ChangeInfo::new(diff))
    }

    fn network_lock(&self, network: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.network_locks
                .entry(network.to_string())
                .or_default()
                .value(),
        )
    }
}

fn timed_diff(view: &Network, desired: &DnsRecords) -> Result<DnsDiff> {
    let start = Instant::now();
    let result = view.get_dns_diff(desired);
    match &result {
        Ok(diff) => {
            record_dns_diff_success(start.elapsed());
            debug!(network = %view.name(), added = diff.added.len(), deleted = diff.deleted.len(), "Computed DNS diff");
        }
        Err(e) => {
            record_dns_diff_error(start.elapsed(), e.status_reason());
            warn!(network = %view.name(), error = %e, "DNS diff rejected");
        }
    }
    result
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
