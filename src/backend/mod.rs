// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Virtualization backend boundary.
//!
//! The [`Backend`] trait is the only way the rest of the crate talks to the
//! platform: object lookups, XML description fetches and the incremental
//! network update primitive.
//!
//! - [`virsh`] - Drives a libvirt daemon through the `virsh` CLI
//! - [`memory`] - Simulated platform holding XML descriptions in memory
//!
//! # Example
//!
//! ```rust,no_run
//! use libvirt_aws::backend::{Backend, ObjectId, VirshBackend};
//!
//! # async fn example() -> libvirt_aws::errors::Result<()> {
//! let backend = VirshBackend::new("qemu:///system");
//! let network = backend.lookup_network(&ObjectId::parse("default")).await?;
//! let xml = backend.network_xml(&network.name).await?;
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod virsh;

pub use memory::MemoryBackend;
pub use virsh::VirshBackend;

use crate::dns::NetworkSection;
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How a pool or network is identified on the command line or in config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectId {
    Name(String),
    Uuid(Uuid),
}

impl ObjectId {
    /// Anything that parses as a UUID is a UUID, everything else a name.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match Uuid::parse_str(value.trim()) {
            Ok(uuid) => Self::Uuid(uuid),
            Err(_) => Self::Name(value.trim().to_string()),
        }
    }

    /// Whether `object` is the one identified.
    #[must_use]
    pub fn matches(&self, object: &ObjectRef) -> bool {
        match self {
            Self::Name(name) => &object.name == name,
            Self::Uuid(uuid) => Uuid::parse_str(&object.uuid).is_ok_and(|other| &other == uuid),
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Uuid(uuid) => write!(f, "{uuid}"),
        }
    }
}

/// A resolved pool or network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub name: String,
    pub uuid: String,
}

/// Operation of a network update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateOperation {
    /// Append the fragment to its section
    AddLast,
    /// Remove the entry matching the fragment
    Delete,
}

impl UpdateOperation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddLast => "add-last",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for UpdateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access to the virtualization platform.
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Check that the platform answers.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::BackendError::Unavailable`] when the platform
    /// cannot be reached.
    async fn ping(&self) -> Result<()>;

    /// Resolve a storage pool by name or UUID.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::LookupError::PoolNotFound`] if no pool matches.
    async fn lookup_pool(&self, id: &ObjectId) -> Result<ObjectRef>;

    /// Resolve a network by name or UUID.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::LookupError::NetworkNotFound`] if no network matches.
    async fn lookup_network(&self, id: &ObjectId) -> Result<ObjectRef>;

    /// Names of every volume in a pool.
    async fn list_volumes(&self, pool: &str) -> Result<Vec<String>>;

    /// XML description of one volume.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::LookupError::VolumeNotFound`] if the volume is
    /// not in the pool.
    async fn volume_xml(&self, pool: &str, volume: &str) -> Result<String>;

    /// Names of every defined domain, running or not.
    async fn list_domains(&self) -> Result<Vec<String>>;

    /// XML description of one domain.
    async fn domain_xml(&self, domain: &str) -> Result<String>;

    /// XML description of one network.
    async fn network_xml(&self, network: &str) -> Result<String>;

    /// Apply one fragment to a section of a network definition.
    ///
    /// # Arguments
    ///
    /// * `network` - Network name
    /// * `operation` - Add the fragment or delete the matching entry
    /// * `section` - Section the fragment belongs to
    /// * `xml` - The fragment
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::BackendError::UpdateRejected`] if the platform
    /// refuses the edit (duplicate or missing entry).
    async fn update_network(
        &self,
        network: &str,
        operation: UpdateOperation,
        section: NetworkSection,
        xml: &str,
    ) -> Result<()>;
}
