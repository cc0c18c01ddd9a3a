// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Domain view and volume attachments.
//!
//! Only disks of `type="volume"` (a pool/volume reference) are modelled.
//! File, block and network disks are outside the volume emulation and are
//! dropped at parse time.

use super::{invalid, parse_xml, FromXml};
use crate::errors::Result;
use serde::{Deserialize, Serialize};

/// A domain and its volume-backed disks, in definition order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Domain {
    pub name: String,
    pub uuid: Option<String>,
    pub disks: Vec<DiskDevice>,
}

/// A disk referencing a volume in a storage pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskDevice {
    pub pool: String,
    pub volume: String,
    /// Guest device name (e.g. `vda`)
    pub device: String,
}

/// A volume attached to a domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolumeAttachment {
    pub domain: String,
    pub volume: String,
    pub pool: String,
    pub device: String,
}

#[derive(Debug, Deserialize)]
struct DomainXml {
    name: String,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    devices: Option<DevicesXml>,
}

#[derive(Debug, Default, Deserialize)]
struct DevicesXml {
    #[serde(rename = "disk", default)]
    disks: Vec<DiskXml>,
}

#[derive(Debug, Deserialize)]
struct DiskXml {
    #[serde(rename = "@type")]
    disk_type: String,
    #[serde(default)]
    source: Option<DiskSourceXml>,
    #[serde(default)]
    target: Option<DiskTargetXml>,
}

#[derive(Debug, Deserialize)]
struct DiskSourceXml {
    #[serde(rename = "@pool", default)]
    pool: Option<String>,
    #[serde(rename = "@volume", default)]
    volume: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiskTargetXml {
    #[serde(rename = "@dev", default)]
    dev: Option<String>,
}

impl FromXml for Domain {
    const KIND: &'static str = "domain";

    fn from_xml(xml: &str) -> Result<Self> {
        let raw: DomainXml = parse_xml(Self::KIND, xml)?;
        let name = raw.name;

        let disks = raw
            .devices
            .unwrap_or_default()
            .disks
            .into_iter()
            .filter(|disk| disk.disk_type == "volume")
            .map(|disk| {
                let source = disk.source.ok_or_else(|| {
                    invalid(Self::KIND, format!("volume disk of '{name}' has no source"))
                })?;
                let (Some(pool), Some(volume)) = (source.pool, source.volume) else {
                    return Err(invalid(
                        Self::KIND,
                        format!("volume disk of '{name}' must name a pool and a volume"),
                    ));
                };
                let device = disk.target.and_then(|target| target.dev).ok_or_else(|| {
                    invalid(Self::KIND, format!("disk '{pool}/{volume}' of '{name}' has no target device"))
                })?;
                Ok(DiskDevice {
                    pool,
                    volume,
                    device,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name,
            uuid: raw.uuid.map(|uuid| uuid.trim().to_string()),
            disks,
        })
    }
}

impl Domain {
    /// Attachments of `volume` in `pool` on this domain.
    pub fn attachments_of<'a>(
        &'a self,
        pool: &'a str,
        volume: &'a str,
    ) -> impl Iterator<Item = VolumeAttachment> + 'a {
        self.disks
            .iter()
            .filter(move |disk| disk.pool == pool && disk.volume == volume)
            .map(|disk| disk.attachment(&self.name))
    }
}

impl DiskDevice {
    /// The attachment this disk represents on `domain`.
    #[must_use]
    pub fn attachment(&self, domain: &str) -> VolumeAttachment {
        VolumeAttachment {
            domain: domain.to_string(),
            volume: self.volume.clone(),
            pool: self.pool.clone(),
            device: self.device.clone(),
        }
    }
}

#[cfg(test)]
#[path = "domain_tests.rs"]
mod domain_tests;
