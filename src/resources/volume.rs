// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Storage volume view.

use super::{invalid, parse_xml, FromXml};
use crate::errors::Result;
use serde::{Deserialize, Serialize};

/// A storage volume inside a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Volume {
    /// Name, unique within the pool
    pub name: String,
    /// Opaque stable key
    pub key: String,
    /// Path of the volume on the host
    pub target_path: String,
    /// Parent in a snapshot/clone chain
    pub backing_store: Option<String>,
    /// Capacity in bytes
    pub capacity: u64,
}

#[derive(Debug, Deserialize)]
struct VolumeXml {
    name: String,
    key: String,
    capacity: CapacityXml,
    target: PathXml,
    #[serde(rename = "backingStore", default)]
    backing_store: Option<BackingStoreXml>,
}

#[derive(Debug, Deserialize)]
struct CapacityXml {
    #[serde(rename = "@unit", default)]
    unit: Option<String>,
    #[serde(rename = "$text")]
    value: u64,
}

#[derive(Debug, Deserialize)]
struct PathXml {
    path: String,
}

#[derive(Debug, Deserialize)]
struct BackingStoreXml {
    #[serde(default)]
    path: Option<String>,
}

impl FromXml for Volume {
    const KIND: &'static str = "volume";

    fn from_xml(xml: &str) -> Result<Self> {
        let raw: VolumeXml = parse_xml(Self::KIND, xml)?;
        let capacity = scale_to_bytes(raw.capacity.value, raw.capacity.unit.as_deref())?;

        Ok(Self {
            name: raw.name,
            key: raw.key,
            target_path: raw.target.path,
            backing_store: raw
                .backing_store
                .and_then(|store| store.path)
                .filter(|path| !path.is_empty()),
            capacity,
        })
    }
}

/// Scale a libvirt capacity to bytes.
///
/// Units follow libvirt: `b`/`bytes`, decimal `KB`..`EB` and binary
/// `k`/`KiB`..`e`/`EiB`. A missing unit means bytes.
fn scale_to_bytes(value: u64, unit: Option<&str>) -> Result<u64> {
    let multiplier: u64 = match unit.unwrap_or("bytes") {
        "b" | "bytes" => 1,
        "KB" => 1_000,
        "k" | "K" | "KiB" => 1 << 10,
        "MB" => 1_000_000,
        "m" | "M" | "MiB" => 1 << 20,
        "GB" => 1_000_000_000,
        "g" | "G" | "GiB" => 1 << 30,
        "TB" => 1_000_000_000_000,
        "t" | "T" | "TiB" => 1 << 40,
        "PB" => 1_000_000_000_000_000,
        "p" | "P" | "PiB" => 1 << 50,
        "EB" => 1_000_000_000_000_000_000,
        "e" | "E" | "EiB" => 1 << 60,
        other => return Err(invalid(Volume::KIND, format!("unknown capacity unit '{other}'"))),
    };
    value
        .checked_mul(multiplier)
        .ok_or_else(|| invalid(Volume::KIND, format!("capacity {value} {unit:?} overflows")))
}

#[cfg(test)]
#[path = "volume_tests.rs"]
mod volume_tests;
