// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use libvirt_aws::backend::{MemoryBackend, VirshBackend};
use libvirt_aws::dns::{DnsRecords, RecordKey, RecordType};
use libvirt_aws::session::Session;
use std::collections::BTreeSet;
use std::sync::Arc;

pub const NETWORK: &str = "default";
pub const NETWORK_UUID: &str = "9a05da11-e96b-47f3-8253-a3a482e445f5";
pub const POOL: &str = "default";
pub const POOL_UUID: &str = "0b1ef3c4-0000-4000-8000-000000000001";
pub const ZONE: &str = "local-1.internal.";

pub const NETWORK_XML: &str = "<network>\
    <name>default</name>\
    <uuid>9a05da11-e96b-47f3-8253-a3a482e445f5</uuid>\
    <forward mode='nat'/>\
    <bridge name='virbr0' stp='on' delay='0'/>\
    <domain name='local-1.internal'/>\
    <ip address='10.11.12.1' netmask='255.255.255.0'>\
    <dhcp><range start='10.11.12.100' end='10.11.12.254'/></dhcp>\
    </ip>\
    </network>";

/// A simulated platform with one pool and the default network.
pub fn memory_backend() -> MemoryBackend {
    MemoryBackend::new()
        .with_pool(POOL, POOL_UUID)
        .with_network(NETWORK_XML)
        .expect("network XML should parse")
}

/// A session over a fresh simulated platform, keeping a handle on the platform.
pub fn memory_session() -> (Arc<MemoryBackend>, Session) {
    let backend = Arc::new(memory_backend());
    let session = Session::new(backend.clone());
    (backend, session)
}

/// A session over a simulated platform whose default network is `xml`.
pub fn memory_session_with_network(xml: &str) -> (Arc<MemoryBackend>, Session) {
    let backend = Arc::new(
        MemoryBackend::new()
            .with_pool(POOL, POOL_UUID)
            .with_network(xml)
            .expect("network XML should parse"),
    );
    let session = Session::new(backend.clone());
    (backend, session)
}

/// Build a record mapping from `(type, name, values)` triples.
pub fn records(entries: &[(RecordType, &str, &[&str])]) -> DnsRecords {
    entries
        .iter()
        .map(|(record_type, name, values)| {
            (
                RecordKey::new(record_type.clone(), *name),
                set(values),
            )
        })
        .collect()
}

pub fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(ToString::to_string).collect()
}

/// Backend for a live libvirt daemon, or `None` to skip the test.
///
/// Set `LIBVIRT_AWS_TEST_URI` to run the live tests.
pub fn virsh_backend_or_skip() -> Option<VirshBackend> {
    match std::env::var("LIBVIRT_AWS_TEST_URI") {
        Ok(uri) => Some(VirshBackend::new(uri).with_transient_updates(true)),
        Err(_) => {
            eprintln!("Skipping integration test: LIBVIRT_AWS_TEST_URI is not set");
            None
        }
    }
}
