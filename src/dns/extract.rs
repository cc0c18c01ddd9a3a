// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Extraction of raw record sets from a network's DNS configuration.
//!
//! The result is the *stored* view: synthetic `@@ns.`/`@@cname.` entries are
//! still TXT records here. Decoding happens in [`super::view`].
//!
//! Names are canonicalized on the way in, so one record can come from several
//! stored entries (`example` and `example.`). [`StoredEntries`] keeps the raw
//! TXT and SRV entries behind each record value, since the platform only
//! deletes an entry whose attributes match exactly.

use super::config::{DnsConfig, SrvEntry, TxtEntry};
use super::{canonical_name, DnsRecords, RecordType};
use crate::constants::{
    DEFAULT_SRV_PORT, DEFAULT_SRV_PRIORITY, DEFAULT_SRV_TARGET, DEFAULT_SRV_WEIGHT,
};
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Raw TXT and SRV entries indexed by the `(name, value)` they extract to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredEntries {
    txt: BTreeMap<(String, String), Vec<TxtEntry>>,
    srv: BTreeMap<(String, String), Vec<SrvEntry>>,
}

impl StoredEntries {
    #[must_use]
    pub fn from_config(dns: &DnsConfig) -> Self {
        let mut entries = Self::default();
        for txt in &dns.txt {
            entries
                .txt
                .entry((canonical_name(&txt.name), txt.value.clone()))
                .or_default()
                .push(txt.clone());
        }
        for srv in &dns.srv {
            entries
                .srv
                .entry((srv_name(srv), srv_value(srv)))
                .or_default()
                .push(srv.clone());
        }
        entries
    }

    /// Stored TXT entries behind `(TXT, name) -> value`
    #[must_use]
    pub fn txt(&self, name: &str, value: &str) -> &[TxtEntry] {
        self.txt
            .get(&(name.to_string(), value.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Stored SRV entries behind `(SRV, name) -> value`
    #[must_use]
    pub fn srv(&self, name: &str, value: &str) -> &[SrvEntry] {
        self.srv
            .get(&(name.to_string(), value.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Build the stored record mapping of a DNS configuration.
///
/// - `txt` entries become `(TXT, name) -> {value}`
/// - `srv` entries become `(SRV, _service._protocol[.domain]) -> {"priority weight port target"}`
/// - `host` entries become one `(A|AAAA, hostname) -> {address}` per hostname
///
/// All names are normalized with [`canonical_name`].
#[must_use]
pub fn extract_records(dns: &DnsConfig) -> DnsRecords {
    let mut records = DnsRecords::new();

    for txt in &dns.txt {
        records.insert(RecordType::Txt, canonical_name(&txt.name), txt.value.clone());
    }

    for srv in &dns.srv {
        records.insert(RecordType::Srv, srv_name(srv), srv_value(srv));
    }

    for host in &dns.hosts {
        let record_type = match host.ip {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        };
        let address = host.ip.to_string();
        for hostname in &host.hostnames {
            records.insert(record_type.clone(), canonical_name(hostname), address.clone());
        }
    }

    records
}

fn srv_name(srv: &SrvEntry) -> String {
    let mut name = format!("_{}._{}", srv.service, srv.protocol);
    if let Some(domain) = srv.domain.as_deref().filter(|d| !d.is_empty()) {
        name.push('.');
        name.push_str(domain);
    }
    canonical_name(&name)
}

fn srv_value(srv: &SrvEntry) -> String {
    [
        srv.priority.as_deref().unwrap_or(DEFAULT_SRV_PRIORITY),
        srv.weight.as_deref().unwrap_or(DEFAULT_SRV_WEIGHT),
        srv.port.as_deref().unwrap_or(DEFAULT_SRV_PORT),
        srv.target.as_deref().unwrap_or(DEFAULT_SRV_TARGET),
    ]
    .join(" ")
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod extract_tests;
