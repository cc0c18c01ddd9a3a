// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Read view over stored records.
//!
//! Stored records carry NS and CNAME data as TXT entries with a reserved name
//! prefix. [`read_records`] decodes them back into typed record sets, applies
//! zone filters and hides the shadow A/AAAA entries that CNAMEs leave behind.
//!
//! SOA/NS synthesis needs the network's DNS domain and is done by the network
//! resource on top of this view.

use super::{canonical_name, in_zone, DnsRecords, RecordKey, RecordType};
use crate::constants::{SYNTHETIC_CNAME_PREFIX, SYNTHETIC_NS_PREFIX, SYNTHETIC_VALUE_SEPARATOR};
use std::collections::{BTreeSet, HashSet};

/// Options of a record read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    /// Only return records inside this zone
    pub zone: Option<String>,
    /// Drop records inside any of these zones
    pub exclude_zones: Vec<String>,
    /// Synthesize SOA and NS at the zone apex
    pub include_soa_ns: bool,
    /// Keep A/AAAA records that share a name with a CNAME
    pub include_eager_cname: bool,
}

impl RecordQuery {
    /// Default view: every record, CNAME shadows hidden, no SOA/NS synthesis.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(canonical_name(&zone.into()));
        self
    }

    #[must_use]
    pub fn exclude_zone(mut self, zone: impl Into<String>) -> Self {
        self.exclude_zones.push(canonical_name(&zone.into()));
        self
    }

    #[must_use]
    pub fn with_soa_ns(mut self) -> Self {
        self.include_soa_ns = true;
        self
    }

    #[must_use]
    pub fn with_eager_cname(mut self) -> Self {
        self.include_eager_cname = true;
        self
    }

    /// Whether a record name passes the zone filters.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        if let Some(zone) = &self.zone {
            if !in_zone(name, zone) {
                return false;
            }
        }
        !self.exclude_zones.iter().any(|zone| in_zone(name, zone))
    }
}

/// Decode stored records into the typed view described by `query`.
///
/// - `(TXT, "@@ns.<name>")` and `(TXT, "@@cname.<name>")` become NS and CNAME
///   record sets whose values are the decoded target lists.
/// - Records outside `query.zone` or inside any excluded zone are dropped.
/// - Unless `include_eager_cname` is set, A and AAAA records whose name also
///   carries a CNAME are dropped.
#[must_use]
pub fn read_records(stored: &DnsRecords, query: &RecordQuery) -> DnsRecords {
    let mut records = DnsRecords::new();

    for (key, values) in stored.iter() {
        let (record_type, name, values) = decode(key, values);
        if values.is_empty() || !query.matches(&name) {
            continue;
        }
        records
            .values_mut(RecordKey::new(record_type, name))
            .extend(values);
    }

    if !query.include_eager_cname {
        let aliased: HashSet<String> = records
            .keys()
            .filter(|key| key.record_type == RecordType::Cname)
            .map(|key| key.name.clone())
            .collect();
        records.retain(|key, _| !(key.record_type.is_address() && aliased.contains(&key.name)));
    }

    records
}

/// Encode targets as the value of a synthetic TXT entry.
///
/// Targets are canonicalized, sorted and quoted, then joined with `,`:
/// `"a.internal.","b.internal."`.
#[must_use]
pub fn encode_targets<'a>(targets: impl IntoIterator<Item = &'a String>) -> String {
    let sorted: BTreeSet<String> = targets
        .into_iter()
        .map(|target| canonical_name(target))
        .collect();
    sorted
        .iter()
        .map(|target| format!("\"{target}\""))
        .collect::<Vec<_>>()
        .join(&SYNTHETIC_VALUE_SEPARATOR.to_string())
}

/// Decode the value of a synthetic TXT entry into its targets.
#[must_use]
pub fn decode_targets(value: &str) -> BTreeSet<String> {
    value
        .split(SYNTHETIC_VALUE_SEPARATOR)
        .map(|part| part.trim().trim_matches('"').trim())
        .filter(|part| !part.is_empty())
        .map(canonical_name)
        .collect()
}

/// Stored TXT name carrying a synthetic record of `record_type` at `name`.
///
/// Returns `None` for types that are stored natively.
#[must_use]
pub fn synthetic_name(record_type: &RecordType, name: &str) -> Option<String> {
    let prefix = match record_type {
        RecordType::Ns => SYNTHETIC_NS_PREFIX,
        RecordType::Cname => SYNTHETIC_CNAME_PREFIX,
        _ => return None,
    };
    Some(format!("{prefix}{}", canonical_name(name)))
}

fn decode(key: &RecordKey, values: &BTreeSet<String>) -> (RecordType, String, BTreeSet<String>) {
    if key.record_type == RecordType::Txt {
        for (prefix, record_type) in [
            (SYNTHETIC_NS_PREFIX, RecordType::Ns),
            (SYNTHETIC_CNAME_PREFIX, RecordType::Cname),
        ] {
            if let Some(name) = key.name.strip_prefix(prefix) {
                let targets = values.iter().flat_map(|value| decode_targets(value)).collect();
                return (record_type, canonical_name(name), targets);
            }
        }
    }
    (key.record_type.clone(), key.name.clone(), values.clone())
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod view_tests;
