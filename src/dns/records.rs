// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record types and the set-valued record mapping.
//!
//! A [`DnsRecords`] maps `(record type, fully-qualified name)` to a set of
//! value strings. Values are deduplicated and unordered: two mappings are equal
//! when they hold the same keys with the same value sets, regardless of the
//! order in which values were inserted.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// DNS resource record type.
///
/// Types the network DNS configuration can hold are named variants; `SOA` is
/// only ever synthesized at read time. Anything else is kept as [`RecordType::Other`]
/// so that it can be rejected with a precise error instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Txt,
    Srv,
    Ns,
    Soa,
    Other(String),
}

impl RecordType {
    /// Canonical upper-case mnemonic
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Txt => "TXT",
            Self::Srv => "SRV",
            Self::Ns => "NS",
            Self::Soa => "SOA",
            Self::Other(other) => other,
        }
    }

    /// A and AAAA records live in address-keyed host entries.
    #[must_use]
    pub fn is_address(&self) -> bool {
        matches!(self, Self::A | Self::Aaaa)
    }

    /// Whether the reconciliation engine can store this type.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            Self::A | Self::Aaaa | Self::Cname | Self::Txt | Self::Srv | Self::Ns
        )
    }
}

impl From<&str> for RecordType {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Self::A,
            "AAAA" => Self::Aaaa,
            "CNAME" => Self::Cname,
            "TXT" => Self::Txt,
            "SRV" => Self::Srv,
            "NS" => Self::Ns,
            "SOA" => Self::Soa,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for RecordType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite key of a record set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    /// Record type
    pub record_type: RecordType,
    /// Fully-qualified name with trailing dot
    pub name: String,
}

impl RecordKey {
    /// Create a key from a type and a name
    pub fn new(record_type: RecordType, name: impl Into<String>) -> Self {
        Self {
            record_type,
            name: name.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.record_type, self.name)
    }
}

/// One record set in its serialized form.
///
/// This is the shape used by the CLI input files and the HTTP API:
///
/// ```json
/// {"type": "A", "name": "www.internal.", "values": ["192.0.2.1"]}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Record name
    pub name: String,
    /// Record values (duplicates are dropped)
    #[serde(default)]
    pub values: BTreeSet<String>,
}

/// Set-valued mapping from `(type, name)` to record values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<RecordSet>", into = "Vec<RecordSet>")]
pub struct DnsRecords {
    records: BTreeMap<RecordKey, BTreeSet<String>>,
}

impl DnsRecords {
    /// Create an empty mapping
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value set for a key, created empty if missing (upsert-or-create).
    pub fn values_mut(&mut self, key: RecordKey) -> &mut BTreeSet<String> {
        self.records.entry(key).or_default()
    }

    /// Add one value to a record set, creating the set if needed.
    ///
    /// Returns `false` if the value was already present.
    pub fn insert(
        &mut self,
        record_type: RecordType,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> bool {
        self.values_mut(RecordKey::new(record_type, name))
            .insert(value.into())
    }

    /// Replace a record set wholesale.
    pub fn set(&mut self, key: RecordKey, values: BTreeSet<String>) -> Option<BTreeSet<String>> {
        self.records.insert(key, values)
    }

    /// Value set for a key
    #[must_use]
    pub fn get_key(&self, key: &RecordKey) -> Option<&BTreeSet<String>> {
        self.records.get(key)
    }

    /// Value set for a type and name
    #[must_use]
    pub fn get(&self, record_type: &RecordType, name: &str) -> Option<&BTreeSet<String>> {
        self.records
            .get(&RecordKey::new(record_type.clone(), name))
    }

    #[must_use]
    pub fn contains_key(&self, key: &RecordKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn remove(&mut self, key: &RecordKey) -> Option<BTreeSet<String>> {
        self.records.remove(key)
    }

    /// Keep only the record sets for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&RecordKey, &BTreeSet<String>) -> bool) {
        self.records.retain(|key, values| keep(key, values));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate record sets in key order (type, then name).
    pub fn iter(&self) -> impl Iterator<Item = (&RecordKey, &BTreeSet<String>)> {
        self.records.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RecordKey> {
        self.records.keys()
    }

    /// Serialized form, one entry per key.
    #[must_use]
    pub fn to_record_sets(&self) -> Vec<RecordSet> {
        self.records
            .iter()
            .map(|(key, values)| RecordSet {
                record_type: key.record_type.clone(),
                name: key.name.clone(),
                values: values.clone(),
            })
            .collect()
    }
}

impl FromIterator<RecordSet> for DnsRecords {
    /// Record sets sharing a key are merged.
    fn from_iter<I: IntoIterator<Item = RecordSet>>(iter: I) -> Self {
        let mut records = Self::new();
        for set in iter {
            records
                .values_mut(RecordKey::new(set.record_type, set.name))
                .extend(set.values);
        }
        records
    }
}

impl FromIterator<(RecordKey, BTreeSet<String>)> for DnsRecords {
    fn from_iter<I: IntoIterator<Item = (RecordKey, BTreeSet<String>)>>(iter: I) -> Self {
        let mut records = Self::new();
        for (key, values) in iter {
            records.values_mut(key).extend(values);
        }
        records
    }
}

impl IntoIterator for DnsRecords {
    type Item = (RecordKey, BTreeSet<String>);
    type IntoIter = std::collections::btree_map::IntoIter<RecordKey, BTreeSet<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl From<Vec<RecordSet>> for DnsRecords {
    fn from(value: Vec<RecordSet>) -> Self {
        value.into_iter().collect()
    }
}

impl From<DnsRecords> for Vec<RecordSet> {
    fn from(value: DnsRecords) -> Self {
        value.to_record_sets()
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod records_tests;
