// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS reconciliation: desired record sets to ordered network update edits.
//!
//! The backend stores A/AAAA data as address-keyed host entries that can only
//! be replaced whole, and has no alias or delegation type at all. Reconciling
//! a name-keyed desired mapping therefore goes through three steps:
//!
//! 1. Every changed record set is turned into per-address hostname removals and
//!    additions (A, AAAA and the shadow entries of CNAMEs) or into TXT/SRV
//!    element edits (TXT, SRV and the synthetic NS/CNAME entries).
//! 2. Each touched address gets its final hostname list computed once,
//!    removals first, then additions.
//! 3. Touched addresses whose hostname list actually changed are rewritten:
//!    the old host entry is deleted and the new one added.
//!
//! Nothing is emitted unless the whole desired mapping is valid.

use super::extract::StoredEntries;
use super::fragments::{srv_entry, Fragment};
use super::view::{read_records, synthetic_name, RecordQuery};
use super::{canonical_name, DnsRecords, RecordKey, RecordType};
use crate::constants::{MAX_ALIAS_CHAIN_DEPTH, SYNTHETIC_CNAME_PREFIX, SYNTHETIC_NS_PREFIX};
use crate::errors::{RecordError, Result};
use hickory_proto::rr::Name;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::{debug, warn};

/// Ordered edit lists produced by [`compute_dns_diff`].
///
/// Apply every fragment of `deleted` in order, then every fragment of `added`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsDiff {
    /// Fragments to add, non-host edits first then host entries
    pub added: Vec<Fragment>,
    /// Fragments to delete, non-host edits first then host entries
    pub deleted: Vec<Fragment>,
}

impl DnsDiff {
    /// True when applying the diff would change nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty()
    }

    /// Total number of fragments
    #[must_use]
    pub fn len(&self) -> usize {
        self.added.len() + self.deleted.len()
    }
}

/// Source of records consulted while resolving aliases.
pub trait RecordLookup {
    /// Value set of `(record_type, name)`, if any
    fn lookup(&self, record_type: &RecordType, name: &str) -> Option<&BTreeSet<String>>;
}

impl RecordLookup for DnsRecords {
    fn lookup(&self, record_type: &RecordType, name: &str) -> Option<&BTreeSet<String>> {
        self.get(record_type, name).filter(|values| !values.is_empty())
    }
}

/// Desired records layered over current ones.
///
/// A name known to the upper layer (any A, AAAA or CNAME) is answered from it
/// alone, so a stale shadow entry in the lower layer never leaks through.
struct Layered<'a> {
    upper: &'a DnsRecords,
    lower: &'a DnsRecords,
}

impl RecordLookup for Layered<'_> {
    fn lookup(&self, record_type: &RecordType, name: &str) -> Option<&BTreeSet<String>> {
        let known = [RecordType::A, RecordType::Aaaa, RecordType::Cname]
            .iter()
            .any(|t| self.upper.lookup(t, name).is_some());
        if known {
            self.upper.lookup(record_type, name)
        } else {
            self.lower.lookup(record_type, name)
        }
    }
}

/// Resolve an alias target to the addresses it finally points at.
///
/// A and AAAA records at the name are returned directly (as a union). A
/// single CNAME is followed. Anything else is a dangling alias and yields an
/// empty set.
///
/// # Errors
///
/// - [`RecordError::CyclicAlias`] if the chain revisits a name
/// - [`RecordError::AliasChainTooDeep`] past `MAX_ALIAS_CHAIN_DEPTH` hops
/// - [`RecordError::MultiValuedCname`] if a link in the chain has several targets
pub fn resolve_alias(
    target: &str,
    knowledge: &dyn RecordLookup,
) -> Result<BTreeSet<String>, RecordError> {
    let start = canonical_name(target);
    let mut chain = vec![start.clone()];
    let mut name = start.clone();

    loop {
        let addresses: BTreeSet<String> = [RecordType::A, RecordType::Aaaa]
            .iter()
            .filter_map(|t| knowledge.lookup(t, &name))
            .flatten()
            .cloned()
            .collect();
        if !addresses.is_empty() {
            return Ok(addresses);
        }

        let Some(targets) = knowledge.lookup(&RecordType::Cname, &name) else {
            debug!(alias = %start, dangling = %name, "Alias resolves to no address");
            return Ok(BTreeSet::new());
        };
        if targets.len() > 1 {
            return Err(RecordError::MultiValuedCname {
                name,
                count: targets.len(),
            });
        }
        let Some(next) = targets.iter().next().map(|t| canonical_name(t)) else {
            return Ok(BTreeSet::new());
        };

        if chain.contains(&next) {
            chain.push(next);
            return Err(RecordError::CyclicAlias {
                name: start,
                chain: chain.join(" -> "),
            });
        }
        if chain.len() > MAX_ALIAS_CHAIN_DEPTH {
            return Err(RecordError::AliasChainTooDeep {
                name: start,
                depth: MAX_ALIAS_CHAIN_DEPTH,
            });
        }
        chain.push(next.clone());
        name = next;
    }
}

/// Validate and normalize a desired record mapping.
///
/// Names become lowercase and fully qualified (keys differing only by case or
/// the trailing dot are merged), empty value sets are dropped, addresses are canonicalized, CNAME
/// and NS targets are fully qualified and SRV values are re-spaced.
///
/// # Errors
///
/// Returns the first [`RecordError`] found; the mapping is rejected as a whole.
pub fn normalize_desired(desired: &DnsRecords) -> Result<DnsRecords, RecordError> {
    let mut merged = DnsRecords::new();
    for (key, values) in desired.iter() {
        if !key.record_type.is_supported() {
            return Err(RecordError::UnsupportedType {
                record_type: key.record_type.to_string(),
                name: key.name.clone(),
            });
        }
        let name = validate_name(&key.name)?;
        if values.is_empty() {
            continue;
        }
        merged
            .values_mut(RecordKey::new(key.record_type.clone(), name))
            .extend(values.iter().cloned());
    }

    let mut normalized = DnsRecords::new();
    for (key, values) in merged.iter() {
        let values = normalize_values(key, values)?;
        normalized.set(key.clone(), values);
    }

    for key in normalized.keys() {
        if key.record_type != RecordType::Cname {
            continue;
        }
        if let Some(other) = normalized
            .keys()
            .find(|other| other.name == key.name && other.record_type != RecordType::Cname)
        {
            return Err(RecordError::CnameConflict {
                name: key.name.clone(),
                other_type: other.record_type.to_string(),
            });
        }
    }

    Ok(normalized)
}

fn validate_name(name: &str) -> Result<String, RecordError> {
    let invalid = |reason: String| RecordError::InvalidName {
        name: name.to_string(),
        reason,
    };
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(invalid("name is empty".to_string()));
    }
    if trimmed.starts_with(SYNTHETIC_NS_PREFIX) || trimmed.starts_with(SYNTHETIC_CNAME_PREFIX) {
        return Err(invalid("name uses a reserved prefix".to_string()));
    }
    Name::from_ascii(trimmed).map_err(|e| invalid(e.to_string()))?;
    Ok(canonical_name(trimmed))
}

fn normalize_values(
    key: &RecordKey,
    values: &BTreeSet<String>,
) -> Result<BTreeSet<String>, RecordError> {
    let name = &key.name;
    match key.record_type {
        RecordType::A => values
            .iter()
            .map(|value| {
                value
                    .trim()
                    .parse::<Ipv4Addr>()
                    .map(|addr| addr.to_string())
                    .map_err(|e| invalid_address(name, value, &e.to_string()))
            })
            .collect(),
        RecordType::Aaaa => values
            .iter()
            .map(|value| {
                value
                    .trim()
                    .parse::<Ipv6Addr>()
                    .map(|addr| addr.to_string())
                    .map_err(|e| invalid_address(name, value, &e.to_string()))
            })
            .collect(),
        RecordType::Cname => {
            if values.len() != 1 {
                return Err(RecordError::MultiValuedCname {
                    name: name.clone(),
                    count: values.len(),
                });
            }
            values.iter().map(|target| validate_name(target)).collect()
        }
        RecordType::Ns => values.iter().map(|target| validate_name(target)).collect(),
        RecordType::Srv => values
            .iter()
            .map(|value| {
                let entry = srv_entry(name, value)?;
                Ok([entry.priority, entry.weight, entry.port, entry.target]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" "))
            })
            .collect(),
        RecordType::Txt => Ok(values.clone()),
        RecordType::Soa | RecordType::Other(_) => Err(RecordError::UnsupportedType {
            record_type: key.record_type.to_string(),
            name: name.clone(),
        }),
    }
}

fn invalid_address(name: &str, value: &str, reason: &str) -> RecordError {
    RecordError::InvalidAddress {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Compute the edits that turn `stored` into `desired`.
///
/// `stored` is the raw record mapping extracted from the network (synthetic
/// TXT entries not yet decoded) and `entries` the TXT and SRV entries it was
/// extracted from. Deletes reuse those entries verbatim; a value with no
/// stored entry is deleted by its normalized form. `desired` is in the default
/// read view shape: NS and CNAME as their own types, no shadow A/AAAA entries
/// for CNAMEs.
///
/// # Errors
///
/// Any invalid or unsupported desired record aborts the computation; no
/// partial diff is returned.
pub fn compute_dns_diff(
    stored: &DnsRecords,
    entries: &StoredEntries,
    desired: &DnsRecords,
) -> Result<DnsDiff> {
    let desired = normalize_desired(desired)?;
    let current = read_records(stored, &RecordQuery::new());
    let current_all = read_records(stored, &RecordQuery::new().with_eager_cname());

    let mut planner = Planner::new(stored, entries, &current_all, &desired);
    let empty = BTreeSet::new();

    let pending = desired
        .keys()
        .chain(current.keys().filter(|key| !desired.contains_key(key)));
    for key in pending {
        let prev = current.get_key(key).unwrap_or(&empty);
        let next = desired.get_key(key).unwrap_or(&empty);
        if prev == next {
            continue;
        }
        debug!(record = %key, removed = prev.difference(next).count(), added = next.difference(prev).count(), "Record set changed");
        planner.change(key, prev, next)?;
    }

    planner.finish()
}

/// Working state of one diff computation.
struct Planner<'a> {
    stored: &'a DnsRecords,
    entries: &'a StoredEntries,
    current_all: &'a DnsRecords,
    desired: &'a DnsRecords,
    /// Hostnames per address as currently stored
    host_map: BTreeMap<IpAddr, BTreeSet<String>>,
    removals: BTreeMap<IpAddr, BTreeSet<String>>,
    additions: BTreeMap<IpAddr, BTreeSet<String>>,
    added: Vec<Fragment>,
    deleted: Vec<Fragment>,
}

impl<'a> Planner<'a> {
    fn new(
        stored: &'a DnsRecords,
        entries: &'a StoredEntries,
        current_all: &'a DnsRecords,
        desired: &'a DnsRecords,
    ) -> Self {
        let mut host_map: BTreeMap<IpAddr, BTreeSet<String>> = BTreeMap::new();
        for (key, values) in current_all.iter() {
            if !key.record_type.is_address() {
                continue;
            }
            for value in values {
                match value.parse::<IpAddr>() {
                    Ok(addr) => {
                        host_map.entry(addr).or_default().insert(key.name.clone());
                    }
                    Err(e) => warn!(record = %key, value = %value, error = %e, "Skipping stored host entry with an invalid address"),
                }
            }
        }

        Self {
            stored,
            entries,
            current_all,
            desired,
            host_map,
            removals: BTreeMap::new(),
            additions: BTreeMap::new(),
            added: Vec::new(),
            deleted: Vec::new(),
        }
    }

    fn change(
        &mut self,
        key: &RecordKey,
        prev: &BTreeSet<String>,
        next: &BTreeSet<String>,
    ) -> Result<()> {
        let name = key.name.as_str();
        match &key.record_type {
            RecordType::A | RecordType::Aaaa => {
                for value in prev.difference(next) {
                    self.unlink(name, value)?;
                }
                for value in next.difference(prev) {
                    self.link(name, value)?;
                }
            }
            RecordType::Cname => {
                let removed: Vec<&String> = prev.difference(next).collect();
                if !removed.is_empty() {
                    let mut addresses = BTreeSet::new();
                    for target in removed {
                        addresses.extend(resolve_alias(target, self.current_all)?);
                    }
                    for shadow in [RecordType::A, RecordType::Aaaa] {
                        if let Some(values) = self.current_all.lookup(&shadow, name) {
                            addresses.extend(values.iter().cloned());
                        }
                    }
                    for address in &addresses {
                        self.unlink(name, address)?;
                    }
                }

                let layered = Layered {
                    upper: self.desired,
                    lower: self.current_all,
                };
                let mut addresses = BTreeSet::new();
                for target in next.difference(prev) {
                    addresses.extend(resolve_alias(target, &layered)?);
                }
                for address in &addresses {
                    self.link(name, address)?;
                }

                self.replace_synthetic(key, next)?;
            }
            RecordType::Ns => self.replace_synthetic(key, next)?,
            RecordType::Txt => {
                for value in prev.difference(next) {
                    self.delete_txt(name, value)?;
                }
                for value in next.difference(prev) {
                    self.added.push(Fragment::txt(name, value)?);
                }
            }
            RecordType::Srv => {
                for value in prev.difference(next) {
                    self.delete_srv(name, value)?;
                }
                for value in next.difference(prev) {
                    self.added.push(Fragment::srv(name, value)?);
                }
            }
            RecordType::Soa | RecordType::Other(_) => {
                return Err(RecordError::UnsupportedType {
                    record_type: key.record_type.to_string(),
                    name: key.name.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Delete the stored synthetic entry of `key` and add one for `next`.
    ///
    /// Every stored entry behind the record is deleted, whatever the spelling
    /// of its name, so at most one synthetic entry remains.
    fn replace_synthetic(&mut self, key: &RecordKey, next: &BTreeSet<String>) -> Result<()> {
        let Some(stored_name) = synthetic_name(&key.record_type, &key.name) else {
            return Err(RecordError::UnsupportedType {
                record_type: key.record_type.to_string(),
                name: key.name.clone(),
            }
            .into());
        };

        let stored = self.stored;
        if let Some(values) = stored.get(&RecordType::Txt, &stored_name) {
            for value in values {
                self.delete_txt(&stored_name, value)?;
            }
        }
        if !next.is_empty() {
            self.added
                .push(Fragment::synthetic(&key.record_type, &key.name, next)?);
        }
        Ok(())
    }

    fn delete_txt(&mut self, name: &str, value: &str) -> Result<()> {
        let entries = self.entries.txt(name, value);
        if entries.is_empty() {
            self.deleted.push(Fragment::txt(name, value)?);
        }
        for entry in entries {
            self.deleted.push(Fragment::txt_entry(entry)?);
        }
        Ok(())
    }

    fn delete_srv(&mut self, name: &str, value: &str) -> Result<()> {
        let entries = self.entries.srv(name, value);
        if entries.is_empty() {
            self.deleted.push(Fragment::srv(name, value)?);
        }
        for entry in entries {
            self.deleted.push(Fragment::srv_entry(entry)?);
        }
        Ok(())
    }

    fn link(&mut self, name: &str, address: &str) -> Result<()> {
        let addr = parse_address(name, address)?;
        self.additions
            .entry(addr)
            .or_default()
            .insert(name.to_string());
        Ok(())
    }

    fn unlink(&mut self, name: &str, address: &str) -> Result<()> {
        let addr = parse_address(name, address)?;
        self.removals
            .entry(addr)
            .or_default()
            .insert(name.to_string());
        Ok(())
    }

    fn finish(mut self) -> Result<DnsDiff> {
        let modified: BTreeSet<IpAddr> = self
            .removals
            .keys()
            .chain(self.additions.keys())
            .copied()
            .collect();

        let mut host_deleted = Vec::new();
        let mut host_added = Vec::new();
        for addr in modified {
            let original = self.host_map.remove(&addr);
            let mut hostnames = original.clone().unwrap_or_default();
            if let Some(removed) = self.removals.get(&addr) {
                hostnames.retain(|hostname| !removed.contains(hostname));
            }
            if let Some(added) = self.additions.get(&addr) {
                hostnames.extend(added.iter().cloned());
            }

            if original.as_ref() == Some(&hostnames) || (original.is_none() && hostnames.is_empty())
            {
                continue;
            }
            debug!(address = %addr, hostnames = hostnames.len(), "Host entry rewritten");
            if original.is_some() {
                host_deleted.push(Fragment::host(addr, &[])?);
            }
            if !hostnames.is_empty() {
                host_added.push(Fragment::host(addr, &hostnames)?);
            }
        }

        let mut diff = DnsDiff {
            added: self.added,
            deleted: self.deleted,
        };
        diff.deleted.extend(host_deleted);
        diff.added.extend(host_added);
        Ok(diff)
    }
}

fn parse_address(name: &str, value: &str) -> Result<IpAddr, RecordError> {
    value
        .parse::<IpAddr>()
        .map_err(|e| invalid_address(name, value, &e.to_string()))
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod diff_tests;
