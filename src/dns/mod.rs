// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS records stored in a libvirt network's embedded DNS configuration.
//!
//! libvirt networks can only hold three kinds of DNS entries: `<host>`
//! (address to hostnames), `<txt>` and `<srv>`. This module turns those
//! entries into record sets keyed by `(type, name)` and back:
//!
//! - [`config`] - Typed view of the `<dns>` element
//! - [`extract`] - Stored entries to raw record sets
//! - [`view`] - Read view: synthetic type decoding, zone filters, SOA/NS synthesis
//! - [`fragments`] - XML fragments for the incremental network update call
//! - [`diff`] - Reconciliation of a desired mapping into ordered edit lists
//!
//! # Architecture
//!
//! A and AAAA records are stored as host entries (one per address, listing
//! every hostname that resolves to it). NS and CNAME have no native
//! representation and are stored as TXT entries whose name carries the
//! `@@ns.` or `@@cname.` prefix. A CNAME additionally gets a shadow host entry
//! under the addresses its target resolves to, which default reads hide.

pub mod config;
pub mod diff;
pub mod extract;
pub mod fragments;
pub mod records;
pub mod view;

pub use config::{DnsConfig, HostEntry, SrvEntry, TxtEntry};
pub use diff::{compute_dns_diff, normalize_desired, resolve_alias, DnsDiff};
pub use extract::{extract_records, StoredEntries};
pub use fragments::{Fragment, NetworkSection};
pub use records::{DnsRecords, RecordKey, RecordSet, RecordType};
pub use view::{read_records, RecordQuery};

/// Normalize a hostname to fully-qualified form with a trailing dot.
///
/// ```rust
/// use libvirt_aws::dns::fqdn;
///
/// assert_eq!(fqdn("www.internal"), "www.internal.");
/// assert_eq!(fqdn("www.internal."), "www.internal.");
/// ```
#[must_use]
pub fn fqdn(hostname: &str) -> String {
    if hostname.ends_with('.') {
        hostname.to_string()
    } else {
        format!("{hostname}.")
    }
}

/// Canonical form of a record name: lowercase and fully qualified.
///
/// Record keys, alias targets and delegation targets are always kept in this
/// form, matching the case-insensitive zone checks of [`in_zone`].
///
/// ```rust
/// use libvirt_aws::dns::canonical_name;
///
/// assert_eq!(canonical_name("WWW.Internal"), "www.internal.");
/// ```
#[must_use]
pub fn canonical_name(name: &str) -> String {
    fqdn(&name.to_ascii_lowercase())
}

/// Whether `hostname` equals `zone` or is a dot-suffix match of it.
///
/// Both sides are normalized with [`fqdn`] and compared case-insensitively.
///
/// ```rust
/// use libvirt_aws::dns::in_zone;
///
/// assert!(in_zone("a.sub.internal.", "sub.internal."));
/// assert!(in_zone("sub.internal", "sub.internal."));
/// assert!(!in_zone("asub.internal.", "sub.internal."));
/// ```
#[must_use]
pub fn in_zone(hostname: &str, zone: &str) -> bool {
    let hostname = fqdn(hostname).to_ascii_lowercase();
    let zone = fqdn(zone).to_ascii_lowercase();

    if zone == "." {
        return true;
    }

    hostname == zone || hostname.ends_with(&format!(".{zone}"))
}
