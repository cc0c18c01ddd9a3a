// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! XML fragments for incremental network DNS updates.
//!
//! Each fragment is one child element of `<dns>` paired with the network
//! section it belongs to. A fragment is applied with an add or delete
//! operation by the backend.

use super::config::{HostEntry, SrvEntry, TxtEntry};
use super::view::{encode_targets, synthetic_name};
use super::RecordType;
use crate::errors::{RecordError, Result, XmlError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;

/// Section of a network definition targeted by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkSection {
    DnsHost,
    DnsTxt,
    DnsSrv,
}

impl NetworkSection {
    /// Section name as understood by `virsh net-update`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DnsHost => "dns-host",
            Self::DnsTxt => "dns-txt",
            Self::DnsSrv => "dns-srv",
        }
    }
}

impl fmt::Display for NetworkSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One edit unit of a DNS diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Target section
    pub section: NetworkSection,
    /// Serialized element
    pub xml: String,
}

impl Fragment {
    /// Host entry listing every hostname of an address.
    ///
    /// With no hostnames the element is empty: `<host ip="192.0.2.1"/>`.
    pub fn host<'a>(ip: IpAddr, hostnames: impl IntoIterator<Item = &'a String>) -> Result<Self> {
        let entry = HostEntry {
            ip,
            hostnames: hostnames.into_iter().cloned().collect(),
        };
        Ok(Self {
            section: NetworkSection::DnsHost,
            xml: to_xml("host", &entry)?,
        })
    }

    /// `<txt name=".." value=".."/>`
    pub fn txt(name: &str, value: &str) -> Result<Self> {
        Self::txt_entry(&TxtEntry {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    /// TXT entry exactly as stored.
    pub fn txt_entry(entry: &TxtEntry) -> Result<Self> {
        Ok(Self {
            section: NetworkSection::DnsTxt,
            xml: to_xml("txt", entry)?,
        })
    }

    /// Synthetic TXT entry carrying a CNAME or NS record set.
    pub fn synthetic(
        record_type: &RecordType,
        name: &str,
        targets: &BTreeSet<String>,
    ) -> Result<Self> {
        let stored_name = synthetic_name(record_type, name).ok_or_else(|| {
            RecordError::UnsupportedType {
                record_type: record_type.to_string(),
                name: name.to_string(),
            }
        })?;
        Self::txt(&stored_name, &encode_targets(targets))
    }

    /// SRV entry from a record name `_service._protocol[.domain]` and a value
    /// `"priority weight port target"`.
    pub fn srv(name: &str, value: &str) -> Result<Self> {
        Self::srv_entry(&srv_entry(name, value)?)
    }

    /// SRV entry exactly as stored, absent attributes included.
    pub fn srv_entry(entry: &SrvEntry) -> Result<Self> {
        Ok(Self {
            section: NetworkSection::DnsSrv,
            xml: to_xml("srv", entry)?,
        })
    }
}

/// Split an SRV record name and value into a libvirt `<srv>` entry.
pub fn srv_entry(name: &str, value: &str) -> Result<SrvEntry, RecordError> {
    let invalid = |reason: &str| RecordError::InvalidSrvRecord {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let mut labels = name.splitn(3, '.');
    let service = labels
        .next()
        .and_then(|label| label.strip_prefix('_'))
        .filter(|label| !label.is_empty())
        .ok_or_else(|| invalid("name must start with _service"))?;
    let protocol = labels
        .next()
        .and_then(|label| label.strip_prefix('_'))
        .filter(|label| !label.is_empty())
        .ok_or_else(|| invalid("name must continue with _protocol"))?;
    let domain = labels.next().filter(|domain| !domain.is_empty());

    let fields: Vec<&str> = value.split_whitespace().collect();
    let [priority, weight, port, target] = fields.as_slice() else {
        return Err(invalid(
            "value must be \"priority weight port target\"",
        ));
    };
    for (field, label) in [(priority, "priority"), (weight, "weight"), (port, "port")] {
        if field.parse::<u16>().is_err() {
            return Err(invalid(&format!("{label} '{field}' is not a 16-bit integer")));
        }
    }

    Ok(SrvEntry {
        service: service.to_string(),
        protocol: protocol.to_string(),
        domain: domain.map(ToString::to_string),
        priority: Some((*priority).to_string()),
        weight: Some((*weight).to_string()),
        port: Some((*port).to_string()),
        target: Some((*target).to_string()),
    })
}

fn to_xml<T: Serialize>(root: &str, value: &T) -> Result<String> {
    quick_xml::se::to_string_with_root(root, value).map_err(|e| {
        XmlError::Write {
            reason: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
#[path = "fragments_tests.rs"]
mod fragments_tests;
