// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Network view: identity, embedded DNS records and IPv4 addressing.
//!
//! ```xml
//! <network>
//!   <name>default</name>
//!   <uuid>9a05da11-e96b-47f3-8253-a3a482e445f5</uuid>
//!   <domain name='local-1.internal'/>
//!   <dns>...</dns>
//!   <ip address='10.11.12.1' netmask='255.255.255.0'>
//!     <dhcp>
//!       <range start='10.11.12.100' end='10.11.12.254'/>
//!     </dhcp>
//!   </ip>
//! </network>
//! ```

use super::{invalid, parse_xml, FromXml};
use crate::constants::{
    SOA_EXPIRE_SECS, SOA_GATEWAY_LABEL, SOA_NEGATIVE_TTL_SECS, SOA_REFRESH_SECS, SOA_RETRY_SECS,
    SOA_SERIAL,
};
use crate::dns::{
    canonical_name, compute_dns_diff, extract_records, read_records, DnsConfig, DnsDiff,
    DnsRecords, RecordKey, RecordQuery, RecordType, StoredEntries,
};
use crate::errors::{ConfigError, Result};
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::sync::OnceLock;

/// Raw shape of a network definition.
///
/// Kept crate-visible so the in-memory backend can edit and re-serialize it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct NetworkXml {
    pub name: String,
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<DomainNameXml>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsConfig>,
    #[serde(rename = "ip", default, skip_serializing_if = "Vec::is_empty")]
    pub ips: Vec<IpXml>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DomainNameXml {
    #[serde(rename = "@name")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct IpXml {
    #[serde(rename = "@family", default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(rename = "@address", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "@prefix", default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(rename = "@netmask", default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhcp: Option<DhcpXml>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DhcpXml {
    #[serde(rename = "range", default, skip_serializing_if = "Vec::is_empty")]
    pub ranges: Vec<RangeXml>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RangeXml {
    #[serde(rename = "@start")]
    pub start: String,
    #[serde(rename = "@end")]
    pub end: String,
}

impl IpXml {
    fn is_ipv4(&self) -> bool {
        self.family
            .as_deref()
            .map_or(true, |family| family.eq_ignore_ascii_case("ipv4"))
    }
}

impl NetworkXml {
    pub(crate) fn parse(xml: &str) -> Result<Self> {
        let raw: Self = parse_xml(Network::KIND, xml)?;
        if raw.name.trim().is_empty() {
            return Err(invalid(Network::KIND, "network has an empty name"));
        }
        if raw.uuid.trim().is_empty() {
            return Err(invalid(
                Network::KIND,
                format!("network '{}' has an empty uuid", raw.name),
            ));
        }
        Ok(raw)
    }

    pub(crate) fn to_xml(&self) -> Result<String> {
        quick_xml::se::to_string_with_root("network", self).map_err(|e| {
            crate::errors::XmlError::Write {
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// A network and the DNS records embedded in its definition.
///
/// The stored record mapping and its raw entries are extracted lazily, once
/// per view.
#[derive(Debug)]
pub struct Network {
    raw: NetworkXml,
    records: OnceLock<DnsRecords>,
    entries: OnceLock<StoredEntries>,
}

/// Serializable overview of a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub name: String,
    pub uuid: String,
    pub dns_domain: Option<String>,
    pub ip_network: Option<String>,
    pub static_ip_range: Option<(Ipv4Addr, Ipv4Addr)>,
    pub record_sets: usize,
}

impl FromXml for Network {
    const KIND: &'static str = "network";

    fn from_xml(xml: &str) -> Result<Self> {
        Ok(Self {
            raw: NetworkXml::parse(xml)?,
            records: OnceLock::new(),
            entries: OnceLock::new(),
        })
    }
}

impl Network {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.raw.name
    }

    #[must_use]
    pub fn uuid(&self) -> &str {
        self.raw.uuid.trim()
    }

    /// Fully-qualified DNS domain, if the network declares one.
    #[must_use]
    pub fn dns_domain(&self) -> Option<String> {
        self.raw
            .domain
            .as_ref()
            .map(|domain| domain.name.trim())
            .filter(|name| !name.is_empty())
            .map(canonical_name)
    }

    /// Fully-qualified DNS domain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoDnsDomain`] if the network has none.
    pub fn dns_domain_or_err(&self) -> Result<String> {
        self.dns_domain().ok_or_else(|| {
            ConfigError::NoDnsDomain {
                network: self.raw.name.clone(),
            }
            .into()
        })
    }

    /// Stored records: host, TXT and SRV entries with synthetic entries
    /// still encoded as TXT.
    pub fn records(&self) -> &DnsRecords {
        self.records.get_or_init(|| {
            self.raw
                .dns
                .as_ref()
                .map(extract_records)
                .unwrap_or_default()
        })
    }

    /// Raw TXT and SRV entries behind [`Network::records`].
    pub fn stored_entries(&self) -> &StoredEntries {
        self.entries.get_or_init(|| {
            self.raw
                .dns
                .as_ref()
                .map(StoredEntries::from_config)
                .unwrap_or_default()
        })
    }

    /// Read view of the network's records.
    ///
    /// With `include_soa_ns`, an SOA and an NS record are synthesized at the
    /// requested zone (the network's domain when no zone is given). A stored
    /// record of the same type and name takes precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoDnsDomain`] if SOA/NS synthesis is requested
    /// on a network without a DNS domain.
    pub fn get_dns_records(&self, query: &RecordQuery) -> Result<DnsRecords> {
        let mut records = read_records(self.records(), query);

        if query.include_soa_ns {
            let domain = self.dns_domain_or_err()?;
            let zone = query.zone.clone().unwrap_or_else(|| domain.clone());
            if query.matches(&zone) {
                let gateway = format!("{SOA_GATEWAY_LABEL}.{domain}");
                let soa = format!(
                    "{gateway} hostmaster.{gateway} {SOA_SERIAL} {SOA_REFRESH_SECS} {SOA_RETRY_SECS} {SOA_EXPIRE_SECS} {SOA_NEGATIVE_TTL_SECS}"
                );
                for (record_type, value) in [(RecordType::Soa, soa), (RecordType::Ns, gateway)] {
                    let key = RecordKey::new(record_type, zone.clone());
                    if !records.contains_key(&key) {
                        records.set(key, [value].into());
                    }
                }
            }
        }

        Ok(records)
    }

    /// Edits that turn the stored records into `desired`.
    ///
    /// # Errors
    ///
    /// See [`compute_dns_diff`].
    pub fn get_dns_diff(&self, desired: &DnsRecords) -> Result<DnsDiff> {
        compute_dns_diff(self.records(), self.stored_entries(), desired)
    }

    fn ipv4_block(&self) -> Result<&IpXml> {
        let Some(first) = self.raw.ips.first() else {
            return Err(ConfigError::NoIpBlock {
                network: self.raw.name.clone(),
            }
            .into());
        };
        self.raw.ips.iter().find(|ip| ip.is_ipv4()).ok_or_else(|| {
            ConfigError::NotIpv4 {
                network: self.raw.name.clone(),
                family: first.family.clone().unwrap_or_default(),
            }
            .into()
        })
    }

    /// The managed IPv4 block, truncated to its network address.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoIpBlock`] if no `<ip>` element exists
    /// - [`ConfigError::NotIpv4`] if none of them is IPv4
    /// - [`ConfigError::InvalidIpBlock`] if address, prefix or netmask are malformed
    pub fn ip_network(&self) -> Result<Ipv4Net> {
        let block = self.ipv4_block()?;
        let invalid_block = |reason: String| ConfigError::InvalidIpBlock {
            network: self.raw.name.clone(),
            reason,
        };

        let address: Ipv4Addr = block
            .address
            .as_deref()
            .ok_or_else(|| invalid_block("no address".to_string()))?
            .parse()
            .map_err(|e| invalid_block(format!("address: {e}")))?;

        let prefix = match (block.prefix.as_deref(), block.netmask.as_deref()) {
            (Some(prefix), _) => prefix
                .parse::<u8>()
                .map_err(|e| invalid_block(format!("prefix '{prefix}': {e}")))?,
            (None, Some(netmask)) => {
                let mask: Ipv4Addr = netmask
                    .parse()
                    .map_err(|e| invalid_block(format!("netmask '{netmask}': {e}")))?;
                ipnet::ipv4_mask_to_prefix(mask)
                    .map_err(|e| invalid_block(format!("netmask '{netmask}': {e}")))?
            }
            (None, None) => return Err(invalid_block("no prefix or netmask".to_string()).into()),
        };

        Ipv4Net::new(address, prefix)
            .map(|net| net.trunc())
            .map_err(|e| invalid_block(format!("prefix {prefix}: {e}")).into())
    }

    /// Static allocation band: the address after the gateway (the second host
    /// of the block) and the start of the DHCP range.
    ///
    /// # Errors
    ///
    /// Everything [`Self::ip_network`] returns, plus
    /// [`ConfigError::NoDhcpRange`] and [`ConfigError::NoStaticAddresses`].
    pub fn static_ip_range(&self) -> Result<(Ipv4Addr, Ipv4Addr)> {
        let net = self.ip_network()?;
        let block = self.ipv4_block()?;

        let range = block
            .dhcp
            .as_ref()
            .and_then(|dhcp| dhcp.ranges.first())
            .ok_or_else(|| ConfigError::NoDhcpRange {
                network: self.raw.name.clone(),
            })?;
        let dhcp_start: Ipv4Addr = range.start.parse().map_err(|e| ConfigError::InvalidIpBlock {
            network: self.raw.name.clone(),
            reason: format!("DHCP range start '{}': {e}", range.start),
        })?;

        let first_static = net
            .hosts()
            .nth(1)
            .ok_or_else(|| ConfigError::NoStaticAddresses {
                network: self.raw.name.clone(),
                block: net.to_string(),
            })?;

        Ok((first_static, dhcp_start))
    }

    /// Overview for display; addressing problems show as missing fields.
    #[must_use]
    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            name: self.name().to_string(),
            uuid: self.uuid().to_string(),
            dns_domain: self.dns_domain(),
            ip_network: self.ip_network().ok().map(|net| net.to_string()),
            static_ip_range: self.static_ip_range().ok(),
            record_sets: self.records().len(),
        }
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod network_tests;
