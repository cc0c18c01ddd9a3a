// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed view of a network's `<dns>` element.
//!
//! ```xml
//! <dns enable='yes'>
//!   <txt name='example' value='example value'/>
//!   <srv service='name' protocol='tcp' domain='test-domain-name' target='.'
//!        port='1024' priority='10' weight='10'/>
//!   <host ip='192.168.122.2'>
//!     <hostname>myhost</hostname>
//!     <hostname>myhostalias</hostname>
//!   </host>
//! </dns>
//! ```
//!
//! The same types parse the single-entry fragments passed to the network
//! update call, since a fragment is just one child element of `<dns>`.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// The `<dns>` element of a network definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsConfig {
    #[serde(rename = "@enable", default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<String>,

    #[serde(rename = "txt", default, skip_serializing_if = "Vec::is_empty")]
    pub txt: Vec<TxtEntry>,

    #[serde(rename = "srv", default, skip_serializing_if = "Vec::is_empty")]
    pub srv: Vec<SrvEntry>,

    #[serde(rename = "host", default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<HostEntry>,
}

/// `<txt name=".." value=".."/>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxtEntry {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@value")]
    pub value: String,
}

/// `<srv service=".." protocol=".." .../>`
///
/// Every field but service and protocol is optional in libvirt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrvEntry {
    #[serde(rename = "@service")]
    pub service: String,
    #[serde(rename = "@protocol")]
    pub protocol: String,
    #[serde(rename = "@domain", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(rename = "@priority", default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(rename = "@weight", default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(rename = "@port", default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(rename = "@target", default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// `<host ip="..">` with zero or more `<hostname>` children.
///
/// At most one host entry exists per address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEntry {
    #[serde(rename = "@ip")]
    pub ip: IpAddr,
    #[serde(rename = "hostname", default, skip_serializing_if = "Vec::is_empty")]
    pub hostnames: Vec<String>,
}
