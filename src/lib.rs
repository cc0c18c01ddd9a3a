// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # libvirt-aws - cloud-shaped APIs on top of libvirt
//!
//! libvirt-aws presents block-storage volumes and private DNS zones on a
//! single virtualization host. Volumes are libvirt storage volumes, their
//! attachments are the `<disk type="volume">` devices of libvirt domains, and
//! DNS records live in the `<dns>` section of a libvirt virtual network.
//!
//! ## Overview
//!
//! - Libvirt XML is parsed into immutable, cached views keyed by a digest of
//!   the XML text, so repeated describes of an unchanged object are free.
//! - A network's `<dns>` configuration is projected into a set-valued record
//!   store. Record types the network cannot hold natively (`NS`, `CNAME`) are
//!   carried as specially named TXT entries.
//! - Reconciling the store to a desired record set produces the minimal list
//!   of network-update fragments, which the backend applies one by one.
//!
//! ## Modules
//!
//! - [`resources`] - Volume, domain and network views parsed from libvirt XML
//! - [`entity_cache`] - Digest-keyed cache of parsed views
//! - [`dns`] - Record store, read view and reconciliation engine
//! - [`backend`] - The virtualization backend boundary (`virsh` and in-memory)
//! - [`session`] - Shared connection object and DNS change application
//! - [`api`] - HTTP surface
//! - [`config`] - Command-line configuration
//!
//! ## Example
//!
//! ```rust
//! use libvirt_aws::dns::{DnsRecords, RecordQuery, RecordType};
//! use libvirt_aws::resources::{FromXml, Network};
//!
//! let network = Network::from_xml(
//!     "<network><name>default</name><uuid>9a05da11-e96b-47f3-8253-a3a482e445f5</uuid>\
//!      <domain name='local-1.internal'/></network>",
//! )
//! .unwrap();
//!
//! let mut desired = DnsRecords::new();
//! desired.insert(RecordType::A, "web.local-1.internal.", "10.11.12.5");
//!
//! let diff = network.get_dns_diff(&desired).unwrap();
//! assert_eq!(diff.added.len(), 1);
//! assert!(network.get_dns_records(&RecordQuery::new()).unwrap().is_empty());
//! ```

pub mod api;
pub mod backend;
pub mod config;
pub mod constants;
pub mod dns;
pub mod entity_cache;
pub mod errors;
pub mod metrics;
pub mod resources;
pub mod session;
