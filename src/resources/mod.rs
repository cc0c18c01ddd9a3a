// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed read-only views over backend XML descriptions.
//!
//! Every view is built from one XML snapshot and never mutated. Updates go
//! through the backend, after which a fresh describe produces a new view.
//!
//! - [`volume`] - Storage volumes
//! - [`domain`] - Domains, their volume-backed disks and volume attachments
//! - [`network`] - Networks, their DNS records and IPv4 addressing

pub mod domain;
pub mod network;
pub mod volume;

pub use domain::{DiskDevice, Domain, VolumeAttachment};
pub use network::{Network, NetworkSummary};
pub use volume::Volume;

use crate::errors::{Result, XmlError};
use serde::de::DeserializeOwned;

/// A view that can be built from an XML description.
pub trait FromXml: Sized + Send + Sync + 'static {
    /// Entity kind used in logs, metrics labels and errors
    const KIND: &'static str;

    /// Parse and validate one XML description.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError`] if the text is malformed or misses required fields.
    fn from_xml(xml: &str) -> Result<Self>;
}

/// Deserialize an XML document into its raw serde shape.
pub(crate) fn parse_xml<T: DeserializeOwned>(kind: &'static str, xml: &str) -> Result<T> {
    quick_xml::de::from_str(xml).map_err(|e| {
        XmlError::Parse {
            kind,
            reason: e.to_string(),
        }
        .into()
    })
}

/// Required-field violation for `kind`.
pub(crate) fn invalid(kind: &'static str, reason: impl Into<String>) -> crate::errors::Error {
    XmlError::Invalid {
        kind,
        reason: reason.into(),
    }
    .into()
}
