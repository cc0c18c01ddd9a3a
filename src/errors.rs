// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for libvirt-aws.
//!
//! This module provides specialized error types for:
//! - Lookups of pools, networks, volumes and domains on the virtualization backend
//! - Network configuration problems (missing IP block, DHCP range or DNS domain)
//! - DNS record validation and reconciliation failures
//! - XML parsing and fragment generation
//! - Backend command and update failures
//!
//! These errors provide structured error handling so that callers can map
//! failures to request outcomes, log reasons and metric labels.

use thiserror::Error;

/// Errors raised when a named object does not exist on the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Storage pool not found by name or UUID
    #[error("Storage pool '{pool}' not found")]
    PoolNotFound {
        /// The pool name or UUID that was requested
        pool: String,
    },

    /// Network not found by name or UUID
    #[error("Network '{network}' not found")]
    NetworkNotFound {
        /// The network name or UUID that was requested
        network: String,
    },

    /// Volume not present in the pool
    #[error("Volume '{volume}' does not exist in pool '{pool}'")]
    VolumeNotFound {
        /// The pool that was scanned
        pool: String,
        /// The volume name that was requested
        volume: String,
    },

    /// Domain not found
    #[error("Domain '{domain}' not found")]
    DomainNotFound {
        /// The domain name that was requested
        domain: String,
    },
}

/// Errors caused by a network definition that lacks what an operation needs.
///
/// These always propagate: callers must never substitute a default.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The network has no `<ip>` element
    #[error("Network '{network}' does not define an IP block")]
    NoIpBlock {
        /// The network name
        network: String,
    },

    /// The network only defines non-IPv4 blocks
    #[error("Network '{network}' is not an IPv4 network (family '{family}')")]
    NotIpv4 {
        /// The network name
        network: String,
        /// The family of the first configured block
        family: String,
    },

    /// The IPv4 block could not be interpreted
    #[error("Network '{network}' has an invalid IP block: {reason}")]
    InvalidIpBlock {
        /// The network name
        network: String,
        /// Explanation of what is invalid
        reason: String,
    },

    /// The IPv4 block has no `<dhcp><range/></dhcp>`
    #[error("Network '{network}' does not define a DHCP range")]
    NoDhcpRange {
        /// The network name
        network: String,
    },

    /// The network has no `<domain name="..."/>`
    #[error("Network '{network}' does not define a DNS domain")]
    NoDnsDomain {
        /// The network name
        network: String,
    },

    /// The block is too small to hold a gateway and a static band
    #[error("Network '{network}' block {block} has no room for static addresses")]
    NoStaticAddresses {
        /// The network name
        network: String,
        /// The configured block
        block: String,
    },
}

/// Errors raised while validating or reconciling DNS records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The record type cannot be stored in the network's DNS configuration
    #[error("Unsupported resource record type '{record_type}' for '{name}'")]
    UnsupportedType {
        /// The record type as given
        record_type: String,
        /// The record name
        name: String,
    },

    /// A CNAME record set held more than one target
    #[error("CNAME record '{name}' must have exactly one target, got {count}")]
    MultiValuedCname {
        /// The record name
        name: String,
        /// Number of targets found
        count: usize,
    },

    /// A CNAME shares its name with other record data
    #[error("CNAME record '{name}' conflicts with a {other_type} record of the same name")]
    CnameConflict {
        /// The record name
        name: String,
        /// The other record type present at the name
        other_type: String,
    },

    /// An alias chain revisits a name
    #[error("CNAME chain starting at '{name}' is cyclic: {chain}")]
    CyclicAlias {
        /// The name resolution started from
        name: String,
        /// The visited names, joined with " -> "
        chain: String,
    },

    /// An alias chain exceeded the hop bound
    #[error("CNAME chain starting at '{name}' exceeds {depth} hops")]
    AliasChainTooDeep {
        /// The name resolution started from
        name: String,
        /// The hop bound that was hit
        depth: usize,
    },

    /// An A/AAAA value is not an address of the right family
    #[error("Invalid address '{value}' for record '{name}': {reason}")]
    InvalidAddress {
        /// The record name
        name: String,
        /// The offending value
        value: String,
        /// Explanation of what is invalid
        reason: String,
    },

    /// An SRV name or value is malformed
    #[error("Invalid SRV record '{name}': {reason}")]
    InvalidSrvRecord {
        /// The record name
        name: String,
        /// Explanation of what is invalid
        reason: String,
    },

    /// A record name is not a valid domain name
    #[error("Invalid record name '{name}': {reason}")]
    InvalidName {
        /// The record name as given
        name: String,
        /// Explanation of what is invalid
        reason: String,
    },
}

/// Errors raised while reading or writing XML.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// The text is not well-formed or does not match the expected shape
    #[error("Failed to parse {kind} XML: {reason}")]
    Parse {
        /// The entity kind being parsed (e.g. "volume")
        kind: &'static str,
        /// Parser message
        reason: String,
    },

    /// The XML parsed but violates a required-field rule
    #[error("Invalid {kind} XML: {reason}")]
    Invalid {
        /// The entity kind being parsed
        kind: &'static str,
        /// Explanation of what is invalid
        reason: String,
    },

    /// An XML fragment could not be produced
    #[error("Failed to write XML: {reason}")]
    Write {
        /// Writer message
        reason: String,
    },
}

/// Errors raised by the virtualization backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// A backend command exited unsuccessfully
    #[error("Backend command '{command}' failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        /// The command line that was run
        command: String,
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// The backend could not be reached
    #[error("Backend unavailable: {reason}")]
    Unavailable {
        /// Reason for the failure
        reason: String,
    },

    /// The backend refused an incremental network update
    #[error("Update of {section} on network '{network}' rejected: {reason}")]
    UpdateRejected {
        /// The network being updated
        network: String,
        /// The configuration section (e.g. "dns-host")
        section: String,
        /// Reason given by the backend
        reason: String,
    },

    /// A command succeeded but its output could not be interpreted
    #[error("Unexpected output from '{command}': {reason}")]
    InvalidOutput {
        /// The command line that was run
        command: String,
        /// Explanation of what was unexpected
        reason: String,
    },
}

/// Composite error type for every libvirt-aws operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Missing pool, network, volume or domain
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Network misconfiguration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// DNS record validation or reconciliation failure
    #[error(transparent)]
    Record(#[from] RecordError),

    /// XML parse or write failure
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// Backend failure
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result alias used across the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Returns true if this error is transient and the operation may be retried.
    ///
    /// Only backend connectivity and command failures are transient. Lookups,
    /// configuration, record and XML errors are permanent for the given input.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Backend(BackendError::Unavailable { .. } | BackendError::CommandFailed { .. }) => {
                true
            }
            Self::Backend(
                BackendError::UpdateRejected { .. } | BackendError::InvalidOutput { .. },
            )
            | Self::Lookup(_)
            | Self::Config(_)
            | Self::Record(_)
            | Self::Xml(_) => false,
        }
    }

    /// Returns a stable reason code for this error.
    ///
    /// Used in log fields, metric labels and HTTP error bodies.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::Lookup(LookupError::PoolNotFound { .. }) => "PoolNotFound",
            Self::Lookup(LookupError::NetworkNotFound { .. }) => "NetworkNotFound",
            Self::Lookup(LookupError::VolumeNotFound { .. }) => "VolumeNotFound",
            Self::Lookup(LookupError::DomainNotFound { .. }) => "DomainNotFound",

            Self::Config(ConfigError::NoIpBlock { .. }) => "NoIpBlock",
            Self::Config(ConfigError::NotIpv4 { .. }) => "NotIpv4",
            Self::Config(ConfigError::InvalidIpBlock { .. }) => "InvalidIpBlock",
            Self::Config(ConfigError::NoDhcpRange { .. }) => "NoDhcpRange",
            Self::Config(ConfigError::NoDnsDomain { .. }) => "NoDnsDomain",
            Self::Config(ConfigError::NoStaticAddresses { .. }) => "NoStaticAddresses",

            Self::Record(RecordError::UnsupportedType { .. }) => "UnsupportedRecordType",
            Self::Record(RecordError::MultiValuedCname { .. }) => "MultiValuedCname",
            Self::Record(RecordError::CnameConflict { .. }) => "CnameConflict",
            Self::Record(RecordError::CyclicAlias { .. }) => "CyclicAlias",
            Self::Record(RecordError::AliasChainTooDeep { .. }) => "AliasChainTooDeep",
            Self::Record(RecordError::InvalidAddress { .. }) => "InvalidAddress",
            Self::Record(RecordError::InvalidSrvRecord { .. }) => "InvalidSrvRecord",
            Self::Record(RecordError::InvalidName { .. }) => "InvalidRecordName",

            Self::Xml(XmlError::Parse { .. }) => "XmlParseFailed",
            Self::Xml(XmlError::Invalid { .. }) => "XmlInvalid",
            Self::Xml(XmlError::Write { .. }) => "XmlWriteFailed",

            Self::Backend(BackendError::CommandFailed { .. }) => "BackendCommandFailed",
            Self::Backend(BackendError::Unavailable { .. }) => "BackendUnavailable",
            Self::Backend(BackendError::UpdateRejected { .. }) => "UpdateRejected",
            Self::Backend(BackendError::InvalidOutput { .. }) => "BackendInvalidOutput",
        }
    }

    /// Returns true for missing-object errors.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Lookup(_))
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
