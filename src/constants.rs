// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for libvirt-aws.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

use std::time::Duration;

// ============================================================================
// DNS Record Encoding Constants
// ============================================================================

/// Name prefix of TXT entries that carry an encoded NS record set
pub const SYNTHETIC_NS_PREFIX: &str = "@@ns.";

/// Name prefix of TXT entries that carry an encoded CNAME record set
pub const SYNTHETIC_CNAME_PREFIX: &str = "@@cname.";

/// Separator between quoted targets inside a synthetic TXT value
pub const SYNTHETIC_VALUE_SEPARATOR: char = ',';

/// Default SRV priority when the stored entry omits it
pub const DEFAULT_SRV_PRIORITY: &str = "0";

/// Default SRV weight when the stored entry omits it
pub const DEFAULT_SRV_WEIGHT: &str = "0";

/// Default SRV port when the stored entry omits it
pub const DEFAULT_SRV_PORT: &str = "0";

/// Default SRV target when the stored entry omits it (the root, i.e. "no service")
pub const DEFAULT_SRV_TARGET: &str = ".";

/// Maximum number of CNAME hops followed while resolving an alias target
pub const MAX_ALIAS_CHAIN_DEPTH: usize = 16;

// ============================================================================
// SOA Constants (read-time synthesis only, never persisted)
// ============================================================================

/// Hostname label of the gateway that answers for the network's zone
pub const SOA_GATEWAY_LABEL: &str = "gw";

/// SOA serial
pub const SOA_SERIAL: u32 = 1;

/// SOA refresh interval (20 minutes)
pub const SOA_REFRESH_SECS: u32 = 1200;

/// SOA retry interval (3 minutes)
pub const SOA_RETRY_SECS: u32 = 180;

/// SOA expire time (14 days)
pub const SOA_EXPIRE_SECS: u32 = 1_209_600;

/// SOA negative caching TTL (10 minutes)
pub const SOA_NEGATIVE_TTL_SECS: u32 = 600;

// ============================================================================
// Backend Constants
// ============================================================================

/// Default libvirt connection URI
pub const DEFAULT_LIBVIRT_URI: &str = "qemu:///system";

/// Default storage pool used for volume emulation
pub const DEFAULT_IMAGE_POOL: &str = "default";

/// Default network used for DNS and address emulation
pub const DEFAULT_NETWORK: &str = "default";

/// Command used to talk to the libvirt daemon
pub const VIRSH_COMMAND: &str = "virsh";

/// Fixed delay between startup connection attempts
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

// ============================================================================
// HTTP Server Constants
// ============================================================================

/// Default bind address for the HTTP server
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";

/// Default TCP port for the HTTP server
pub const DEFAULT_HTTP_PORT: u16 = 5100;

/// Change status reported for applied record changes
pub const CHANGE_STATUS_INSYNC: &str = "INSYNC";
