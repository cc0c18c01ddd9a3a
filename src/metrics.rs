// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for libvirt-aws.
//!
//! All metrics carry the namespace prefix `libvirt_aws_`.
//!
//! # Metrics Categories
//!
//! - **Entity Cache Metrics** - Hits and misses of the XML-keyed entity caches
//! - **DNS Reconciliation Metrics** - Diffs computed, their duration and outcome
//! - **Backend Update Metrics** - Fragments applied to the network configuration
//! - **Error Metrics** - Failures by reason code
//!
//! # Example
//!
//! ```rust,no_run
//! use libvirt_aws::metrics::{gather_metrics, record_dns_diff_success};
//!
//! record_dns_diff_success(std::time::Duration::from_millis(3));
//! let text = gather_metrics().unwrap();
//! assert!(text.contains("libvirt_aws_dns_diffs_total"));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

/// Namespace prefix for all metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "libvirt_aws";

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via the `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Entity Cache Metrics
// ============================================================================

/// Entity cache lookups
///
/// Labels:
/// - `kind`: Entity kind (`volume`, `domain`, `network`)
/// - `result`: `hit` or `miss`
pub static ENTITY_CACHE_LOOKUPS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_entity_cache_lookups_total"),
        "Total number of entity cache lookups by entity kind and result",
    );
    let counter = CounterVec::new(opts, &["kind", "result"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// DNS Reconciliation Metrics
// ============================================================================

/// DNS diffs computed
///
/// Labels:
/// - `status`: `success` or `error`
pub static DNS_DIFFS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_dns_diffs_total"),
        "Total number of DNS diffs computed by outcome",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of DNS diff computation in seconds
///
/// Labels:
/// - `status`: `success` or `error`
pub static DNS_DIFF_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_dns_diff_duration_seconds"),
        "Duration of DNS diff computation in seconds",
    )
    .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]);
    let histogram = HistogramVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Backend Update Metrics
// ============================================================================

/// Network configuration fragments applied
///
/// Labels:
/// - `section`: `dns-host`, `dns-txt` or `dns-srv`
/// - `operation`: `add-last` or `delete`
pub static NETWORK_UPDATES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_network_updates_total"),
        "Total number of network configuration fragments applied by section and operation",
    );
    let counter = CounterVec::new(opts, &["section", "operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Errors by operation and reason
///
/// Labels:
/// - `operation`: The failing operation (e.g. `dns_diff`, `apply`)
/// - `reason`: Reason code from [`crate::errors::Error::status_reason`]
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by operation and reason",
    );
    let counter = CounterVec::new(opts, &["operation", "reason"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Record an entity cache hit
pub fn record_cache_hit(kind: &str) {
    ENTITY_CACHE_LOOKUPS_TOTAL
        .with_label_values(&[kind, "hit"])
        .inc();
}

/// Record an entity cache miss (the XML was parsed)
pub fn record_cache_miss(kind: &str) {
    ENTITY_CACHE_LOOKUPS_TOTAL
        .with_label_values(&[kind, "miss"])
        .inc();
}

/// Record a successfully computed DNS diff
///
/// # Arguments
/// * `duration` - Time spent computing the diff
pub fn record_dns_diff_success(duration: Duration) {
    DNS_DIFFS_TOTAL.with_label_values(&["success"]).inc();
    DNS_DIFF_DURATION_SECONDS
        .with_label_values(&["success"])
        .observe(duration.as_secs_f64());
}

/// Record a failed DNS diff
///
/// # Arguments
/// * `duration` - Time spent before the failure
/// * `reason` - Reason code of the failure
pub fn record_dns_diff_error(duration: Duration, reason: &str) {
    DNS_DIFFS_TOTAL.with_label_values(&["error"]).inc();
    DNS_DIFF_DURATION_SECONDS
        .with_label_values(&["error"])
        .observe(duration.as_secs_f64());
    record_error("dns_diff", reason);
}

/// Record one applied network configuration fragment
pub fn record_network_update(section: &str, operation: &str) {
    NETWORK_UPDATES_TOTAL
        .with_label_values(&[section, operation])
        .inc();
}

/// Record an error
///
/// # Arguments
/// * `operation` - The operation that failed
/// * `reason` - Reason code of the failure
pub fn record_error(operation: &str, reason: &str) {
    ERRORS_TOTAL.with_label_values(&[operation, reason]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
