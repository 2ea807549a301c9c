//! Prometheus metrics for the image folder sync.
//!
//! All metrics follow the naming convention: `ls_<area>_<metric>_<unit>`
//!
//! Link and router counters are owned by their crates as plain atomics; the
//! runtime copies them in with [`observe_total`], which only ever moves a
//! counter forward.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // LINK METRICS
    // =========================================================================

    pub static ref LINK_CALLS: IntCounter = IntCounter::new(
        "ls_link_calls_total",
        "Calls sent to the host"
    ).expect("metric creation failed");

    pub static ref LINK_REPLIES: IntCounter = IntCounter::new(
        "ls_link_replies_total",
        "Calls resolved by a matching reply"
    ).expect("metric creation failed");

    pub static ref LINK_TIMEOUTS: IntCounter = IntCounter::new(
        "ls_link_timeouts_total",
        "Calls that saw no reply within the timeout"
    ).expect("metric creation failed");

    pub static ref LINK_CANCELLED: IntCounter = IntCounter::new(
        "ls_link_cancelled_total",
        "Calls abandoned by send failure, caller drop or connection loss"
    ).expect("metric creation failed");

    pub static ref LINK_DISCARDED: IntCounter = IntCounter::new(
        "ls_link_discarded_messages_total",
        "Inbound messages that matched no pending call"
    ).expect("metric creation failed");

    pub static ref LINK_PENDING: IntGauge = IntGauge::new(
        "ls_link_pending_calls",
        "Calls currently waiting for a reply"
    ).expect("metric creation failed");

    // =========================================================================
    // SCENE METRICS
    // =========================================================================

    pub static ref OBJECTS_CONSTRUCTED: IntCounter = IntCounter::new(
        "ls_scene_objects_constructed_total",
        "Image objects built in the remote scene"
    ).expect("metric creation failed");

    pub static ref OBJECTS_REFRESHED: IntCounter = IntCounter::new(
        "ls_scene_objects_refreshed_total",
        "Image objects whose texture was repointed"
    ).expect("metric creation failed");

    pub static ref OBJECTS_NOT_UPDATABLE: IntCounter = IntCounter::new(
        "ls_scene_objects_not_updatable_total",
        "Refreshes that found a node without a texture"
    ).expect("metric creation failed");

    // =========================================================================
    // FILE EVENT METRICS
    // =========================================================================

    pub static ref FILE_EVENTS_HANDLED: IntCounter = IntCounter::new(
        "ls_watch_events_handled_total",
        "Image file events handled successfully"
    ).expect("metric creation failed");

    pub static ref FILE_EVENTS_FAILED: IntCounter = IntCounter::new(
        "ls_watch_events_failed_total",
        "Image file events that ended in an error"
    ).expect("metric creation failed");

    pub static ref FILE_EVENTS_IGNORED: IntCounter = IntCounter::new(
        "ls_watch_events_ignored_total",
        "File events for non-image files"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry. Safe to call repeatedly.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Link
        Box::new(LINK_CALLS.clone()),
        Box::new(LINK_REPLIES.clone()),
        Box::new(LINK_TIMEOUTS.clone()),
        Box::new(LINK_CANCELLED.clone()),
        Box::new(LINK_DISCARDED.clone()),
        Box::new(LINK_PENDING.clone()),
        // Scene
        Box::new(OBJECTS_CONSTRUCTED.clone()),
        Box::new(OBJECTS_REFRESHED.clone()),
        Box::new(OBJECTS_NOT_UPDATABLE.clone()),
        // File events
        Box::new(FILE_EVENTS_HANDLED.clone()),
        Box::new(FILE_EVENTS_FAILED.clone()),
        Box::new(FILE_EVENTS_IGNORED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Advance `counter` to `total` if it is behind.
pub fn observe_total(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
