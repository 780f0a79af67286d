//! Delivery Metrics

use metrics::{Counter, Gauge};
use pericope_wire::MessageType;

/// Send cycle metrics
#[derive(Clone, Debug)]
pub(crate) struct DeliveryMetrics {
    /// Number of requests enqueued
    pub(crate) enqueued_total: Counter,
    /// Number of submissions accepted or refused by the transport
    pub(crate) submissions_total: Counter,
    /// Number of submissions the transport refused outright
    pub(crate) refused_total: Counter,
    /// Number of requests delivered
    pub(crate) delivered_total: Counter,
    /// Number of failed attempts, refusals included
    pub(crate) failed_attempts_total: Counter,
    /// Number of requests dropped after exhausting their attempts
    pub(crate) dropped_total: Counter,
    /// Number of pending requests
    pub(crate) queue_depth: Gauge,
}

impl Default for DeliveryMetrics {
    fn default() -> Self {
        Self {
            enqueued_total: metrics::counter!("delivery.enqueued_total"),
            submissions_total: metrics::counter!("delivery.submissions_total"),
            refused_total: metrics::counter!("delivery.refused_total"),
            delivered_total: metrics::counter!("delivery.delivered_total"),
            failed_attempts_total: metrics::counter!("delivery.failed_attempts_total"),
            dropped_total: metrics::counter!("delivery.dropped_total"),
            queue_depth: metrics::gauge!("delivery.queue_depth"),
        }
    }
}

impl DeliveryMetrics {
    pub(crate) fn inc_enqueued(&self, depth: usize) {
        self.enqueued_total.increment(1);
        self.set_queue_depth(depth);
    }

    pub(crate) fn inc_submissions(&self) {
        self.submissions_total.increment(1);
    }

    pub(crate) fn inc_refused(&self) {
        self.refused_total.increment(1);
    }

    pub(crate) fn inc_delivered(&self, depth: usize) {
        self.delivered_total.increment(1);
        self.set_queue_depth(depth);
    }

    pub(crate) fn inc_failed_attempts(&self) {
        self.failed_attempts_total.increment(1);
    }

    pub(crate) fn inc_dropped(&self, depth: usize) {
        self.dropped_total.increment(1);
        self.set_queue_depth(depth);
    }

    fn set_queue_depth(&self, depth: usize) {
        self.queue_depth.set(depth as f64);
    }
}

/// Inbound dispatch metrics
#[derive(Clone, Debug)]
pub(crate) struct DispatchMetrics {
    /// Number of payloads without a usable category
    pub(crate) malformed_total: Counter,
    /// Number of payloads for a category with no registered handler
    pub(crate) unregistered_total: Counter,
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self {
            malformed_total: metrics::counter!("dispatch.malformed_total"),
            unregistered_total: metrics::counter!("dispatch.unregistered_total"),
        }
    }
}

impl DispatchMetrics {
    /// Increments the routed counter for `category`.
    pub(crate) fn inc_routed(&self, category: MessageType) {
        let category: &'static str = category.into();
        metrics::counter!("dispatch.routed_total", "category" => category).increment(1);
    }

    pub(crate) fn inc_malformed(&self) {
        self.malformed_total.increment(1);
    }

    pub(crate) fn inc_unregistered(&self) {
        self.unregistered_total.increment(1);
    }
}
