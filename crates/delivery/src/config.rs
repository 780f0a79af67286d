//! Delivery configuration.

use pericope_wire::DEFAULT_MAX_DICTIONARY_SIZE;
use serde::{Deserialize, Serialize};

/// Transmission attempts per request before it is dropped.
pub const MAX_ATTEMPTS: u8 = 3;

/// How request tokens are minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStrategy {
    /// Unix time in seconds. Two requests issued within the same second
    /// share a token.
    Clock,
    /// Monotonic counter starting at one, skipping zero on wrap.
    #[default]
    Counter,
}

/// Configuration for the delivery core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Attempts per request, first send included.
    pub max_attempts: u8,
    pub token_strategy: TokenStrategy,
    /// Outbound transport buffer in bytes.
    pub outbound_buffer_size: usize,
    /// Inbound transport buffer in bytes.
    pub inbound_buffer_size: usize,
}

impl DeliveryConfig {
    /// Attempt cap, never below one.
    pub fn attempt_cap(&self) -> u8 {
        self.max_attempts.max(1)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            token_strategy: TokenStrategy::default(),
            outbound_buffer_size: DEFAULT_MAX_DICTIONARY_SIZE,
            inbound_buffer_size: DEFAULT_MAX_DICTIONARY_SIZE,
        }
    }
}
