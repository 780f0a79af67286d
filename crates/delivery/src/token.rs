//! Correlation token allocation.

use std::time::{SystemTime, UNIX_EPOCH};

use pericope_wire::CorrelationToken;

use crate::TokenStrategy;

/// Mints a fresh token for each new request.
///
/// Cancellation does not go through the allocator: a cancel request reuses
/// the token of the request it cancels.
#[derive(Debug, Clone)]
pub struct TokenAllocator {
    strategy: TokenStrategy,
    next: u32,
}

impl TokenAllocator {
    pub fn new(strategy: TokenStrategy) -> Self {
        Self { strategy, next: 1 }
    }

    pub fn strategy(&self) -> TokenStrategy {
        self.strategy
    }

    pub fn allocate(&mut self) -> CorrelationToken {
        match self.strategy {
            TokenStrategy::Clock => CorrelationToken::new(unix_seconds()),
            TokenStrategy::Counter => {
                let token = self.next;
                self.next = match self.next.wrapping_add(1) {
                    0 => 1,
                    next => next,
                };
                CorrelationToken::new(token)
            }
        }
    }
}

impl Default for TokenAllocator {
    fn default() -> Self {
        Self::new(TokenStrategy::default())
    }
}

fn unix_seconds() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as u32)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_is_monotonic() {
        let mut tokens = TokenAllocator::new(TokenStrategy::Counter);
        let first = tokens.allocate();
        let second = tokens.allocate();
        assert_eq!(first, CorrelationToken::new(1));
        assert_eq!(second, CorrelationToken::new(2));
    }

    #[test]
    fn test_counter_skips_zero_on_wrap() {
        let mut tokens = TokenAllocator {
            strategy: TokenStrategy::Counter,
            next: u32::MAX,
        };
        assert_eq!(tokens.allocate(), CorrelationToken::new(u32::MAX));
        assert_eq!(tokens.allocate(), CorrelationToken::new(1));
    }

    #[test]
    fn test_clock_is_coarse() {
        let mut tokens = TokenAllocator::new(TokenStrategy::Clock);
        let token = tokens.allocate();
        // After 2023
        assert!(token.get() > 1_700_000_000);
    }
}
