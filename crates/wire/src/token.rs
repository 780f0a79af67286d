use derive_more::{Display, From, Into};

/// Opaque identifier tying an outbound request to its inbound responses.
///
/// Tokens are only compared for equality. How they are minted is the
/// allocator's concern, not the wire's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Display, From, Into)]
pub struct CorrelationToken(u32);

impl CorrelationToken {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}
