/// One-time latch that holds transmission until the peer is ready.
///
/// Starts closed and never closes again once opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadinessGate {
    open: bool,
}

impl ReadinessGate {
    pub const fn new() -> Self {
        Self { open: false }
    }

    /// Open the gate. Returns `true` only for the call that opened it.
    pub fn open(&mut self) -> bool {
        !std::mem::replace(&mut self.open, true)
    }

    pub const fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_opens_once() {
        let mut gate = ReadinessGate::new();
        assert!(!gate.is_open());
        assert!(gate.open());
        assert!(!gate.open());
        assert!(gate.is_open());
    }
}
