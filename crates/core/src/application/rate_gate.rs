// Flag-file rate gate for expensive probes
//
// A gated probe runs only when its trigger flag is present, consuming the
// flag in the same step. Transitions are monotonic: a failed probe run does
// not restore the flag, and an unconsumed gate stays armed until taken.

use std::sync::Arc;

use crate::port::state_store::{StateError, StateStore};

/// State controlling whether a throttled probe executes or returns a
/// sentinel. Never blocks: the outcome is "execute" or "not ready".
pub struct RateGate {
    store: Arc<dyn StateStore>,
    flag: &'static str,
}

impl RateGate {
    pub fn new(store: Arc<dyn StateStore>, flag: &'static str) -> Self {
        Self { store, flag }
    }

    /// Arm the gate so the next probe call executes.
    pub fn arm(&self) -> Result<(), StateError> {
        self.store.set_flag(self.flag)
    }

    /// Consume the trigger. True exactly once per arming.
    pub fn consume(&self) -> Result<bool, StateError> {
        self.store.take_flag(self.flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::state_store::mocks::MemoryStateStore;

    #[test]
    fn test_consume_is_once_per_arming() {
        let store = Arc::new(MemoryStateStore::new());
        let gate = RateGate::new(store, "check-updates");

        assert!(!gate.consume().unwrap());

        gate.arm().unwrap();
        assert!(gate.consume().unwrap());
        assert!(!gate.consume().unwrap());
    }

    #[test]
    fn test_arm_is_idempotent() {
        let store = Arc::new(MemoryStateStore::new());
        let gate = RateGate::new(store, "check-updates");

        gate.arm().unwrap();
        gate.arm().unwrap();
        assert!(gate.consume().unwrap());
        assert!(!gate.consume().unwrap());
    }
}
