// State Store Port - persisted key/value and flag files under a state root
//
// Access discipline is "idempotent create-if-missing": concurrent first
// writers may race but writes are whole-file replacements of self-consistent
// values, so state never corrupts.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("state root unavailable: {0}")]
    Unavailable(String),

    #[error("state io on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Small persisted-state mechanism backing cached and rate-gated probes.
pub trait StateStore: Send + Sync {
    /// Read a value file. Ok(None) when the key does not exist.
    fn read(&self, key: &str) -> Result<Option<String>, StateError>;

    /// Write a value file, replacing any previous contents.
    fn write(&self, key: &str, value: &str) -> Result<(), StateError>;

    /// Create a flag file (idempotent).
    fn set_flag(&self, name: &str) -> Result<(), StateError>;

    /// Consume a flag file: returns true and removes it if present.
    fn take_flag(&self, name: &str) -> Result<bool, StateError>;

    /// Materialize an executable script under the state root, creating it
    /// once, and return its path.
    fn ensure_script(&self, name: &str, contents: &str) -> Result<PathBuf, StateError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// In-memory state store for tests.
    #[derive(Default)]
    pub struct MemoryStateStore {
        entries: Mutex<HashMap<String, String>>,
        flags: Mutex<HashSet<String>>,
    }

    impl MemoryStateStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn has_flag(&self, name: &str) -> bool {
            self.flags.lock().unwrap().contains(name)
        }

        pub fn script_contents(&self, name: &str) -> Option<String> {
            self.entries.lock().unwrap().get(name).cloned()
        }
    }

    impl StateStore for MemoryStateStore {
        fn read(&self, key: &str) -> Result<Option<String>, StateError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        fn write(&self, key: &str, value: &str) -> Result<(), StateError> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn set_flag(&self, name: &str) -> Result<(), StateError> {
            self.flags.lock().unwrap().insert(name.to_string());
            Ok(())
        }

        fn take_flag(&self, name: &str) -> Result<bool, StateError> {
            Ok(self.flags.lock().unwrap().remove(name))
        }

        fn ensure_script(&self, name: &str, contents: &str) -> Result<PathBuf, StateError> {
            let mut entries = self.entries.lock().unwrap();
            entries
                .entry(name.to_string())
                .or_insert_with(|| contents.to_string());
            Ok(PathBuf::from(format!("/mock-state/{name}")))
        }
    }
}
