// Probe arguments - loosely typed JSON object with accessor helpers

use crate::error::{ProbeError, Result};
use serde_json::Value;

/// Arguments for one probe invocation.
///
/// Probes take a small JSON object ({"path": "/"}, {"host": ..., "port": ...});
/// missing keys fall back to per-probe defaults.
#[derive(Debug, Clone, Default)]
pub struct ProbeArgs(Value);

impl ProbeArgs {
    pub fn none() -> Self {
        Self(Value::Null)
    }

    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn str_opt(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn str_or(&self, key: &str, default: &str) -> String {
        self.str_opt(key).unwrap_or(default).to_string()
    }

    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.str_opt(key)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProbeError::InvalidArgs(format!("missing '{key}'")))
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn u16_or(&self, key: &str, default: u16) -> u16 {
        self.0
            .get(key)
            .and_then(Value::as_u64)
            .and_then(|n| u16::try_from(n).ok())
            .unwrap_or(default)
    }

    pub fn str_list(&self, key: &str) -> Vec<String> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl From<Value> for ProbeArgs {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
