// Dispatcher - single and batched probe invocation with failure isolation

use std::sync::Arc;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::args::ProbeArgs;
use super::registry::ProbeRegistry;
use crate::domain::ProbeResult;
use crate::error::{ProbeError, Result};

/// One entry of a batch request: probe name plus its JSON arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSpec {
    pub name: String,

    #[serde(default)]
    pub args: serde_json::Value,
}

impl BatchSpec {
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: serde_json::Value::Null,
        }
    }

    pub fn with_args(name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// One batch outcome, keyed by the requested probe name.
#[derive(Debug)]
pub struct BatchEntry {
    pub name: String,
    pub outcome: Result<ProbeResult>,
}

/// Ordered batch results. Serializes as an object in request order; failed
/// entries become {"error": "..."} values so partial telemetry survives.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn get(&self, name: &str) -> Option<&Result<ProbeResult>> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.outcome)
    }

    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_err()).count()
    }
}

impl Serialize for BatchReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct ErrorValue<'a> {
            error: &'a str,
        }

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            match &entry.outcome {
                Ok(result) => map.serialize_entry(&entry.name, result)?,
                Err(err) => map.serialize_entry(
                    &entry.name,
                    &ErrorValue {
                        error: &err.to_string(),
                    },
                )?,
            }
        }
        map.end()
    }
}

/// Executes probes resolved through the registry.
///
/// Single calls surface the first applicable error; batch calls isolate
/// failures per entry and never fail wholesale. Entries run sequentially
/// in input order, which keeps the output ordering contract trivially.
pub struct Dispatcher {
    registry: Arc<ProbeRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ProbeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    pub async fn invoke(&self, name: &str, args: &ProbeArgs) -> Result<ProbeResult> {
        let probe = self.registry.resolve(name)?;
        debug!(probe = %name, "invoking probe");
        probe.run(args).await
    }

    pub async fn invoke_batch(&self, specs: &[BatchSpec]) -> BatchReport {
        let mut report = BatchReport::default();
        for spec in specs {
            let args = ProbeArgs::new(spec.args.clone());
            let outcome = self.invoke(&spec.name, &args).await;
            if let Err(err) = &outcome {
                warn!(probe = %spec.name, error = %err, "probe failed in batch");
            }
            report.entries.push(BatchEntry {
                name: spec.name.clone(),
                outcome,
            });
        }
        report
    }
}

// Keep the batch error shape aligned with the ProbeError taxonomy.
impl BatchEntry {
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self.outcome,
            Err(ProbeError::UnsupportedPlatform { .. })
        )
    }
}
