// Application Layer - probe implementations and dispatch

pub mod args;
pub mod dispatcher;
pub mod probe;
pub mod probes;
pub mod rate_gate;
pub mod registry;

// Re-exports
pub use args::ProbeArgs;
pub use dispatcher::{BatchEntry, BatchReport, BatchSpec, Dispatcher};
pub use probe::Probe;
pub use rate_gate::RateGate;
pub use registry::{build_default_registry, names, Capabilities, ProbeRegistry, RegistryBuilder, RegistryOptions};
