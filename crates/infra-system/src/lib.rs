// Hostprobe Infra-System - concrete adapters for the core ports

pub mod fs_state_store;
pub mod platform;
pub mod subprocess_runner;

pub use fs_state_store::FsStateStore;
pub use platform::detect_platform;
pub use subprocess_runner::SubprocessRunner;
