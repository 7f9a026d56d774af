// Port Layer - Interfaces for external dependencies

pub mod command_runner;
pub mod management_query;
pub mod state_store;
pub mod token_provider;

// Re-exports
pub use command_runner::{CommandOutput, CommandRunner, RunnerError};
pub use management_query::{
    ManagedDisk, ManagedMemory, ManagedOsInfo, ManagementQuery, QueryError,
};
pub use state_store::{StateError, StateStore};
pub use token_provider::{RandTokenProvider, TokenProvider};
