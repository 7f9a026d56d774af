// Domain Layer - Pure types and parsing logic

pub mod platform;
pub mod result;
pub mod table;

// Re-exports
pub use platform::{Platform, PlatformKind};
pub use result::{ProbeResult, TableRow};
pub use table::{ColumnSchema, HeaderSkip, TableSpec};
