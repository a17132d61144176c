// Market data providers
pub mod sources;

// Re-export commonly used types
pub use sources::{BarSource, SourceError, SourceRegistry};
