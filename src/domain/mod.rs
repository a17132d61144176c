// Domain types and value objects
pub mod bar;
pub mod instrument;

// Re-export commonly used types
pub use bar::{Bar, BarSeries, CandleType};
pub use instrument::{BarInterval, DataSource, Instrument};
