//! Fetch → render → hand-off → composite → detect.
//!
//! The fetcher side (`fetcher`, `schedule`) runs on a worker thread; the
//! viewer side (`viewer`, `composite`) runs on the UI thread. They meet only
//! at the chart files (`handoff`).

pub mod composite;
pub mod fetcher;
pub mod handoff;
pub mod schedule;
pub mod viewer;

pub use composite::{CompositeError, GridLayout, compose_grid};
pub use fetcher::{ChartFetcher, CycleReport, spawn_fetcher_thread};
pub use schedule::{Schedule, ShutdownHandle, ShutdownSignal, shutdown_channel};
pub use viewer::{ViewerError, ViewerFrame, ViewerLoop, ViewerOutcome};
