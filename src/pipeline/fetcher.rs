//! Data fetcher: pulls bars for every instrument, renders, hands off.

use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{Context, Result};

#[cfg(debug_assertions)]
use crate::config::debug::{PRINT_FETCH_CYCLE, PRINT_SERIES_RANGE, PRINT_SHUTDOWN};
use crate::config::{ChartStyle, DashboardConfig};
use crate::data::sources::SourceRegistry;
use crate::domain::Instrument;
use crate::pipeline::handoff::{remove_stale_temp_files, write_chart_atomically};
use crate::pipeline::schedule::{Schedule, ShutdownSignal};
use crate::render::{encode_png, render_chart};

/// Outcome of one pass over the instruments.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CycleReport {
    /// Instruments whose chart was replaced, in fetch order
    pub updated: Vec<String>,
    /// Instruments left untouched this cycle, with the reason
    pub failed: Vec<(String, String)>,
}

impl CycleReport {
    pub fn all_updated(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ChartFetcher {
    sources: SourceRegistry,
    /// Each instrument with the fixed path its chart is written to
    targets: Vec<(Instrument, PathBuf)>,
    charts_dir: PathBuf,
    style: ChartStyle,
}

impl ChartFetcher {
    /// Fetcher for the viewer grid instruments.
    pub fn new(config: &DashboardConfig, sources: SourceRegistry) -> Self {
        Self::for_instruments(config, sources, config.instruments.clone())
    }

    pub fn for_instruments(
        config: &DashboardConfig,
        sources: SourceRegistry,
        instruments: Vec<Instrument>,
    ) -> Self {
        let targets = instruments
            .into_iter()
            .map(|instrument| {
                let path = config.chart_path(&instrument);
                (instrument, path)
            })
            .collect();
        Self {
            sources,
            targets,
            charts_dir: config.charts_dir.clone(),
            style: config.chart.clone(),
        }
    }

    /// Remove temp files an interrupted earlier run left in the charts directory.
    pub fn remove_stale_temp_files(&self) {
        match remove_stale_temp_files(&self.charts_dir) {
            Ok(0) => {}
            Ok(n) => log::warn!(
                "Removed {} unfinished chart writes from {}",
                n,
                self.charts_dir.display()
            ),
            Err(e) => log::warn!("Could not clean {}: {:#}", self.charts_dir.display(), e),
        }
    }

    /// One pass over every instrument in order. A failure is logged and
    /// recorded; the next instrument is still attempted.
    pub async fn run_cycle(&self) -> CycleReport {
        let start = Instant::now();
        let mut report = CycleReport::default();

        for (instrument, path) in &self.targets {
            match self.update_instrument(instrument, path).await {
                Ok(()) => {
                    #[cfg(debug_assertions)]
                    if PRINT_FETCH_CYCLE {
                        log::info!("{} -> {}", instrument, path.display());
                    }
                    report.updated.push(instrument.symbol.clone());
                }
                Err(e) => {
                    log::error!("Skipping {}: {:#}", instrument, e);
                    report
                        .failed
                        .push((instrument.symbol.clone(), format!("{:#}", e)));
                }
            }
        }

        log::info!(
            "Fetch cycle done in {} ms: {} updated, {} failed",
            start.elapsed().as_millis(),
            report.updated.len(),
            report.failed.len()
        );
        report
    }

    async fn update_instrument(&self, instrument: &Instrument, path: &Path) -> Result<()> {
        let series = self.sources.fetch(instrument).await?;

        #[cfg(debug_assertions)]
        if PRINT_SERIES_RANGE {
            if let (Some(first), Some(last)) = (series.bars().first(), series.bars().last()) {
                log::info!(
                    "{}: {} bars {} .. {} (last close {:.2})",
                    instrument,
                    series.len(),
                    crate::utils::time_utils::epoch_ms_to_utc(first.open_time_ms),
                    crate::utils::time_utils::epoch_ms_to_utc(last.open_time_ms),
                    series.last_close()
                );
            }
        }

        let image = render_chart(&series, instrument, &self.style)?;
        let bytes = encode_png(&image)?;
        write_chart_atomically(path, &bytes)
    }

    /// Cycle until `shutdown` fires. Consecutive failures never stop the loop.
    pub async fn run_forever(&self, schedule: Schedule, mut shutdown: ShutdownSignal) {
        self.remove_stale_temp_files();
        loop {
            if shutdown.is_triggered() {
                break;
            }
            self.run_cycle().await;
            if shutdown.sleep_or_stop(schedule.next_delay()).await {
                break;
            }
        }
        #[cfg(debug_assertions)]
        if PRINT_SHUTDOWN {
            log::info!("Fetcher stopped");
        }
    }
}

/// Run the fetcher loop on its own OS thread with a private tokio runtime.
pub fn spawn_fetcher_thread(
    fetcher: ChartFetcher,
    schedule: Schedule,
    shutdown: ShutdownSignal,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("chart-fetcher".to_string())
        .spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Fetcher could not start its runtime: {}", e);
                    return;
                }
            };
            rt.block_on(fetcher.run_forever(schedule, shutdown));
        })
        .context("Failed to spawn fetcher thread")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sources::{BarSource, SourceError};
    use crate::domain::{Bar, BarSeries, DataSource};
    use crate::pipeline::handoff::read_chart;
    use crate::pipeline::schedule::shutdown_channel;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Rising closes for every symbol except `fail_symbol` ("*" fails them all).
    struct MockSource {
        fail_symbol: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BarSource for MockSource {
        fn signature(&self) -> &'static str {
            "mock"
        }

        async fn fetch_bars(&self, instrument: &Instrument) -> Result<BarSeries, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fails = match self.fail_symbol {
                Some("*") => true,
                Some(symbol) => instrument.symbol == symbol,
                None => false,
            };
            if fails {
                return Err(SourceError::ConnectionFailed("boom".into()));
            }
            let bars = (0..60)
                .map(|i| {
                    let c = 10.0 + i as f64;
                    Bar::new(i * 900_000, c - 0.5, c + 1.0, c - 1.0, c, 5.0)
                })
                .collect();
            BarSeries::new(instrument.symbol.clone(), 900_000, bars)
                .map_err(|e| SourceError::Malformed(e.to_string()))
        }
    }

    fn config(dir: &std::path::Path) -> DashboardConfig {
        let mut config = DashboardConfig::default();
        config.charts_dir = dir.to_path_buf();
        config.chart.width = 400;
        config.chart.height = 240;
        config
    }

    fn fetcher(dir: &std::path::Path, fail: Option<&'static str>) -> (ChartFetcher, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let sources = SourceRegistry::new().with(
            DataSource::Binance,
            Box::new(MockSource {
                fail_symbol: fail,
                calls: calls.clone(),
            }),
        );
        (ChartFetcher::new(&config(dir), sources), calls)
    }

    #[tokio::test]
    async fn successful_cycle_writes_every_chart() {
        let dir = tempfile::tempdir().unwrap();
        let (fetcher, _) = fetcher(dir.path(), None);
        let report = fetcher.run_cycle().await;
        assert!(report.all_updated());
        assert_eq!(report.updated.len(), 4);
        for (_, path) in &fetcher.targets {
            let img = read_chart(path).unwrap();
            assert_eq!(img.dimensions(), (400, 240));
        }
    }

    #[tokio::test]
    async fn one_failing_instrument_does_not_block_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let (fetcher, calls) = fetcher(dir.path(), Some("ETH/USDT"));
        let report = fetcher.run_cycle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "ETH/USDT");
        assert_eq!(report.updated, vec!["BTC/USDT", "SOL/USDT", "PAXG/USDT"]);
        for (inst, path) in &fetcher.targets {
            assert_eq!(path.exists(), inst.symbol != "ETH/USDT");
        }
    }

    #[tokio::test]
    async fn instrument_without_a_provider_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let fetcher = ChartFetcher::for_instruments(
            &config,
            SourceRegistry::new(),
            config.index_instruments.clone(),
        );
        let report = fetcher.run_cycle().await;
        assert!(report.updated.is_empty());
        assert_eq!(report.failed.len(), 2);
    }

    #[tokio::test]
    async fn run_forever_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let (fetcher, calls) = fetcher(dir.path(), None);
        let (handle, signal) = shutdown_channel();
        let task = tokio::spawn(async move {
            fetcher
                .run_forever(Schedule::fixed(Duration::from_secs(3600)), signal)
                .await
        });
        // Let the first cycle finish, then stop during the long sleep.
        while calls.load(Ordering::SeqCst) < 4 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        handle.trigger();
        tokio::time::timeout(Duration::from_secs(30), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn run_forever_keeps_cycling_through_failures() {
        let dir = tempfile::tempdir().unwrap();
        let (fetcher, calls) = fetcher(dir.path(), Some("*"));
        let (handle, signal) = shutdown_channel();
        let task = tokio::spawn(async move {
            fetcher
                .run_forever(Schedule::fixed(Duration::from_millis(1)), signal)
                .await
        });
        // Three full cycles in which every instrument failed
        tokio::time::timeout(Duration::from_secs(30), async {
            while calls.load(Ordering::SeqCst) < 3 * 4 {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .unwrap();
        assert!(!task.is_finished());
        handle.trigger();
        tokio::time::timeout(Duration::from_secs(30), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn chart_paths_come_from_the_config() {
        let dir = tempfile::tempdir().unwrap();
        let (fetcher, _) = fetcher(dir.path(), None);
        let config = config(dir.path());
        let paths: Vec<PathBuf> = fetcher.targets.iter().map(|(_, p)| p.clone()).collect();
        assert_eq!(paths, config.grid_chart_paths());
    }
}
