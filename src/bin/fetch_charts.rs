use anyhow::{Result, bail};
use clap::Parser;
use tokio::runtime::Runtime;

use pattern_monitor::pipeline::ChartFetcher;
use pattern_monitor::{DashboardConfig, FetchCli, SourceRegistry, init_logging};

fn main() -> Result<()> {
    init_logging();
    let args = FetchCli::parse();
    let config = DashboardConfig::resolve(args.config.as_deref())?;

    let instruments = if args.indices_only {
        config.index_instruments.clone()
    } else if args.indices {
        config.all_instruments().cloned().collect()
    } else {
        config.instruments.clone()
    };

    let fetcher = ChartFetcher::for_instruments(&config, SourceRegistry::live()?, instruments);
    fetcher.remove_stale_temp_files();
    let rt = Runtime::new()?;
    let report = rt.block_on(fetcher.run_cycle());

    for symbol in &report.updated {
        log::info!("Updated {}", symbol);
    }
    if report.updated.is_empty() {
        bail!("No chart could be updated");
    }
    Ok(())
}
