mod config;
mod output;
mod setup;

use anyhow::Result;
use deltamon_common::clock;
use deltamon_common::context::SystemContext;
use deltamon_common::types::Report;
use deltamon_monitor::ResourceMonitor;
use output::CsvSink;
use setup::Monitors;
use tokio::signal;
use tokio::time::{interval, Duration};
use tracing_subscriber::EnvFilter;

/// Update every monitor once. Returns which ones produced fresh output.
fn sample(monitors: &mut Monitors, print_summary: bool) -> Vec<bool> {
    monitors
        .iter_mut()
        .map(|monitor| match monitor.update() {
            Ok(()) => {
                if print_summary {
                    tracing::info!("{}", monitor.summary());
                }
                true
            }
            Err(e) => {
                tracing::warn!(monitor = monitor.name(), error = %e, "Update failed");
                false
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("deltamon=info".parse()?))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/agent.toml".to_string());

    let config = config::AgentConfig::load(&config_path)?;
    let ctx = SystemContext::detect();
    tracing::info!("deltamon-agent starting\n{ctx}");

    let mut monitors = setup::build_monitors(&config, &ctx, clock::monotonic())?;
    let mut csv = match &config.csv_path {
        Some(path) => Some(CsvSink::open(
            path,
            config.csv_delimiter,
            monitors.iter().map(|m| &**m),
        )?),
        None => None,
    };

    let mut tick = interval(Duration::from_secs(config.interval_secs));
    tracing::info!(
        interval_secs = config.interval_secs,
        monitors = monitors.len(),
        csv = ?config.csv_path,
        "Starting sampling loop"
    );

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let fresh = sample(&mut monitors, config.print_summary);
                if let Some(sink) = csv.as_mut() {
                    let rows = monitors
                        .iter()
                        .zip(&fresh)
                        .map(|(m, ok)| ok.then_some(&**m));
                    if let Err(e) = sink.append(rows) {
                        tracing::warn!(error = %e, "Failed to write CSV row");
                    }
                }
            }
            _ = signal::ctrl_c() => {
                tracing::info!("Shutting down gracefully");
                break;
            }
        }
    }

    Ok(())
}
