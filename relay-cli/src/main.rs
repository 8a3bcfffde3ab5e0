//! relay-dataset CLI
//!
//! Exports the Onionoo relay directory to CSV and JSON snapshots.
//! Meant to be run from cron; with no arguments it writes to `./dataset`.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use relay_onionoo::{FetchConfig, DEFAULT_API_URL};
use relay_runtime::{ExportConfig, Exporter, OutputConfig};

#[derive(Parser)]
#[command(name = "relay-dataset")]
#[command(author, version, about = "Export the Tor relay directory from Onionoo", long_about = None)]
struct Cli {
    /// Dataset directory
    #[arg(short, long, default_value = "dataset")]
    output_dir: PathBuf,

    /// Onionoo details URL
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Fetch through a proxy, e.g. socks5h://127.0.0.1:9050
    #[arg(long)]
    proxy: Option<String>,

    /// Request timeout in seconds (default: wait indefinitely)
    #[arg(long)]
    timeout: Option<u64>,

    /// Exit non-zero if the fetch or any output batch fails
    #[arg(long)]
    strict: bool,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let mut fetch = FetchConfig::default().with_url(&cli.api_url);
    if let Some(proxy) = &cli.proxy {
        fetch = fetch.with_proxy(proxy);
    }
    if let Some(secs) = cli.timeout {
        fetch = fetch.with_timeout(secs);
    }

    let exporter = Exporter::new(ExportConfig {
        fetch,
        output: OutputConfig {
            dir: cli.output_dir,
        },
    });

    let summary = match exporter.run().await {
        Ok(summary) => summary,
        Err(e) if cli.strict => bail!("fetch failed: {}", e),
        Err(_) => return Ok(()),
    };

    if !summary.rejected_endpoints.is_empty() {
        warn!(
            "Skipped {} malformed endpoints",
            summary.rejected_endpoints.len()
        );
    }

    if summary.is_complete() {
        info!(
            "Done! All files saved to the {} directory.",
            exporter.output_dir().display()
        );
    } else if cli.strict {
        bail!(
            "export incomplete (csv written: {}, json written: {})",
            summary.tables.is_written(),
            summary.documents.is_written()
        );
    } else {
        warn!("Done with errors; see log above.");
    }

    Ok(())
}
