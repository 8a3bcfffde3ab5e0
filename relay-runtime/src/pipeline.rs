//! Export pipeline
//!
//! One run, strictly sequential:
//! - fetch the details document (fatal on failure)
//! - stamp the capture instant
//! - extract CSV rows and partition guard/exit relays
//! - write the tabular batch, then the structured batch
//!
//! The two batches fail independently; outcomes land in a [`RunSummary`].

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tracing::{error, info};

use crate::{OutputConfig, SnapshotWriter, WriteError};
use relay_core::{partition, tabulate, Dataset};
use relay_onionoo::{fetch_dataset, FetchConfig, FetchError};

/// Exporter configuration
#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    /// Onionoo fetch settings
    pub fetch: FetchConfig,
    /// Dataset directory
    pub output: OutputConfig,
}

/// Result of writing one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Written(Vec<PathBuf>),
    Failed(String),
}

impl BatchOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, BatchOutcome::Written(_))
    }
}

/// What a run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Capture instant shared by all structured documents
    pub captured_at: String,
    pub relays: usize,
    /// Valid endpoints across all relays
    pub tuples: usize,
    pub guard_relays: usize,
    pub exit_relays: usize,
    /// Endpoint strings that failed to parse
    pub rejected_endpoints: Vec<String>,
    pub tables: BatchOutcome,
    pub documents: BatchOutcome,
}

impl RunSummary {
    /// Both batches were written
    pub fn is_complete(&self) -> bool {
        self.tables.is_written() && self.documents.is_written()
    }
}

/// UTC RFC 3339 timestamp with microseconds
pub fn capture_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Drives export runs
pub struct Exporter {
    fetch: FetchConfig,
    writer: SnapshotWriter,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            fetch: config.fetch,
            writer: SnapshotWriter::new(config.output),
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.writer.dir()
    }

    /// Fetch and export; a fetch failure writes nothing
    pub async fn run(&self) -> Result<RunSummary, FetchError> {
        info!("Fetching Tor node data from Onionoo API...");

        let dataset = match fetch_dataset(&self.fetch).await {
            Ok(dataset) => dataset,
            Err(e) => {
                error!("Failed to fetch data from API: {}", e);
                return Err(e);
            }
        };

        info!(
            "Successfully fetched data for {} Tor relays",
            dataset.relays().len()
        );

        Ok(self.export(dataset, &capture_timestamp()))
    }

    /// Write both batches for an already fetched dataset
    pub fn export(&self, mut dataset: Dataset, captured_at: &str) -> RunSummary {
        dataset.stamp(captured_at);

        let relays = dataset.relays();
        let tables = tabulate(relays);
        let parts = partition(relays);

        let prepared = self.writer.prepare().map_err(|e| e.to_string());
        if let Err(e) = &prepared {
            error!("Cannot create {}: {}", self.output_dir().display(), e);
        }

        info!("Creating CSV files...");
        let tables_outcome = match &prepared {
            Ok(()) => self.settle("CSV", self.writer.write_tables(&tables)),
            Err(e) => BatchOutcome::Failed(e.clone()),
        };

        info!("Creating JSON files...");
        let documents_outcome = match &prepared {
            Ok(()) => self.settle("JSON", self.writer.write_documents(&dataset, &parts)),
            Err(e) => BatchOutcome::Failed(e.clone()),
        };

        if documents_outcome.is_written() {
            info!("- Sorted guard nodes by consensus weight: {} nodes", parts.guard.len());
            info!("- Sorted exit nodes by consensus weight: {} nodes", parts.exit.len());
        }

        RunSummary {
            captured_at: captured_at.to_string(),
            relays: relays.len(),
            tuples: tables.all.len(),
            guard_relays: parts.guard.len(),
            exit_relays: parts.exit.len(),
            rejected_endpoints: tables.rejected.iter().map(|e| e.input().to_string()).collect(),
            tables: tables_outcome,
            documents: documents_outcome,
        }
    }

    fn settle(&self, kind: &str, result: Result<Vec<PathBuf>, WriteError>) -> BatchOutcome {
        match result {
            Ok(paths) => {
                info!("{} files created in {} directory", kind, self.output_dir().display());
                BatchOutcome::Written(paths)
            }
            Err(e) => {
                error!("Error writing {} files: {}", kind, e);
                BatchOutcome::Failed(e.to_string())
            }
        }
    }
}
