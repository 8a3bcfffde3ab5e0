//! Snapshot writer
//!
//! Produces the two output batches:
//! - tabular: `all_nodes.csv`, `guard_nodes.csv`, `exit_nodes.csv`
//! - structured: `all_nodes.json`, `guard_nodes.json`, `exit_nodes.json`

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::{AtomicBatch, WriteError};
use relay_core::{Dataset, EndpointTuple, NodeRecord, Partition, Tables, CSV_HEADER};

pub const ALL_NODES_CSV: &str = "all_nodes.csv";
pub const GUARD_NODES_CSV: &str = "guard_nodes.csv";
pub const EXIT_NODES_CSV: &str = "exit_nodes.csv";
pub const ALL_NODES_JSON: &str = "all_nodes.json";
pub const GUARD_NODES_JSON: &str = "guard_nodes.json";
pub const EXIT_NODES_JSON: &str = "exit_nodes.json";

/// Output location
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Dataset directory (created if absent)
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("dataset"),
        }
    }
}

/// Written in place of a missing `bridges` field
static NO_BRIDGES: Value = Value::Array(Vec::new());

/// Reduced document for the guard and exit snapshots
///
/// Metadata values are copied from the payload as-is; missing ones are
/// written as `null`.
#[derive(Debug, Serialize)]
pub struct RoleDocument<'a> {
    pub version: Option<&'a Value>,
    pub build_revision: Option<&'a Value>,
    pub relays_published: Option<&'a Value>,
    pub snapshot_timestamp: Option<&'a Value>,
    pub relays: &'a [&'a NodeRecord],
    pub bridges_published: Option<&'a Value>,
    pub bridges: &'a Value,
}

impl<'a> RoleDocument<'a> {
    pub fn new(dataset: &'a Dataset, relays: &'a [&'a NodeRecord]) -> Self {
        Self {
            version: dataset.get("version"),
            build_revision: dataset.get("build_revision"),
            relays_published: dataset.get("relays_published"),
            snapshot_timestamp: dataset.get("snapshot_timestamp"),
            relays,
            bridges_published: dataset.get("bridges_published"),
            bridges: dataset.get("bridges").unwrap_or(&NO_BRIDGES),
        }
    }
}

/// Writes the dataset directory
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    config: OutputConfig,
}

impl SnapshotWriter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Create the output directory if needed
    pub fn prepare(&self) -> Result<(), WriteError> {
        fs::create_dir_all(self.dir())?;
        Ok(())
    }

    /// Write the three CSV files as one batch
    pub fn write_tables(&self, tables: &Tables) -> Result<Vec<PathBuf>, WriteError> {
        let mut batch = AtomicBatch::new(self.dir());

        batch.stage(ALL_NODES_CSV, |file| write_csv(file, &tables.all))?;
        batch.stage(GUARD_NODES_CSV, |file| write_csv(file, &tables.guard))?;
        batch.stage(EXIT_NODES_CSV, |file| write_csv(file, &tables.exit))?;

        batch.commit()
    }

    /// Write the three JSON snapshots as one batch
    ///
    /// `dataset` must already carry its `snapshot_timestamp`.
    pub fn write_documents(
        &self,
        dataset: &Dataset,
        partition: &Partition<'_>,
    ) -> Result<Vec<PathBuf>, WriteError> {
        let guard = RoleDocument::new(dataset, &partition.guard);
        let exit = RoleDocument::new(dataset, &partition.exit);

        let mut batch = AtomicBatch::new(self.dir());

        batch.stage(ALL_NODES_JSON, |file| write_json(file, dataset))?;
        batch.stage(GUARD_NODES_JSON, |file| write_json(file, &guard))?;
        batch.stage(EXIT_NODES_JSON, |file| write_json(file, &exit))?;

        batch.commit()
    }
}

/// Header plus one CRLF-terminated row per tuple
pub fn write_csv<W: Write>(out: W, rows: &[EndpointTuple]) -> Result<(), WriteError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(out);

    wtr.write_record(CSV_HEADER)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Pretty-printed JSON, two-space indent
pub fn write_json<W: Write, T: Serialize + ?Sized>(out: W, value: &T) -> Result<(), WriteError> {
    let mut out = BufWriter::new(out);
    serde_json::to_writer_pretty(&mut out, value)?;
    out.flush()?;
    Ok(())
}
