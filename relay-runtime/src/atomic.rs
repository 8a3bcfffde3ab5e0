//! Atomic output batches
//!
//! Every file of a batch is staged as a hidden temporary in the target
//! directory and only renamed into place once the whole batch has been
//! written. Readers of the directory never see a half-written file.

use std::fs::File;
use std::io;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Errors while producing a batch of output files
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to move {} into place: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

struct Staged {
    file: NamedTempFile,
    target: PathBuf,
}

/// A set of files replaced together
///
/// Dropping a batch without committing removes every staged temporary.
pub struct AtomicBatch {
    dir: PathBuf,
    staged: Vec<Staged>,
}

impl AtomicBatch {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            staged: Vec::new(),
        }
    }

    /// Number of files staged so far
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Write `file_name` into a temporary next to its final path
    pub fn stage<F>(&mut self, file_name: &str, write: F) -> Result<(), WriteError>
    where
        F: FnOnce(&mut File) -> Result<(), WriteError>,
    {
        let mut file = tempfile::Builder::new()
            .prefix(&format!(".{}.", file_name))
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;

        write(file.as_file_mut())?;
        file.as_file().sync_all()?;

        debug!("Staged {} at {}", file_name, file.path().display());
        self.staged.push(Staged {
            file,
            target: self.dir.join(file_name),
        });
        Ok(())
    }

    /// Rename every staged file into place, in staging order
    ///
    /// Stops at the first failed rename; temporaries not yet renamed are
    /// removed.
    pub fn commit(self) -> Result<Vec<PathBuf>, WriteError> {
        let mut written = Vec::with_capacity(self.staged.len());

        for Staged { file, target } in self.staged {
            file.persist(&target).map_err(|e| WriteError::Persist {
                path: target.clone(),
                source: e.error,
            })?;
            debug!("Wrote {}", target.display());
            written.push(target);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::io::Write;
    use std::path::Path;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_commit_moves_all_files() {
        let tmp = tempfile::tempdir().unwrap();
        let mut batch = AtomicBatch::new(tmp.path());

        batch
            .stage("a.csv", |f| Ok(f.write_all(b"a\r\n")?))
            .unwrap();
        batch
            .stage("b.csv", |f| Ok(f.write_all(b"b\r\n")?))
            .unwrap();
        assert_eq!(batch.len(), 2);

        // nothing visible at the final paths before commit
        assert!(!tmp.path().join("a.csv").exists());

        let written = batch.commit().unwrap();
        assert_eq!(written, vec![tmp.path().join("a.csv"), tmp.path().join("b.csv")]);
        assert_eq!(entries(tmp.path()), vec!["a.csv", "b.csv"]);
        assert_eq!(fs::read_to_string(tmp.path().join("b.csv")).unwrap(), "b\r\n");
    }

    #[test]
    fn test_failure_mid_write_leaves_previous_run_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("all_nodes.csv"), "previous run\r\n").unwrap();
        fs::write(tmp.path().join("guard_nodes.csv"), "previous guards\r\n").unwrap();

        let result = (|| -> Result<Vec<PathBuf>, WriteError> {
            let mut batch = AtomicBatch::new(tmp.path());
            batch.stage("all_nodes.csv", |f| Ok(f.write_all(b"new all\r\n")?))?;
            batch.stage("guard_nodes.csv", |f| {
                f.write_all(b"fingerprint,ipaddr,port\r\nAAA,185.2")?;
                Err(io::Error::new(io::ErrorKind::Other, "disk full").into())
            })?;
            batch.commit()
        })();

        assert!(matches!(result, Err(WriteError::Io(_))));
        assert_eq!(
            fs::read_to_string(tmp.path().join("all_nodes.csv")).unwrap(),
            "previous run\r\n"
        );
        assert_eq!(
            fs::read_to_string(tmp.path().join("guard_nodes.csv")).unwrap(),
            "previous guards\r\n"
        );
        assert_eq!(entries(tmp.path()), vec!["all_nodes.csv", "guard_nodes.csv"]);
    }

    #[test]
    fn test_failed_rename_cleans_up_temporaries() {
        let tmp = tempfile::tempdir().unwrap();
        // a directory squatting on the final path makes the rename fail
        fs::create_dir(tmp.path().join("exit_nodes.csv")).unwrap();

        let mut batch = AtomicBatch::new(tmp.path());
        batch.stage("exit_nodes.csv", |f| Ok(f.write_all(b"x")?)).unwrap();
        batch.stage("all_nodes.csv", |f| Ok(f.write_all(b"y")?)).unwrap();

        let err = batch.commit().unwrap_err();
        match err {
            WriteError::Persist { path, .. } => assert_eq!(path, tmp.path().join("exit_nodes.csv")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(entries(tmp.path()), vec!["exit_nodes.csv"]);
    }

    #[test]
    fn test_missing_directory_fails_to_stage() {
        let tmp = tempfile::tempdir().unwrap();
        let mut batch = AtomicBatch::new(tmp.path().join("missing"));
        let result = batch.stage("a.csv", |_| Ok(()));
        assert!(matches!(result, Err(WriteError::Io(_))));
        assert!(batch.is_empty());
    }
}
