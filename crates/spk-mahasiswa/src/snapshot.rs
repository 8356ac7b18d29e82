//! Durable CSV snapshots of the latest classification and ranking runs.
//!
//! Each run replaces its snapshot wholesale. Writers serialize on a per-snapshot mutex and
//! publish through a temp file renamed over the target, so readers only ever see a
//! complete previous or complete new snapshot.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::ErrorKind;
use crate::table::{ScoreTable, TableError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    ClassifiedRoster,
    NormalizedScores,
    SawResults,
}

impl SnapshotKind {
    pub fn file_name(self) -> &'static str {
        match self {
            SnapshotKind::ClassifiedRoster => "clustered_data.csv",
            SnapshotKind::NormalizedScores => "normalized_data.csv",
            SnapshotKind::SawResults => "saw_results.csv",
        }
    }

    fn slot(self) -> usize {
        match self {
            SnapshotKind::ClassifiedRoster => 0,
            SnapshotKind::NormalizedScores => 1,
            SnapshotKind::SawResults => 2,
        }
    }
}

/// Confirmation returned after a snapshot has been published.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotReceipt {
    pub kind: SnapshotKind,
    pub path: PathBuf,
    pub rows: usize,
    pub written_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot {0} has not been written yet")]
    Missing(&'static str),
    #[error("snapshot storage error: {0}")]
    Io(#[from] io::Error),
    #[error("unable to encode snapshot: {0}")]
    Encode(#[from] csv::Error),
    #[error("snapshot {name} is unreadable: {source}")]
    Corrupt {
        name: &'static str,
        #[source]
        source: TableError,
    },
}

impl SnapshotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SnapshotError::Missing(_) => ErrorKind::SnapshotMissing,
            _ => ErrorKind::Internal,
        }
    }
}

/// Directory-backed store holding one file per [`SnapshotKind`].
#[derive(Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
    writers: [Mutex<()>; 3],
}

impl SnapshotStore {
    /// Open the store, creating the directory when needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, SnapshotError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            writers: Default::default(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, kind: SnapshotKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    pub fn write(
        &self,
        kind: SnapshotKind,
        table: &ScoreTable,
    ) -> Result<SnapshotReceipt, SnapshotError> {
        let _writer = self.writer(kind);
        let target = self.path(kind);

        let staged = NamedTempFile::new_in(&self.dir)?;
        {
            let mut buffered = BufWriter::new(staged.as_file());
            table.write_csv(&mut buffered)?;
            buffered.flush()?;
        }
        staged.as_file().sync_all()?;
        staged.persist(&target).map_err(|err| err.error)?;

        info!(snapshot = kind.file_name(), rows = table.len(), "snapshot published");

        Ok(SnapshotReceipt {
            kind,
            path: target,
            rows: table.len(),
            written_at: Utc::now(),
        })
    }

    pub fn read(&self, kind: SnapshotKind) -> Result<ScoreTable, SnapshotError> {
        let bytes = self.read_bytes(kind)?;
        ScoreTable::from_reader(bytes.as_slice()).map_err(|source| SnapshotError::Corrupt {
            name: kind.file_name(),
            source,
        })
    }

    /// Raw CSV contents, for download endpoints.
    pub fn read_bytes(&self, kind: SnapshotKind) -> Result<Vec<u8>, SnapshotError> {
        match std::fs::read(self.path(kind)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(SnapshotError::Missing(kind.file_name()))
            }
            Err(err) => Err(SnapshotError::Io(err)),
        }
    }

    fn writer(&self, kind: SnapshotKind) -> MutexGuard<'_, ()> {
        self.writers[kind.slot()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn table(csv: &str) -> ScoreTable {
        ScoreTable::from_reader(csv.as_bytes()).expect("table parses")
    }

    #[test]
    fn read_before_write_is_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::open(dir.path()).expect("store opens");
        match store.read(SnapshotKind::ClassifiedRoster) {
            Err(SnapshotError::Missing(name)) => assert_eq!(name, "clustered_data.csv"),
            other => panic!("expected missing snapshot, got {other:?}"),
        }
    }

    #[test]
    fn write_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::open(dir.path().join("nested")).expect("store opens");

        store
            .write(SnapshotKind::SawResults, &table("NPM,Rank\n1,1\n2,2\n"))
            .expect("first write");
        let receipt = store
            .write(SnapshotKind::SawResults, &table("NPM,Rank\n3,1\n"))
            .expect("second write");

        assert_eq!(receipt.rows, 1);
        assert_eq!(receipt.path, store.path(SnapshotKind::SawResults));
        let stored = store.read(SnapshotKind::SawResults).expect("read back");
        assert_eq!(stored, table("NPM,Rank\n3,1\n"));

        let leftovers: Vec<_> = std::fs::read_dir(store.dir())
            .expect("list dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name() != "saw_results.csv")
            .collect();
        assert!(leftovers.is_empty(), "temp files must not linger");
    }

    #[test]
    fn concurrent_writers_leave_a_complete_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(SnapshotStore::open(dir.path()).expect("store opens"));

        let handles: Vec<_> = (0..8)
            .map(|writer| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let mut csv = String::from("NPM,Writer\n");
                    for row in 0..50 {
                        csv.push_str(&format!("{row},{writer}\n"));
                    }
                    store
                        .write(SnapshotKind::ClassifiedRoster, &table(&csv))
                        .expect("write succeeds");
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread");
        }

        let stored = store
            .read(SnapshotKind::ClassifiedRoster)
            .expect("snapshot readable");
        assert_eq!(stored.len(), 50);
        let writer = stored.get(0, "Writer").cloned();
        assert!(stored
            .rows()
            .all(|row| Some(&row[1]) == writer.as_ref()));
    }
}
