use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::EtlError;

/// Artifact names shared by the stages.
pub const CUSTOMERS: &str = "customers";
pub const ORDERS: &str = "orders";
pub const PRODUCTS: &str = "products";
pub const TRANSFORMED: &str = "transformed_data";

/// Date-partitioned CSV artifact store: the sole hand-off surface between
/// stages. One file per (name, date) under a single root directory.
///
/// Files are published atomically: rows are written to a `.tmp` sibling and
/// renamed onto the final name only once fully flushed, so a crashed run can
/// never leave a half-written file that a later run mistakes for complete
/// output.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic location for one artifact: `{root}/{name}-{date}.csv`.
    pub fn path(&self, name: &str, date: NaiveDate) -> PathBuf {
        self.root.join(format!("{}-{}.csv", name, date.format("%Y-%m-%d")))
    }

    pub fn exists(&self, name: &str, date: NaiveDate) -> bool {
        self.path(name, date).exists()
    }

    /// Precondition check for the downstream stages: an artifact counts as
    /// ready only if it exists and holds at least one data row. A zero-byte
    /// file (what extracting an empty collection produces) and a header-only
    /// file are both "empty".
    pub fn has_rows(&self, name: &str, date: NaiveDate) -> Result<bool, EtlError> {
        let path = self.path(name, date);
        let Ok(meta) = fs::metadata(&path) else {
            return Ok(false);
        };
        if meta.len() == 0 {
            return Ok(false);
        }
        let mut reader = csv::Reader::from_path(&path)?;
        match reader.records().next() {
            Some(Ok(_)) => Ok(true),
            Some(Err(e)) => Err(e.into()),
            None => Ok(false),
        }
    }

    /// Serializes rows to CSV (header row from the struct fields) and
    /// atomically publishes the file. Zero rows produce an empty file, which
    /// downstream preconditions treat as a skip signal.
    pub fn write_rows<T: Serialize>(
        &self,
        name: &str,
        date: NaiveDate,
        rows: &[T],
    ) -> Result<PathBuf, EtlError> {
        fs::create_dir_all(&self.root)?;
        let final_path = self.path(name, date);
        let tmp_path = final_path.with_extension("csv.tmp");

        {
            let mut writer = csv::Writer::from_path(&tmp_path)?;
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, &final_path)?;

        debug!(path = %final_path.display(), rows = rows.len(), "artifact published");
        Ok(final_path)
    }

    pub fn read_rows<T: DeserializeOwned>(
        &self,
        name: &str,
        date: NaiveDate,
    ) -> Result<Vec<T>, EtlError> {
        let path = self.path(name, date);
        let meta = fs::metadata(&path)?;
        if meta.len() == 0 {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    }
}
