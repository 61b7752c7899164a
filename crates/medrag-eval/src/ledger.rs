//! Append-only CSV ledger for batch generation evaluation.
//!
//! One row per evaluated item, header written only when the file is
//! created, flush after every row. A crash after N rows leaves exactly
//! N valid rows, and reopening the same path resumes after them.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use medrag_core::error::{Error, Result};

/// First column of every row type; used to detect already-done items
/// when a batch resumes.
pub const ID_COLUMN: &str = "resource_id";

pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn has_rows(&self) -> bool {
        self.path
            .metadata()
            .map(|m| m.len() > 0)
            .unwrap_or(false)
    }

    /// Opens the ledger for appending. The header row is emitted only
    /// when the file is empty or missing.
    pub fn writer(&self) -> Result<LedgerWriter> {
        let fresh = !self.has_rows();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let inner = csv::WriterBuilder::new()
            .has_headers(fresh)
            .from_writer(file);
        Ok(LedgerWriter { inner })
    }

    /// Reads every persisted row back. This is the source of truth for
    /// aggregate reporting: what was flushed is what gets counted.
    pub fn read_rows<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        if !self.has_rows() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path).map_err(ledger_error)?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row.map_err(ledger_error)?);
        }
        Ok(rows)
    }

    /// Ids of items that already have a row, for resumed batches.
    pub fn completed_ids(&self) -> Result<HashSet<String>> {
        if !self.has_rows() {
            return Ok(HashSet::new());
        }
        let mut reader = csv::Reader::from_path(&self.path).map_err(ledger_error)?;
        let headers = reader.headers().map_err(ledger_error)?.clone();
        let id_position = headers.iter().position(|h| h == ID_COLUMN).ok_or_else(|| {
            Error::Ledger(format!(
                "ledger {} has no '{ID_COLUMN}' column",
                self.path.display()
            ))
        })?;
        let mut ids = HashSet::new();
        for record in reader.records() {
            let record = record.map_err(ledger_error)?;
            if let Some(id) = record.get(id_position) {
                ids.insert(id.to_string());
            }
        }
        Ok(ids)
    }
}

pub struct LedgerWriter {
    inner: csv::Writer<File>,
}

impl LedgerWriter {
    /// Serializes one row and flushes it to disk before returning, so
    /// an interrupted batch never leaves a partial row behind.
    pub fn append<T: Serialize>(&mut self, row: &T) -> Result<()> {
        self.inner.serialize(row).map_err(ledger_error)?;
        self.inner.flush()?;
        Ok(())
    }
}

fn ledger_error(e: csv::Error) -> Error {
    Error::Ledger(e.to_string())
}
