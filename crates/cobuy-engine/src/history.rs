//! Append-only log of served recommendations.
//!
//! Nothing in the engine reads this history back; it exists for auditing.
//! Stores must tolerate concurrent `record` calls.
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ProductId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub input_products: Vec<ProductId>,
    pub recommended_products: Vec<ProductId>,
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn new(input_products: Vec<ProductId>, recommended_products: Vec<ProductId>) -> Self {
        Self {
            input_products,
            recommended_products,
            created_at: Utc::now(),
        }
    }
}

pub trait HistoryStore: Send + Sync {
    fn record(&self, record: &HistoryRecord) -> Result<()>;

    /// Most recent records first.
    fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>>;
}

/// One JSON object per line, appended to a file.
pub struct JsonLinesHistory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesHistory {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonLinesHistory {
    fn record(&self, record: &HistoryRecord) -> Result<()> {
        let mut line = serde_json::to_string(record).context("Failed to serialize history record")?;
        line.push('\n');

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history file: {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("Failed to append to history file: {}", self.path.display()))?;
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open history file: {}", self.path.display()))?;

        let mut records = Vec::new();
        for (line_idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read history line {}", line_idx + 1))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: HistoryRecord = serde_json::from_str(&line)
                .with_context(|| format!("Invalid history record at line {}", line_idx + 1))?;
            records.push(record);
        }

        records.reverse();
        records.truncate(limit);
        Ok(records)
    }
}

/// Keeps history in memory; handy for tests and throwaway servers.
#[derive(Default)]
pub struct MemoryHistory {
    records: Mutex<Vec<HistoryRecord>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoryStore for MemoryHistory {
    fn record(&self, record: &HistoryRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<HistoryRecord>> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}
