use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Column order of the backing file. The JSON wire shape of a record uses
/// the same capitalized keys.
pub const HEADER: [&str; 3] = ["Name", "Email", "Date"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Date")]
    pub date: String,
}

/// Append-only CSV store for registration rows.
///
/// The file is not locked: a writer in another process can interleave with
/// us. Accepted limitation for a single-user local tool.
#[derive(Clone, Debug)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row, creating the file with its header row when absent.
    pub fn append(&self, record: &Record) -> Result<()> {
        if !self.path.exists() {
            let file = File::create(&self.path)
                .with_context(|| format!("create {}", self.path.display()))?;
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(HEADER)?;
            writer.flush()?;
        }
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {} for append", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record([
            record.name.as_str(),
            record.email.as_str(),
            record.date.as_str(),
        ])?;
        writer.flush()?;
        Ok(())
    }

    /// Full scan of the file. A missing file reads as an empty store.
    /// Fields are trimmed; rows with any field missing or empty are
    /// silently dropped.
    pub fn read_all(&self) -> Result<Vec<Record>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let name = row.get(0).unwrap_or("").trim();
            let email = row.get(1).unwrap_or("").trim();
            let date = row.get(2).unwrap_or("").trim();
            if name.is_empty() || email.is_empty() || date.is_empty() {
                continue;
            }
            records.push(Record {
                name: name.to_string(),
                email: email.to_string(),
                date: date.to_string(),
            });
        }
        Ok(records)
    }
}
