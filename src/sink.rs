use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::db;
use crate::export;
use crate::record::BreedRecord;

/// Where validated records end up.
pub trait RecordSink {
    /// Is a record with this resolved name already stored?
    fn contains(&self, name: &str) -> Result<bool>;
    fn store(&mut self, record: &BreedRecord) -> Result<()>;
    /// Make everything stored so far durable. Pages are marked processed
    /// only after this succeeds.
    fn commit(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    Stored,
    Duplicate,
}

/// Store `record` unless its name is already present. Duplicates are not
/// errors.
pub fn ingest<S: RecordSink + ?Sized>(sink: &mut S, record: &BreedRecord) -> Result<Ingest> {
    if sink.contains(&record.name)? {
        info!("Skipping {} - already stored", record.name);
        return Ok(Ingest::Duplicate);
    }
    sink.store(record)?;
    if record.traits.all_absent() {
        warn!("{} stored without any trait scores", record.name);
    }
    debug!(
        breed = %record.name,
        missing = ?record.missing_fields(),
        "stored breed"
    );
    Ok(Ingest::Stored)
}

pub struct SqliteSink<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSink<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        SqliteSink { conn }
    }
}

impl RecordSink for SqliteSink<'_> {
    fn contains(&self, name: &str) -> Result<bool> {
        db::breed_exists(self.conn, name)
    }

    fn store(&mut self, record: &BreedRecord) -> Result<()> {
        db::insert_breed(self.conn, record)
    }

    // Each insert is already committed.
    fn commit(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collects records in memory and rewrites one JSON document on every
/// commit.
pub struct JsonSink {
    path: PathBuf,
    names: HashSet<String>,
    records: Vec<BreedRecord>,
}

impl JsonSink {
    /// Records go to `dog_breeds_<timestamp>.json` in `dir`.
    pub fn new(dir: &Path) -> Self {
        JsonSink {
            path: export::timestamped_path(dir, "dog_breeds"),
            names: HashSet::new(),
            records: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordSink for JsonSink {
    fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.names.contains(name))
    }

    fn store(&mut self, record: &BreedRecord) -> Result<()> {
        self.names.insert(record.name.clone());
        self.records.push(record.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.records.is_empty() {
            return Ok(());
        }
        export::write_json_to(&self.path, &self.records)
    }
}

// ── Tests ──
