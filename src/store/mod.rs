//! # Series Store
//!
//! Append-only CSV log of a sampling run, one row per tick.
//!
//! The header is decided once, when the store is opened:
//!
//! * a fresh (missing or empty) file gets its header from the first appended sample
//! * an existing file keeps its header; later rows follow its column order, columns the
//!   header does not know are dropped and columns the sample lacks are written empty
//!
//! `Null` cells are written empty and read back as `Null`.
//!
//! Rows are flushed as they are written so that a run that dies midway still leaves a
//! loadable log behind.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::classify::TIMESTAMP_KEY;
use crate::core::types::TypedValue;
use crate::error::{Error, Result};
use crate::parser::coerce;
use crate::sample::{Cell, Sample};

/// Byte-level destination of a series log
///
/// A failed [`RowSink::append`] may have written part of its buffer; the store rolls the sink
/// back with [`RowSink::truncate`] so a log never holds a torn row.
pub trait RowSink: Send {
    /// Current length in bytes
    fn end_offset(&mut self) -> io::Result<u64>;

    fn append(&mut self, bytes: &[u8]) -> io::Result<()>;

    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl RowSink for File {
    fn end_offset(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)?;
        self.flush()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Writer half of a series log
pub struct SeriesStore {
    path: PathBuf,
    sink: Box<dyn RowSink>,
    header: Option<Vec<String>>,
    rows_written: usize,
    dropped: HashSet<String>,
}

impl std::fmt::Debug for SeriesStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesStore")
            .field("path", &self.path)
            .field("header", &self.header)
            .field("rows_written", &self.rows_written)
            .finish_non_exhaustive()
    }
}

impl SeriesStore {
    /// Opens (or creates) the log at `path`.
    ///
    /// Idempotent with respect to existing content: nothing already in the file is rewritten.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::series_write(path, e))?;

        Self::with_sink(path, file)
    }

    /// Opens the log at `path` but sends rows through `sink`.
    ///
    /// The header is still read from `path`, so `sink` should append to that same file.
    pub fn with_sink(path: impl AsRef<Path>, sink: impl RowSink + 'static) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let header = read_header(&path)?;

        let mut sink: Box<dyn RowSink> = Box::new(sink);
        if header.is_some() && !ends_with_newline(&path)? {
            sink.append(b"\n").map_err(|e| Error::series_write(&path, e))?;
        }

        match &header {
            Some(columns) => info!(path = %path.display(), columns = columns.len(), "reopened series store"),
            None => info!(path = %path.display(), "created series store"),
        }

        Ok(Self { path, sink, header, rows_written: 0, dropped: HashSet::new() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The column order rows are written in, once known
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Rows appended through this handle
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Appends one sample and returns the row exactly as it was written, aligned to the header.
    ///
    /// The first append to a fresh log writes the header first.
    pub fn append(&mut self, sample: &Sample) -> Result<Vec<Cell>> {
        self.append_cells(sample.flatten())
    }

    /// Appends one already-flattened row.
    ///
    /// The row (and the header, on a fresh log) reaches the sink as one buffer. When that write
    /// fails the sink is truncated back, so nothing of the row is left behind.
    pub fn append_cells(&mut self, cells: Vec<Cell>) -> Result<Vec<Cell>> {
        let (header, fresh) = match &self.header {
            Some(header) => (header.clone(), false),
            None => (cells.iter().map(|(k, _)| k.clone()).collect::<Vec<_>>(), true),
        };

        let row = self.align(&header, cells);

        let mut encoder = csv::WriterBuilder::new().has_headers(false).flexible(true).from_writer(Vec::new());
        if fresh {
            encoder.write_record(&header).map_err(|e| Error::series_write(&self.path, e))?;
        }
        encoder
            .write_record(row.iter().map(|(_, value)| render_cell(value)))
            .map_err(|e| Error::series_write(&self.path, e))?;
        let bytes = encoder.into_inner().map_err(|e| Error::series_write(&self.path, e.into_error()))?;

        self.write_atomically(&bytes)?;

        if fresh {
            self.header = Some(header);
        }
        self.rows_written += 1;
        Ok(row)
    }

    fn write_atomically(&mut self, bytes: &[u8]) -> Result<()> {
        let offset = self.sink.end_offset().map_err(|e| Error::series_write(&self.path, e))?;

        if let Err(e) = self.sink.append(bytes) {
            if let Err(rollback) = self.sink.truncate(offset) {
                warn!(path = %self.path.display(), error = %rollback, "failed to roll back partial row");
            }
            return Err(Error::series_write(&self.path, e));
        }
        Ok(())
    }

    fn align(&mut self, header: &[String], cells: Vec<Cell>) -> Vec<Cell> {
        let mut by_column: IndexMap<String, TypedValue> = cells.into_iter().collect();

        let row = header
            .iter()
            .map(|column| (column.clone(), by_column.shift_remove(column).unwrap_or_default()))
            .collect();

        for (column, _) in by_column {
            if self.dropped.insert(column.clone()) {
                debug!(column = %column, path = %self.path.display(), "column not in header, dropping");
            }
        }
        row
    }
}

/// Unobserved values are left empty
fn render_cell(value: &TypedValue) -> String {
    match value {
        TypedValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn read_header(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.exists() {
        return Ok(None);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::series_write(path, e))?;

    let mut record = csv::StringRecord::new();
    if !reader.read_record(&mut record).map_err(|e| Error::series_write(path, e))? {
        return Ok(None);
    }
    Ok(Some(record.iter().map(|c| c.trim().to_string()).collect()))
}

fn ends_with_newline(path: &Path) -> Result<bool> {
    let mut file = File::open(path).map_err(|e| Error::series_write(path, e))?;
    let len = file.metadata().map_err(|e| Error::series_write(path, e))?.len();
    if len == 0 {
        return Ok(true);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1)).map_err(|e| Error::series_write(path, e))?;
    file.read_exact(&mut last).map_err(|e| Error::series_write(path, e))?;
    Ok(last[0] == b'\n')
}

/// A completed series read back for batch aggregation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedSeries {
    /// Column names, with unnamed columns already removed
    pub columns: Vec<String>,
    /// Coerced cells, one `Vec` per row, aligned to `columns`
    pub rows: Vec<Vec<TypedValue>>,
}

impl LoadedSeries {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Iterates rows as `(timestamp, cells)`; the timestamp is `Null` when the log has none
    pub fn iter_rows(&self) -> impl Iterator<Item = (TypedValue, Vec<Cell>)> + '_ {
        let ts_index = self.column_index(TIMESTAMP_KEY);
        self.rows.iter().map(move |row| {
            let timestamp = ts_index.and_then(|i| row.get(i).cloned()).unwrap_or_default();
            let cells = self.columns.iter().cloned().zip(row.iter().cloned()).collect();
            (timestamp, cells)
        })
    }
}

/// Reads a whole series log.
///
/// Rows shorter than the header are padded with `Null`, longer ones are truncated. A missing
/// or empty file is an empty series.
pub fn load(path: impl AsRef<Path>) -> Result<LoadedSeries> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(LoadedSeries::default());
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    // Logs written with a trailing comma carry an unnamed last column
    let kept: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (i, name.trim().to_string()))
        .filter(|(_, name)| !name.is_empty())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let row = kept
            .iter()
            .map(|(i, _)| record.get(*i).map(load_cell).unwrap_or_default())
            .collect();
        rows.push(row);
    }

    debug!(path = %path.display(), rows = rows.len(), columns = kept.len(), "loaded series");
    Ok(LoadedSeries { columns: kept.into_iter().map(|(_, name)| name).collect(), rows })
}

/// Empty cells read back as `Null`, everything else goes through the same coercion as a dump
fn load_cell(cell: &str) -> TypedValue {
    let cell = cell.trim();
    if cell.is_empty() {
        TypedValue::Null
    } else {
        coerce(cell)
    }
}
