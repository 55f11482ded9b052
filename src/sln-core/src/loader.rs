//! Dataset loading
//!
//! Reads the salary CSV fully into memory and derives the label columns. Any
//! failure is reported as [`Error::DataUnavailable`]; a table is never loaded
//! partially.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use polars::prelude::*;

use crate::error::{Error, Result};
use crate::table::DerivedTable;

/// Default input path, relative to the working directory
pub const DEFAULT_DATA_PATH: &str = "salaries.csv";

/// Options for reading the salary file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Field separator
    pub separator: u8,
    /// Number of rows used for schema inference (None scans the whole file)
    pub infer_schema_length: Option<usize>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            separator: b',',
            infer_schema_length: Some(100),
        }
    }
}

/// Load and derive the salary table at `path`
pub fn load<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<DerivedTable> {
    let path = path.as_ref();
    log::debug!("Loading salary data from {}", path.display());

    if !path.is_file() {
        return Err(Error::data_unavailable(path, "file not found"));
    }

    let frame = read_csv(path, options).map_err(|e| Error::data_unavailable(path, e.to_string()))?;
    let table = DerivedTable::derive(frame, path)?;

    log::info!(
        "Loaded {} salary records from {}",
        table.height(),
        path.display()
    );
    Ok(table)
}

fn read_csv(path: &Path, options: &ReadOptions) -> PolarsResult<DataFrame> {
    let mut csv_options = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(options.infer_schema_length);

    let mut parse_opts = (*csv_options.parse_options).clone();
    parse_opts.separator = options.separator;
    csv_options.parse_options = Arc::new(parse_opts);

    csv_options
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

/// Load-once holder for the salary table
///
/// The first successful [`DatasetCache::get`] reads the file; later calls hand
/// out the same shared table without touching the filesystem. Failed loads are
/// not cached, so a later call retries.
#[derive(Debug)]
pub struct DatasetCache {
    path: PathBuf,
    options: ReadOptions,
    table: OnceCell<Arc<DerivedTable>>,
}

impl DatasetCache {
    /// Create an empty cache for `path`
    pub fn new(path: impl Into<PathBuf>, options: ReadOptions) -> Self {
        Self {
            path: path.into(),
            options,
            table: OnceCell::new(),
        }
    }

    /// Path of the cached dataset
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the table has been loaded
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    /// The shared table, loading it on first use
    pub fn get(&self) -> Result<Arc<DerivedTable>> {
        self.table
            .get_or_try_init(|| load(&self.path, &self.options).map(Arc::new))
            .map(Arc::clone)
    }
}
