//! Tabular input/output for Shopify product CSVs.
//!
//! A [`Table`] is a header row plus string cells. Columns are discovered by
//! header name; a missing column is not an error, it just contributes no
//! values. Rows shorter than the header are padded with empty cells; a row
//! longer than the header widens the table with unnamed columns, so no cell
//! is ever dropped.

mod rewrite;

pub use rewrite::{
    DEFAULT_MAPPING_FILE, MAPPED_IMAGE_COLUMN, MAPPED_VARIANT_COLUMN, MAPPING_PUBLISHED_COLUMN,
    MAPPING_SOURCE_COLUMN, MappingFallback, OUTPUT_SUFFIX, augmented_output_path, mapping_table,
    rewrite,
};

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Primary product image column.
pub const IMAGE_SRC_COLUMN: &str = "Image Src";

/// Variant image column.
pub const VARIANT_IMAGE_COLUMN: &str = "Variant Image";

/// Columns scanned for image URLs, in scan order.
pub const IMAGE_COLUMNS: [&str; 2] = [IMAGE_SRC_COLUMN, VARIANT_IMAGE_COLUMN];

/// Errors reading or writing tables.
#[derive(Debug, Error)]
pub enum TableError {
    /// File could not be opened, created, or flushed.
    #[error("IO error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// CSV syntax or encoding problem.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// File involved.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },
}

impl TableError {
    fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }

    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Header-addressed table of string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates an empty table with the given header row.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding it to the header width.
    ///
    /// A row wider than the header adds unnamed (empty) header cells and pads
    /// every earlier row to match.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        if row.len() > self.headers.len() {
            warn!(
                row = self.rows.len() + 1,
                cells = row.len(),
                columns = self.headers.len(),
                "row has more cells than headers; adding unnamed columns"
            );
            self.headers.resize(row.len(), String::new());
            for earlier in &mut self.rows {
                earlier.resize(row.len(), String::new());
            }
        }
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Returns the header row.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Returns all data rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the index of the first column named `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Returns every cell of column `name` in row order, or `None` when the
    /// column is absent.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &str>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[index].as_str()))
    }

    /// Returns the cell at (`row`, `name`).
    #[must_use]
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let index = self.column_index(name)?;
        self.rows.get(row).map(|cells| cells[index].as_str())
    }

    /// Returns the index of column `name`, appending it when missing.
    pub(crate) fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Overwrites a cell. Out-of-range coordinates are ignored.
    pub(crate) fn set_cell(&mut self, row: usize, column: usize, value: String) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|cells| cells.get_mut(column)) {
            *cell = value;
        }
    }

    /// Parses CSV from any reader. The first record is the header row.
    ///
    /// # Errors
    ///
    /// Returns [`csv::Error`] on malformed CSV or invalid UTF-8.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let mut table = Self::new(reader.headers()?.iter());
        for record in reader.records() {
            table.push_row(record?.iter());
        }
        Ok(table)
    }

    /// Serializes the table as CSV into any writer.
    ///
    /// # Errors
    ///
    /// Returns [`csv::Error`] when writing fails.
    pub fn to_writer<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Reads a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] when the file cannot be opened or parsed.
    #[instrument(fields(path = %path.display()))]
    pub fn read_path(path: &Path) -> Result<Self, TableError> {
        let file = std::fs::File::open(path).map_err(|e| TableError::io(path, e))?;
        let table = Self::from_reader(io::BufReader::new(file)).map_err(|e| TableError::csv(path, e))?;
        debug!(rows = table.len(), columns = table.headers.len(), "table loaded");
        Ok(table)
    }

    /// Writes the table to a CSV file, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] when the file cannot be created or written.
    #[instrument(skip(self), fields(path = %path.display(), rows = self.len()))]
    pub fn write_path(&self, path: &Path) -> Result<(), TableError> {
        let file = std::fs::File::create(path).map_err(|e| TableError::io(path, e))?;
        self.to_writer(io::BufWriter::new(file))
            .map_err(|e| TableError::csv(path, e))?;
        debug!("table written");
        Ok(())
    }
}
