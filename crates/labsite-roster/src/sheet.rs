//! Spreadsheet loading.
//!
//! Reads the first worksheet of a workbook (or a CSV export of it) into a
//! rectangular grid of strings with a header row.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

/// A loaded worksheet: one header row plus data rows, all cells as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    /// Column headers, de-duplicated
    pub headers: Vec<String>,

    /// Data rows, each padded to the header width
    pub rows: Vec<Vec<String>>,
}

/// Errors that can occur when loading a spreadsheet.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Unsupported spreadsheet format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to open workbook {path}: {message}")]
    Workbook { path: String, message: String },

    #[error("Workbook has no worksheets: {0}")]
    NoWorksheet(String),

    #[error("Failed to read CSV {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Spreadsheet is empty: {0}")]
    Empty(String),
}

impl Sheet {
    /// Build a sheet from a raw header row and raw data rows.
    ///
    /// Headers are de-duplicated, short rows are padded and fully blank rows
    /// are dropped.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers = dedupe_headers(headers);
        let width = headers.len();

        let rows = rows
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();

        Self { headers, rows }
    }

    /// Index of the column with the given header.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell text, or an empty string when out of range.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the sheet has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Load the first worksheet of a spreadsheet file.
///
/// The format is chosen by extension: Excel/OpenDocument workbooks go through
/// calamine, `.csv` through the csv reader.
pub fn load_sheet(path: &Path) -> Result<Sheet, SheetError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let grid = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path)?,
        "csv" => read_csv(path)?,
        _ => return Err(SheetError::UnsupportedFormat(path.display().to_string())),
    };

    let mut rows = grid.into_iter();
    let Some(headers) = rows.next() else {
        return Err(SheetError::Empty(path.display().to_string()));
    };

    let sheet = Sheet::from_rows(headers, rows.collect());
    tracing::debug!(
        "Loaded {} rows with columns {:?} from {}",
        sheet.len(),
        sheet.headers,
        path.display()
    );

    Ok(sheet)
}

fn read_workbook(path: &Path) -> Result<Vec<Vec<String>>, SheetError> {
    let workbook_error = |message: String| SheetError::Workbook {
        path: path.display().to_string(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetError::NoWorksheet(path.display().to_string()))?
        .map_err(|e| workbook_error(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn read_csv(path: &Path) -> Result<Vec<Vec<String>>, SheetError> {
    let csv_error = |source: csv::Error| SheetError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        grid.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    // Excel writes a byte-order mark at the start of CSV exports
    if let Some(first) = grid.first_mut().and_then(|row| row.first_mut()) {
        *first = first.trim_start_matches('\u{feff}').to_string();
    }

    Ok(grid)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Make header names unique: repeats get `.1`, `.2`, ... suffixes and blank
/// headers become `Unnamed: <index>`.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();

    headers
        .into_iter()
        .enumerate()
        .map(|(index, header)| {
            let header = header.trim();
            let base = if header.is_empty() {
                format!("Unnamed: {}", index)
            } else {
                header.to_string()
            };

            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}
