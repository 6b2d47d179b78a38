use crate::error::{AnalyzerError, Result};
use crate::schema::{CellValue, Row, StatementHeaders, StatementTable};
use log::debug;
use std::io::Read;
use std::path::Path;

/// Reader failures stay I/O errors; malformed or non-UTF-8 content is a
/// structure error.
fn csv_error(e: csv::Error) -> AnalyzerError {
    if e.is_io_error() {
        AnalyzerError::Csv(e)
    } else {
        AnalyzerError::Structure(format!("Input is not a readable table: {}", e))
    }
}

/// Number of leading columns a statement is built from: label, prior, current.
pub const REQUIRED_COLUMNS: usize = 3;

/// A 2-D grid straight from a spreadsheet or CSV file. The first source row
/// is taken as the header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { headers, rows }
    }

    /// Widest of the header row and every data row.
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record.map_err(csv_error)?;
            rows.push(record.iter().map(CellValue::from).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Reads the first worksheet of an xlsx/xls/xlsb/ods workbook.
    #[cfg(feature = "xlsx")]
    pub fn from_spreadsheet_path(path: &Path) -> Result<Self> {
        use calamine::{open_workbook_auto, Data, Reader};

        let mut workbook =
            open_workbook_auto(path).map_err(|e| AnalyzerError::Spreadsheet(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AnalyzerError::Structure("Workbook contains no worksheets".to_string()))?
            .map_err(|e| AnalyzerError::Spreadsheet(e.to_string()))?;

        let mut grid = range.rows().map(|cells| {
            cells
                .iter()
                .map(|cell| match cell {
                    Data::Empty => CellValue::Empty,
                    Data::String(s) => CellValue::from(s.as_str()),
                    Data::Float(n) => CellValue::Number(*n),
                    Data::Int(n) => CellValue::Number(*n as f64),
                    Data::Bool(b) => CellValue::Bool(*b),
                    Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
                    Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
                    Data::Error(_) => CellValue::Empty,
                })
                .collect::<Vec<_>>()
        });

        let headers = grid
            .next()
            .ok_or_else(|| AnalyzerError::Structure("Worksheet is empty".to_string()))?
            .iter()
            .map(CellValue::to_label)
            .collect();

        Ok(Self {
            headers,
            rows: grid.collect(),
        })
    }
}

/// Declares the first three columns as (label, prior, current) and coerces
/// the two value columns to numbers. Extra columns are dropped; no row is.
pub fn build_statement_table(raw: &RawTable) -> Result<StatementTable> {
    let width = raw.width();
    if width < REQUIRED_COLUMNS {
        return Err(AnalyzerError::Structure(format!(
            "Expected at least {} columns (label, prior period, current period), found {}",
            REQUIRED_COLUMNS, width
        )));
    }

    if width > REQUIRED_COLUMNS {
        debug!(
            "Dropping {} extra column(s) beyond label/prior/current",
            width - REQUIRED_COLUMNS
        );
    }

    let header = |idx: usize, fallback: String| {
        raw.headers
            .get(idx)
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .unwrap_or(fallback)
    };
    let defaults = StatementHeaders::default();
    let headers = StatementHeaders {
        label: header(0, defaults.label),
        prior: header(1, defaults.prior),
        current: header(2, defaults.current),
    };

    let cell = |cells: &[CellValue], idx: usize| cells.get(idx).cloned().unwrap_or(CellValue::Empty);
    let rows = raw
        .rows
        .iter()
        .map(|cells| Row {
            label: cell(cells.as_slice(), 0).to_label(),
            prior: cell(cells.as_slice(), 1).to_number(),
            current: cell(cells.as_slice(), 2).to_number(),
        })
        .collect();

    Ok(StatementTable::with_headers(headers, rows))
}

impl TryFrom<&RawTable> for StatementTable {
    type Error = AnalyzerError;

    fn try_from(raw: &RawTable) -> Result<Self> {
        build_statement_table(raw)
    }
}

pub fn load_statement_csv(path: &Path) -> Result<StatementTable> {
    build_statement_table(&RawTable::from_csv_path(path)?)
}

/// Loads a statement by extension: spreadsheets need the `xlsx` feature,
/// everything else is read as CSV.
pub fn load_statement(path: &Path) -> Result<StatementTable> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => load_spreadsheet(path),
        _ => load_statement_csv(path),
    }
}

#[cfg(feature = "xlsx")]
fn load_spreadsheet(path: &Path) -> Result<StatementTable> {
    build_statement_table(&RawTable::from_spreadsheet_path(path)?)
}

#[cfg(not(feature = "xlsx"))]
fn load_spreadsheet(path: &Path) -> Result<StatementTable> {
    Err(AnalyzerError::Spreadsheet(format!(
        "{} is a spreadsheet; rebuild with the `xlsx` feature to read it",
        path.display()
    )))
}
