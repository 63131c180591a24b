//! Workbook sources.
//! A workbook hands out sheets by name; a sheet hands out a rectangular grid of
//! text cells for a column span such as `A:C`. Cells are coerced to text at
//! this boundary so the serializer only ever sees strings.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub mod csv_dir;
pub mod xlsx;

pub use csv_dir::CsvWorkbook;
pub use xlsx::XlsxWorkbook;

/// Rows of text cells, row 0 being the header row.
pub type Grid = Vec<Vec<String>>;

#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    #[error("failed to open workbook '{path}': {message}")]
    Open { path: PathBuf, message: String },
    #[error("failed to read sheet '{sheet}': {message}")]
    Read { sheet: String, message: String },
    #[error("invalid column range '{0}'")]
    InvalidRange(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type WorkbookResult<T> = Result<T, WorkbookError>;

/// Columns in a worksheet (`A` through `XFD`).
pub const MAX_COLUMNS: usize = 16_384;

/// Inclusive, zero-based column span parsed from spreadsheet notation (`A:C`, `B:AA`, `D`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRange {
    pub first: usize,
    pub last: usize,
}

impl ColumnRange {
    pub fn parse(spec: &str) -> WorkbookResult<Self> {
        let trimmed = spec.trim();
        let (a, b) = match trimmed.split_once(':') {
            Some((a, b)) => (a, b),
            None => (trimmed, trimmed),
        };
        let first = column_index(a).ok_or_else(|| WorkbookError::InvalidRange(spec.to_string()))?;
        let last = column_index(b).ok_or_else(|| WorkbookError::InvalidRange(spec.to_string()))?;
        if last < first || last >= MAX_COLUMNS {
            return Err(WorkbookError::InvalidRange(spec.to_string()));
        }
        Ok(Self { first, last })
    }

    pub fn width(&self) -> usize {
        self.last - self.first + 1
    }

    /// Cut a raw row down to this span, padding absent cells with `""`.
    pub fn project(&self, row: &[String]) -> Vec<String> {
        (self.first..=self.last)
            .map(|i| row.get(i).cloned().unwrap_or_default())
            .collect()
    }
}

impl Default for ColumnRange {
    fn default() -> Self {
        Self { first: 0, last: 2 }
    }
}

impl Display for ColumnRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", column_letters(self.first), column_letters(self.last))
    }
}

fn column_index(letters: &str) -> Option<usize> {
    let letters = letters.trim();
    if letters.is_empty() {
        return None;
    }
    let mut idx: usize = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let v = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        idx = idx.checked_mul(26)?.checked_add(v)?;
    }
    Some(idx - 1)
}

fn column_letters(mut idx: usize) -> String {
    let mut out = Vec::new();
    loop {
        out.push((b'A' + (idx % 26) as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    out.iter().rev().collect()
}

/// A single named sheet, already coerced to text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    rows: Grid,
}

impl Sheet {
    pub fn new<S: Into<String>>(name: S, rows: Grid) -> Self {
        Self { name: name.into(), rows }
    }

    /// Values for the column span, one entry per sheet row, each exactly `range.width()` wide.
    pub fn values(&self, range: ColumnRange) -> Grid {
        self.rows.iter().map(|r| range.project(r)).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

pub trait Workbook {
    /// `Ok(None)` when the workbook has no sheet with that name.
    fn sheet_by_name(&self, name: &str) -> WorkbookResult<Option<Sheet>>;

    fn sheet_names(&self) -> WorkbookResult<Vec<String>>;
}

/// Workbook held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: HashMap<String, Grid>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet<S: Into<String>>(mut self, name: S, rows: Grid) -> Self {
        self.sheets.insert(name.into(), rows);
        self
    }
}

impl Workbook for MemoryWorkbook {
    fn sheet_by_name(&self, name: &str) -> WorkbookResult<Option<Sheet>> {
        Ok(self.sheets.get(name).map(|rows| Sheet::new(name, rows.clone())))
    }

    fn sheet_names(&self) -> WorkbookResult<Vec<String>> {
        let mut names: Vec<String> = self.sheets.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// Open a workbook from disk: a directory is read as one CSV file per sheet,
/// anything else goes through calamine (xlsx, xlsm, xls, ods).
pub fn open_workbook(path: &Path) -> WorkbookResult<Box<dyn Workbook>> {
    if path.is_dir() {
        Ok(Box::new(CsvWorkbook::new(path)))
    } else {
        Ok(Box::new(XlsxWorkbook::open(path)?))
    }
}

impl<W: Workbook + ?Sized> Workbook for Box<W> {
    fn sheet_by_name(&self, name: &str) -> WorkbookResult<Option<Sheet>> {
        (**self).sheet_by_name(name)
    }

    fn sheet_names(&self) -> WorkbookResult<Vec<String>> {
        (**self).sheet_names()
    }
}
