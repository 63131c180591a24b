use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, ExcelDateTime, Range, Reader};
use chrono::Timelike;
use tracing::debug;

use super::{Grid, Sheet, Workbook, WorkbookError, WorkbookResult};

/// Spreadsheet file read through calamine. The file is reopened on every
/// lookup so each flow sees the workbook as it is on disk right now.
#[derive(Debug, Clone)]
pub struct XlsxWorkbook {
    path: PathBuf,
}

impl XlsxWorkbook {
    pub fn open(path: &Path) -> WorkbookResult<Self> {
        if !path.is_file() {
            return Err(WorkbookError::Open {
                path: path.to_path_buf(),
                message: "file not found".to_string(),
            });
        }
        Ok(Self { path: path.to_path_buf() })
    }

    fn open_err(&self, e: calamine::Error) -> WorkbookError {
        WorkbookError::Open { path: self.path.clone(), message: e.to_string() }
    }
}

impl Workbook for XlsxWorkbook {
    fn sheet_by_name(&self, name: &str) -> WorkbookResult<Option<Sheet>> {
        let mut sheets = open_workbook_auto(&self.path).map_err(|e| self.open_err(e))?;
        if !sheets.sheet_names().iter().any(|s| s == name) {
            return Ok(None);
        }
        let range = sheets.worksheet_range(name).map_err(|e| WorkbookError::Read {
            sheet: name.to_string(),
            message: e.to_string(),
        })?;
        let rows = range_to_grid(&range);
        debug!(target: "sheetsync::sheet", "xlsx sheet '{}' loaded: rows={}", name, rows.len());
        Ok(Some(Sheet::new(name, rows)))
    }

    fn sheet_names(&self) -> WorkbookResult<Vec<String>> {
        let sheets = open_workbook_auto(&self.path).map_err(|e| self.open_err(e))?;
        Ok(sheets.sheet_names())
    }
}

// calamine ranges start at the first used cell; rows and columns are rebuilt
// from A1 so positional header mapping matches what the sheet shows.
fn range_to_grid(range: &Range<Data>) -> Grid {
    let Some((end_row, end_col)) = range.end() else { return Vec::new() };
    let mut rows = Vec::with_capacity(end_row as usize + 1);
    for r in 0..=end_row {
        let mut row = Vec::with_capacity(end_col as usize + 1);
        for c in 0..=end_col {
            row.push(range.get_value((r, c)).map(cell_text).unwrap_or_default());
        }
        rows.push(row);
    }
    rows
}

/// Text form of a cell: integral floats print without a fractional part, empty cells as `""`,
/// date cells as `YYYY-MM-DD` (with `HH:MM:SS` when the time is not midnight).
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => date_text(dt).unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

// Durations keep their serial form; they have no calendar date.
fn date_text(dt: &ExcelDateTime) -> Option<String> {
    if dt.is_duration() {
        return None;
    }
    let at = dt.as_datetime()?;
    let fmt = if at.num_seconds_from_midnight() == 0 { "%Y-%m-%d" } else { "%Y-%m-%d %H:%M:%S" };
    Some(at.format(fmt).to_string())
}
