use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Grid, Sheet, Workbook, WorkbookError, WorkbookResult};

/// A directory holding one `<sheet>.csv` file per sheet, as produced by
/// "download as CSV" from most spreadsheet applications.
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    root: PathBuf,
}

impl CsvWorkbook {
    pub fn new(root: &Path) -> Self {
        Self { root: root.to_path_buf() }
    }

    fn sheet_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.csv", name))
    }
}

impl Workbook for CsvWorkbook {
    fn sheet_by_name(&self, name: &str) -> WorkbookResult<Option<Sheet>> {
        let path = self.sheet_path(name);
        if !path.is_file() {
            return Ok(None);
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .map_err(|e| WorkbookError::Open { path: path.clone(), message: e.to_string() })?;
        let mut rows: Grid = Vec::new();
        for rec in reader.records() {
            let rec = rec.map_err(|e| WorkbookError::Read { sheet: name.to_string(), message: e.to_string() })?;
            rows.push(rec.iter().map(|c| c.to_string()).collect());
        }
        debug!(target: "sheetsync::sheet", "csv sheet '{}' loaded from {}: rows={}", name, path.display(), rows.len());
        Ok(Some(Sheet::new(name, rows)))
    }

    fn sheet_names(&self) -> WorkbookResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("csv") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
