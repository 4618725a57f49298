// ==========================================
// Rural Sales IMS - workbook parsing
// ==========================================
// Supports: Excel (.xlsx/.xls) via calamine, CSV (.csv) as a single sheet
// Output: cleaned sheets (blank rows/columns dropped, headers
// uppercase-trimmed), ready for classification
// ==========================================

use crate::domain::sheet::{CleanSheet, RawSheet};
use crate::importer::error::ImportError;
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

/// Parse any supported file into raw sheets, chosen by extension.
pub struct WorkbookParser;

impl WorkbookParser {
    pub fn parse<P: AsRef<Path>>(file_path: P) -> Result<Vec<RawSheet>, ImportError> {
        let path = file_path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "xlsx" | "xls" => Self::parse_excel(path),
            "csv" => Self::parse_csv(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }

    /// All worksheets of an Excel workbook.
    fn parse_excel(path: &Path) -> Result<Vec<RawSheet>, ImportError> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let sheet_names = workbook.sheet_names().to_vec();
        if sheet_names.is_empty() {
            return Err(ImportError::ExcelParseError(
                "workbook has no worksheets".to_string(),
            ));
        }

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for sheet_name in sheet_names {
            let range = workbook
                .worksheet_range(&sheet_name)
                .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

            let rows = range
                .rows()
                .map(|row| row.iter().map(cell_to_string).collect())
                .collect();

            sheets.push(RawSheet {
                name: sheet_name,
                rows,
            });
        }
        Ok(sheets)
    }

    /// A CSV file as a single sheet named after the file stem.
    fn parse_csv(path: &Path) -> Result<Vec<RawSheet>, ImportError> {
        let file = File::open(path).map_err(|e| ImportError::FileReadError(e.to_string()))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| ImportError::CsvParseError(e.to_string()))?;
            rows.push(record.iter().map(|v| v.trim().to_string()).collect());
        }

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("sheet")
            .to_string();

        Ok(vec![RawSheet { name, rows }])
    }
}

/// Clean a raw sheet: the first non-blank row becomes the header row
/// (uppercase, trimmed), fully blank rows and columns are dropped.
///
/// When nothing survives the result is an empty shell; the classifier
/// reports it as Empty via `CleanSheet::is_empty`.
pub fn clean_sheet(raw: &RawSheet) -> CleanSheet {
    let mut rows: Vec<&Vec<String>> = raw
        .rows
        .iter()
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();

    if rows.is_empty() {
        return CleanSheet {
            name: raw.name.clone(),
            headers: Vec::new(),
            rows: Vec::new(),
        };
    }

    let header_row = rows.remove(0);
    let width = rows
        .iter()
        .map(|r| r.len())
        .chain(std::iter::once(header_row.len()))
        .max()
        .unwrap_or(0);

    // keep a column when the header or any data cell is non-blank
    let keep: Vec<bool> = (0..width)
        .map(|j| {
            let header_filled = header_row.get(j).map_or(false, |c| !c.is_empty());
            header_filled
                || rows
                    .iter()
                    .any(|row| row.get(j).map_or(false, |c| !c.is_empty()))
        })
        .collect();

    let project = |row: &Vec<String>| -> Vec<String> {
        (0..width)
            .filter(|&j| keep[j])
            .map(|j| row.get(j).cloned().unwrap_or_default())
            .collect()
    };

    let headers = project(header_row)
        .into_iter()
        .map(|h| h.trim().to_uppercase())
        .collect();
    let data_rows = rows.into_iter().map(project).collect();

    CleanSheet {
        name: raw.name.clone(),
        headers,
        rows: data_rows,
    }
}

/// Render a calamine cell as the trimmed string the pipeline works with.
///
/// Whole floats print without the trailing ".0" so serial numbers and
/// invoice codes survive Excel's numeric typing.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn raw(rows: Vec<Vec<&str>>) -> RawSheet {
        RawSheet {
            name: "Sheet1".to_string(),
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
        }
    }

    #[test]
    fn test_clean_sheet_drops_blank_rows_and_columns() {
        let sheet = raw(vec![
            vec!["Name", "", "Mobile"],
            vec!["", "", ""],
            vec!["Ramesh", "", "9876543210"],
        ]);
        let clean = clean_sheet(&sheet);
        assert_eq!(clean.headers, vec!["NAME", "MOBILE"]);
        assert_eq!(clean.rows, vec![vec!["Ramesh", "9876543210"]]);
    }

    #[test]
    fn test_clean_sheet_all_blank_is_empty() {
        let sheet = raw(vec![vec!["", ""], vec!["", ""]]);
        let clean = clean_sheet(&sheet);
        assert!(clean.is_empty());
    }

    #[test]
    fn test_csv_parse_keeps_every_row() {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "CODE,NAME,MOBILE").unwrap();
        writeln!(file, "12,Ramesh,9876543210").unwrap();
        let sheets = WorkbookParser::parse(file.path()).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].rows.len(), 2);
        assert_eq!(sheets[0].rows[1][1], "Ramesh");
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let file = NamedTempFile::with_suffix(".txt").unwrap();
        let err = WorkbookParser::parse(file.path());
        assert!(matches!(err, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_rejected() {
        let err = WorkbookParser::parse("no_such_file.xlsx");
        assert!(matches!(err, Err(ImportError::FileNotFound(_))));
    }
}
