//! Tabular export of extracted records: CSV and a plain terminal table.
//!
//! Columns are the union of every record's keys. The preferred columns
//! (see [`PREFERRED_COLUMNS`]) come first when present; the rest follow in
//! order of first appearance. Cells a record does not have are left empty.

use crate::error::StatementError;
use crate::output::{ExtractedRecord, PREFERRED_COLUMNS};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Default file name used by the CLI when CSV output is requested without a path.
pub const DEFAULT_CSV_NAME: &str = "parsed_statements.csv";

/// Widest cell rendered by [`render_table`] before eliding.
const MAX_CELL_WIDTH: usize = 40;

/// Column names for `records`, preferred order first.
pub fn columns(records: &[ExtractedRecord]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for record in records {
        for (key, _) in record.to_row() {
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
    }

    let mut cols: Vec<String> = PREFERRED_COLUMNS
        .iter()
        .filter(|c| seen.iter().any(|s| s == *c))
        .map(|c| c.to_string())
        .collect();
    cols.extend(
        seen.into_iter()
            .filter(|s| !PREFERRED_COLUMNS.contains(&s.as_str())),
    );
    cols
}

/// Text form of a cell: strings unquoted, null empty, everything else JSON.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn rows(records: &[ExtractedRecord], cols: &[String]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| {
            let row: HashMap<String, Value> = record.to_row().into_iter().collect();
            cols.iter()
                .map(|c| row.get(c).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect()
}

/// Write `records` as CSV with a header row.
pub fn write_csv<W: Write>(records: &[ExtractedRecord], writer: W) -> Result<(), StatementError> {
    let cols = columns(records);
    if cols.is_empty() {
        return Ok(());
    }
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&cols)?;
    for row in rows(records, &cols) {
        csv.write_record(&row)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// CSV as an in-memory string.
pub fn to_csv_string(records: &[ExtractedRecord]) -> Result<String, StatementError> {
    let mut buf = Vec::new();
    write_csv(records, &mut buf)?;
    String::from_utf8(buf).map_err(|e| StatementError::Internal(format!("CSV is not UTF-8: {e}")))
}

/// Write CSV to `path` atomically: a temp file in the same directory is
/// renamed over `path`, and removed again if anything fails.
pub fn write_csv_file(records: &[ExtractedRecord], path: &Path) -> Result<(), StatementError> {
    let write_err = |source: std::io::Error| StatementError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(write_err)?;
            parent
        }
        None => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".statements-")
        .suffix(".csv.tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;
    write_csv(records, tmp.as_file_mut())?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Render `records` as an aligned plain-text table.
pub fn render_table(records: &[ExtractedRecord]) -> String {
    let cols = columns(records);
    let body: Vec<Vec<String>> = rows(records, &cols)
        .into_iter()
        .map(|row| row.into_iter().map(|c| elide(&c)).collect())
        .collect();

    let widths: Vec<usize> = cols
        .iter()
        .enumerate()
        .map(|(i, c)| {
            body.iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_line(&mut out, &cols, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for row in &body {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn elide(cell: &str) -> String {
    let flat = cell.replace(['\n', '\r'], " ");
    if flat.chars().count() <= MAX_CELL_WIDTH {
        return flat;
    }
    let kept: String = flat.chars().take(MAX_CELL_WIDTH - 1).collect();
    format!("{kept}\u{2026}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentError;
    use crate::output::StatementFields;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn ok(name: &str, issuer: &str) -> ExtractedRecord {
        ExtractedRecord::success(
            name,
            StatementFields {
                issuer: Some(issuer.into()),
                account_last_4: json!("1234"),
                statement_date: json!("2024-03-15"),
                due_date: Value::Null,
                total_balance: json!(1234.5),
                extra: BTreeMap::new(),
            },
        )
    }

    fn failed(name: &str) -> ExtractedRecord {
        ExtractedRecord::failure(
            name,
            &DocumentError::Transport {
                message: "connection refused".into(),
                status: None,
            },
        )
    }

    #[test]
    fn columns_put_preferred_first_then_first_seen() {
        let cols = columns(&[failed("b.pdf"), ok("a.pdf", "Chase Bank")]);
        assert_eq!(
            cols,
            vec![
                "filename",
                "issuer",
                "total_balance",
                "due_date",
                "statement_date",
                "account_last_4",
                "error",
                "details"
            ]
        );
    }

    #[test]
    fn csv_has_header_and_blank_missing_cells() {
        let csv = to_csv_string(&[ok("a.pdf", "Chase Bank"), failed("b.pdf")]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "filename,issuer,total_balance,due_date,statement_date,account_last_4,error,details"
        );
        assert_eq!(lines[1], "a.pdf,Chase Bank,1234.5,,2024-03-15,1234,,");
        assert_eq!(
            lines[2],
            "b.pdf,,,,,,connection refused,Model failed to return JSON"
        );
    }

    #[test]
    fn csv_quotes_commas() {
        let csv = to_csv_string(&[ok("a.pdf", "Bank of Nowhere, N.A.")]).unwrap();
        assert!(csv.contains("\"Bank of Nowhere, N.A.\""));
    }

    #[test]
    fn csv_file_is_written_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join(DEFAULT_CSV_NAME);
        write_csv_file(&[ok("a.pdf", "Chase Bank")], &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("filename,"));
        let names: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(DEFAULT_CSV_NAME)]);
    }

    #[test]
    fn failed_csv_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory already occupies the target name, so the final rename fails.
        let path = dir.path().join(DEFAULT_CSV_NAME);
        std::fs::create_dir(&path).unwrap();

        let err = write_csv_file(&[ok("a.pdf", "Chase Bank")], &path).unwrap_err();
        assert!(matches!(err, StatementError::OutputWriteFailed { .. }));

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(DEFAULT_CSV_NAME)]);
    }

    #[test]
    fn table_aligns_columns_and_elides_long_cells() {
        let long = "x".repeat(80);
        let table = render_table(&[ok("a.pdf", &long), ok("bb.pdf", "Chase Bank")]);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("filename  issuer"));
        assert!(lines[1].starts_with("--------  "));
        assert!(lines[2].contains('\u{2026}'));
        assert!(!lines[2].contains(&long));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn empty_batch_writes_nothing() {
        assert_eq!(columns(&[]), Vec::<String>::new());
        assert_eq!(to_csv_string(&[]).unwrap(), "");
    }
}
