//! Per-page CSV output.
//!
//! Files are written atomically: the CSV goes to a temp file in the output
//! directory and is persisted under the final name, so a crash never leaves
//! a half-written CSV behind. If anything fails the temp file is removed on
//! drop. An empty table produces an empty file rather than no file.

use crate::output::ExtractedTable;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// `vision_extracted_<base>_page_<N>.csv`
pub fn output_file_name(base_name: &str, page_num: usize) -> String {
    format!("vision_extracted_{base_name}_page_{page_num}.csv")
}

/// Full output path for page `page_num` of `base_name` inside `dir`.
pub fn output_path(dir: &Path, base_name: &str, page_num: usize) -> PathBuf {
    dir.join(output_file_name(base_name, page_num))
}

/// Write `table` as CSV to `path`: header row first, no index column.
pub fn write_table(path: &Path, table: &ExtractedTable) -> Result<(), csv::Error> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".vision-csv-")
        .suffix(".tmp")
        .tempfile_in(dir)?;

    {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(tmp.as_file_mut());
        if !table.headers.is_empty() {
            writer.write_record(&table.headers)?;
        }
        for row in &table.rows {
            writer.write_record(row)?;
        }
        // Check for error rather than implicitly flushing on drop.
        writer.flush()?;
    }

    persist(tmp, path)
}

fn persist(tmp: NamedTempFile, path: &Path) -> Result<(), csv::Error> {
    tmp.persist(path)
        .map(|_| ())
        .map_err(|e| csv::Error::from(std::io::Error::from(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_pattern() {
        assert_eq!(
            output_file_name("annual report", 12),
            "vision_extracted_annual report_page_12.csv"
        );
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path(dir.path(), "doc", 1);
        let table = ExtractedTable {
            headers: vec!["Name".into(), "Note".into()],
            rows: vec![vec!["Doe, J".into(), "ok".into()]],
        };
        write_table(&path, &table).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Name,Note\n\"Doe, J\",ok\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn empty_table_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path(dir.path(), "doc", 2);
        write_table(&path, &ExtractedTable::empty()).unwrap();
        assert!(path.exists());
        assert_eq!(std::fs::read(&path).unwrap().len(), 0);
    }

    #[test]
    fn failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path(dir.path(), "doc", 3);
        std::fs::create_dir(&path).unwrap();

        let table = ExtractedTable {
            headers: vec!["a".into()],
            rows: vec![vec!["1".into()]],
        };
        assert!(write_table(&path, &table).is_err());

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries, vec![path]);
    }
}
