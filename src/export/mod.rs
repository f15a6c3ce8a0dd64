//! Client-side tabular export
//!
//! Serializes uniform records to comma-separated text and hands the result
//! to a download sink. The quoting is minimal: a string value
//! containing a comma is wrapped in double quotes, nothing else is escaped.
//! Embedded quotes and line breaks pass through unchanged, so such values
//! produce CSV that strict readers will split incorrectly.

use crate::core::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// MIME type attached to exported files
pub const CSV_MIME: &str = "text/csv;charset=utf-8;";

/// One row: field name to value, in insertion order
pub type Record = Map<String, Value>;

/// A file ready to be saved on the client
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub filename: String,
    pub mime: String,
    pub content: String,
}

/// Destination of client-initiated downloads
pub trait DownloadSink {
    /// Save the file. Nothing of the download is retained afterwards.
    fn save(&mut self, download: Download) -> Result<()>;
}

/// Convert serializable items into records, keeping their field order
pub fn to_records<T: Serialize>(items: &[T]) -> Result<Vec<Record>> {
    items
        .iter()
        .map(|item| match serde_json::to_value(item)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Export(format!("expected an object, got {}", other))),
        })
        .collect()
}

/// Render records as CSV text; `None` when there is nothing to export.
///
/// The header comes from the first record. Every row follows the header's
/// field order; a field absent from a later record renders empty.
pub fn to_csv(records: &[Record]) -> Option<String> {
    let first = records.first()?;
    let headers: Vec<&String> = first.keys().collect();

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(headers.iter().map(|h| h.as_str()).collect::<Vec<_>>().join(","));

    for record in records {
        let row: Vec<String> = headers
            .iter()
            .map(|header| record.get(header.as_str()).map(render_value).unwrap_or_default())
            .collect();
        lines.push(row.join(","));
    }

    Some(lines.join("\n"))
}

/// Serialize `records` and trigger a download of `{filename_stem}.csv`.
///
/// Empty input is a no-op: the sink is not touched.
pub fn export_records(records: &[Record], filename_stem: &str, sink: &mut dyn DownloadSink) -> Result<()> {
    let Some(content) = to_csv(records) else {
        return Ok(());
    };

    let download = Download {
        filename: format!("{}.csv", filename_stem),
        mime: CSV_MIME.to_string(),
        content,
    };

    log::info!("Exporting {} records to {}", records.len(), download.filename);
    sink.save(download)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) if s.contains(',') => format!("\"{}\"", s),
        Value::String(s) => s.clone(),
        Value::Number(n) => render_number(n),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Integral floats print without a fractional part ("456", not "456.0")
fn render_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => format!("{}", f),
        None => n.to_string(),
    }
}

/// Saves downloads as files in a directory
pub struct FileDownloadSink {
    directory: PathBuf,
}

impl FileDownloadSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path the given filename would be written to
    pub fn target_path(&self, filename: &str) -> PathBuf {
        let safe: String = filename
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        self.directory.join(safe)
    }
}

impl DownloadSink for FileDownloadSink {
    fn save(&mut self, download: Download) -> Result<()> {
        fs::create_dir_all(&self.directory)?;
        let path = self.target_path(&download.filename);
        fs::write(&path, download.content.as_bytes())?;
        log::info!("Saved {} ({}) to {}", download.filename, download.mime, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingSink {
        saved: Vec<Download>,
    }

    impl DownloadSink for RecordingSink {
        fn save(&mut self, download: Download) -> Result<()> {
            self.saved.push(download);
            Ok(())
        }
    }

    struct FailingSink;

    impl DownloadSink for FailingSink {
        fn save(&mut self, _download: Download) -> Result<()> {
            Err(Error::Export("no download target".into()))
        }
    }

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => map,
                _ => panic!("not an object"),
            })
            .collect()
    }

    #[test]
    fn test_empty_export_touches_nothing() {
        let mut sink = RecordingSink::default();
        export_records(&[], "test", &mut sink).unwrap();
        assert!(sink.saved.is_empty());
        assert!(to_csv(&[]).is_none());
    }

    #[test]
    fn test_export_with_headers() {
        let data = records(vec![
            json!({"name": "Test", "value": 123}),
            json!({"name": "Test2", "value": 456}),
        ]);
        let mut sink = RecordingSink::default();

        export_records(&data, "test", &mut sink).unwrap();

        assert_eq!(sink.saved.len(), 1);
        assert_eq!(sink.saved[0].content, "name,value\nTest,123\nTest2,456");
        assert_eq!(sink.saved[0].filename, "test.csv");
        assert_eq!(sink.saved[0].mime, "text/csv;charset=utf-8;");
    }

    #[test]
    fn test_header_order_follows_first_record() {
        let data = records(vec![
            json!({"b": 1, "a": 2}),
            json!({"a": 3, "b": 4}),
        ]);
        assert_eq!(to_csv(&data).unwrap(), "b,a\n1,2\n4,3");
    }

    #[test]
    fn test_comma_quoting_is_the_only_escaping() {
        let data = records(vec![json!({
            "nota": "Bloco A, andar 2",
            "aspas": "diz \"oi\"",
            "consumo": 12.5,
            "inteiro": 15.0,
            "ativo": true,
            "vazio": null
        })]);

        assert_eq!(
            to_csv(&data).unwrap(),
            "nota,aspas,consumo,inteiro,ativo,vazio\n\"Bloco A, andar 2\",diz \"oi\",12.5,15,true,"
        );
    }

    #[test]
    fn test_missing_field_renders_empty() {
        let data = records(vec![json!({"a": 1, "b": 2}), json!({"a": 3})]);
        assert_eq!(to_csv(&data).unwrap(), "a,b\n1,2\n3,");
    }

    #[test]
    fn test_to_records_keeps_struct_field_order() {
        #[derive(Serialize)]
        struct Row {
            zeta: u32,
            alpha: &'static str,
        }

        let rows = to_records(&[Row { zeta: 1, alpha: "x" }]).unwrap();
        assert_eq!(to_csv(&rows).unwrap(), "zeta,alpha\n1,x");
        assert!(to_records(&[1, 2]).is_err());
    }

    #[test]
    fn test_sink_failure_is_returned() {
        let data = records(vec![json!({"a": 1})]);
        assert!(export_records(&data, "x", &mut FailingSink).is_err());
    }

    #[test]
    fn test_file_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileDownloadSink::new(dir.path().join("exports"));
        let data = records(vec![json!({"id": 1})]);

        export_records(&data, "leituras-2024-01-22", &mut sink).unwrap();

        let written = fs::read_to_string(dir.path().join("exports/leituras-2024-01-22.csv")).unwrap();
        assert_eq!(written, "id\n1");
    }

    #[test]
    fn test_file_sink_sanitizes_separators() {
        let sink = FileDownloadSink::new("/tmp/out");
        assert_eq!(sink.target_path("../evil.csv"), PathBuf::from("/tmp/out/.._evil.csv"));
    }
}
