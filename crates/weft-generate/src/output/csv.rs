use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use weft_core::Value;

use crate::errors::SinkError;
use crate::output::Sink;

/// Column used when no row is an object.
const VALUE_COLUMN: &str = "value";

/// Writes `<dir>/<collection>.csv` for every collection on finish.
///
/// Columns are the union of object keys in first-seen order. Nulls are
/// empty cells (a null row is a row of empty cells); arrays and objects
/// are embedded as JSON.
#[derive(Debug)]
pub struct CsvSink {
    dir: PathBuf,
    collections: Vec<(String, Vec<Value>)>,
    files: Vec<(PathBuf, u64)>,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            collections: Vec::new(),
            files: Vec::new(),
        })
    }

    /// Files written by `finish`, with their size in bytes.
    pub fn files(&self) -> &[(PathBuf, u64)] {
        &self.files
    }

    pub fn bytes_written(&self) -> u64 {
        self.files.iter().map(|(_, bytes)| bytes).sum()
    }
}

impl Sink for CsvSink {
    fn insert(&mut self, collection: &str, rows: &[Value]) -> Result<(), SinkError> {
        match self
            .collections
            .iter_mut()
            .find(|(name, _)| name == collection)
        {
            Some((_, existing)) => existing.extend_from_slice(rows),
            None => self
                .collections
                .push((collection.to_string(), rows.to_vec())),
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        for (collection, rows) in std::mem::take(&mut self.collections) {
            let path = self.dir.join(format!("{collection}.csv"));
            let bytes = write_collection_csv(&path, &rows)?;
            debug!(collection = %collection, path = %path.display(), bytes, "csv written");
            self.files.push((path, bytes));
        }
        Ok(())
    }
}

/// Write rows as CSV with a deterministic column order.
pub fn write_collection_csv(path: &Path, rows: &[Value]) -> Result<u64, csv::Error> {
    let writer = BufWriter::new(File::create(path).map_err(csv::Error::from)?);
    let counting = CountingWriter::new(writer);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    let columns = columns(rows);
    writer.write_record(&columns)?;

    for row in rows {
        writer.write_record(record(row, &columns))?;
    }

    writer.flush()?;
    let counting = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(counting.bytes_written())
}

fn columns(rows: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(fields) = row {
            for (name, _) in fields {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }
    }
    if columns.is_empty() {
        columns.push(VALUE_COLUMN.to_string());
    }
    columns
}

fn record(row: &Value, columns: &[String]) -> Vec<String> {
    match row {
        Value::Object(_) => columns
            .iter()
            .map(|column| row.get(column).map(cell).unwrap_or_default())
            .collect(),
        Value::Null => vec![String::new(); columns.len()],
        // Scalars and arrays next to object rows land in the first column.
        other => {
            let mut record = vec![String::new(); columns.len()];
            record[0] = cell(other);
            record
        }
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_follow_first_seen_order() {
        let rows = vec![
            Value::Object(vec![("b".to_string(), Value::from(true))]),
            Value::Object(vec![
                ("a".to_string(), Value::Null),
                ("b".to_string(), Value::from(false)),
            ]),
        ];
        assert_eq!(columns(&rows), ["b", "a"]);
    }

    #[test]
    fn null_rows_keep_object_columns() {
        let rows = vec![
            Value::Object(vec![
                ("id".to_string(), Value::from(true)),
                ("name".to_string(), Value::from("ana".to_string())),
            ]),
            Value::Null,
        ];
        let columns = columns(&rows);
        assert_eq!(columns, ["id", "name"]);
        assert_eq!(record(&rows[0], &columns), ["true", "ana"]);
        assert_eq!(record(&rows[1], &columns), ["", ""]);
    }

    #[test]
    fn mixed_rows_are_written_with_object_columns() {
        let path = std::env::temp_dir().join(format!("weft_csv_{}.csv", uuid::Uuid::new_v4()));
        let rows = vec![
            Value::Object(vec![("id".to_string(), Value::from(true))]),
            Value::Null,
        ];
        let bytes = write_collection_csv(&path, &rows).expect("write csv");
        let written = std::fs::read_to_string(&path).expect("read csv");
        std::fs::remove_file(&path).expect("cleanup");
        assert_eq!(written, "id\ntrue\n\"\"\n");
        assert_eq!(bytes, written.len() as u64);
    }

    #[test]
    fn scalar_rows_use_a_single_column() {
        let rows = vec![Value::from("x".to_string()), Value::Null];
        assert_eq!(columns(&rows), [VALUE_COLUMN]);
        assert_eq!(cell(&rows[1]), "");
    }
}
