use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use weft_core::Value;

use crate::errors::SinkError;
use crate::output::Sink;

/// Writes a single `{collection: [rows]}` document on finish.
pub struct JsonSink<W: Write> {
    writer: W,
    pretty: bool,
    collections: Vec<(String, Vec<Value>)>,
}

impl JsonSink<BufWriter<File>> {
    pub fn create(path: &Path, pretty: bool) -> Result<Self, SinkError> {
        Ok(Self::new(BufWriter::new(File::create(path)?), pretty))
    }
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W, pretty: bool) -> Self {
        Self {
            writer,
            pretty,
            collections: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink for JsonSink<W> {
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
        let document = Value::Object(
            std::mem::take(&mut self.collections)
                .into_iter()
                .map(|(name, rows)| (name, Value::Array(rows)))
                .collect(),
        );
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &document)?;
        } else {
            serde_json::to_writer(&mut self.writer, &document)?;
        }
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct Line<'a> {
    collection: &'a str,
    row: &'a Value,
}

/// One `{"collection": ..., "row": ...}` object per line, streamed as
/// batches arrive.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    lines: u64,
}

impl JsonLinesSink<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, lines: 0 }
    }

    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink for JsonLinesSink<W> {
    fn insert(&mut self, collection: &str, rows: &[Value]) -> Result<(), SinkError> {
        for row in rows {
            serde_json::to_writer(&mut self.writer, &Line { collection, row })?;
            self.writer.write_all(b"\n")?;
            self.lines += 1;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_sink_merges_batches_in_arrival_order() {
        let mut sink = JsonSink::new(Vec::new(), false);
        sink.insert("users", &[Value::from(true)]).expect("insert");
        sink.insert("orders", &[Value::from("a".to_string())])
            .expect("insert");
        sink.insert("users", &[Value::from(false)]).expect("insert");
        sink.finish().expect("finish");
        let text = String::from_utf8(sink.into_inner()).expect("utf8");
        assert_eq!(text, "{\"users\":[true,false],\"orders\":[\"a\"]}\n");
    }

    #[test]
    fn json_lines_tag_rows_with_their_collection() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.insert("users", &[Value::from(true), Value::Null])
            .expect("insert");
        sink.finish().expect("finish");
        assert_eq!(sink.lines_written(), 2);
        let text = String::from_utf8(sink.into_inner()).expect("utf8");
        assert_eq!(
            text,
            "{\"collection\":\"users\",\"row\":true}\n{\"collection\":\"users\",\"row\":null}\n"
        );
    }
}
