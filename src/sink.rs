//! Record sinks.
//!
//! The runner hands every article's records to a [`RecordSink`] in one call,
//! so a sink can keep an article together. [`ParquetWriter`] and
//! [`JsonlWriter`] write numbered files into a directory and share the same
//! size-based rotation policy.

use crate::error::Result;
use crate::model::Record;
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default rotation threshold (500 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Destination for extracted records.
pub trait RecordSink {
    /// Writes all records of one article.
    fn write_article(&mut self, records: &[Record]) -> Result<()>;

    /// Flushes buffered output. Called once at the end of a run.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl RecordSink for Vec<Record> {
    fn write_article(&mut self, records: &[Record]) -> Result<()> {
        self.extend_from_slice(records);
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn write_article(&mut self, records: &[Record]) -> Result<()> {
        (**self).write_article(records)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// On-disk format of the output files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Typed three-column Parquet files (`{n}.parquet`)
    #[default]
    Parquet,
    /// One JSON object per line (`{n}.jsonl`)
    Jsonl,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Opens a rotating writer for the given format.
pub fn open_sink(
    format: OutputFormat,
    dir: impl AsRef<Path>,
    max_file_size: u64,
) -> Result<Box<dyn RecordSink>> {
    Ok(match format {
        OutputFormat::Parquet => Box::new(ParquetWriter::new(dir, max_file_size)?),
        OutputFormat::Jsonl => Box::new(JsonlWriter::new(dir, max_file_size)?),
    })
}

/// Size bookkeeping shared by the file writers.
///
/// Before an article that would push the current file past the limit the
/// writer moves to the next file. A file that holds nothing yet is never
/// abandoned, so an oversized article still gets written.
#[derive(Debug)]
struct Rotation {
    dir: PathBuf,
    extension: &'static str,
    max_file_size: u64,
    current_size: u64,
    files_written: usize,
}

impl Rotation {
    fn new(dir: impl AsRef<Path>, extension: &'static str, max_file_size: u64) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            extension,
            max_file_size,
            current_size: 0,
            files_written: 0,
        })
    }

    fn file_path(&self, n: usize) -> PathBuf {
        self.dir.join(format!("{}.{}", n, self.extension))
    }

    /// Whether an article of `size` bytes must go to a new file.
    fn needs_new_file(&self, is_open: bool, size: u64) -> bool {
        !is_open || (self.current_size > 0 && self.current_size + size > self.max_file_size)
    }

    /// Advances to the next file number and returns its path.
    fn advance(&mut self) -> PathBuf {
        self.files_written += 1;
        self.current_size = 0;
        let path = self.file_path(self.files_written);
        tracing::debug!(path = %path.display(), "opening output file");
        path
    }
}

/// Arrow schema of the output files: three non-null UTF-8 columns.
pub fn record_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("article_title", DataType::Utf8, false),
        Field::new("topic_title", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
    ]))
}

fn string_column<'a>(values: impl Iterator<Item = &'a str>) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(values))
}

fn to_record_batch(schema: &SchemaRef, records: &[Record]) -> Result<RecordBatch> {
    let columns = vec![
        string_column(records.iter().map(|r| r.article_title.as_str())),
        string_column(records.iter().map(|r| r.topic_title.as_str())),
        string_column(records.iter().map(|r| r.text.as_str())),
    ];
    Ok(RecordBatch::try_new(Arc::clone(schema), columns)?)
}

/// Writes records into `{dir}/{n}.parquet`, `n` starting at 1.
///
/// Each article becomes one record batch. Sizes are estimated from the
/// uncompressed string bytes, so files on disk come out smaller than the
/// limit. Files are created on first write and closed (footer written) on
/// rotation or [`RecordSink::finish`].
pub struct ParquetWriter {
    rotation: Rotation,
    schema: SchemaRef,
    current: Option<ArrowWriter<File>>,
    records_written: usize,
}

impl ParquetWriter {
    /// Creates a writer, creating the output directory if needed.
    pub fn new(dir: impl AsRef<Path>, max_file_size: u64) -> Result<Self> {
        Ok(Self {
            rotation: Rotation::new(dir, OutputFormat::Parquet.extension(), max_file_size)?,
            schema: record_schema(),
            current: None,
            records_written: 0,
        })
    }

    /// Number of files created so far.
    pub fn files_written(&self) -> usize {
        self.rotation.files_written
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Path of the `n`-th output file.
    pub fn file_path(&self, n: usize) -> PathBuf {
        self.rotation.file_path(n)
    }

    fn close_current(&mut self) -> Result<()> {
        if let Some(writer) = self.current.take() {
            writer.close()?;
        }
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        self.close_current()?;

        let path = self.rotation.advance();
        let properties = WriterProperties::builder()
            .set_compression(parquet::basic::Compression::SNAPPY)
            .build();
        let writer = ArrowWriter::try_new(
            File::create(path)?,
            Arc::clone(&self.schema),
            Some(properties),
        )?;

        self.current = Some(writer);
        Ok(())
    }
}

impl RecordSink for ParquetWriter {
    fn write_article(&mut self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let estimated_size: u64 = records
            .iter()
            .map(|r| (r.article_title.len() + r.topic_title.len() + r.text.len()) as u64)
            .sum();

        if self
            .rotation
            .needs_new_file(self.current.is_some(), estimated_size)
        {
            self.rotate()?;
        }

        let batch = to_record_batch(&self.schema, records)?;
        if let Some(writer) = self.current.as_mut() {
            writer.write(&batch)?;
        }
        self.rotation.current_size += estimated_size;
        self.records_written += records.len();
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.close_current()
    }
}

/// Writes records as JSON Lines into `{dir}/{n}.jsonl`, `n` starting at 1.
///
/// Sizes are the serialized byte lengths. Files are created on first write.
#[derive(Debug)]
pub struct JsonlWriter {
    rotation: Rotation,
    current: Option<BufWriter<File>>,
    records_written: usize,
}

impl JsonlWriter {
    /// Creates a writer, creating the output directory if needed.
    pub fn new(dir: impl AsRef<Path>, max_file_size: u64) -> Result<Self> {
        Ok(Self {
            rotation: Rotation::new(dir, OutputFormat::Jsonl.extension(), max_file_size)?,
            current: None,
            records_written: 0,
        })
    }

    /// Number of files created so far.
    pub fn files_written(&self) -> usize {
        self.rotation.files_written
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Path of the `n`-th output file.
    pub fn file_path(&self, n: usize) -> PathBuf {
        self.rotation.file_path(n)
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.current.take() {
            writer.flush()?;
        }

        let path = self.rotation.advance();
        self.current = Some(BufWriter::new(File::create(path)?));
        Ok(())
    }
}

impl RecordSink for JsonlWriter {
    fn write_article(&mut self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut batch = Vec::new();
        for record in records {
            serde_json::to_writer(&mut batch, record)?;
            batch.push(b'\n');
        }
        let batch_size = batch.len() as u64;

        if self
            .rotation
            .needs_new_file(self.current.is_some(), batch_size)
        {
            self.rotate()?;
        }

        if let Some(writer) = self.current.as_mut() {
            writer.write_all(&batch)?;
        }
        self.rotation.current_size += batch_size;
        self.records_written += records.len();
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(writer) = self.current.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    fn read_parquet(path: &Path) -> Vec<Record> {
        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path).unwrap())
            .unwrap()
            .build()
            .unwrap();

        let mut records = Vec::new();
        for batch in reader {
            let batch = batch.unwrap();
            let column = |i: usize| {
                batch
                    .column(i)
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .unwrap()
                    .clone()
            };
            let (titles, topics, texts) = (column(0), column(1), column(2));
            for row in 0..batch.num_rows() {
                records.push(Record::new(titles.value(row), topics.value(row), texts.value(row)));
            }
        }
        records
    }


    fn article(title: &str, lines: usize) -> Vec<Record> {
        (0..lines)
            .map(|i| Record::new(title, "概要", format!("{}の{}行目の本文です。", title, i)))
            .collect()
    }

    fn read_lines(path: &Path) -> Vec<Record> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<Record> = Vec::new();
        sink.write_article(&article("A", 2)).unwrap();
        sink.write_article(&article("B", 1)).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.len(), 3);
        assert_eq!(sink[2].article_title, "B");
    }

    #[test]
    fn test_single_file_when_under_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JsonlWriter::new(dir.path(), DEFAULT_MAX_FILE_SIZE).unwrap();
        writer.write_article(&article("東京都", 3)).unwrap();
        writer.finish().unwrap();

        assert_eq!(writer.files_written(), 1);
        assert_eq!(writer.records_written(), 3);
        let records = read_lines(&dir.path().join("1.jsonl"));
        assert_eq!(records, article("東京都", 3));
    }

    #[test]
    fn test_no_file_without_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JsonlWriter::new(dir.path(), 1024).unwrap();
        writer.write_article(&[]).unwrap();
        writer.finish().unwrap();
        assert_eq!(writer.files_written(), 0);
        assert!(!dir.path().join("1.jsonl").exists());
    }

    #[test]
    fn test_rotation_keeps_articles_whole() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JsonlWriter::new(dir.path(), 512).unwrap();
        let titles = ["甲", "乙", "丙", "丁", "戊"];
        for title in titles {
            writer.write_article(&article(title, 4)).unwrap();
        }
        writer.finish().unwrap();

        assert!(writer.files_written() > 1);

        let mut seen = Vec::new();
        for n in 1..=writer.files_written() {
            let records = read_lines(&writer.file_path(n));
            assert!(!records.is_empty());
            let mut file_titles: Vec<String> =
                records.iter().map(|r| r.article_title.clone()).collect();
            file_titles.dedup();
            for title in file_titles {
                assert!(!seen.contains(&title), "{} spans two files", title);
                seen.push(title);
            }
        }
        assert_eq!(seen.len(), titles.len());
    }

    #[test]
    fn test_oversized_article_written_to_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JsonlWriter::new(dir.path(), 16).unwrap();
        writer.write_article(&article("大", 10)).unwrap();
        writer.write_article(&article("小", 1)).unwrap();
        writer.finish().unwrap();

        assert_eq!(writer.files_written(), 2);
        assert_eq!(read_lines(&writer.file_path(1)).len(), 10);
        assert_eq!(read_lines(&writer.file_path(2)).len(), 1);
    }

    #[test]
    fn test_record_schema_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JsonlWriter::new(dir.path(), DEFAULT_MAX_FILE_SIZE).unwrap();
        writer
            .write_article(&[Record::new("東京都", "", "東京都は日本の首都である。")])
            .unwrap();
        writer.finish().unwrap();

        let line = fs::read_to_string(dir.path().join("1.jsonl")).unwrap();
        assert_eq!(
            line,
            "{\"article_title\":\"東京都\",\"topic_title\":\"\",\"text\":\"東京都は日本の首都である。\"}\n"
        );
    }

    #[test]
    fn test_parquet_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ParquetWriter::new(dir.path(), DEFAULT_MAX_FILE_SIZE).unwrap();
        writer.write_article(&article("東京都", 3)).unwrap();
        writer.write_article(&article("大阪府", 2)).unwrap();
        writer.finish().unwrap();

        assert_eq!(writer.files_written(), 1);
        assert_eq!(writer.records_written(), 5);
        let mut expected = article("東京都", 3);
        expected.extend(article("大阪府", 2));
        assert_eq!(read_parquet(&dir.path().join("1.parquet")), expected);
    }

    #[test]
    fn test_parquet_schema_columns() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ParquetWriter::new(dir.path(), DEFAULT_MAX_FILE_SIZE).unwrap();
        writer.write_article(&[Record::new("東京都", "", "本文です。")]).unwrap();
        writer.finish().unwrap();

        let file = File::open(dir.path().join("1.parquet")).unwrap();
        let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
        let schema = builder.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, ["article_title", "topic_title", "text"]);
        assert!(schema.fields().iter().all(|f| f.data_type() == &DataType::Utf8));
    }

    #[test]
    fn test_parquet_rotation_keeps_articles_whole() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ParquetWriter::new(dir.path(), 300).unwrap();
        for title in ["甲", "乙", "丙"] {
            writer.write_article(&article(title, 4)).unwrap();
        }
        writer.finish().unwrap();

        assert_eq!(writer.files_written(), 3);
        for (n, title) in ["甲", "乙", "丙"].iter().enumerate() {
            let records = read_parquet(&writer.file_path(n + 1));
            assert_eq!(records, article(title, 4));
        }
    }

    #[test]
    fn test_parquet_no_file_without_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ParquetWriter::new(dir.path(), 1024).unwrap();
        writer.write_article(&[]).unwrap();
        writer.finish().unwrap();
        assert_eq!(writer.files_written(), 0);
        assert!(!dir.path().join("1.parquet").exists());
    }

    #[test]
    fn test_open_sink_uses_format_extension() {
        let dir = tempfile::tempdir().unwrap();
        for format in [OutputFormat::Parquet, OutputFormat::Jsonl] {
            let mut sink = open_sink(format, dir.path(), DEFAULT_MAX_FILE_SIZE).unwrap();
            sink.write_article(&article("東京都", 1)).unwrap();
            sink.finish().unwrap();
            assert!(dir.path().join(format!("1.{}", format)).exists());
        }
        assert_eq!(OutputFormat::default(), OutputFormat::Parquet);
    }
}
