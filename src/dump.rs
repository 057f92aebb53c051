//! Streaming reader for MediaWiki XML exports.
//!
//! Pages are pulled one at a time, so a multi-gigabyte dump never has to fit
//! in memory. Only `<title>` and `<text>` inside `<page>` are collected; they
//! are matched by local name, so the export schema namespace does not matter.

use crate::detect::{detect_compression_from_reader, Compression};
use crate::error::{Error, Result};
use crate::model::RawPage;
use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read buffer size for compressed dumps.
const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Opens a dump file, choosing a decoder from its magic bytes.
pub fn open_dump(path: impl AsRef<Path>) -> Result<Box<dyn BufRead + Send>> {
    let mut file = File::open(path.as_ref())?;
    let compression = detect_compression_from_reader(&mut file)?;

    tracing::debug!(path = %path.as_ref().display(), %compression, "opening dump");

    let reader: Box<dyn BufRead + Send> = match compression {
        Compression::Bzip2 => Box::new(BufReader::with_capacity(
            READ_BUFFER_SIZE,
            MultiBzDecoder::new(file),
        )),
        Compression::Gzip => Box::new(BufReader::with_capacity(
            READ_BUFFER_SIZE,
            MultiGzDecoder::new(file),
        )),
        Compression::Plain => Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file)),
    };

    Ok(reader)
}

/// Which page field is being collected.
#[derive(Debug, Clone, Copy)]
enum Field {
    Title,
    Text,
}

/// Iterator over the pages of a dump.
pub struct DumpReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    pages_read: usize,
    done: bool,
}

impl DumpReader<Box<dyn BufRead + Send>> {
    /// Opens a dump file (plain, bzip2 or gzip).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(open_dump(path)?))
    }
}

impl<'a> DumpReader<&'a [u8]> {
    /// Reads a dump held in memory.
    pub fn from_xml(xml: &'a str) -> Self {
        Self::new(xml.as_bytes())
    }
}

impl<R: BufRead> DumpReader<R> {
    /// Wraps a buffered reader positioned at the start of the export.
    pub fn new(inner: R) -> Self {
        Self {
            reader: Reader::from_reader(inner),
            buf: Vec::new(),
            pages_read: 0,
            done: false,
        }
    }

    /// Number of pages yielded so far.
    pub fn pages_read(&self) -> usize {
        self.pages_read
    }

    fn next_page(&mut self) -> Result<Option<RawPage>> {
        let mut page: Option<RawPage> = None;
        let mut field: Option<Field> = None;
        let mut value = String::new();

        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"page" => page = Some(RawPage::default()),
                    b"title" if page.is_some() => {
                        field = Some(Field::Title);
                        value.clear();
                    }
                    b"text" if page.is_some() => {
                        field = Some(Field::Text);
                        value.clear();
                    }
                    _ => {}
                },
                Event::Empty(e) => {
                    if e.local_name().as_ref() == b"text" {
                        if let Some(page) = page.as_mut() {
                            page.text = Some(String::new());
                        }
                    }
                }
                Event::Text(t) if field.is_some() => {
                    let text = t.unescape().map_err(|e| Error::XmlParse(e.to_string()))?;
                    value.push_str(&text);
                }
                Event::CData(c) if field.is_some() => {
                    value.push_str(std::str::from_utf8(&c)?);
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"title" | b"text" => {
                        if let (Some(field), Some(page)) = (field.take(), page.as_mut()) {
                            let collected = std::mem::take(&mut value);
                            match field {
                                Field::Title => page.title = Some(collected),
                                Field::Text => page.text = Some(collected),
                            }
                        }
                    }
                    b"page" => {
                        if let Some(page) = page.take() {
                            return Ok(Some(page));
                        }
                    }
                    _ => {}
                },
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for DumpReader<R> {
    type Item = Result<RawPage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_page() {
            Ok(Some(page)) => {
                self.pages_read += 1;
                Some(Ok(page))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
