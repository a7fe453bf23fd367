//! Streaming XML writer
//!
//! [`Writer`] emits a document element by element into an in-memory
//! quick-xml buffer and hands the buffered bytes to a [`ChunkSink`] in
//! batches. The first chunk is always the declaration plus the opening root
//! tag; after that a chunk is cut every `flush_threshold` leaf elements, and
//! the rest goes out once the root is closed.
//!
//! Leaf text is written as CDATA when the element name was registered with
//! [`Writer::add_force_character_data`] or when the text holds anything
//! outside `[a-zA-Z0-9-_.,:;# /]`; otherwise it is a plain text node.
//! A `#text` entry is written the same way as the content of the element
//! that holds it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::{debug, instrument};

use crate::charset::{self, Charset};
use crate::error::{Error, Result};
use crate::paths::{ensure_directory, resolve_path};
use crate::value::{Object, Value, ATTRIBUTES_KEY, TEXT_KEY};
use crate::xml::model::{is_valid_name, split_cdata};

type XmlWriter = quick_xml::Writer<Vec<u8>>;

/// Output settings for [`Writer`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// Value of `version` in the XML declaration
    pub version: String,
    /// Value of `encoding` in the XML declaration; written chunks are
    /// transcoded into it when it names a known charset
    pub encoding: String,
    /// Leaf elements per intermediate flush (0 disables intermediate flushes)
    pub flush_threshold: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: "UTF-8".to_string(),
            flush_threshold: 1000,
        }
    }
}

impl WriteOptions {
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_flush_threshold(mut self, flush_threshold: usize) -> Self {
        self.flush_threshold = flush_threshold;
        self
    }
}

/// Destination for flushed chunks of a document
pub trait ChunkSink {
    /// Append `chunk` after everything previously appended
    fn append_chunk(&mut self, chunk: &[u8]) -> io::Result<()>;
}

impl ChunkSink for Vec<u8> {
    fn append_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.extend_from_slice(chunk);
        Ok(())
    }
}

/// A file opened for appending
#[derive(Debug)]
pub struct FileSink {
    file: File,
}

impl FileSink {
    /// Open `path` for appending, creating it if missing
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self { file })
    }
}

impl ChunkSink for FileSink {
    fn append_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.write_all(chunk)
    }
}

/// True if `text` holds a character outside `[a-zA-Z0-9-_.,:;# /]` and so
/// has to be wrapped in CDATA
pub fn needs_character_data(text: &str) -> bool {
    !text.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | ',' | ':' | ';' | '#' | ' ' | '/')
    })
}

/// Streams nested data to an XML file.
///
/// The force-character-data registry and the leaf counter belong to the
/// instance; separate writers never share them.
#[derive(Debug)]
pub struct Writer {
    base_path: PathBuf,
    file_name: PathBuf,
    options: WriteOptions,
    force_character_data: IndexSet<String>,
    leaf_count: usize,
}

impl Writer {
    /// Writer for `file_name` relative to `./`
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            base_path: PathBuf::from("./"),
            file_name: file_name.into(),
            options: WriteOptions::default(),
            force_character_data: IndexSet::new(),
            leaf_count: 0,
        }
    }

    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Target path: the file name resolved against the base path
    pub fn path(&self) -> PathBuf {
        resolve_path(&self.file_name, &self.base_path)
    }

    /// Always wrap the text of elements named `name` in CDATA
    pub fn add_force_character_data(&mut self, name: impl Into<String>) {
        self.force_character_data.insert(name.into());
    }

    /// Names registered with [`add_force_character_data`](Self::add_force_character_data)
    pub fn force_character_data(&self) -> impl Iterator<Item = &str> {
        self.force_character_data.iter().map(String::as_str)
    }

    /// Write `data` as the children of `root_element` to the target file.
    ///
    /// Without `append` an existing file is deleted first. With `append` the
    /// whole declaration and root sequence is added after the existing
    /// bytes. Missing parent directories are created.
    #[instrument(skip(self, root_attributes, data), fields(path = %self.path().display()))]
    pub fn write(
        &mut self,
        root_element: &str,
        root_attributes: &Object,
        data: &Object,
        append: bool,
    ) -> Result<()> {
        let path = self.path();

        if !append && path.exists() {
            debug!("removing existing file");
            fs::remove_file(&path).map_err(|err| Error::file(&path, err))?;
        }
        if let Some(parent) = path.parent() {
            ensure_directory(parent).map_err(|err| Error::file(parent, err))?;
        }

        let mut sink = FileSink::open(&path).map_err(|err| Error::file(&path, err))?;
        self.write_to(&mut sink, root_element, root_attributes, data)
    }

    /// Stream the document into `sink`
    pub fn write_to<S: ChunkSink>(
        &mut self,
        sink: &mut S,
        root_element: &str,
        root_attributes: &Object,
        data: &Object,
    ) -> Result<()> {
        let charset = Charset::from_label(&self.options.encoding);
        if charset.is_none() {
            debug!(
                encoding = %self.options.encoding,
                "unknown output encoding, writing UTF-8 bytes"
            );
        }

        let mut session = Session {
            xml: XmlWriter::new_with_indent(Vec::new(), b' ', 2),
            sink,
            charset,
            force_character_data: &self.force_character_data,
            flush_threshold: self.options.flush_threshold,
            leaf_count: &mut self.leaf_count,
        };

        session.xml.write_event(Event::Decl(BytesDecl::new(
            &self.options.version,
            Some(self.options.encoding.as_str()),
            None,
        )))?;
        let root = start_tag(root_element, Some(root_attributes))?;
        session.xml.write_event(Event::Start(root))?;
        session.flush()?;
        *session.leaf_count = 0;

        for (key, value) in data {
            session.add_entry(root_element, key, value)?;
        }

        session.xml.write_event(Event::End(BytesEnd::new(root_element)))?;
        session.xml.get_mut().push(b'\n');
        session.flush()
    }
}

/// State of one `write_to` call
struct Session<'w, S> {
    xml: XmlWriter,
    sink: &'w mut S,
    charset: Option<Charset>,
    force_character_data: &'w IndexSet<String>,
    flush_threshold: usize,
    leaf_count: &'w mut usize,
}

impl<S: ChunkSink> Session<'_, S> {
    fn add_element(&mut self, name: &str, value: &Value) -> Result<()> {
        match value {
            Value::Object(obj) => self.add_object(name, obj),
            Value::Array(items) => {
                for item in items {
                    self.add_element(name, item)?;
                }
                Ok(())
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                let text = value.scalar_text().unwrap_or_default();
                self.write_data(name, &text, None)
            }
        }
    }

    fn add_object(&mut self, name: &str, obj: &Object) -> Result<()> {
        let attributes = attribute_directive(obj)?;
        let rest: Vec<(&String, &Value)> = obj
            .iter()
            .filter(|(key, _)| key.as_str() != ATTRIBUTES_KEY)
            .collect();

        if attributes.is_some() {
            if let [(_, single)] = rest.as_slice() {
                if let Some(text) = single.scalar_text() {
                    return self.write_data(name, &text, attributes);
                }
            }
        }

        let start = start_tag(name, attributes)?;
        if rest.is_empty() {
            self.xml.write_event(Event::Empty(start))?;
            return Ok(());
        }

        self.xml.write_event(Event::Start(start))?;
        for (key, value) in rest {
            self.add_entry(name, key, value)?;
        }
        self.xml.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// An entry of an object written under `parent`; `#text` is the
    /// parent's own character content
    fn add_entry(&mut self, parent: &str, key: &str, value: &Value) -> Result<()> {
        if key != TEXT_KEY {
            return self.add_element(key, value);
        }
        let text = value
            .scalar_text()
            .ok_or_else(|| Error::InvalidName(key.to_string()))?;
        self.write_characters(parent, &text)
    }

    /// Write one leaf element and count it towards the next flush
    fn write_data(&mut self, name: &str, text: &str, attributes: Option<&Object>) -> Result<()> {
        let start = start_tag(name, attributes)?;

        self.xml.write_event(Event::Start(start))?;
        self.write_characters(name, text)?;
        self.xml.write_event(Event::End(BytesEnd::new(name)))?;

        *self.leaf_count += 1;
        if self.flush_threshold > 0 && *self.leaf_count >= self.flush_threshold {
            self.flush()?;
            *self.leaf_count = 0;
        }
        Ok(())
    }

    /// Character content of the element `name`, as CDATA when the registry
    /// or the text asks for it
    fn write_characters(&mut self, name: &str, text: &str) -> Result<()> {
        let text = charset::normalize(text, self.charset);
        if self.force_character_data.contains(name) || needs_character_data(&text) {
            for part in split_cdata(&text) {
                self.xml.write_event(Event::CData(BytesCData::new(part)))?;
            }
        } else {
            self.xml.write_event(Event::Text(BytesText::new(&text)))?;
        }
        Ok(())
    }

    /// Hand everything buffered so far to the sink
    fn flush(&mut self) -> Result<()> {
        let chunk = std::mem::take(self.xml.get_mut());
        debug!(bytes = chunk.len(), "flushing XML chunk");

        match self.charset {
            Some(charset @ (Charset::Latin1 | Charset::Ascii)) => {
                let text = String::from_utf8_lossy(&chunk);
                self.sink.append_chunk(&charset.encode(&text))?;
            }
            Some(Charset::Utf8) | None => self.sink.append_chunk(&chunk)?,
        }
        Ok(())
    }
}

/// The `@attributes` map of `obj`, if it has one
fn attribute_directive(obj: &Object) -> Result<Option<&Object>> {
    match obj.get(ATTRIBUTES_KEY) {
        None => Ok(None),
        Some(Value::Object(attributes)) => Ok(Some(attributes)),
        Some(_) => Err(Error::InvalidAttribute(ATTRIBUTES_KEY.to_string())),
    }
}

fn start_tag<'a>(name: &'a str, attributes: Option<&Object>) -> Result<BytesStart<'a>> {
    if !is_valid_name(name) {
        return Err(Error::InvalidName(name.to_string()));
    }
    let mut start = BytesStart::new(name);

    for (key, value) in attributes.into_iter().flatten() {
        if !is_valid_name(key) {
            return Err(Error::InvalidName(key.clone()));
        }
        let text = value
            .scalar_text()
            .ok_or_else(|| Error::InvalidAttribute(key.clone()))?;
        start.push_attribute((key.as_str(), text.as_str()));
    }
    Ok(start)
}

/// Write `data` under `root_element` to `path` in one call
pub fn write_xml_file(
    path: impl Into<PathBuf>,
    root_element: &str,
    root_attributes: &Object,
    data: &Object,
    append: bool,
    options: &WriteOptions,
) -> Result<()> {
    Writer::new(path)
        .with_options(options.clone())
        .write(root_element, root_attributes, data, append)
}
