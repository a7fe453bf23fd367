//! Resilient XML file reader
//!
//! Files written by another process may be caught half-written, so a failed
//! parse can be retried a configured number of times with a pause in
//! between. Every attempt rereads the file and runs a fresh parser; only the
//! diagnostic of the last attempt is reported.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::charset;
use crate::decode::xml_to_array;
use crate::error::{Diagnostic, Error, Result};
use crate::paths::resolve_path;
use crate::value::Object;
use crate::xml::{Element, Parser};

/// Reader settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadOptions {
    /// Strip null, empty strings and empty containers from the result
    pub remove_empty_elements: bool,
    /// Extra parse attempts after the first one fails
    pub retries: u32,
    /// Pause before each retry
    pub retry_pause: Duration,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            remove_empty_elements: true,
            retries: 0,
            retry_pause: Duration::from_millis(250),
        }
    }
}

impl ReadOptions {
    pub const fn new(remove_empty_elements: bool, retries: u32, retry_pause: Duration) -> Self {
        Self {
            remove_empty_elements,
            retries,
            retry_pause,
        }
    }

    pub const fn with_remove_empty_elements(mut self, remove_empty_elements: bool) -> Self {
        self.remove_empty_elements = remove_empty_elements;
        self
    }

    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub const fn with_retry_pause(mut self, retry_pause: Duration) -> Self {
        self.retry_pause = retry_pause;
        self
    }
}

/// Reads an XML file into an [`Object`]
#[derive(Clone, Debug)]
pub struct Reader {
    base_path: PathBuf,
    file_name: PathBuf,
    options: ReadOptions,
}

impl Reader {
    /// Reader for `file_name` relative to `./`
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            base_path: PathBuf::from("./"),
            file_name: file_name.into(),
            options: ReadOptions::default(),
        }
    }

    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    pub const fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Source path: the file name resolved against the base path
    pub fn path(&self) -> PathBuf {
        resolve_path(&self.file_name, &self.base_path)
    }

    /// Read, parse and decode the file.
    ///
    /// # Errors
    ///
    /// - [`Error::NotAFile`] if the path is not a regular file
    /// - [`Error::File`] if reading fails (not retried)
    /// - [`Error::Parse`] once every attempt failed to parse
    #[instrument(skip(self), fields(path = %self.path().display()))]
    pub fn read(&self) -> Result<Object> {
        let path = self.path();
        if !path.is_file() {
            return Err(Error::NotAFile { path });
        }

        self.read_with(|| fs::read(&path).map_err(|err| Error::file(&path, err)))
    }

    /// Retry loop around `load`, which yields the current file content
    pub(crate) fn read_with(&self, mut load: impl FnMut() -> Result<Vec<u8>>) -> Result<Object> {
        let attempts = self.options.retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let bytes = load()?;
            debug!(attempt, bytes = bytes.len(), "parsing");

            match parse_attempt(&bytes) {
                Ok(root) => return Ok(self.finish(&root)),
                Err(diagnostic) if attempt < attempts => {
                    warn!(
                        attempt,
                        attempts,
                        reason = diagnostic.as_ref().map_or("empty document", |d| d.message.as_str()),
                        "could not parse XML, retrying in {:?}",
                        self.options.retry_pause
                    );
                    thread::sleep(self.options.retry_pause);
                }
                Err(diagnostic) => {
                    return Err(Error::Parse {
                        path: self.path(),
                        diagnostic: diagnostic.map(Box::new),
                    })
                }
            }
        }
    }

    fn finish(&self, root: &Element) -> Object {
        let obj = xml_to_array(root);
        if self.options.remove_empty_elements {
            obj.prune_empty()
        } else {
            obj
        }
    }
}

/// One parse with a fresh parser. Empty or blank content fails without a
/// diagnostic.
fn parse_attempt(bytes: &[u8]) -> std::result::Result<Element, Option<Diagnostic>> {
    let text = charset::decode_document(bytes);
    if text.trim().is_empty() {
        return Err(None);
    }

    Parser::new(text.as_bytes())
        .parse()
        .map(|doc| doc.root)
        .map_err(|err| Some(Diagnostic::from_parse_error(&err, &text)))
}

/// Parse and decode an in-memory document; empty values are kept.
///
/// A parse failure is reported as [`Error::Syntax`] with the same
/// diagnostic, source line and caret included, as a failed file read.
pub fn parse_str(content: &str) -> Result<Object> {
    Parser::new(content.as_bytes())
        .parse()
        .map(|doc| xml_to_array(&doc.root))
        .map_err(|err| Error::Syntax(Box::new(Diagnostic::from_parse_error(&err, content))))
}

/// Read the XML file at `path` into an [`Object`]
pub fn read_xml_file(path: impl Into<PathBuf>, options: &ReadOptions) -> Result<Object> {
    Reader::new(path).with_options(*options).read()
}
