//! Error types for kvxml

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.offset, self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self::new(pos, pos)
    }
}

/// How bad a parser diagnostic is
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "Warning"),
            Self::Error => write!(f, "Error"),
            Self::Fatal => write!(f, "Fatal Error"),
        }
    }
}

/// Well-formedness violations reported by the XML parser
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    DocumentEmpty,
    ExtraContent,
    InvalidChar,
    InvalidUtf8,
    UndeclaredEntity { name: String },
    EntitySemicolonMissing,
    AttributeNotStarted,
    AttributeNotFinished,
    AttributeRedefined { name: String },
    LtInAttribute,
    EqualRequired,
    NameRequired,
    GtRequired,
    TagNameMismatch { expected: String, found: String },
    TagNotFinished { name: String },
    CommentNotFinished,
    PiNotFinished,
    CdataNotFinished,
    DoctypeNotFinished,
}

impl ErrorKind {
    /// Numeric code, using libxml2's `xmlParserErrors` numbering
    pub const fn code(&self) -> u32 {
        match self {
            Self::DocumentEmpty => 4,
            Self::ExtraContent => 5,
            Self::InvalidChar => 9,
            Self::EntitySemicolonMissing => 23,
            Self::UndeclaredEntity { .. } => 26,
            Self::LtInAttribute => 38,
            Self::AttributeNotStarted => 39,
            Self::AttributeNotFinished => 40,
            Self::AttributeRedefined { .. } => 42,
            Self::CommentNotFinished => 45,
            Self::PiNotFinished => 47,
            Self::DoctypeNotFinished => 61,
            Self::CdataNotFinished => 63,
            Self::NameRequired => 68,
            Self::GtRequired => 73,
            Self::EqualRequired => 75,
            Self::TagNameMismatch { .. } => 76,
            Self::TagNotFinished { .. } => 77,
            Self::InvalidUtf8 => 81,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DocumentEmpty => write!(f, "Document is empty"),
            Self::ExtraContent => write!(f, "Extra content at the end of the document"),
            Self::InvalidChar => write!(f, "invalid character in content"),
            Self::InvalidUtf8 => write!(f, "Input is not proper UTF-8"),
            Self::UndeclaredEntity { name } => write!(f, "Entity '{name}' not defined"),
            Self::EntitySemicolonMissing => write!(f, "EntityRef: expecting ';'"),
            Self::AttributeNotStarted => write!(f, "AttValue: \" or ' expected"),
            Self::AttributeNotFinished => write!(f, "AttValue: ' expected"),
            Self::AttributeRedefined { name } => write!(f, "Attribute {name} redefined"),
            Self::LtInAttribute => write!(f, "Unescaped '<' not allowed in attributes values"),
            Self::EqualRequired => write!(f, "Specification mandates value for attribute"),
            Self::NameRequired => write!(f, "StartTag: invalid element name"),
            Self::GtRequired => write!(f, "Couldn't find end of Start Tag"),
            Self::TagNameMismatch { expected, found } => {
                write!(f, "Opening and ending tag mismatch: {expected} and {found}")
            }
            Self::TagNotFinished { name } => {
                write!(f, "Premature end of data in tag {name}")
            }
            Self::CommentNotFinished => write!(f, "Comment not terminated"),
            Self::PiNotFinished => write!(f, "ParsePI: PI not terminated"),
            Self::CdataNotFinished => write!(f, "CData section not finished"),
            Self::DoctypeNotFinished => write!(f, "DOCTYPE improperly terminated"),
        }
    }
}

/// Error raised by the XML parser
#[derive(Error, Clone, Debug, PartialEq)]
pub struct ParseError {
    kind: ErrorKind,
    span: Span,
    severity: Severity,
    message: String,
}

impl ParseError {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            severity: Severity::Fatal,
            message,
        }
    }

    /// Create error at specific position
    pub fn at(kind: ErrorKind, pos: Pos) -> Self {
        Self::new(kind, Span::at(pos))
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> u32 {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error at {}: {}", self.span.start, self.message)
    }
}

/// A parser diagnostic together with the source line it points into.
///
/// Rendered as the offending line, a caret under the column, then the
/// severity, code, message and position:
///
/// ```text
/// <root><a></b></root>
/// ---------^
/// Fatal Error 76: Opening and ending tag mismatch: a and b
///   Line: 1
///   Column: 10
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: u32,
    pub column: u32,
    pub severity: Severity,
    pub code: u32,
    pub message: String,
    pub source_line: Option<String>,
}

impl Diagnostic {
    /// Build a diagnostic from a parse error and the text that was parsed
    pub fn from_parse_error(error: &ParseError, source: &str) -> Self {
        let pos = error.span().start;
        let source_line = pos
            .line
            .checked_sub(1)
            .and_then(|idx| usize::try_from(idx).ok())
            .and_then(|idx| source.lines().nth(idx))
            .map(str::to_owned);

        Self {
            line: pos.line,
            column: pos.col,
            severity: error.severity(),
            code: error.code(),
            message: error.message().to_owned(),
            source_line,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(line) = &self.source_line {
            let pad = usize::try_from(self.column.saturating_sub(1)).unwrap_or(0);
            writeln!(f, "{line}")?;
            writeln!(f, "{}^", "-".repeat(pad))?;
        }
        write!(
            f,
            "{} {}: {}\n  Line: {}\n  Column: {}",
            self.severity,
            self.code,
            self.message.trim(),
            self.line,
            self.column
        )
    }
}

fn describe(diagnostic: &Option<Box<Diagnostic>>) -> String {
    match diagnostic {
        Some(diagnostic) => diagnostic.to_string(),
        None => "Could not parse XML".to_string(),
    }
}

/// Main error type for kvxml
#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not read file: {} because: Not a file", .path.display())]
    NotAFile { path: PathBuf },

    #[error("Could not read file: {} because: {}", .path.display(), describe(.diagnostic))]
    Parse {
        path: PathBuf,
        diagnostic: Option<Box<Diagnostic>>,
    },

    /// In-memory content that failed to parse
    #[error("{0}")]
    Syntax(Box<Diagnostic>),

    #[error("invalid XML name: {0:?}")]
    InvalidName(String),

    #[error("attribute {0:?} must have a scalar value")]
    InvalidAttribute(String),

    #[error("I/O error on {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Parser diagnostic carried by an [`Error::Parse`] or [`Error::Syntax`]
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Parse { diagnostic, .. } => diagnostic.as_deref(),
            Self::Syntax(diagnostic) => Some(diagnostic),
            _ => None,
        }
    }
}

/// Result type alias for kvxml
pub type Result<T> = std::result::Result<T, Error>;
