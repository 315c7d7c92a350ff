//! Purpose: One error type for decoding, pooling, traversal, and the CLI.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`.
//! Invariants: Dispatch failures carry the union name and the raw discriminant byte.
//! Invariants: Exit codes per kind never change once published.

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    Io,
    /// A union slot carried a discriminant this layout version does not know.
    Discriminant,
    /// A read reached past the end of the buffer.
    Bounds,
    Utf8,
    /// Raised by a visitor callback to abandon a traversal.
    Visitor,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    path: Option<PathBuf>,
    offset: Option<u64>,
    union_name: Option<&'static str>,
    discriminant: Option<u8>,
    hint: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            path: None,
            offset: None,
            union_name: None,
            discriminant: None,
            hint: None,
            source: None,
        }
    }

    /// Fatal dispatch failure: the producer wrote a variant this decoder cannot map.
    pub fn unexpected_discriminant(union_name: &'static str, discriminant: u8) -> Self {
        Self::new(ErrorKind::Discriminant)
            .with_message(format!(
                "Unexpected discriminant {discriminant} for {union_name}"
            ))
            .with_union(union_name)
            .with_discriminant(discriminant)
    }

    pub fn out_of_bounds(offset: u64, width: u64, len: usize) -> Self {
        Self::new(ErrorKind::Bounds)
            .with_message(format!(
                "read of {width} bytes exceeds buffer of {len} bytes"
            ))
            .with_offset(offset)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn union_name(&self) -> Option<&'static str> {
        self.union_name
    }

    pub fn discriminant(&self) -> Option<u8> {
        self.discriminant
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_union(mut self, union_name: &'static str) -> Self {
        self.union_name = Some(union_name);
        self
    }

    pub fn with_discriminant(mut self, discriminant: u8) -> Self {
        self.discriminant = Some(discriminant);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        if let Some(offset) = self.offset {
            write!(f, " (offset: {offset})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::Io => 3,
        ErrorKind::Discriminant => 4,
        ErrorKind::Bounds => 5,
        ErrorKind::Utf8 => 6,
        ErrorKind::Visitor => 7,
    }
}
