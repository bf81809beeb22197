//! Error handling for pdfwash

use std::io;
use thiserror::Error;

/// The main error type for pdfwash operations
#[derive(Error, Debug)]
pub enum Error {
    /// The lexer or parser could not make sense of the bytes.
    #[error("Syntax error: {0}")]
    Syntax(String),
    /// A cyclic or otherwise unresolvable indirect reference.
    #[error("Bad reference: {0}")]
    Reference(String),
    /// A filter name the pipeline does not know how to decode.
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),
    /// A filter ran but the compressed data was corrupt.
    #[error("Decode error: {0}")]
    Decode(String),
    /// Bad password or an unsupported security handler.
    #[error("Encryption error: {0}")]
    Encryption(String),
    /// Underlying file access failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Operation aborted by the caller.
    #[error("Operation aborted")]
    Abort,
}

impl Error {
    pub fn syntax<S: Into<String>>(msg: S) -> Self {
        Error::Syntax(msg.into())
    }
    pub fn reference<S: Into<String>>(msg: S) -> Self {
        Error::Reference(msg.into())
    }
    pub fn unsupported_filter<S: Into<String>>(msg: S) -> Self {
        Error::UnsupportedFilter(msg.into())
    }
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Error::Decode(msg.into())
    }
    pub fn encryption<S: Into<String>>(msg: S) -> Self {
        Error::Encryption(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_syntax() {
        let e = Error::syntax("unexpected token");
        assert!(matches!(e, Error::Syntax(_)));
        assert!(format!("{}", e).contains("unexpected token"));
    }

    #[test]
    fn test_error_reference() {
        let e = Error::reference("object stream cycle");
        assert!(matches!(e, Error::Reference(_)));
        assert!(format!("{}", e).contains("cycle"));
    }

    #[test]
    fn test_error_unsupported_filter() {
        let e = Error::unsupported_filter("FooDecode");
        assert!(matches!(e, Error::UnsupportedFilter(_)));
        assert!(format!("{}", e).contains("FooDecode"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(format!("{}", e).contains("file not found"));
    }

    #[test]
    fn test_result_type() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_ok().unwrap(), 42);
    }
}
