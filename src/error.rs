//! Error types for flowdoc parsing, serialization and model resolution.
//!
//! ## Error Categories
//!
//! - **Structural errors**: only raised in [`ParseMode::Strict`](crate::ParseMode::Strict).
//!   The default lenient parser never fails on malformed indentation or stray lines.
//! - **Model errors**: `use_model` naming a model that is not registered, or holding
//!   something other than a name. These are the only failures that cross
//!   [`from_str_with_model`](crate::from_str_with_model).
//! - **Coercion errors**: a raw scalar does not match a field's declared type. Exposed by
//!   [`parse_typed`](crate::scalar::parse_typed) and swallowed during model application.
//! - **I/O and codec errors**: surfaced unchanged to the caller.
//!
//! ## Examples
//!
//! ```rust
//! use flowdoc::{from_str_with_options, ParseOptions};
//!
//! let result = from_str_with_options("server\n  port = 80", &ParseOptions::strict());
//! assert!(result.is_err());
//! ```

use std::fmt;
use thiserror::Error;

use crate::model::FieldType;

/// Represents all possible errors produced by this crate.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Structural error reported by the strict parser
    #[error("Syntax error at line {line}, column {col}:\n{context}\n{msg}")]
    Syntax {
        line: usize,
        col: usize,
        msg: String,
        context: String,
    },

    /// Indentation error reported by the strict parser
    #[error("Indentation error at line {line}:\n{context}\nExpected at most {expected} spaces, found {found} spaces\nHelp: nested entries use 2-space indentation")]
    IndentationError {
        line: usize,
        expected: usize,
        found: usize,
        context: String,
    },

    /// `use_model` names a model that is not in the registry
    #[error("model '{0}' not found in registry")]
    ModelNotFound(String),

    /// `use_model` is present but does not hold a model name
    #[error("use_model must be a string, found {0}")]
    InvalidDirective(String),

    /// A raw scalar does not satisfy a field's declared type
    #[error("invalid {field_type} value: {value}")]
    Coercion { field_type: FieldType, value: String },

    /// A tree shape the text notation cannot express
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Binary envelope encode/decode failure
    #[error("Codec error: {0}")]
    Codec(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a syntax error with the offending line as context.
    ///
    /// ```rust
    /// use flowdoc::Error;
    ///
    /// let err = Error::syntax(3, 1, "expected `key = value`", "name Alice");
    /// assert!(err.to_string().contains("line 3"));
    /// ```
    pub fn syntax(line: usize, col: usize, msg: &str, context: &str) -> Self {
        Error::Syntax {
            line,
            col,
            msg: msg.to_string(),
            context: context.to_string(),
        }
    }

    pub fn indentation_error(line: usize, expected: usize, found: usize, context: &str) -> Self {
        Error::IndentationError {
            line,
            expected,
            found,
            context: context.to_string(),
        }
    }

    /// Creates a coercion error for a value that does not match `field_type`.
    ///
    /// ```rust
    /// use flowdoc::{Error, FieldType};
    ///
    /// let err = Error::coercion(FieldType::Int, "abc");
    /// assert_eq!(err.to_string(), "invalid int value: abc");
    /// ```
    pub fn coercion(field_type: FieldType, value: &str) -> Self {
        Error::Coercion {
            field_type,
            value: value.to_string(),
        }
    }

    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    pub fn codec<T: fmt::Display>(msg: T) -> Self {
        Error::Codec(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Returns `true` for errors that the lenient pipeline never produces.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::Syntax { .. } | Error::IndentationError { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
