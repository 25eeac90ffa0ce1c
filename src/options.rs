//! Configuration options for parsing and for the binary envelope.
//!
//! - [`ParseOptions`]: chooses between the lenient and the strict tree builder
//! - [`BinaryOptions`]: configures the binary codec call
//!
//! ## Examples
//!
//! ```rust
//! use flowdoc::{from_str_with_options, ParseOptions};
//!
//! let text = "server:\n  port = 8080\n";
//! let value = from_str_with_options(text, &ParseOptions::strict()).unwrap();
//! assert!(value.is_object());
//! ```

/// How the tree builder reacts to structural irregularities.
///
/// # Examples
///
/// ```rust
/// use flowdoc::ParseMode;
///
/// assert_eq!(ParseMode::default(), ParseMode::Lenient);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Skip lines without `=`, collapse unmatched dedents, never fail.
    #[default]
    Lenient,
    /// Report the first structural problem as an error.
    Strict,
}

/// Configuration options for the text parser.
///
/// # Examples
///
/// ```rust
/// use flowdoc::{ParseMode, ParseOptions};
///
/// let options = ParseOptions::new();
/// assert_eq!(options.mode, ParseMode::Lenient);
///
/// let options = ParseOptions::new().with_mode(ParseMode::Strict);
/// assert!(options.is_strict());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ParseOptions {
    pub mode: ParseMode,
}

impl ParseOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for the strict parser.
    #[must_use]
    pub fn strict() -> Self {
        ParseOptions {
            mode: ParseMode::Strict,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    #[inline]
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.mode == ParseMode::Strict
    }
}

/// Configuration passed into every binary codec call.
///
/// When `field_ids` is set, object keys whose field definition carries an id are
/// written as integer keys instead of full names.
///
/// # Examples
///
/// ```rust
/// use flowdoc::BinaryOptions;
///
/// let options = BinaryOptions::new();
/// assert!(!options.field_ids);
/// assert!(BinaryOptions::new().with_field_ids(true).field_ids);
/// ```
#[derive(Clone, Debug, Default)]
pub struct BinaryOptions {
    pub field_ids: bool,
}

impl BinaryOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Substitute integer field ids for full names where the model defines them.
    #[must_use]
    pub fn with_field_ids(mut self, field_ids: bool) -> Self {
        self.field_ids = field_ids;
        self
    }
}
