//! # flowdoc
//!
//! An indentation-structured data notation with a JSON-like value tree.
//!
//! ## The notation
//!
//! ```text
//! # comments run to the end of the line
//! name = "Oscilloscope A"
//! retries = 3
//! ratio = 0.75
//! enabled = true
//! regions = [us, eu, [ap, sa]]
//! limits:
//!   max = 10
//!   min = -2
//! ```
//!
//! - `key = value` assigns a scalar or an inline array.
//! - `key:` opens a nested object; its entries sit two spaces deeper.
//! - Values are `true`/`false`, integers, decimals, `"quoted strings"`, bracketed
//!   arrays, or bare text taken verbatim.
//!
//! A document may also declare mapping models under `$models` and pick one with
//! `use_model`, so short aliases in the body resolve to full field names with typed
//! values. See [`mapping`].
//!
//! ## Quick Start
//!
//! ```rust
//! use flowdoc::{from_str, to_string, Value};
//!
//! let value = from_str("name = probe\nlimits:\n  max = 10\n");
//! assert_eq!(value.get("name"), Some(&Value::from("probe")));
//! assert_eq!(
//!     value.get("limits").and_then(|l| l.get("max")),
//!     Some(&Value::Integer(10))
//! );
//!
//! let text = to_string(&value).unwrap();
//! assert_eq!(from_str(&text), value);
//! ```
//!
//! ### Typed data
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use flowdoc::{from_value, to_value, to_string, from_str};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Limits {
//!     max: i64,
//!     labels: Vec<String>,
//! }
//!
//! let limits = Limits { max: 10, labels: vec!["hot".into(), "cold".into()] };
//! let text = to_string(&to_value(&limits).unwrap()).unwrap();
//! assert_eq!(text, "max = 10\nlabels = [hot, cold]\n");
//!
//! let back: Limits = from_value(from_str(&text)).unwrap();
//! assert_eq!(back, limits);
//! ```
//!
//! ### Building values with `flow!`
//!
//! ```rust
//! use flowdoc::{flow, Value};
//!
//! let value = flow!({ "tags": ["a", "b"], "retries": 3 });
//! assert_eq!(value.get("retries"), Some(&Value::Integer(3)));
//! ```
//!
//! ## Modules
//!
//! - [`lexer`]: line splitting, comment stripping, indentation levels
//! - [`scalar`]: untyped and typed value literals
//! - [`de`]: the indentation tree builder and [`from_value`] support
//! - [`ser`]: writing trees back to text, and [`to_value`] support
//! - [`model`] and [`mapping`]: alias/type models and their application
//! - [`binary`]: the MessagePack envelope
//! - [`json`]: conversion to and from JSON text
//!
//! The demos under `demos/` can be run with `cargo run --example <name>`.

pub mod binary;
pub mod de;
pub mod error;
pub mod json;
pub mod lexer;
pub mod macros;
pub mod map;
pub mod mapping;
pub mod model;
pub mod options;
pub mod scalar;
pub mod ser;
pub mod value;

pub use de::TreeBuilder;
pub use error::{Error, Result};
pub use map::FlowMap;
pub use model::{FieldDefinition, FieldType, ModelDefinition, ModelRegistry};
pub use options::{BinaryOptions, ParseMode, ParseOptions};
pub use ser::{Serializer, ValueSerializer};
pub use value::Value;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Parses a document leniently.
///
/// Lenient parsing never fails: malformed lines are skipped and an empty or
/// comment-only document gives an empty object.
///
/// # Examples
///
/// ```rust
/// use flowdoc::{from_str, Value};
///
/// let value = from_str("a = 1\nthis line is ignored\nb = [x, 2]\n");
/// assert_eq!(value.get("a"), Some(&Value::Integer(1)));
/// assert_eq!(value.as_object().map(|o| o.len()), Some(2));
/// ```
#[must_use]
pub fn from_str(text: &str) -> Value {
    from_str_with_options(text, &ParseOptions::default()).unwrap_or_else(|err| {
        warn!(error = %err, "lenient parse reported an error");
        Value::Object(FlowMap::new())
    })
}

/// Parses a document with explicit options.
///
/// # Examples
///
/// ```rust
/// use flowdoc::{from_str_with_options, Error, ParseOptions};
///
/// let err = from_str_with_options("a = 1\nnot a pair\n", &ParseOptions::strict()).unwrap_err();
/// assert!(matches!(err, Error::Syntax { line: 2, .. }));
/// ```
///
/// # Errors
///
/// Only in [`ParseMode::Strict`]: [`Error::Syntax`] or [`Error::IndentationError`]
/// for the first malformed line.
pub fn from_str_with_options(text: &str, options: &ParseOptions) -> Result<Value> {
    let lines = lexer::tokenize(text);
    debug!(lines = lines.len(), mode = ?options.mode, "parsing document");
    let root = TreeBuilder::new(options).build(&lines)?;
    Ok(Value::Object(root))
}

/// Parses UTF-8 bytes leniently.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8.
pub fn from_slice(bytes: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(bytes).map_err(Error::custom)?;
    Ok(from_str(text))
}

/// Reads a whole stream and parses it leniently.
///
/// # Examples
///
/// ```rust
/// use flowdoc::{from_reader, Value};
/// use std::io::Cursor;
///
/// let value = from_reader(Cursor::new(b"x = 1\ny = 2\n")).unwrap();
/// assert_eq!(value.get("y"), Some(&Value::Integer(2)));
/// ```
///
/// # Errors
///
/// [`Error::Io`] if reading fails.
pub fn from_reader<R>(mut reader: R) -> Result<Value>
where
    R: io::Read,
{
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(from_str(&text))
}

/// Parses a file leniently.
///
/// # Errors
///
/// [`Error::Io`] if the file cannot be read.
pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Value> {
    let text = fs::read_to_string(path)?;
    Ok(from_str(&text))
}

/// Parses a document and resolves its `$models` / `use_model` directives.
///
/// When `registry` is `None` the document's own `$models` block is used.
/// A document without `use_model` parses exactly as [`from_str`] does, minus any
/// `$models` block.
///
/// # Examples
///
/// ```rust
/// use flowdoc::{from_str_with_model, FieldDefinition, FieldType, ModelDefinition, ModelRegistry, Value};
///
/// let mut model = ModelDefinition::new("Reading");
/// model.add_field(FieldDefinition::new("temperature", "t").with_type(FieldType::Float));
/// let mut registry = ModelRegistry::new();
/// registry.register(model);
///
/// let value = from_str_with_model("use_model = Reading\nnow:\n  t = 21\n", Some(&registry)).unwrap();
/// assert_eq!(
///     value.get("now").and_then(|n| n.get("temperature")),
///     Some(&Value::Float(21.0))
/// );
/// ```
///
/// # Errors
///
/// [`Error::ModelNotFound`] or [`Error::InvalidDirective`] for a bad `use_model`.
pub fn from_str_with_model(text: &str, registry: Option<&ModelRegistry>) -> Result<Value> {
    mapping::resolve_document(from_str(text), registry)
}

/// Reads a file and resolves its model directives, see [`from_str_with_model`].
///
/// # Errors
///
/// [`Error::Io`] if the file cannot be read, otherwise as [`from_str_with_model`].
pub fn from_path_with_model<P: AsRef<Path>>(
    path: P,
    registry: Option<&ModelRegistry>,
) -> Result<Value> {
    let text = fs::read_to_string(path)?;
    from_str_with_model(&text, registry)
}

/// Writes a tree as flowdoc text.
///
/// The root must be an Object. The output ends with a newline unless the object is
/// empty, in which case it is the empty string.
///
/// # Errors
///
/// [`Error::UnsupportedType`] for trees the notation cannot express: a non-object
/// root, an object nested inside an array, a non-finite float, a string with a line
/// break, or a key containing `=`, `#`, `"` or surrounding whitespace.
pub fn to_string(value: &Value) -> Result<String> {
    let mut serializer = Serializer::new();
    serializer.write_document(value)?;
    Ok(serializer.into_inner())
}

/// Writes a tree as flowdoc text into `writer`.
///
/// # Errors
///
/// Errors of [`to_string`], or [`Error::Io`] if writing fails.
pub fn to_writer<W>(mut writer: W, value: &Value) -> Result<()>
where
    W: io::Write,
{
    let text = to_string(value)?;
    writer.write_all(text.as_bytes())?;
    Ok(())
}

/// Writes a tree as flowdoc text to a file.
///
/// # Errors
///
/// Errors of [`to_string`], or [`Error::Io`] if the file cannot be written.
pub fn to_path<P: AsRef<Path>>(path: P, value: &Value) -> Result<()> {
    let text = to_string(value)?;
    fs::write(path, text)?;
    Ok(())
}

/// Converts any `T: Serialize` into a [`Value`].
///
/// # Examples
///
/// ```rust
/// use flowdoc::{to_value, Value};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let value = to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(value.get("x"), Some(&Value::Integer(1)));
/// ```
///
/// # Errors
///
/// [`Error::UnsupportedType`] if `value` is `None` or unit at the top level, or
/// contains a shape with no tree representation.
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value
        .serialize(ValueSerializer)?
        .ok_or_else(|| Error::unsupported_type("null has no flowdoc representation"))
}

/// Reads a `T: Deserialize` out of a [`Value`].
///
/// # Examples
///
/// ```rust
/// use flowdoc::{from_str, from_value};
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_value(from_str("x = 1\ny = 2\n")).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
/// ```
///
/// # Errors
///
/// Returns an error if the tree does not match the shape of `T`.
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(de::ValueDeserializer::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Device {
        id: u32,
        name: String,
        active: bool,
        tags: Vec<String>,
        firmware: Option<String>,
    }

    fn device() -> Device {
        Device {
            id: 123,
            name: "Bench PSU".to_string(),
            active: true,
            tags: vec!["lab".to_string(), "42".to_string()],
            firmware: None,
        }
    }

    #[test]
    fn test_typed_round_trip_through_text() {
        let text = to_string(&to_value(&device()).unwrap()).unwrap();
        assert_eq!(
            text,
            "id = 123\nname = \"Bench PSU\"\nactive = true\ntags = [lab, \"42\"]\n"
        );
        let back: Device = from_value(from_str(&text)).unwrap();
        assert_eq!(back, device());
    }

    #[test]
    fn test_empty_documents() {
        assert_eq!(from_str(""), Value::Object(FlowMap::new()));
        assert_eq!(from_str("# only a comment\n\n"), Value::Object(FlowMap::new()));
        assert_eq!(to_string(&Value::Object(FlowMap::new())).unwrap(), "");
    }

    #[test]
    fn test_top_level_value_must_be_object() {
        assert!(matches!(
            to_string(&Value::Integer(1)),
            Err(Error::UnsupportedType(_))
        ));
        assert!(to_value(&None::<i32>).is_err());
    }

    #[test]
    fn test_from_slice_rejects_invalid_utf8() {
        assert!(from_slice(&[0xff, 0xfe]).is_err());
        assert_eq!(
            from_slice(b"k = v\n").unwrap().get("k"),
            Some(&Value::from("v"))
        );
    }

    #[test]
    fn test_writer_and_reader() {
        let value = from_str("a:\n  b = 1\n");
        let mut buffer = Vec::new();
        to_writer(&mut buffer, &value).unwrap();
        assert_eq!(buffer, b"a:\n  b = 1\n");
        assert_eq!(from_reader(buffer.as_slice()).unwrap(), value);
    }

    #[test]
    fn test_strict_mode_matches_lenient_on_valid_input() {
        let text = "a = 1\nb:\n  c = [1, 2]\n";
        assert_eq!(
            from_str_with_options(text, &ParseOptions::strict()).unwrap(),
            from_str(text)
        );
    }

    #[test]
    fn test_model_orchestration_uses_embedded_models() {
        let text = "\
$models:
  Reading:
    fields:
      temperature:
        alias = t
        type = float
use_model = Reading
now:
  t = 21
";
        let value = from_str_with_model(text, None).unwrap();
        assert_eq!(value, flow!({ "now": { "temperature": 21.0 } }));
    }
}
