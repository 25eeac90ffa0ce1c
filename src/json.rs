//! Conversion between flowdoc text and JSON.
//!
//! ```rust
//! use flowdoc::json;
//!
//! let out = json::flow_to_json("name = probe\nlimits:\n  max = 3\n").unwrap();
//! let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
//! assert_eq!(parsed["limits"]["max"], 3);
//!
//! let text = json::json_to_flow(r#"{"ratio": 2.0, "tags": ["a", "b"]}"#).unwrap();
//! assert_eq!(text, "ratio = 2.0\ntags = [a, b]\n");
//! ```

use crate::{Error, Result, Value};

/// Parses flowdoc text leniently and renders it as pretty-printed JSON.
///
/// # Errors
///
/// [`Error::Custom`] if JSON encoding fails.
pub fn flow_to_json(text: &str) -> Result<String> {
    let value = crate::from_str(text);
    serde_json::to_string_pretty(&value).map_err(Error::custom)
}

/// Parses JSON and renders it as flowdoc text.
///
/// # Errors
///
/// [`Error::Custom`] for invalid JSON or JSON `null`, and any serializer error from
/// [`to_string`](crate::to_string), e.g. an object nested inside an array.
pub fn json_to_flow(json: &str) -> Result<String> {
    let value: Value = serde_json::from_str(json).map_err(Error::custom)?;
    crate::to_string(&value)
}
