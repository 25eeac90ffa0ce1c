//! Scalar value parsing.
//!
//! Two parsers live here:
//!
//! - [`parse_scalar`] classifies a raw token from a `key = value` line. It never fails;
//!   anything it does not recognise is kept as a String.
//! - [`parse_typed`] is the stricter parser used by model application. It validates a
//!   scalar's string form against a [`FieldType`] and reports a mismatch as
//!   [`Error::Coercion`].
//!
//! ```rust
//! use flowdoc::scalar::{parse_scalar, parse_typed};
//! use flowdoc::{FieldType, Value};
//!
//! assert_eq!(parse_scalar("3"), Value::Integer(3));
//! assert_eq!(parse_scalar("3.14159"), Value::Float(3.14159));
//! assert_eq!(parse_scalar("free text"), Value::from("free text"));
//!
//! assert_eq!(parse_typed("42", FieldType::Int).unwrap(), Value::Integer(42));
//! assert!(parse_typed("2025-13-40", FieldType::Date).is_err());
//! ```

use chrono::{NaiveDate, NaiveDateTime};

use crate::lexer::split_top_level;
use crate::model::FieldType;
use crate::{Error, Result, Value};

/// Parses a raw token into a typed value.
///
/// Priority order: `true`/`false`, quoted string (quotes stripped, no escapes),
/// bracketed array (elements parsed recursively), decimal number, verbatim string.
#[must_use]
pub fn parse_scalar(raw: &str) -> Value {
    let v = raw.trim();

    if v == "true" {
        return Value::Bool(true);
    }
    if v == "false" {
        return Value::Bool(false);
    }
    if let Some(inner) = strip_quotes(v) {
        return Value::String(inner.to_string());
    }
    if v.len() >= 2 && v.starts_with('[') && v.ends_with(']') {
        let inner = &v[1..v.len() - 1];
        if inner.trim().is_empty() {
            return Value::Array(Vec::new());
        }
        let elements = split_top_level(inner, ',')
            .into_iter()
            .map(parse_scalar)
            .collect();
        return Value::Array(elements);
    }
    if let Some(has_fraction) = number_shape(v) {
        // Literals that overflow the numeric types stay verbatim.
        let parsed = if has_fraction {
            v.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Float)
        } else {
            v.parse::<i64>().ok().map(Value::Integer)
        };
        if let Some(number) = parsed {
            return number;
        }
    }
    Value::String(v.to_string())
}

/// Strips one pair of enclosing double quotes.
#[inline]
fn strip_quotes(v: &str) -> Option<&str> {
    if v.len() >= 2 && v.starts_with('"') && v.ends_with('"') {
        Some(&v[1..v.len() - 1])
    } else {
        None
    }
}

/// Matches `-?\d+(\.\d+)?`; returns whether a fractional part is present.
fn number_shape(v: &str) -> Option<bool> {
    let digits = v.strip_prefix('-').unwrap_or(v);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) {
        return None;
    }
    match frac_part {
        Some(f) if all_digits(f) => Some(true),
        Some(_) => None,
        None => Some(false),
    }
}

/// Returns `true` when the unquoted token would be read back as something other than
/// the same String by [`parse_scalar`].
#[must_use]
pub fn is_ambiguous_bare(s: &str) -> bool {
    s == "true"
        || s == "false"
        || number_shape(s).is_some()
        || strip_quotes(s).is_some()
        || (s.starts_with('[') && s.ends_with(']'))
}

/// Validates and converts a scalar's string form according to `field_type`.
///
/// - `bool`: exactly `true` or `false`
/// - `int`: a 64-bit signed integer
/// - `float`: a finite floating point number
/// - `date`: `YYYY-MM-DD` naming a real calendar day, kept as a String
/// - `datetime`: a valid `YYYY-MM-DDTHH:MM:SS` prefix, any suffix, kept as a String
/// - `string`: one pair of enclosing quotes stripped, otherwise unchanged
///
/// # Errors
///
/// Returns [`Error::Coercion`] when the text does not satisfy the type.
pub fn parse_typed(raw: &str, field_type: FieldType) -> Result<Value> {
    let v = raw.trim();

    match field_type {
        FieldType::Bool => match v {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(Error::coercion(field_type, v)),
        },
        FieldType::Int => v
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| Error::coercion(field_type, v)),
        FieldType::Float => match v.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Value::Float(f)),
            _ => Err(Error::coercion(field_type, v)),
        },
        FieldType::Date => {
            if matches_shape(v, "dddd-dd-dd") && NaiveDate::parse_from_str(v, "%Y-%m-%d").is_ok()
            {
                Ok(Value::String(v.to_string()))
            } else {
                Err(Error::coercion(field_type, v))
            }
        }
        FieldType::DateTime => {
            let valid = v.get(..19).is_some_and(|prefix| {
                matches_shape(prefix, "dddd-dd-ddTdd:dd:dd")
                    && NaiveDateTime::parse_from_str(prefix, "%Y-%m-%dT%H:%M:%S").is_ok()
            });
            if valid {
                Ok(Value::String(v.to_string()))
            } else {
                Err(Error::coercion(field_type, v))
            }
        }
        FieldType::String => Ok(Value::String(strip_quotes(v).unwrap_or(v).to_string())),
    }
}

/// `d` in `pattern` matches one ASCII digit; every other byte must match literally.
fn matches_shape(s: &str, pattern: &str) -> bool {
    s.len() == pattern.len()
        && s.bytes().zip(pattern.bytes()).all(|(c, p)| match p {
            b'd' => c.is_ascii_digit(),
            _ => c == p,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booleans_are_exact() {
        assert_eq!(parse_scalar("true"), Value::Bool(true));
        assert_eq!(parse_scalar("  false "), Value::Bool(false));
        assert_eq!(parse_scalar("True"), Value::from("True"));
    }

    #[test]
    fn test_quoted_strings_keep_content_literally() {
        assert_eq!(parse_scalar("\"Oscilloscope A\""), Value::from("Oscilloscope A"));
        assert_eq!(parse_scalar("\"\""), Value::from(""));
        assert_eq!(parse_scalar("\"a\\nb\""), Value::from("a\\nb"));
        assert_eq!(parse_scalar("\"42\""), Value::from("42"));
        // a lone quote is not a quoted string
        assert_eq!(parse_scalar("\""), Value::from("\""));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_scalar("3"), Value::Integer(3));
        assert_eq!(parse_scalar("-12"), Value::Integer(-12));
        assert_eq!(parse_scalar("3.14159"), Value::Float(3.14159));
        assert_eq!(parse_scalar("-0.5"), Value::Float(-0.5));
        assert_eq!(parse_scalar("1.2.3"), Value::from("1.2.3"));
        assert_eq!(parse_scalar("1e5"), Value::from("1e5"));
        assert_eq!(parse_scalar("0x1F"), Value::from("0x1F"));
        assert_eq!(parse_scalar(".5"), Value::from(".5"));
        assert_eq!(parse_scalar("5."), Value::from("5."));
        assert_eq!(parse_scalar("+5"), Value::from("+5"));
    }

    #[test]
    fn test_integer_overflow_stays_verbatim() {
        assert_eq!(
            parse_scalar("99999999999999999999"),
            Value::from("99999999999999999999")
        );
    }

    #[test]
    fn test_float_overflow_stays_verbatim() {
        let huge = format!("1{}.0", "0".repeat(400));
        assert_eq!(parse_scalar(&huge), Value::String(huge.clone()));
        assert_eq!(
            parse_scalar(&format!("-{}", huge)),
            Value::String(format!("-{}", huge))
        );
    }

    #[test]
    fn test_arrays() {
        assert_eq!(
            parse_scalar("[us, eu, asia]"),
            Value::Array(vec![
                Value::from("us"),
                Value::from("eu"),
                Value::from("asia")
            ])
        );
        assert_eq!(parse_scalar("[]"), Value::Array(vec![]));
        assert_eq!(parse_scalar("[   ]"), Value::Array(vec![]));
        assert_eq!(
            parse_scalar("[1, 2.5, true, \"x, y\"]"),
            Value::Array(vec![
                Value::Integer(1),
                Value::Float(2.5),
                Value::Bool(true),
                Value::from("x, y"),
            ])
        );
    }

    #[test]
    fn test_nested_arrays() {
        assert_eq!(
            parse_scalar("[[1, 2], [], [a]]"),
            Value::Array(vec![
                Value::Array(vec![Value::Integer(1), Value::Integer(2)]),
                Value::Array(vec![]),
                Value::Array(vec![Value::from("a")]),
            ])
        );
    }

    #[test]
    fn test_free_text() {
        assert_eq!(parse_scalar("INS-0001"), Value::from("INS-0001"));
        assert_eq!(parse_scalar("hello big world"), Value::from("hello big world"));
    }

    #[test]
    fn test_typed_bool() {
        assert_eq!(parse_typed("true", FieldType::Bool).unwrap(), Value::Bool(true));
        assert!(matches!(
            parse_typed("yes", FieldType::Bool),
            Err(Error::Coercion { field_type: FieldType::Bool, .. })
        ));
    }

    #[test]
    fn test_typed_numbers() {
        assert_eq!(parse_typed(" 42 ", FieldType::Int).unwrap(), Value::Integer(42));
        assert!(parse_typed("4.2", FieldType::Int).is_err());
        assert_eq!(parse_typed("42", FieldType::Float).unwrap(), Value::Float(42.0));
        assert_eq!(parse_typed("1e3", FieldType::Float).unwrap(), Value::Float(1000.0));
        assert!(parse_typed("inf", FieldType::Float).is_err());
        assert!(parse_typed("abc", FieldType::Float).is_err());
    }

    #[test]
    fn test_typed_date() {
        assert_eq!(
            parse_typed("2025-01-31", FieldType::Date).unwrap(),
            Value::from("2025-01-31")
        );
        assert!(parse_typed("2025-13-40", FieldType::Date).is_err());
        assert!(parse_typed("2025-02-30", FieldType::Date).is_err());
        assert!(parse_typed("2025-1-31", FieldType::Date).is_err());
        assert!(parse_typed("2025-01-31T00:00:00", FieldType::Date).is_err());
    }

    #[test]
    fn test_typed_datetime() {
        assert_eq!(
            parse_typed("2025-01-31T08:30:00", FieldType::DateTime).unwrap(),
            Value::from("2025-01-31T08:30:00")
        );
        assert_eq!(
            parse_typed("2025-01-31T08:30:00.250+02:00", FieldType::DateTime).unwrap(),
            Value::from("2025-01-31T08:30:00.250+02:00")
        );
        assert!(parse_typed("2025-01-31", FieldType::DateTime).is_err());
        assert!(parse_typed("2025-01-31 08:30:00", FieldType::DateTime).is_err());
        assert!(parse_typed("2025-01-31T25:00:00", FieldType::DateTime).is_err());
    }

    #[test]
    fn test_typed_string_strips_one_quote_pair() {
        assert_eq!(
            parse_typed("\"quoted\"", FieldType::String).unwrap(),
            Value::from("quoted")
        );
        assert_eq!(
            parse_typed("\"\"twice\"\"", FieldType::String).unwrap(),
            Value::from("\"twice\"")
        );
        assert_eq!(parse_typed("plain", FieldType::String).unwrap(), Value::from("plain"));
    }

    #[test]
    fn test_ambiguous_bare_strings() {
        assert!(is_ambiguous_bare("true"));
        assert!(is_ambiguous_bare("12"));
        assert!(is_ambiguous_bare("-1.5"));
        assert!(is_ambiguous_bare("\"x\""));
        assert!(is_ambiguous_bare("[x]"));
        assert!(!is_ambiguous_bare("INS-0001"));
        assert!(!is_ambiguous_bare("1.2.3"));
    }
}
