//! Flowdoc serialization.
//!
//! [`Serializer`] renders an object tree back into the line notation, walking keys in
//! insertion order:
//!
//! - an Object under `k` becomes a `k:` header followed by its entries, two spaces deeper
//! - an Array under `k` becomes `k = [e1, e2, ...]`, nested arrays recursively
//! - a scalar under `k` becomes `k = <literal>`
//!
//! Strings are written bare unless the bare text would be read back differently
//! (see [`needs_quotes`]). Floats always keep a fractional part.
//!
//! Serialization always writes full field names. A tree produced from an aliased
//! document does not turn back into aliases on the way out.
//!
//! ```rust
//! use flowdoc::{flow, to_string};
//!
//! let value = flow!({
//!     "name": "Oscilloscope A",
//!     "retries": 3,
//!     "regions": ["us", "eu"],
//!     "limits": { "max": 2.0 }
//! });
//! let text = to_string(&value).unwrap();
//! assert_eq!(
//!     text,
//!     "name = \"Oscilloscope A\"\nretries = 3\nregions = [us, eu]\nlimits:\n  max = 2.0\n"
//! );
//! ```
//!
//! [`ValueSerializer`] goes the other way round for typed data: any `T: Serialize`
//! becomes a [`Value`] through [`to_value`](crate::to_value).

use serde::{ser, Serialize};

use crate::scalar::is_ambiguous_bare;
use crate::value::format_float;
use crate::{Error, FlowMap, Result, Value};

const INDENT: usize = 2;

/// Writes trees in the line notation.
#[derive(Default)]
pub struct Serializer {
    output: String,
}

impl Serializer {
    pub fn new() -> Self {
        Serializer {
            output: String::with_capacity(256),
        }
    }

    pub fn into_inner(self) -> String {
        self.output
    }

    /// Writes a whole document. The root must be an Object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] for a non-object root and for any shape
    /// the notation cannot express.
    pub fn write_document(&mut self, root: &Value) -> Result<()> {
        match root {
            Value::Object(map) => self.write_object(map, 0),
            other => Err(Error::unsupported_type(&format!(
                "top-level value must be an object, found {}",
                other.type_name()
            ))),
        }
    }

    fn write_object(&mut self, map: &FlowMap, indent: usize) -> Result<()> {
        for (key, value) in map.iter() {
            check_key(key)?;
            self.output.push_str(&" ".repeat(indent));
            self.output.push_str(key);

            match value {
                Value::Object(child) => {
                    self.output.push_str(":\n");
                    self.write_object(child, indent + INDENT)?;
                }
                _ => {
                    self.output.push_str(" = ");
                    self.write_inline(value)?;
                    self.output.push('\n');
                }
            }
        }
        Ok(())
    }

    fn write_inline(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Bool(b) => self.output.push_str(if *b { "true" } else { "false" }),
            Value::Integer(i) => self.output.push_str(&i.to_string()),
            Value::Float(f) => {
                if !f.is_finite() {
                    return Err(Error::unsupported_type(&format!("non-finite float {}", f)));
                }
                self.output.push_str(&format_float(*f));
            }
            Value::String(s) => self.write_string(s)?,
            Value::Array(arr) => {
                self.output.push('[');
                for (i, element) in arr.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.write_inline(element)?;
                }
                self.output.push(']');
            }
            Value::Object(_) => {
                return Err(Error::unsupported_type("object nested inside an array"));
            }
        }
        Ok(())
    }

    #[inline]
    fn write_string(&mut self, s: &str) -> Result<()> {
        if s.contains(&['\n', '\r'][..]) {
            return Err(Error::unsupported_type("string containing a line break"));
        }
        // tabs are read back as two spaces
        if s.contains('\t') {
            return Err(Error::unsupported_type("string containing a tab"));
        }
        if needs_quotes(s) {
            self.output.push('"');
            self.output.push_str(s);
            self.output.push('"');
        } else {
            self.output.push_str(s);
        }
        Ok(())
    }
}

/// Returns `true` when a string has to be written inside `"..."` to read back unchanged.
///
/// ```rust
/// use flowdoc::ser::needs_quotes;
///
/// assert!(needs_quotes("Oscilloscope A"));
/// assert!(needs_quotes(""));
/// assert!(needs_quotes("42"));
/// assert!(needs_quotes("true"));
/// assert!(needs_quotes("a#b"));
/// assert!(!needs_quotes("INS-0001"));
/// ```
#[must_use]
pub fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.chars().any(char::is_whitespace)
        || s.contains(&['#', '=', ',', '[', ']'][..])
        || s.ends_with(':')
        || is_ambiguous_bare(s)
}

fn check_key(key: &str) -> Result<()> {
    if key.contains(&['=', '#', '"', '\n', '\r', '\t'][..]) || key.trim() != key {
        return Err(Error::unsupported_type(&format!(
            "key {:?} cannot be written in the line notation",
            key
        )));
    }
    Ok(())
}

/// Converts `T: Serialize` into a [`Value`].
///
/// `None` and unit values have no tree representation: inside a struct or map the
/// entry is left out, anywhere else they are an error.
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
}

pub struct SerializeMap {
    map: FlowMap,
    current_key: Option<String>,
}

pub struct SerializeVariant {
    variant: &'static str,
    inner: SerializeMap,
}

impl ser::Serializer for ValueSerializer {
    type Ok = Option<Value>;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = ser::Impossible<Option<Value>, Error>;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeVariant;

    fn serialize_bool(self, v: bool) -> Result<Option<Value>> {
        Ok(Some(Value::Bool(v)))
    }

    fn serialize_i8(self, v: i8) -> Result<Option<Value>> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<Option<Value>> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<Option<Value>> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<Option<Value>> {
        Ok(Some(Value::Integer(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<Option<Value>> {
        self.serialize_i64(v as i64)
    }

    fn serialize_u16(self, v: u16) -> Result<Option<Value>> {
        self.serialize_i64(v as i64)
    }

    fn serialize_u32(self, v: u32) -> Result<Option<Value>> {
        self.serialize_i64(v as i64)
    }

    fn serialize_u64(self, v: u64) -> Result<Option<Value>> {
        if v <= i64::MAX as u64 {
            Ok(Some(Value::Integer(v as i64)))
        } else {
            Ok(Some(Value::Float(v as f64)))
        }
    }

    fn serialize_f32(self, v: f32) -> Result<Option<Value>> {
        self.serialize_f64(v as f64)
    }

    fn serialize_f64(self, v: f64) -> Result<Option<Value>> {
        Ok(Some(Value::Float(v)))
    }

    fn serialize_char(self, v: char) -> Result<Option<Value>> {
        Ok(Some(Value::String(v.to_string())))
    }

    fn serialize_str(self, v: &str) -> Result<Option<Value>> {
        Ok(Some(Value::String(v.to_string())))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Option<Value>> {
        let vec = v.iter().map(|&b| Value::Integer(b as i64)).collect();
        Ok(Some(Value::Array(vec)))
    }

    fn serialize_none(self) -> Result<Option<Value>> {
        Ok(None)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Option<Value>>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Option<Value>> {
        Ok(None)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Option<Value>> {
        Ok(None)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Option<Value>> {
        Ok(Some(Value::String(variant.to_string())))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Option<Value>>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Option<Value>>
    where
        T: ?Sized + Serialize,
    {
        let mut map = FlowMap::new();
        if let Some(inner) = value.serialize(ValueSerializer)? {
            map.insert(variant.to_string(), inner);
        }
        Ok(Some(Value::Object(map)))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec {
            vec: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::unsupported_type("tuple variants"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeVariant> {
        Ok(SerializeVariant {
            variant,
            inner: SerializeMap::new(),
        })
    }
}

impl SerializeVec {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        match value.serialize(ValueSerializer)? {
            Some(v) => {
                self.vec.push(v);
                Ok(())
            }
            None => Err(Error::unsupported_type("null array element")),
        }
    }
}

impl SerializeMap {
    fn new() -> Self {
        SerializeMap {
            map: FlowMap::new(),
            current_key: None,
        }
    }

    fn put<T: ?Sized + Serialize>(&mut self, key: String, value: &T) -> Result<()> {
        if let Some(v) = value.serialize(ValueSerializer)? {
            self.map.insert(key, v);
        }
        Ok(())
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(Some(Value::Array(self.vec)))
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(Some(Value::Array(self.vec)))
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(Some(Value::Array(self.vec)))
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        match key.serialize(ValueSerializer)? {
            Some(Value::String(s)) => {
                self.current_key = Some(s);
                Ok(())
            }
            _ => Err(Error::custom("map keys must be strings")),
        }
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.put(key, value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(Some(Value::Object(self.map)))
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.put(key.to_string(), value)
    }

    fn end(self) -> Result<Option<Value>> {
        Ok(Some(Value::Object(self.map)))
    }
}

impl ser::SerializeStructVariant for SerializeVariant {
    type Ok = Option<Value>;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.inner.put(key.to_string(), value)
    }

    fn end(self) -> Result<Option<Value>> {
        let mut outer = FlowMap::new();
        outer.insert(self.variant.to_string(), Value::Object(self.inner.map));
        Ok(Some(Value::Object(outer)))
    }
}
