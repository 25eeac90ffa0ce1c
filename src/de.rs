//! Flowdoc deserialization.
//!
//! Two directions of "reading" live here:
//!
//! - [`TreeBuilder`] turns tokenized lines into an object tree using a stack of
//!   indentation frames.
//! - [`from_value`](crate::from_value) hands a tree to any `T: Deserialize`, so
//!   application code can read a model-applied document straight into a struct.
//!
//! ## Indentation frames
//!
//! The builder keeps a stack of open objects, each tagged with the indentation level
//! of its children. The root frame (level 0) is never closed. For every line:
//!
//! - `key:` closes frames deeper than the line, then opens a new object one level down.
//! - `key = value` closes frames deeper than the line, then assigns into the innermost
//!   open object.
//!
//! In [`ParseMode::Lenient`](crate::ParseMode::Lenient) a line without `=` is skipped
//! and a line indented past its enclosing object is attached to that object anyway.
//! [`ParseMode::Strict`](crate::ParseMode::Strict) reports both.
//!
//! ```rust
//! use flowdoc::from_str;
//!
//! let value = from_str("app:\n  name = TestApp\n  features:\n    list = [a, b]\nenabled = true\n");
//! let app = value.get("app").unwrap();
//! assert_eq!(app.get("name").and_then(|v| v.as_str()), Some("TestApp"));
//! assert!(app.get("features").unwrap().is_object());
//! assert_eq!(value.get("enabled").and_then(|v| v.as_bool()), Some(true));
//! ```

use serde::de::IntoDeserializer;
use serde::{de, forward_to_deserialize_any};
use tracing::trace;

use crate::lexer::{find_unquoted, Line};
use crate::scalar::parse_scalar;
use crate::{Error, FlowMap, ParseOptions, Result, Value};

/// An open object waiting for its children.
struct Frame {
    level: usize,
    key: String,
    map: FlowMap,
}

/// Builds an object tree from tokenized lines.
///
/// Created via [`TreeBuilder::new`]; consumed by [`TreeBuilder::build`].
pub struct TreeBuilder<'a> {
    options: &'a ParseOptions,
    stack: Vec<Frame>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(options: &'a ParseOptions) -> Self {
        TreeBuilder {
            options,
            stack: vec![Frame {
                level: 0,
                key: String::new(),
                map: FlowMap::new(),
            }],
        }
    }

    /// Consumes `lines` and returns the root object.
    ///
    /// # Errors
    ///
    /// Only in strict mode; the lenient builder always produces a tree.
    pub fn build(mut self, lines: &[Line]) -> Result<FlowMap> {
        for line in lines {
            self.line(line)?;
        }
        Ok(self.finish())
    }

    fn line(&mut self, line: &Line) -> Result<()> {
        let leading = line.leading_spaces();
        let level = leading / 2;
        let trimmed = line.trimmed();

        if self.options.is_strict() {
            if leading % 2 != 0 {
                return Err(Error::indentation_error(
                    line.number,
                    leading - 1,
                    leading,
                    &line.content,
                ));
            }
            if line.open_quote {
                return Err(Error::syntax(
                    line.number,
                    leading + 1,
                    "unterminated quoted string",
                    &line.content,
                ));
            }
        }

        if let Some(header) = trimmed.strip_suffix(':') {
            let key = header.trim();
            self.require_key(key, line, leading)?;
            self.close_deeper_than(level);
            self.check_depth(level, line, leading)?;
            self.stack.push(Frame {
                level: level + 1,
                key: key.to_string(),
                map: FlowMap::new(),
            });
            return Ok(());
        }

        let Some(eq) = find_unquoted(trimmed, '=') else {
            if self.options.is_strict() {
                return Err(Error::syntax(
                    line.number,
                    leading + 1,
                    "expected `key = value` or `key:`",
                    &line.content,
                ));
            }
            trace!(line = line.number, "skipping line without '='");
            return Ok(());
        };

        let key = trimmed[..eq].trim();
        let raw = trimmed[eq + 1..].trim();
        self.require_key(key, line, leading)?;
        self.close_deeper_than(level);
        self.check_depth(level, line, leading)?;
        self.current().insert(key.to_string(), parse_scalar(raw));
        Ok(())
    }

    fn require_key(&self, key: &str, line: &Line, leading: usize) -> Result<()> {
        if key.is_empty() && self.options.is_strict() {
            return Err(Error::syntax(line.number, leading + 1, "empty key", &line.content));
        }
        Ok(())
    }

    /// After closing, the innermost frame must sit exactly at `level` in strict mode.
    fn check_depth(&self, level: usize, line: &Line, leading: usize) -> Result<()> {
        let open = self.stack.last().map_or(0, |frame| frame.level);
        if open < level && self.options.is_strict() {
            return Err(Error::indentation_error(
                line.number,
                open * 2,
                leading,
                &line.content,
            ));
        }
        Ok(())
    }

    fn close_deeper_than(&mut self, level: usize) {
        while self.stack.len() > 1 && self.stack.last().is_some_and(|f| f.level > level) {
            self.close_top();
        }
    }

    fn close_top(&mut self) {
        if let Some(frame) = self.stack.pop() {
            self.current().insert(frame.key, Value::Object(frame.map));
        }
    }

    fn current(&mut self) -> &mut FlowMap {
        let last = self.stack.len() - 1;
        &mut self.stack[last].map
    }

    fn finish(mut self) -> FlowMap {
        while self.stack.len() > 1 {
            self.close_top();
        }
        self.stack.pop().map(|frame| frame.map).unwrap_or_default()
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(map: FlowMap) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(key.into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant =
            seed.deserialize(de::value::StringDeserializer::<Error>::new(self.variant))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            None => Ok(()),
            Some(_) => Err(Error::custom("expected unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("expected newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Array(arr)) => visitor.visit_seq(SeqDeserializer::new(arr)),
            _ => Err(Error::custom("expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Object(obj)) => visitor.visit_map(MapDeserializer::new(obj)),
            _ => Err(Error::custom("expected struct variant")),
        }
    }
}

/// Feeds an owned [`Value`] to a serde visitor.
pub(crate) struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    pub(crate) fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Integer(i) => visitor.visit_i64(i),
            Value::Float(f) => visitor.visit_f64(f),
            Value::String(s) => visitor.visit_string(s),
            Value::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr)),
            Value::Object(obj) => visitor.visit_map(MapDeserializer::new(obj)),
        }
    }

    // Present keys are always `Some`; absent keys are handled by serde's struct visitor.
    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            Value::Object(obj) if obj.len() == 1 => {
                let Some((variant, value)) = obj.into_iter().next() else {
                    return Err(Error::custom("expected a single-key object for enum"));
                };
                visitor.visit_enum(EnumDeserializer {
                    variant,
                    value: Some(value),
                })
            }
            other => Err(Error::custom(format!(
                "expected string or single-key object for enum, found {}",
                other.type_name()
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct newtype_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}
