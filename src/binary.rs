//! MessagePack envelope for [`Value`] trees.
//!
//! [`to_vec`] and [`from_slice`] carry a tree as-is: objects become maps with string
//! keys, arrays become arrays, scalars keep their type.
//!
//! With a model, [`to_vec_with_model`] can replace every key that names a field with
//! a numeric id (`BinaryOptions::field_ids`). Keys that are not fields, or fields
//! without an id, stay strings. [`from_slice_with_model`] maps ids back to full names.
//!
//! ```rust
//! use flowdoc::{binary, flow, BinaryOptions, FieldDefinition, ModelDefinition};
//!
//! let mut model = ModelDefinition::new("Point");
//! model.add_field(FieldDefinition::new("latitude", "lat").with_id(1));
//! model.add_field(FieldDefinition::new("longitude", "lon").with_id(2));
//!
//! let value = flow!({ "latitude": 51.5, "longitude": (-0.12), "label": "London" });
//!
//! let options = BinaryOptions::new().with_field_ids(true);
//! let compact = binary::to_vec_with_model(&value, &model, &options).unwrap();
//! let plain = binary::to_vec(&value).unwrap();
//! assert!(compact.len() < plain.len());
//!
//! let decoded = binary::from_slice_with_model(&compact, &model).unwrap();
//! assert_eq!(decoded, value);
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::model::ModelDefinition;
use crate::{BinaryOptions, Error, FlowMap, Result, Value};

/// Encodes a tree with string keys.
///
/// # Errors
///
/// [`Error::Codec`] if the encoder fails.
pub fn to_vec(value: &Value) -> Result<Vec<u8>> {
    rmp_serde::to_vec(value).map_err(Error::codec)
}

/// Decodes a tree written by [`to_vec`].
///
/// # Errors
///
/// [`Error::Codec`] on malformed input or on a MessagePack type with no
/// [`Value`] counterpart, such as nil.
pub fn from_slice(bytes: &[u8]) -> Result<Value> {
    rmp_serde::from_slice(bytes).map_err(Error::codec)
}

/// Encodes a tree, writing field ids instead of full names when
/// `options.field_ids` is set.
///
/// # Errors
///
/// [`Error::Codec`] if the encoder fails.
pub fn to_vec_with_model(
    value: &Value,
    model: &ModelDefinition,
    options: &BinaryOptions,
) -> Result<Vec<u8>> {
    if !options.field_ids {
        return to_vec(value);
    }
    debug!(model = %model.name(), "encoding with field ids");
    rmp_serde::to_vec(&Compact { value, model }).map_err(Error::codec)
}

/// Decodes a tree whose keys may be field ids of `model`.
///
/// # Errors
///
/// [`Error::Codec`] on malformed input or when an integer key is not a field id
/// of `model`.
pub fn from_slice_with_model(bytes: &[u8], model: &ModelDefinition) -> Result<Value> {
    let mut deserializer = rmp_serde::Deserializer::new(bytes);
    ValueSeed { model }
        .deserialize(&mut deserializer)
        .map_err(Error::codec)
}

/// Reads and decodes a MessagePack file.
///
/// # Errors
///
/// [`Error::Io`] if the file cannot be read, [`Error::Codec`] if it does not decode.
pub fn read_path<P: AsRef<Path>>(path: P) -> Result<Value> {
    let bytes = fs::read(path)?;
    from_slice(&bytes)
}

/// Encodes `value` and writes it to a file.
///
/// # Errors
///
/// [`Error::Codec`] if encoding fails, [`Error::Io`] if the file cannot be written.
pub fn write_path<P: AsRef<Path>>(path: P, value: &Value) -> Result<()> {
    let bytes = to_vec(value)?;
    fs::write(path, bytes)?;
    Ok(())
}

struct Compact<'a> {
    value: &'a Value,
    model: &'a ModelDefinition,
}

impl Compact<'_> {
    /// The id for `key`, only when decoding that id gives `key` back.
    fn field_id(&self, key: &str) -> Option<u32> {
        let id = self.model.field(key)?.field_id?;
        let owner = self.model.field_by_id(id)?;
        (owner.full_name == key).then_some(id)
    }
}

impl Serialize for Compact<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.value {
            Value::Object(object) => {
                let mut map = serializer.serialize_map(Some(object.len()))?;
                for (key, child) in object.iter() {
                    let child = Compact {
                        value: child,
                        model: self.model,
                    };
                    match self.field_id(key) {
                        Some(id) => map.serialize_entry(&id, &child)?,
                        None => map.serialize_entry(key, &child)?,
                    }
                }
                map.end()
            }
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&Compact {
                        value: item,
                        model: self.model,
                    })?;
                }
                seq.end()
            }
            scalar => scalar.serialize(serializer),
        }
    }
}

#[derive(Clone, Copy)]
struct ValueSeed<'a> {
    model: &'a ModelDefinition,
}

impl<'de> DeserializeSeed<'de> for ValueSeed<'_> {
    type Value = Value;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for ValueSeed<'_> {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a flowdoc value")
    }

    fn visit_bool<E>(self, v: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<Value, E> {
        Ok(Value::Integer(v))
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<Value, E> {
        Ok(i64::try_from(v).map_or(Value::Float(v as f64), Value::Integer))
    }

    fn visit_f64<E>(self, v: f64) -> std::result::Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element_seed(self)? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut object = FlowMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(key) = map.next_key_seed(KeySeed { model: self.model })? {
            let value = map.next_value_seed(self)?;
            object.insert(key, value);
        }
        Ok(Value::Object(object))
    }
}

struct KeySeed<'a> {
    model: &'a ModelDefinition,
}

impl<'de> DeserializeSeed<'de> for KeySeed<'_> {
    type Value = String;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for KeySeed<'_> {
    type Value = String;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string key or a field id")
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E>(self, v: String) -> std::result::Result<String, E> {
        Ok(v)
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<String, E>
    where
        E: de::Error,
    {
        u32::try_from(v)
            .ok()
            .and_then(|id| self.model.field_by_id(id))
            .map(|field| field.full_name.clone())
            .ok_or_else(|| {
                E::custom(format!(
                    "unknown field id {} for model '{}'",
                    v,
                    self.model.name()
                ))
            })
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<String, E>
    where
        E: de::Error,
    {
        match u64::try_from(v) {
            Ok(id) => self.visit_u64(id),
            Err(_) => Err(E::custom(format!("negative field id {}", v))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow;
    use crate::model::FieldDefinition;

    fn reading_model() -> ModelDefinition {
        let mut model = ModelDefinition::new("Reading");
        model.add_field(FieldDefinition::new("sensor", "s").with_id(1));
        model.add_field(FieldDefinition::new("value", "v").with_id(2));
        model.add_field(FieldDefinition::new("note", "n"));
        model
    }

    #[test]
    fn test_plain_round_trip_keeps_types_and_order() {
        let value = flow!({
            "z": 1,
            "a": 2.0,
            "flag": false,
            "nested": { "list": [1, "two", [3.5]] }
        });
        let bytes = to_vec(&value).unwrap();
        assert_eq!(from_slice(&bytes).unwrap(), value);
    }

    #[test]
    fn test_field_ids_replace_keys_at_every_depth() {
        let value = flow!({
            "sensor": "T1",
            "history": [ { "sensor": "T1", "value": 3 } ],
            "note": "ok"
        });
        let options = BinaryOptions::new().with_field_ids(true);
        let bytes = to_vec_with_model(&value, &reading_model(), &options).unwrap();

        // "sensor" and "value" must not appear as strings
        let text = String::from_utf8_lossy(&bytes);
        assert!(!text.contains("sensor"));
        assert!(!text.contains("value"));
        assert!(text.contains("note"));

        assert_eq!(from_slice_with_model(&bytes, &reading_model()).unwrap(), value);
    }

    #[test]
    fn test_shared_field_id_keeps_both_keys() {
        let mut model = ModelDefinition::new("Shared");
        model.add_field(FieldDefinition::new("alpha", "a").with_id(1));
        model.add_field(FieldDefinition::new("beta", "b").with_id(1));

        let value = flow!({ "alpha": 1, "beta": 2 });
        let options = BinaryOptions::new().with_field_ids(true);
        let bytes = to_vec_with_model(&value, &model, &options).unwrap();

        // the id decodes to the last field registered with it
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("alpha"));
        assert!(!text.contains("beta"));
        assert_eq!(model.field_by_id(1).map(|f| f.full_name.as_str()), Some("beta"));
        assert_eq!(from_slice_with_model(&bytes, &model).unwrap(), value);
    }

    #[test]
    fn test_without_field_ids_matches_plain_encoding() {
        let value = flow!({ "sensor": "T1" });
        let bytes = to_vec_with_model(&value, &reading_model(), &BinaryOptions::new()).unwrap();
        assert_eq!(bytes, to_vec(&value).unwrap());
    }

    #[test]
    fn test_unknown_field_id_is_a_codec_error() {
        let value = flow!({ "sensor": "T1" });
        let options = BinaryOptions::new().with_field_ids(true);
        let bytes = to_vec_with_model(&value, &reading_model(), &options).unwrap();

        let other = ModelDefinition::new("Other");
        assert!(matches!(
            from_slice_with_model(&bytes, &other),
            Err(Error::Codec(_))
        ));
    }

    #[test]
    fn test_malformed_input_is_a_codec_error() {
        assert!(matches!(from_slice(&[0xc1]), Err(Error::Codec(_))));
        assert!(matches!(from_slice(&[0xc0]), Err(Error::Codec(_))));
    }
}
