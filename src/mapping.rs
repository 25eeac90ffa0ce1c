//! Model extraction, model application and document resolution.
//!
//! A document may carry its own schema under the reserved `$models` key and pick a
//! model with the reserved `use_model` key:
//!
//! ```text
//! $models:
//!   Instrument:
//!     fields:
//!       id:
//!         alias = i
//!       calibrated:
//!         alias = c
//!         type = date
//! use_model = Instrument
//! scope:
//!   i = INS-0001
//!   c = 2025-01-31
//! ```
//!
//! Resolving that document renames `i`/`c` to `id`/`calibrated` at every depth,
//! coerces `calibrated` as a date, and strips both reserved keys:
//!
//! ```rust
//! use flowdoc::{from_str_with_model, Value};
//!
//! let text = "$models:\n  Instrument:\n    fields:\n      id:\n        alias = i\nuse_model = Instrument\nscope:\n  i = INS-0001\n";
//! let value = from_str_with_model(text, None).unwrap();
//! let scope = value.get("scope").unwrap();
//! assert_eq!(scope.get("id"), Some(&Value::from("INS-0001")));
//! assert!(value.get("$models").is_none());
//! ```

use tracing::debug;

use crate::model::{FieldDefinition, FieldType, ModelDefinition, ModelRegistry};
use crate::scalar::parse_typed;
use crate::{Error, FlowMap, Result, Value};

/// Reserved key holding the model definitions block.
pub const MODELS_KEY: &str = "$models";

/// Reserved key naming the model to apply.
pub const USE_MODEL_KEY: &str = "use_model";

/// Builds a registry from the document's `$models` block.
///
/// Returns `None` when the document has no `$models` object. Models without a
/// `fields` object, and fields whose spec is not an object, are skipped.
#[must_use]
pub fn extract_models(document: &Value) -> Option<ModelRegistry> {
    let models = document.get(MODELS_KEY)?.as_object()?;
    let mut registry = ModelRegistry::new();

    for (model_name, model_spec) in models.iter() {
        let Some(fields) = model_spec.get("fields").and_then(Value::as_object) else {
            debug!(model = %model_name, "skipping model without a fields block");
            continue;
        };

        let mut model = ModelDefinition::new(model_name.as_str());
        for (full_name, field_spec) in fields.iter() {
            match field_spec.as_object() {
                Some(spec) => model.add_field(field_from_spec(full_name, spec)),
                None => debug!(model = %model_name, field = %full_name, "skipping malformed field"),
            }
        }
        registry.register(model);
    }

    debug!(models = registry.len(), "extracted model registry");
    Some(registry)
}

fn field_from_spec(full_name: &str, spec: &FlowMap) -> FieldDefinition {
    let alias = spec
        .get("alias")
        .and_then(Value::as_str)
        .unwrap_or(full_name);

    let field_type = match spec.get("type").and_then(Value::as_str) {
        Some(name) => name.parse().unwrap_or_else(|_| {
            debug!(field = %full_name, type_hint = %name, "unknown type hint, using string");
            FieldType::String
        }),
        None => FieldType::String,
    };

    let mut field = FieldDefinition::new(full_name, alias).with_type(field_type);
    if let Some(id) = spec
        .get("id")
        .and_then(Value::as_i64)
        .and_then(|id| u32::try_from(id).ok())
    {
        field = field.with_id(id);
    }
    field
}

/// Applies `model` to an object and everything below it, returning a new object.
///
/// Keys that are aliases become full names; other keys pass through. Scalars under a
/// defined field are coerced to the field's type, and keep their original value when
/// coercion fails.
#[must_use]
pub fn apply_model(object: &FlowMap, model: &ModelDefinition) -> FlowMap {
    let mut result = FlowMap::with_capacity(object.len());

    for (key, value) in object.iter() {
        let full_name = model.resolve_alias(key);
        let mapped = match value {
            Value::Object(child) => Value::Object(apply_model(child, model)),
            Value::Array(items) => Value::Array(apply_to_array(items, model)),
            scalar => coerce_field(full_name, scalar, model),
        };
        result.insert(full_name.to_string(), mapped);
    }
    result
}

/// Applies `model` to every Object element; other elements are copied unchanged.
#[must_use]
pub fn apply_to_array(items: &[Value], model: &ModelDefinition) -> Vec<Value> {
    items
        .iter()
        .map(|item| match item {
            Value::Object(child) => Value::Object(apply_model(child, model)),
            other => other.clone(),
        })
        .collect()
}

fn coerce_field(full_name: &str, scalar: &Value, model: &ModelDefinition) -> Value {
    let Some(field) = model.field(full_name) else {
        return scalar.clone();
    };

    match parse_typed(&scalar.to_string(), field.field_type) {
        Ok(typed) => typed,
        Err(err) => {
            debug!(field = %full_name, error = %err, "coercion failed, keeping original value");
            scalar.clone()
        }
    }
}

/// Resolves the reserved keys of a parsed document.
///
/// - With `use_model`: the named model is looked up in `registry`, or in the
///   document's own `$models` when no registry is given. Top-level Objects and
///   Arrays get the model applied. Top-level keys are alias-resolved too, but
///   top-level scalar values are never coerced: `n = "5"` under an `int` field
///   named `count` resolves to `count = "5"`. Only nested scalars are typed.
/// - With only `$models`: the block is stripped and nothing else changes.
/// - Otherwise the document is returned as is.
///
/// # Errors
///
/// [`Error::ModelNotFound`] if `use_model` names a model that is not registered,
/// [`Error::InvalidDirective`] if `use_model` is not a string.
pub fn resolve_document(document: Value, registry: Option<&ModelRegistry>) -> Result<Value> {
    let extracted;
    let registry = match registry {
        Some(registry) => Some(registry),
        None => {
            extracted = extract_models(&document);
            extracted.as_ref()
        }
    };

    let Value::Object(mut root) = document else {
        return Ok(document);
    };

    let Some(directive) = root.remove(USE_MODEL_KEY) else {
        root.remove(MODELS_KEY);
        return Ok(Value::Object(root));
    };

    let model_name = match &directive {
        Value::String(name) => name.as_str(),
        other => return Err(Error::InvalidDirective(other.type_name().to_string())),
    };
    let model = registry
        .and_then(|registry| registry.get(model_name))
        .ok_or_else(|| Error::ModelNotFound(model_name.to_string()))?;

    root.remove(MODELS_KEY);
    debug!(model = %model.name(), "applying model to document");

    let mut result = FlowMap::with_capacity(root.len());
    for (key, value) in root {
        let full_name = model.resolve_alias(&key).to_string();
        let mapped = match value {
            Value::Object(child) => Value::Object(apply_model(&child, model)),
            Value::Array(items) => Value::Array(apply_to_array(&items, model)),
            scalar => scalar,
        };
        result.insert(full_name, mapped);
    }
    Ok(Value::Object(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow;

    fn sensor_model() -> ModelDefinition {
        let mut model = ModelDefinition::new("Sensor");
        model.add_field(FieldDefinition::new("id", "i"));
        model.add_field(FieldDefinition::new("reading", "r").with_type(FieldType::Float));
        model.add_field(FieldDefinition::new("active", "a").with_type(FieldType::Bool));
        model.add_field(FieldDefinition::new("installed", "d").with_type(FieldType::Date));
        model.add_field(FieldDefinition::new("count", "n").with_type(FieldType::Int));
        model
    }

    fn object(value: Value) -> FlowMap {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_reads_alias_type_and_id() {
        let doc = flow!({
            "$models": {
                "M": {
                    "fields": {
                        "id": { "alias": "i", "id": 1 },
                        "price": { "alias": "p", "type": "float" },
                        "name": {}
                    }
                }
            }
        });
        let registry = extract_models(&doc).unwrap();
        let model = registry.get("M").unwrap();

        let id = model.field("id").unwrap();
        assert_eq!(id.alias, "i");
        assert_eq!(id.field_id, Some(1));
        assert_eq!(id.field_type, FieldType::String);
        assert_eq!(model.field("price").unwrap().field_type, FieldType::Float);
        assert_eq!(model.field("name").unwrap().alias, "name");
        assert_eq!(model.field("name").unwrap().field_id, None);
    }

    #[test]
    fn test_extract_skips_malformed_shapes() {
        let doc = flow!({
            "$models": {
                "NoFields": { "other": 1 },
                "ScalarFields": { "fields": 3 },
                "NotAnObject": 5,
                "Good": { "fields": { "x": { "alias": "y" }, "bad": 7 } }
            }
        });
        let registry = extract_models(&doc).unwrap();
        assert_eq!(registry.len(), 1);
        let good = registry.get("Good").unwrap();
        assert_eq!(good.len(), 1);
        assert_eq!(good.resolve_alias("y"), "x");
    }

    #[test]
    fn test_extract_without_models_block() {
        assert!(extract_models(&flow!({ "a": 1 })).is_none());
        assert!(extract_models(&flow!({ "$models": "nope" })).is_none());
    }

    #[test]
    fn test_extract_unknown_type_and_negative_id() {
        let doc = flow!({
            "$models": { "M": { "fields": { "u": { "type": "uuid", "id": (-4) } } } }
        });
        let registry = extract_models(&doc).unwrap();
        let field = registry.get("M").unwrap().field("u").unwrap();
        assert_eq!(field.field_type, FieldType::String);
        assert_eq!(field.field_id, None);
    }

    #[test]
    fn test_apply_renames_and_coerces() {
        let input = object(flow!({
            "i": "S-1",
            "r": 12,
            "a": "true",
            "n": "42",
            "d": "2025-03-01",
            "extra": "kept"
        }));
        let out = apply_model(&input, &sensor_model());

        assert_eq!(out.get("id"), Some(&Value::from("S-1")));
        assert_eq!(out.get("reading"), Some(&Value::Float(12.0)));
        assert_eq!(out.get("active"), Some(&Value::Bool(true)));
        assert_eq!(out.get("count"), Some(&Value::Integer(42)));
        assert_eq!(out.get("installed"), Some(&Value::from("2025-03-01")));
        assert_eq!(out.get("extra"), Some(&Value::from("kept")));
        assert!(out.get("i").is_none());
    }

    #[test]
    fn test_apply_keeps_original_when_coercion_fails() {
        let input = object(flow!({ "d": "2025-13-40", "n": 4.5, "a": "yes" }));
        let out = apply_model(&input, &sensor_model());

        assert_eq!(out.get("installed"), Some(&Value::from("2025-13-40")));
        assert_eq!(out.get("count"), Some(&Value::Float(4.5)));
        assert_eq!(out.get("active"), Some(&Value::from("yes")));
    }

    #[test]
    fn test_apply_recurses_into_objects_and_arrays() {
        let input = object(flow!({
            "batch": {
                "items": [ { "i": "A", "n": "1" }, "loose", 3 ]
            }
        }));
        let out = apply_model(&input, &sensor_model());
        let items = out
            .get("batch")
            .and_then(|b| b.get("items"))
            .and_then(Value::as_array)
            .unwrap();

        assert_eq!(items[0], flow!({ "id": "A", "count": 1 }));
        assert_eq!(items[1], Value::from("loose"));
        assert_eq!(items[2], Value::Integer(3));
    }

    #[test]
    fn test_apply_does_not_touch_input() {
        let input = object(flow!({ "i": "A" }));
        let snapshot = input.clone();
        let _ = apply_model(&input, &sensor_model());
        assert_eq!(input, snapshot);
    }

    #[test]
    fn test_resolve_without_directives_is_identity() {
        let doc = flow!({ "a": 1, "b": { "c": [1, 2] } });
        assert_eq!(resolve_document(doc.clone(), None).unwrap(), doc);
    }

    #[test]
    fn test_resolve_strips_models_without_applying() {
        let doc = flow!({
            "$models": { "M": { "fields": { "id": { "alias": "i" } } } },
            "rec": { "i": "x" }
        });
        let out = resolve_document(doc, None).unwrap();
        assert_eq!(out, flow!({ "rec": { "i": "x" } }));
    }

    #[test]
    fn test_resolve_missing_model_is_an_error() {
        let doc = flow!({ "use_model": "Ghost", "rec": { "i": "x" } });
        assert!(matches!(
            resolve_document(doc, None),
            Err(Error::ModelNotFound(ref name)) if name == "Ghost"
        ));
    }

    #[test]
    fn test_resolve_non_string_directive() {
        let doc = flow!({ "use_model": 3 });
        assert!(matches!(
            resolve_document(doc, None),
            Err(Error::InvalidDirective(_))
        ));
    }

    #[test]
    fn test_resolve_with_supplied_registry() {
        let mut registry = ModelRegistry::new();
        registry.register(sensor_model());

        let doc = flow!({
            "use_model": "Sensor",
            "r": "7",
            "unit": { "r": "7.5" },
            "list": [ { "a": "false" } ]
        });
        let out = resolve_document(doc, Some(&registry)).unwrap();

        // top-level scalar: key resolved, value untouched
        assert_eq!(out.get("reading"), Some(&Value::from("7")));
        assert_eq!(
            out.get("unit").and_then(|u| u.get("reading")),
            Some(&Value::Float(7.5))
        );
        assert_eq!(out.get("list"), Some(&flow!([{ "active": false }])));
        assert!(out.get("use_model").is_none());
    }

    #[test]
    fn test_top_level_scalars_are_renamed_but_not_coerced() {
        let mut registry = ModelRegistry::new();
        registry.register(sensor_model());

        let doc = flow!({ "use_model": "Sensor", "n": "5", "batch": { "n": "5" } });
        let out = resolve_document(doc, Some(&registry)).unwrap();
        assert_eq!(
            out,
            flow!({ "count": "5", "batch": { "count": 5 } })
        );
    }

    #[test]
    fn test_supplied_registry_takes_precedence() {
        let mut registry = ModelRegistry::new();
        registry.register(sensor_model());

        let doc = flow!({
            "$models": { "Other": { "fields": { "x": {} } } },
            "use_model": "Other"
        });
        assert!(matches!(
            resolve_document(doc, Some(&registry)),
            Err(Error::ModelNotFound(_))
        ));
    }
}
