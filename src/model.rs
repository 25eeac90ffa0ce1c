//! Mapping model definitions.
//!
//! A [`ModelDefinition`] names a set of [`FieldDefinition`]s. Each field has a full
//! name (what application code sees), an alias (what raw documents use), a
//! [`FieldType`] hint for coercion, and an optional numeric id used by the binary
//! envelope. Models are collected in a [`ModelRegistry`].
//!
//! ```rust
//! use flowdoc::{FieldDefinition, FieldType, ModelDefinition, ModelRegistry};
//!
//! let mut model = ModelDefinition::new("Instrument");
//! model.add_field(FieldDefinition::new("id", "i"));
//! model.add_field(FieldDefinition::new("calibrated", "c").with_type(FieldType::Date).with_id(2));
//!
//! let mut registry = ModelRegistry::new();
//! registry.register(model);
//!
//! let model = registry.get("Instrument").unwrap();
//! assert_eq!(model.resolve_alias("i"), "id");
//! assert_eq!(model.resolve_alias("unknown"), "unknown");
//! assert_eq!(model.field_by_id(2).map(|f| f.full_name.as_str()), Some("calibrated"));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Type hint attached to a field.
///
/// # Examples
///
/// ```rust
/// use flowdoc::FieldType;
///
/// assert_eq!("datetime".parse::<FieldType>(), Ok(FieldType::DateTime));
/// assert_eq!(FieldType::Int.as_str(), "int");
/// assert_eq!(FieldType::default(), FieldType::String);
/// assert!("uuid".parse::<FieldType>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Int,
    Float,
    Bool,
    Date,
    DateTime,
}

impl FieldType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(FieldType::String),
            "int" => Ok(FieldType::Int),
            "float" => Ok(FieldType::Float),
            "bool" => Ok(FieldType::Bool),
            "date" => Ok(FieldType::Date),
            "datetime" => Ok(FieldType::DateTime),
            other => Err(format!("unknown field type '{}'", other)),
        }
    }
}

/// One field of a model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDefinition {
    pub full_name: String,
    pub alias: String,
    pub field_type: FieldType,
    pub field_id: Option<u32>,
}

impl FieldDefinition {
    /// Creates a `string` field with no id.
    #[must_use]
    pub fn new(full_name: impl Into<String>, alias: impl Into<String>) -> Self {
        FieldDefinition {
            full_name: full_name.into(),
            alias: alias.into(),
            field_type: FieldType::default(),
            field_id: None,
        }
    }

    #[must_use]
    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    #[must_use]
    pub fn with_id(mut self, field_id: u32) -> Self {
        self.field_id = Some(field_id);
        self
    }
}

/// A named set of fields with derived alias and id lookups.
///
/// The lookups are only ever changed through [`ModelDefinition::add_field`]. When two
/// fields share an alias (or an id), the one added last wins the reverse lookup.
#[derive(Clone, Debug, Default)]
pub struct ModelDefinition {
    name: String,
    fields: IndexMap<String, FieldDefinition>,
    alias_map: HashMap<String, String>,
    id_map: HashMap<u32, String>,
}

impl ModelDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        ModelDefinition {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds or replaces the field named `field.full_name`.
    ///
    /// ```rust
    /// use flowdoc::{FieldDefinition, ModelDefinition};
    ///
    /// let mut model = ModelDefinition::new("M");
    /// model.add_field(FieldDefinition::new("name", "n"));
    /// model.add_field(FieldDefinition::new("name", "nm"));
    ///
    /// assert_eq!(model.len(), 1);
    /// assert_eq!(model.resolve_alias("nm"), "name");
    /// assert_eq!(model.resolve_alias("n"), "n");
    /// ```
    pub fn add_field(&mut self, field: FieldDefinition) {
        if let Some(previous) = self.fields.get(&field.full_name) {
            if self.alias_map.get(&previous.alias) == Some(&previous.full_name) {
                self.alias_map.remove(&previous.alias);
            }
            if let Some(id) = previous.field_id {
                if self.id_map.get(&id) == Some(&previous.full_name) {
                    self.id_map.remove(&id);
                }
            }
        }

        self.alias_map
            .insert(field.alias.clone(), field.full_name.clone());
        if let Some(id) = field.field_id {
            self.id_map.insert(id, field.full_name.clone());
        }
        self.fields.insert(field.full_name.clone(), field);
    }

    /// Looks up a field by its full name.
    #[must_use]
    pub fn field(&self, full_name: &str) -> Option<&FieldDefinition> {
        self.fields.get(full_name)
    }

    /// Maps a document key to its full name; unknown keys come back unchanged.
    #[must_use]
    pub fn resolve_alias<'a>(&'a self, key: &'a str) -> &'a str {
        self.alias_map.get(key).map_or(key, String::as_str)
    }

    #[must_use]
    pub fn is_alias(&self, key: &str) -> bool {
        self.alias_map.contains_key(key)
    }

    #[must_use]
    pub fn field_by_id(&self, field_id: u32) -> Option<&FieldDefinition> {
        self.id_map
            .get(&field_id)
            .and_then(|full_name| self.fields.get(full_name))
    }

    /// Fields in the order they were first added.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Models by name.
///
/// Registering a model under an existing name replaces the earlier definition.
/// A registry shared between parse calls is only read, so `&ModelRegistry` can be
/// used from several threads at once.
#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelDefinition>,
}

impl ModelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, model: ModelDefinition) {
        self.models.insert(model.name.clone(), model);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ModelDefinition> {
        self.models.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
