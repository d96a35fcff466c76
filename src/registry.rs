//! Type registry: which content types exist and how they map to handlers.
//!
//! A content type (e.g., "article") is bound to a handler identifier (a
//! stable name for the domain model type, e.g., "app::Article") plus an
//! options bag. Handlers that are not bound themselves may declare a parent
//! handler with [`TypeRegistry::extend`]; resolution walks that chain until
//! a bound ancestor is found.

use crate::error::{Result, TranslationError};
use crate::i18n::KeyTranslator;
use crate::text::natural_cmp;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Render flags for a single translatable property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyOptions {
    /// Convert newlines to `<br />` when displaying the property
    #[serde(default)]
    pub nl2br: bool,
}

/// Options bag attached to a content type binding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeOptions {
    /// Translatable properties and their render flags
    #[serde(default, deserialize_with = "deserialize_properties")]
    pub properties: BTreeMap<String, PropertyOptions>,

    /// Property that provides the display label of an object
    pub label_property: String,

    /// i18n key for the human name of the type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,

    /// Any further configured options, reachable through [`TypeRegistry::option`]
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentTypeOptions {
    pub fn new(label_property: impl Into<String>) -> Self {
        Self {
            label_property: label_property.into(),
            ..Self::default()
        }
    }

    /// Add a plain translatable property.
    pub fn property(self, name: impl Into<String>) -> Self {
        self.property_with(name, PropertyOptions::default())
    }

    pub fn property_with(mut self, name: impl Into<String>, options: PropertyOptions) -> Self {
        self.properties.insert(name.into(), options);
        self
    }

    pub fn object_type(mut self, key: impl Into<String>) -> Self {
        self.object_type = Some(key.into());
        self
    }

    /// Names of the translatable properties, in name order.
    pub fn property_names(&self) -> Vec<String> {
        self.properties.keys().cloned().collect()
    }

    /// Whether `property` should have newlines rendered as `<br />`.
    pub fn converts_newlines(&self, property: &str) -> bool {
        self.properties
            .get(property)
            .map(|options| options.nl2br)
            .unwrap_or(false)
    }
}

/// Accepts either `["title", "body"]` or `{"title": {}, "body": {"nl2br": true}}`.
fn deserialize_properties<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, PropertyOptions>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Properties {
        List(Vec<String>),
        Map(BTreeMap<String, PropertyOptions>),
    }

    Ok(match Properties::deserialize(deserializer)? {
        Properties::List(names) => names
            .into_iter()
            .map(|name| (name, PropertyOptions::default()))
            .collect(),
        Properties::Map(map) => map,
    })
}

/// Bidirectional content type <-> handler bindings with per-type options.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    handlers_by_type: HashMap<String, String>,
    types_by_handler: HashMap<String, String>,
    options: HashMap<String, ContentTypeOptions>,
    parents: HashMap<String, String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a content type to a handler. Rebinding a content type replaces
    /// the previous handler and options.
    pub fn bind(
        &mut self,
        content_type: impl Into<String>,
        handler: impl Into<String>,
        options: ContentTypeOptions,
    ) {
        let content_type = content_type.into();
        let handler = handler.into();

        if let Some(previous) = self.handlers_by_type.get(&content_type) {
            if previous != &handler
                && self.types_by_handler.get(previous) == Some(&content_type)
            {
                self.types_by_handler.remove(previous);
            }
        }

        debug!(%content_type, %handler, "binding content type");
        self.handlers_by_type
            .insert(content_type.clone(), handler.clone());
        self.types_by_handler.insert(handler, content_type.clone());
        self.options.insert(content_type, options);
    }

    /// Declare that `handler` extends `parent`, so it inherits the parent's binding.
    pub fn extend(&mut self, handler: impl Into<String>, parent: impl Into<String>) {
        self.parents.insert(handler.into(), parent.into());
    }

    /// Handler bound to a content type, if any.
    pub fn resolve_handler(&self, content_type: &str) -> Option<&str> {
        self.handlers_by_type.get(content_type).map(String::as_str)
    }

    /// Content type of a handler: its own binding, or the nearest bound ancestor's.
    pub fn resolve_content_type(&self, handler: &str) -> Option<&str> {
        let mut visited = HashSet::new();
        let mut current = handler;

        loop {
            if let Some(content_type) = self.types_by_handler.get(current) {
                return Some(content_type.as_str());
            }
            if !visited.insert(current) {
                // Extends chain loops back on itself
                return None;
            }
            current = self.parents.get(current)?.as_str();
        }
    }

    pub fn options(&self, content_type: &str) -> Result<&ContentTypeOptions> {
        self.options
            .get(content_type)
            .ok_or_else(|| TranslationError::UnknownContentType(content_type.to_string()))
    }

    /// A single option by key, as configured. An unset `object_type` reads
    /// as the same default key [`Self::object_type_label_key`] returns.
    pub fn option(&self, content_type: &str, key: &str) -> Result<Value> {
        let options = self.options(content_type)?;
        let mut value = serde_json::to_value(options)?;
        if let Value::Object(map) = &mut value {
            map.entry("object_type")
                .or_insert_with(|| Value::String(default_object_type_key(content_type)));
        }

        value
            .get_mut(key)
            .map(Value::take)
            .ok_or_else(|| TranslationError::UnknownOption {
                content_type: content_type.to_string(),
                option: key.to_string(),
            })
    }

    /// i18n key for the human name of a content type.
    pub fn object_type_label_key(&self, content_type: &str) -> Result<String> {
        let options = self.options(content_type)?;
        Ok(options
            .object_type
            .clone()
            .unwrap_or_else(|| default_object_type_key(content_type)))
    }

    /// Bound content types, in name order.
    pub fn content_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers_by_type.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Content types with their localized names, sorted naturally by name.
    pub fn labeled_types(&self, translator: &dyn KeyTranslator) -> Vec<(String, String)> {
        let mut labeled: Vec<(String, String)> = self
            .content_types()
            .into_iter()
            .map(|content_type| {
                let key = self
                    .object_type_label_key(content_type)
                    .unwrap_or_else(|_| format!("content_translation.{content_type}.object_type"));
                (content_type.to_string(), translator.translate_key(&key))
            })
            .collect();

        labeled.sort_by(|(a_type, a_label), (b_type, b_label)| {
            natural_cmp(a_label, b_label).then_with(|| a_type.cmp(b_type))
        });
        labeled
    }
}

fn default_object_type_key(content_type: &str) -> String {
    format!("content_translation.{content_type}.object_type")
}
