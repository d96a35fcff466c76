//! Lookup of localized UI strings by key.

use std::collections::HashMap;

/// Resolves an i18n key (e.g., `content_translation.article.object_type`)
/// to a display string.
pub trait KeyTranslator: Send + Sync {
    fn translate_key(&self, key: &str) -> String;
}

/// In-memory key catalog. Unknown keys resolve to the key itself, so a
/// missing label is visible rather than blank.
#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    labels: HashMap<String, String>,
}

impl LabelCatalog {
    pub fn new(labels: HashMap<String, String>) -> Self {
        Self { labels }
    }

    pub fn insert(&mut self, key: impl Into<String>, label: impl Into<String>) {
        self.labels.insert(key.into(), label.into());
    }
}

impl KeyTranslator for LabelCatalog {
    fn translate_key(&self, key: &str) -> String {
        self.labels
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
