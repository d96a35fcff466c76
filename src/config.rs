use crate::db::TranslationStore;
use crate::i18n::{FixedLocale, LabelCatalog, LocaleDescriptor, StaticLocales};
use crate::manager::TranslationManager;
use crate::registry::{ContentTypeOptions, TypeRegistry};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

const DEFAULT_DATABASE_URL: &str = "sqlite:content_translations.db";
const DEFAULT_FALLBACK_LOCALE: &str = "en";

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Locales
    pub fallback_locale: String,
    pub app_locale: String,

    // Content types, locales and labels
    pub translation: TranslationConfig,
}

/// Content translation settings, usually read from a JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslationConfig {
    #[serde(default)]
    pub fallback_locale: Option<String>,

    #[serde(default)]
    pub locales: Vec<LocaleDescriptor>,

    /// i18n key -> display string
    #[serde(default)]
    pub labels: HashMap<String, String>,

    /// content type -> binding
    #[serde(default)]
    pub models: BTreeMap<String, ModelConfig>,

    /// handler -> parent handler
    #[serde(default)]
    pub handlers: BTreeMap<String, String>,
}

/// One configured content type.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(rename = "class")]
    pub handler: String,

    #[serde(flatten)]
    pub options: ContentTypeOptions,
}

impl TranslationConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse content translation config")
    }

    /// Registry with every configured model bound and every handler extension declared.
    pub fn registry(&self) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for (content_type, model) in &self.models {
            registry.bind(content_type, &model.handler, model.options.clone());
        }
        for (handler, parent) in &self.handlers {
            registry.extend(handler, parent);
        }
        registry
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let translation = match std::env::var("CONTENT_TRANSLATION_CONFIG") {
            Ok(path) => TranslationConfig::from_file(&path)?,
            Err(_) => TranslationConfig::default(),
        };

        // Environment wins over the file
        let fallback_locale = std::env::var("CONTENT_TRANSLATION_FALLBACK_LOCALE")
            .ok()
            .or_else(|| translation.fallback_locale.clone())
            .unwrap_or_else(|| DEFAULT_FALLBACK_LOCALE.to_string());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            app_locale: std::env::var("APP_LOCALE").unwrap_or_else(|_| fallback_locale.clone()),
            fallback_locale,
            translation,
        })
    }

    /// Build a manager wired to this configuration.
    pub fn manager(&self, store: Arc<dyn TranslationStore>) -> TranslationManager {
        TranslationManager::new(store, self.translation.registry(), &self.fallback_locale)
            .with_locales(Arc::new(StaticLocales::new(self.translation.locales.clone())))
            .with_current_locale(Arc::new(FixedLocale::new(&self.app_locale)))
            .with_labels(Arc::new(LabelCatalog::new(self.translation.labels.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
        "fallback_locale": "en",
        "locales": [
            {"code": "en", "name": "English"},
            {"code": "nl", "name": "Dutch", "native_name": "Nederlands"}
        ],
        "labels": {"content_translation.article.object_type": "Article"},
        "models": {
            "article": {
                "class": "app::Article",
                "properties": {"title": {}, "body": {"nl2br": true}},
                "label_property": "title",
                "object_type": "content_translation.article.object_type",
                "icon": "newspaper"
            },
            "product": {
                "class": "app::Product",
                "properties": ["name"],
                "label_property": "name"
            }
        },
        "handlers": {"app::FeaturedArticle": "app::Article"}
    }"#;

    fn clear_env() {
        std::env::remove_var("CONTENT_TRANSLATION_CONFIG");
        std::env::remove_var("CONTENT_TRANSLATION_FALLBACK_LOCALE");
        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("APP_LOCALE");
    }

    // ==================== TranslationConfig Tests ====================

    #[test]
    fn test_parse_sample() {
        let config = TranslationConfig::from_json(SAMPLE).expect("valid config");

        assert_eq!(config.fallback_locale.as_deref(), Some("en"));
        assert_eq!(config.locales.len(), 2);
        assert_eq!(config.models.len(), 2);

        let article = &config.models["article"];
        assert_eq!(article.handler, "app::Article");
        assert_eq!(article.options.label_property, "title");
        assert!(article.options.converts_newlines("body"));
        assert_eq!(article.options.extra["icon"], "newspaper");
    }

    #[test]
    fn test_invalid_json_fails() {
        assert!(TranslationConfig::from_json("{not json").is_err());
    }

    #[test]
    fn test_model_without_label_property_fails() {
        let result = TranslationConfig::from_json(r#"{"models": {"article": {"class": "A"}}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_registry_from_config() {
        let config = TranslationConfig::from_json(SAMPLE).expect("valid config");
        let registry = config.registry();

        assert_eq!(registry.resolve_handler("product"), Some("app::Product"));
        assert_eq!(
            registry.resolve_content_type("app::FeaturedArticle"),
            Some("article")
        );
        assert_eq!(
            registry.option("article", "icon").expect("configured"),
            serde_json::json!("newspaper")
        );
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("content-translation.json");
        std::fs::write(&path, SAMPLE).expect("Failed to write config");

        let config = TranslationConfig::from_file(&path).expect("valid config");
        assert_eq!(config.models.len(), 2);
    }

    #[test]
    fn test_from_missing_file_fails() {
        assert!(TranslationConfig::from_file("/non/existent/config.json").is_err());
    }

    // ==================== Config::from_env Tests ====================

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();

        let config = Config::from_env().expect("defaults should load");

        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.fallback_locale, "en");
        assert_eq!(config.app_locale, "en");
        assert!(config.translation.models.is_empty());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_file_and_overrides() {
        clear_env();
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("content-translation.json");
        std::fs::write(&path, SAMPLE).expect("Failed to write config");

        std::env::set_var("CONTENT_TRANSLATION_CONFIG", &path);
        std::env::set_var("CONTENT_TRANSLATION_FALLBACK_LOCALE", "nl");
        std::env::set_var("APP_LOCALE", "de");
        std::env::set_var("DATABASE_URL", "sqlite::memory:");

        let config = Config::from_env().expect("config should load");
        clear_env();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.fallback_locale, "nl");
        assert_eq!(config.app_locale, "de");
        assert_eq!(config.translation.models.len(), 2);
    }

    #[test]
    #[serial]
    fn test_from_env_bad_file_fails() {
        clear_env();
        std::env::set_var("CONTENT_TRANSLATION_CONFIG", "/non/existent/config.json");

        let result = Config::from_env();
        clear_env();

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_manager_from_config() {
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            fallback_locale: "en".to_string(),
            app_locale: "nl".to_string(),
            translation: TranslationConfig::from_json(SAMPLE).expect("valid config"),
        };
        let db = crate::db::Database::in_memory().await.expect("database");

        let manager = config.manager(Arc::new(db));

        assert_eq!(manager.default_locale(), "nl");
        assert_eq!(manager.fallback_locale(), "en");
        assert_eq!(manager.supported_locales().len(), 2);
        assert_eq!(
            manager.labeled_types(),
            vec![
                ("article".to_string(), "Article".to_string()),
                (
                    "product".to_string(),
                    "content_translation.product.object_type".to_string()
                ),
            ]
        );
    }
}
