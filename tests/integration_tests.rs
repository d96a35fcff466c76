//! Integration tests for content translation
//!
//! These tests wire the pieces together the way an application does:
//! configuration file -> registry -> SQLite database -> manager -> models.

use std::sync::Arc;
use tempfile::TempDir;

use content_translation::config::{Config, TranslationConfig};
use content_translation::{Database, SaveOutcome, Translatable, TranslationManager};

// ==================== Test Helpers ====================

const CONFIG_JSON: &str = r#"{
    "fallback_locale": "en",
    "locales": [
        {"code": "en", "name": "English"},
        {"code": "fr", "name": "French"},
        {"code": "nl", "name": "Dutch"}
    ],
    "labels": {"content_translation.article.object_type": "Article"},
    "models": {
        "article": {
            "class": "app::Article",
            "properties": {"title": {}, "body": {"nl2br": true}},
            "label_property": "title"
        }
    },
    "handlers": {"app::FeaturedArticle": "app::Article"}
}"#;

struct Article {
    id: u32,
}

impl Translatable for Article {
    const HANDLER: &'static str = "app::Article";

    fn translation_id(&self) -> u32 {
        self.id
    }
}

struct FeaturedArticle {
    id: u32,
}

impl Translatable for FeaturedArticle {
    const HANDLER: &'static str = "app::FeaturedArticle";

    fn translation_id(&self) -> u32 {
        self.id
    }
}

/// Create a config backed by a JSON file and a database file in `temp_dir`
fn create_test_config(temp_dir: &TempDir, app_locale: &str) -> Config {
    let config_path = temp_dir.path().join("content-translation.json");
    std::fs::write(&config_path, CONFIG_JSON).expect("Failed to write config");

    Config {
        database_url: format!(
            "sqlite:{}",
            temp_dir.path().join("translations.db").display()
        ),
        fallback_locale: "en".to_string(),
        app_locale: app_locale.to_string(),
        translation: TranslationConfig::from_file(&config_path).expect("Config should parse"),
    }
}

async fn create_manager(config: &Config) -> TranslationManager {
    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to open database");
    db.migrate().await.expect("Failed to migrate");
    config.manager(Arc::new(db))
}

// ==================== End-to-End Scenario ====================

#[tokio::test]
async fn test_label_translation_with_fallback() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&temp_dir, "en");
    let manager = create_manager(&config).await;

    let article = manager
        .translations(&Article { id: 1 })
        .expect("Article should be bound");
    let outcome = manager
        .save("article", 1, "title", "en", "Hello")
        .await
        .expect("Should save");
    assert!(matches!(outcome, SaveOutcome::Saved(_)));

    let english = article.translate_label(Some("en"), true).await.expect("translate");
    assert_eq!(english, "Hello");
    assert!(!manager.is_fallback_used());

    let without_fallback = article
        .translate_label(Some("fr"), false)
        .await
        .expect("translate");
    assert_eq!(without_fallback, "");
    assert!(!manager.is_fallback_used());

    let french = article.translate_label(Some("fr"), true).await.expect("translate");
    assert_eq!(french, "Hello");
    assert!(manager.is_fallback_used());
}

#[tokio::test]
async fn test_translations_persist_across_managers() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&temp_dir, "nl");

    {
        let manager = create_manager(&config).await;
        manager
            .translations(&Article { id: 9 })
            .expect("bound")
            .save_translations("nl", [("title", "Hallo"), ("body", "Regel 1\nRegel 2")])
            .await
            .expect("Should save");
    }

    // A fresh manager (new request) starts with an empty cache
    let manager = create_manager(&config).await;
    let article = manager.translations(&Article { id: 9 }).expect("bound");

    assert_eq!(
        article.translate("title", None, true).await.expect("translate"),
        "Hallo"
    );
    assert_eq!(
        article.display("body", false, None, true).await.expect("display"),
        "Regel 1<br />\nRegel 2"
    );
    assert_eq!(article.count_translations("nl").await.expect("count"), 2);
    assert!(!manager.is_fallback_used());
}

#[tokio::test]
async fn test_listing_page_workflow() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&temp_dir, "nl");
    let manager = create_manager(&config).await;

    for (id, title) in [(1, "Eerste"), (2, "Tweede")] {
        manager
            .save("article", id, "title", "nl", title)
            .await
            .expect("Should save");
    }
    manager
        .save("article", 3, "title", "en", "Third")
        .await
        .expect("Should save");

    // Preload a page of articles, then render each one from the cache
    let ids = [1, 2, 3, 4];
    manager.preload("article", &ids, None).await.expect("preload");
    let queries_after_preload = manager.metrics().store_queries();

    let mut titles = Vec::new();
    for id in [1, 2] {
        let article = manager.translations(&Article { id }).expect("bound");
        titles.push(article.translate_with_default("title", None, true).await.expect("translate"));
    }
    assert_eq!(titles, vec!["Eerste", "Tweede"]);
    assert_eq!(manager.metrics().store_queries(), queries_after_preload);

    // Article 3 only exists in English; article 4 has nothing at all
    let third = manager.translations(&Article { id: 3 }).expect("bound");
    assert_eq!(
        third.translate_with_default("title", None, true).await.expect("translate"),
        "Third"
    );
    assert!(manager.is_fallback_used());

    let fourth = manager.translations(&Article { id: 4 }).expect("bound");
    assert_eq!(
        fourth.translate_with_default("title", None, false).await.expect("translate"),
        "article title # 4"
    );

    // Search finds translations in any locale
    let found = manager
        .search("article", &["title".to_string()], "wee")
        .await
        .expect("search");
    assert_eq!(found.into_iter().collect::<Vec<_>>(), vec![2]);

    let bulk = manager
        .bulk_translations::<Article>(&ids, "title", None)
        .await
        .expect("bulk");
    assert_eq!(bulk.len(), 2);
    assert_eq!(bulk[&1], "Eerste");
}

#[tokio::test]
async fn test_editing_ui_data() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&temp_dir, "en");
    let manager = create_manager(&config).await;

    let featured = manager
        .translations(&FeaturedArticle { id: 2 })
        .expect("Subtype should resolve to article");
    featured
        .save_translations("fr", [("title", "Bonjour")])
        .await
        .expect("Should save");

    let locales = featured.translation_locales().await.expect("locales");
    let summary: Vec<_> = locales
        .iter()
        .map(|l| (l.locale.code.as_str(), l.translated))
        .collect();
    assert_eq!(summary, vec![("nl", false), ("en", false), ("fr", true)]);

    assert_eq!(
        manager.labeled_types(),
        vec![("article".to_string(), "Article".to_string())]
    );
    assert_eq!(
        manager.translation_content_properties::<FeaturedArticle>().expect("bound"),
        vec!["body", "title"]
    );

    // Clearing the only translation removes it again
    featured
        .save_translations("fr", [("title", "")])
        .await
        .expect("Should delete");
    let locales = featured.translation_locales().await.expect("locales");
    assert!(locales.iter().all(|l| !l.translated));
}
