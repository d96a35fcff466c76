//! Translation manager: the entry point for reading and writing translations.
//!
//! One manager is built per request (or per process for batch jobs) and
//! passed by reference to whatever needs translations. It keeps a cache of
//! fetched rows keyed by (locale, content_type, content_id); the first read
//! of any property of an object loads every property of that object in that
//! locale, so further properties of the same object are served from memory.

use crate::db::{PropertyMap, SaveOutcome, TranslationRecord, TranslationStore};
use crate::error::Result;
use crate::i18n::{
    CacheMetrics, CurrentLocale, FixedLocale, KeyTranslator, LabelCatalog, LocaleDescriptor,
    LocaleProvider, StaticLocales,
};
use crate::registry::TypeRegistry;
use crate::text::natural_cmp;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// (locale, content_type, content_id)
type CacheKey = (String, String, u32);

pub struct TranslationManager {
    store: Arc<dyn TranslationStore>,
    registry: TypeRegistry,
    locales: Arc<dyn LocaleProvider>,
    current_locale: Arc<dyn CurrentLocale>,
    labels: Arc<dyn KeyTranslator>,
    fallback_locale: String,
    cache: Mutex<HashMap<CacheKey, Arc<PropertyMap>>>,
    fallback_used: AtomicBool,
    metrics: CacheMetrics,
}

impl TranslationManager {
    /// Create a manager with no configured locales, a request locale equal
    /// to the fallback locale and an empty label catalog.
    pub fn new(
        store: Arc<dyn TranslationStore>,
        registry: TypeRegistry,
        fallback_locale: impl Into<String>,
    ) -> Self {
        let fallback_locale = fallback_locale.into();
        Self {
            store,
            registry,
            locales: Arc::new(StaticLocales::default()),
            current_locale: Arc::new(FixedLocale::new(fallback_locale.clone())),
            labels: Arc::new(LabelCatalog::default()),
            fallback_locale,
            cache: Mutex::new(HashMap::new()),
            fallback_used: AtomicBool::new(false),
            metrics: CacheMetrics::new(),
        }
    }

    pub fn with_locales(mut self, locales: Arc<dyn LocaleProvider>) -> Self {
        self.locales = locales;
        self
    }

    pub fn with_current_locale(mut self, current_locale: Arc<dyn CurrentLocale>) -> Self {
        self.current_locale = current_locale;
        self
    }

    pub fn with_labels(mut self, labels: Arc<dyn KeyTranslator>) -> Self {
        self.labels = labels;
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    // ==================== Locales ====================

    /// Locales content can be translated into, as the locale provider orders them.
    pub fn supported_locales(&self) -> Vec<LocaleDescriptor> {
        self.locales.supported_locales()
    }

    /// (code, name) of every supported locale, sorted naturally by name.
    pub fn locale_names(&self) -> Vec<(String, String)> {
        let mut names: Vec<(String, String)> = self
            .supported_locales()
            .into_iter()
            .map(|locale| (locale.code, locale.name))
            .collect();
        names.sort_by(|(a_code, a_name), (b_code, b_name)| {
            natural_cmp(a_name, b_name).then_with(|| a_code.cmp(b_code))
        });
        names
    }

    /// Locale used when none is given explicitly: the current request locale.
    pub fn default_locale(&self) -> String {
        self.current_locale.current_locale()
    }

    /// Locale shown when the requested one has no translation.
    pub fn fallback_locale(&self) -> &str {
        &self.fallback_locale
    }

    pub(crate) fn effective_locale(&self, locale: Option<&str>) -> String {
        match locale {
            Some(locale) => locale.to_string(),
            None => self.default_locale(),
        }
    }

    // ==================== Content types ====================

    /// Handler bound to a content type; `None` if the type is not registered.
    pub fn content_handler(&self, content_type: &str) -> Option<&str> {
        self.registry.resolve_handler(content_type)
    }

    /// Registered content types with their localized names, for type pickers.
    pub fn labeled_types(&self) -> Vec<(String, String)> {
        self.registry.labeled_types(self.labels.as_ref())
    }

    // ==================== Reads ====================

    /// Translation of one property, served from the cache when possible.
    pub async fn get(
        &self,
        content_type: &str,
        content_id: u32,
        property: &str,
        locale: Option<&str>,
    ) -> Result<Option<String>> {
        let locale = self.effective_locale(locale);
        let properties = self
            .object_translations(content_type, content_id, &locale)
            .await?;
        Ok(properties.get(property).cloned())
    }

    async fn object_translations(
        &self,
        content_type: &str,
        content_id: u32,
        locale: &str,
    ) -> Result<Arc<PropertyMap>> {
        let key = (locale.to_string(), content_type.to_string(), content_id);

        let cached = self.cache().get(&key).cloned();
        if let Some(properties) = cached {
            self.metrics.record_cache_hit();
            return Ok(properties);
        }

        self.metrics.record_cache_miss();
        self.metrics.record_store_query();
        debug!(content_type, content_id, locale, "translation cache miss");

        let properties = Arc::new(
            self.store
                .find_object(content_type, content_id, locale)
                .await?,
        );
        self.cache().insert(key, Arc::clone(&properties));
        Ok(properties)
    }

    /// Load the translations of many objects into the cache with one query
    /// per `MAX_IDS_PER_QUERY` ids. Ids may repeat.
    /// Objects without any translation are cached as empty.
    pub async fn preload(
        &self,
        content_type: &str,
        content_ids: &[u32],
        locale: Option<&str>,
    ) -> Result<()> {
        let locale = self.effective_locale(locale);

        self.metrics.record_store_query();
        let found = self
            .store
            .find_objects(content_type, content_ids, &locale)
            .await?;

        let mut cache = self.cache();
        for &content_id in content_ids {
            let properties = found.get(&content_id).cloned().unwrap_or_default();
            cache.insert(
                (locale.clone(), content_type.to_string(), content_id),
                Arc::new(properties),
            );
        }

        debug!(content_type, locale = %locale, objects = content_ids.len(), "preloaded translations");
        Ok(())
    }

    /// All locales in which one property of one object is translated. Uncached.
    pub async fn get_grouped_by_locale(
        &self,
        content_type: &str,
        content_id: u32,
        property: &str,
    ) -> Result<BTreeMap<String, TranslationRecord>> {
        self.metrics.record_store_query();
        self.store
            .find_grouped_by_locale(content_type, content_id, property)
            .await
    }

    /// One property of many objects with one query per `MAX_IDS_PER_QUERY` ids. Uncached.
    pub async fn bulk_get(
        &self,
        content_type: &str,
        content_ids: &[u32],
        property: &str,
        locale: Option<&str>,
    ) -> Result<HashMap<u32, String>> {
        let locale = self.effective_locale(locale);
        self.metrics.record_store_query();
        self.store
            .find_many(content_type, content_ids, property, &locale)
            .await
    }

    /// Ids of objects whose translations of `properties` contain `search`.
    pub async fn search(
        &self,
        content_type: &str,
        properties: &[String],
        search: &str,
    ) -> Result<BTreeSet<u32>> {
        self.metrics.record_store_query();
        self.store.search(content_type, properties, search).await
    }

    /// Number of translated properties of one object in one locale.
    pub async fn count(&self, content_type: &str, content_id: u32, locale: &str) -> Result<u64> {
        self.metrics.record_store_query();
        self.store.count(content_type, content_id, locale).await
    }

    // ==================== Writes ====================

    /// Save one translation; a blank value deletes it.
    ///
    /// The cached properties of the written object in that locale are
    /// dropped, so the next read sees the new value.
    pub async fn save(
        &self,
        content_type: &str,
        content_id: u32,
        property: &str,
        locale: &str,
        translation: &str,
    ) -> Result<SaveOutcome> {
        self.metrics.record_store_query();
        let outcome = self
            .store
            .upsert(content_type, content_id, property, locale, translation)
            .await?;

        self.cache()
            .remove(&(locale.to_string(), content_type.to_string(), content_id));

        match &outcome {
            SaveOutcome::Saved(record) => {
                info!(content_type, content_id, property, locale, id = record.id, "translation saved")
            }
            SaveOutcome::Deleted { rows } => {
                info!(content_type, content_id, property, locale, rows, "translation removed")
            }
        }
        Ok(outcome)
    }

    // ==================== Fallback tracking ====================

    /// Record that a translation was served from the fallback locale.
    pub fn mark_fallback_used(&self, content_type: &str, content_id: u32, property: &str) {
        self.fallback_used.store(true, Ordering::Relaxed);
        self.metrics.record_fallback();
        debug!(content_type, content_id, property, "fallback translation used");
    }

    /// Whether any lookup served by this manager fell back to the fallback locale.
    pub fn is_fallback_used(&self) -> bool {
        self.fallback_used.load(Ordering::Relaxed)
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<CacheKey, Arc<PropertyMap>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
