//! Translatable capability for domain models.
//!
//! A model opts in by implementing [`Translatable`]: it names its handler
//! identifier and exposes its id. [`TranslationManager::translations`] then
//! resolves the model's content type (following the handler's extends chain)
//! and returns a [`Translations`] handle that reads and writes that object's
//! translations through the manager.
//!
//! ```rust,ignore
//! struct Article { id: u32 }
//!
//! impl Translatable for Article {
//!     const HANDLER: &'static str = "app::Article";
//!     fn translation_id(&self) -> u32 { self.id }
//! }
//!
//! let title = manager.translations(&article)?.translate("title", None, true).await?;
//! ```

use crate::db::{SaveOutcome, TranslationRecord};
use crate::error::{Result, TranslationError};
use crate::i18n::LocaleDescriptor;
use crate::manager::TranslationManager;
use crate::registry::ContentTypeOptions;
use crate::text::nl2br;
use serde::Serialize;
use std::collections::HashMap;

/// A domain model whose properties can be translated.
pub trait Translatable {
    /// Stable identifier of the model type, bound (or extended) in the registry.
    const HANDLER: &'static str;

    /// Identity of this object within its content type.
    fn translation_id(&self) -> u32;
}

/// A supported locale and whether the object's label is translated in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleTranslation {
    #[serde(flatten)]
    pub locale: LocaleDescriptor,
    pub translated: bool,
    pub record: Option<TranslationRecord>,
}

/// Translations of one object, bound to a manager.
#[derive(Clone)]
pub struct Translations<'m> {
    manager: &'m TranslationManager,
    content_type: String,
    content_id: u32,
}

impl<'m> Translations<'m> {
    /// Bind directly to a known content type and id.
    pub fn new(
        manager: &'m TranslationManager,
        content_type: impl Into<String>,
        content_id: u32,
    ) -> Self {
        Self {
            manager,
            content_type: content_type.into(),
            content_id,
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn content_id(&self) -> u32 {
        self.content_id
    }

    fn options(&self) -> Result<&'m ContentTypeOptions> {
        self.manager.registry().options(&self.content_type)
    }

    /// Translate a property, falling back to the fallback locale when allowed.
    ///
    /// Returns an empty string when neither locale has a translation.
    pub async fn translate(
        &self,
        property: &str,
        locale: Option<&str>,
        use_fallback: bool,
    ) -> Result<String> {
        let locale = self.manager.effective_locale(locale);

        if let Some(translation) = self.lookup(property, &locale).await? {
            return Ok(translation);
        }

        let fallback = self.manager.fallback_locale();
        if use_fallback && locale != fallback {
            if let Some(translation) = self.lookup(property, fallback).await? {
                self.manager
                    .mark_fallback_used(&self.content_type, self.content_id, property);
                return Ok(translation);
            }
        }

        Ok(String::new())
    }

    async fn lookup(&self, property: &str, locale: &str) -> Result<Option<String>> {
        let translation = self
            .manager
            .get(&self.content_type, self.content_id, property, Some(locale))
            .await?;
        Ok(translation.filter(|t| !t.is_empty()))
    }

    /// Like [`translate`](Self::translate), but never blank: a missing
    /// translation becomes `"<content_type> <property> # <content_id>"`.
    pub async fn translate_with_default(
        &self,
        property: &str,
        locale: Option<&str>,
        use_fallback: bool,
    ) -> Result<String> {
        let translation = self.translate(property, locale, use_fallback).await?;
        if translation.is_empty() {
            return Ok(self.translation_default(property));
        }
        Ok(translation)
    }

    /// Placeholder shown to editors for a missing translation.
    pub fn translation_default(&self, property: &str) -> String {
        format!("{} {} # {}", self.content_type, property, self.content_id)
    }

    /// Translate the content type's label property.
    pub async fn translate_label(&self, locale: Option<&str>, use_fallback: bool) -> Result<String> {
        let label_property = &self.options()?.label_property;
        self.translate(label_property, locale, use_fallback).await
    }

    /// Translate a property for display, applying the property's newline flag.
    pub async fn display(
        &self,
        property: &str,
        with_default: bool,
        locale: Option<&str>,
        use_fallback: bool,
    ) -> Result<String> {
        let translation = if with_default {
            self.translate_with_default(property, locale, use_fallback)
                .await?
        } else {
            self.translate(property, locale, use_fallback).await?
        };

        if self.options()?.converts_newlines(property) {
            return Ok(nl2br(&translation));
        }
        Ok(translation)
    }

    /// Every supported locale, marked with whether the label property is
    /// translated in it, sorted by locale.
    pub async fn translation_locales(&self) -> Result<Vec<LocaleTranslation>> {
        let label_property = &self.options()?.label_property;
        let mut records = self
            .manager
            .get_grouped_by_locale(&self.content_type, self.content_id, label_property)
            .await?;

        let mut locales: Vec<LocaleTranslation> = self
            .manager
            .supported_locales()
            .into_iter()
            .map(|locale| {
                let record = records.remove(&locale.code);
                LocaleTranslation {
                    translated: record.is_some(),
                    record,
                    locale,
                }
            })
            .collect();

        locales.sort_by(|a, b| a.locale.cmp(&b.locale));
        Ok(locales)
    }

    /// Save several properties in one locale.
    ///
    /// Each property is saved on its own; if one fails, the ones before it
    /// stay saved.
    pub async fn save_translations<I, K, V>(
        &self,
        locale: &str,
        translations: I,
    ) -> Result<Vec<SaveOutcome>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut outcomes = Vec::new();
        for (property, translation) in translations {
            let outcome = self
                .manager
                .save(
                    &self.content_type,
                    self.content_id,
                    property.as_ref(),
                    locale,
                    translation.as_ref(),
                )
                .await?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Number of translated properties in a locale.
    pub async fn count_translations(&self, locale: &str) -> Result<u64> {
        self.manager
            .count(&self.content_type, self.content_id, locale)
            .await
    }
}

impl TranslationManager {
    /// Translations handle for a model instance.
    pub fn translations<T: Translatable>(&self, model: &T) -> Result<Translations<'_>> {
        let content_type = self.translation_content_type::<T>()?;
        Ok(Translations::new(self, content_type, model.translation_id()))
    }

    /// Content type the model type is bound to.
    pub fn translation_content_type<T: Translatable>(&self) -> Result<&str> {
        self.registry()
            .resolve_content_type(T::HANDLER)
            .ok_or_else(|| TranslationError::UnboundHandler(T::HANDLER.to_string()))
    }

    /// Translatable property names of the model type.
    pub fn translation_content_properties<T: Translatable>(&self) -> Result<Vec<String>> {
        let content_type = self.translation_content_type::<T>()?;
        Ok(self.registry().options(content_type)?.property_names())
    }

    /// Label property of the model type.
    pub fn translation_label_property<T: Translatable>(&self) -> Result<&str> {
        let content_type = self.translation_content_type::<T>()?;
        Ok(self.registry().options(content_type)?.label_property.as_str())
    }

    /// One property of many objects of the model type, newlines rendered as `<br />`.
    pub async fn bulk_translations<T: Translatable>(
        &self,
        content_ids: &[u32],
        property: &str,
        locale: Option<&str>,
    ) -> Result<HashMap<u32, String>> {
        let content_type = self.translation_content_type::<T>()?;
        let translations = self
            .bulk_get(content_type, content_ids, property, locale)
            .await?;

        Ok(translations
            .into_iter()
            .map(|(content_id, translation)| (content_id, nl2br(&translation)))
            .collect())
    }
}
