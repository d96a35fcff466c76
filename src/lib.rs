//! Per-property, per-locale translations for arbitrary domain models.
//!
//! Translations of every content type live in one `content_translations`
//! table. A [`TranslationManager`] built per request reads them with a
//! locale fallback and an in-memory cache, and models gain translate/save
//! behavior by implementing [`Translatable`].

pub mod config;
pub mod db;
pub mod error;
pub mod i18n;
pub mod manager;
pub mod registry;
pub mod text;
pub mod translatable;

pub use db::{Database, SaveOutcome, TranslationRecord, TranslationStore};
pub use error::{Result, TranslationError};
pub use manager::TranslationManager;
pub use registry::{ContentTypeOptions, PropertyOptions, TypeRegistry};
pub use translatable::{LocaleTranslation, Translatable, Translations};
