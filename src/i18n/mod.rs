//! Internationalization collaborators used by the translation manager.
//!
//! # Architecture
//!
//! - `locales`: locale descriptors plus the supported-locale and current-locale seams
//! - `labels`: i18n key lookup for human-readable type names
//! - `metrics`: per-manager cache and fallback counters
//!
//! # Example
//!
//! ```rust,ignore
//! use content_translation::i18n::{FixedLocale, LocaleDescriptor, StaticLocales};
//!
//! let locales = StaticLocales::new(vec![LocaleDescriptor::new("en", "English")]);
//! let current = FixedLocale::new("en");
//! ```

mod labels;
mod locales;
mod metrics;

pub use labels::{KeyTranslator, LabelCatalog};
pub use locales::{CurrentLocale, FixedLocale, LocaleDescriptor, LocaleProvider, StaticLocales};
pub use metrics::{CacheMetrics, MetricsReport};
