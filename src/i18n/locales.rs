//! Locale descriptors and the collaborator seams the manager consumes.
//!
//! The manager never decides which locales exist or which one is active for
//! the current request; it asks a [`LocaleProvider`] and a [`CurrentLocale`].
//! Static implementations are provided for configuration-driven setups and
//! tests.

use crate::text::natural_cmp;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A supported locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleDescriptor {
    /// Locale code (e.g., "en", "nl", "pt-BR")
    pub code: String,

    /// Display name of the locale (e.g., "English", "Dutch")
    pub name: String,

    /// Name of the locale in its own language (e.g., "Nederlands")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_name: Option<String>,
}

impl LocaleDescriptor {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            native_name: None,
        }
    }

    pub fn with_native_name(mut self, native_name: impl Into<String>) -> Self {
        self.native_name = Some(native_name.into());
        self
    }
}

/// Descriptors order naturally by display name, then by code.
impl Ord for LocaleDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.name, &other.name)
            .then_with(|| self.code.cmp(&other.code))
            .then_with(|| self.native_name.cmp(&other.native_name))
    }
}

impl PartialOrd for LocaleDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Source of the locales content can be translated into.
pub trait LocaleProvider: Send + Sync {
    /// Supported locales, in the provider's configured order.
    fn supported_locales(&self) -> Vec<LocaleDescriptor>;
}

/// Source of the locale active for the current request.
pub trait CurrentLocale: Send + Sync {
    fn current_locale(&self) -> String;
}

/// Fixed list of locales, typically loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticLocales {
    locales: Vec<LocaleDescriptor>,
}

impl StaticLocales {
    pub fn new(locales: Vec<LocaleDescriptor>) -> Self {
        Self { locales }
    }

    /// Get a locale descriptor by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LocaleDescriptor> {
        self.locales.iter().find(|locale| locale.code == code)
    }
}

impl LocaleProvider for StaticLocales {
    fn supported_locales(&self) -> Vec<LocaleDescriptor> {
        self.locales.clone()
    }
}

/// A request locale that never changes.
#[derive(Debug, Clone)]
pub struct FixedLocale(pub String);

impl FixedLocale {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

impl CurrentLocale for FixedLocale {
    fn current_locale(&self) -> String {
        self.0.clone()
    }
}
