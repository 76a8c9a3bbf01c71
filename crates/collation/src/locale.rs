//! Locales, `"tag:oid"` collation specs and the supported-locale database.
//!
//! Tags are split the way directory configuration has always written them:
//! everything before the first `-` is the language, everything after the last
//! `-` is the variant (when there are two separators), and whatever sits in
//! between is the country. `en`, `en-US` and `no-NO-NY` are all valid tags.

use std::fmt;
use std::str::FromStr;

use fxhash::FxHashSet;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::CollationError;

/// A language / country / variant triple.
///
/// Language is stored lower-cased and country upper-cased so that `en-us` and
/// `EN-US` name the same locale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locale {
    language: String,
    country: Option<String>,
    variant: Option<String>,
}

impl Locale {
    /// Build a locale from its parts, normalizing case.
    pub fn new(language: &str, country: Option<&str>, variant: Option<&str>) -> Self {
        Self {
            language: language.to_ascii_lowercase(),
            country: country
                .filter(|c| !c.is_empty())
                .map(str::to_ascii_uppercase),
            variant: variant.filter(|v| !v.is_empty()).map(str::to_owned),
        }
    }

    /// Parse a language tag such as `en`, `fr-CA` or `th-TH-TH`.
    pub fn from_tag(tag: &str) -> Result<Self, CollationError> {
        let malformed = || CollationError::MalformedLocaleSpec(tag.to_owned());

        let (language, country, variant) = match (tag.find('-'), tag.rfind('-')) {
            (None, _) | (_, None) => (tag, None, None),
            (Some(first), Some(last)) if first == last => (&tag[..first], Some(&tag[first + 1..]), None),
            (Some(first), Some(last)) => (
                &tag[..first],
                Some(&tag[first + 1..last]),
                Some(&tag[last + 1..]),
            ),
        };

        if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(malformed());
        }
        if let Some(country) = country {
            if country.is_empty() || !country.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(malformed());
            }
        }
        if let Some(variant) = variant {
            if variant.is_empty()
                || !variant
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(malformed());
            }
        }

        Ok(Self::new(language, country, variant))
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// Name used to namespace index keys for this locale: `lang[_COUNTRY][_variant]`.
    pub fn index_name(&self) -> String {
        let mut name = self.language.clone();
        for part in [&self.country, &self.variant].into_iter().flatten() {
            name.push('_');
            name.push_str(part);
        }
        name
    }

    /// Whether the process-wide locale database can build a collator for this locale.
    pub fn is_supported(&self) -> bool {
        supported_locales().contains(self)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.language)?;
        for part in [&self.country, &self.variant].into_iter().flatten() {
            write!(f, "-{part}")?;
        }
        Ok(())
    }
}

impl FromStr for Locale {
    type Err = CollationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::from_tag(s)
    }
}

/// A configured collation: the language tag plus the base OID its rules derive from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocaleSpec {
    tag: String,
    oid: String,
}

impl LocaleSpec {
    /// Parse `"<language-tag>:<base-oid>"`. The split happens at the first `:`.
    pub fn parse(spec: &str) -> Result<Self, CollationError> {
        let malformed = || CollationError::MalformedLocaleSpec(spec.to_owned());

        let split = spec.find(':').filter(|&idx| idx > 0).ok_or_else(malformed)?;
        let tag = spec[..split].trim();
        let oid = spec[split + 1..].trim();
        if tag.is_empty() || !is_numeric_oid(oid) {
            return Err(malformed());
        }

        Ok(Self {
            tag: tag.to_owned(),
            oid: oid.to_owned(),
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn oid(&self) -> &str {
        &self.oid
    }

    /// Resolve the tag against the supported-locale database.
    pub fn locale(&self) -> Result<Locale, CollationError> {
        let locale = Locale::from_tag(&self.tag)?;
        if !locale.is_supported() {
            return Err(CollationError::UnsupportedLocale(self.tag.clone()));
        }
        Ok(locale)
    }
}

impl fmt::Display for LocaleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tag, self.oid)
    }
}

impl FromStr for LocaleSpec {
    type Err = CollationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LocaleSpec::parse(s)
    }
}

fn is_numeric_oid(oid: &str) -> bool {
    !oid.is_empty()
        && oid
            .split('.')
            .all(|arc| !arc.is_empty() && arc.bytes().all(|b| b.is_ascii_digit()))
}

/// Locales the collator can be built for. Initialized once, read-only afterwards.
#[derive(Debug)]
pub struct SupportedLocales {
    locales: FxHashSet<Locale>,
}

impl SupportedLocales {
    fn builtin() -> Self {
        let locales = BUILTIN_LOCALES
            .iter()
            .filter_map(|tag| Locale::from_tag(tag).ok())
            .collect();
        Self { locales }
    }

    pub fn contains(&self, locale: &Locale) -> bool {
        self.locales.contains(locale)
    }

    pub fn len(&self) -> usize {
        self.locales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locales.is_empty()
    }

    /// All supported locales, sorted.
    pub fn sorted(&self) -> Vec<&Locale> {
        let mut all: Vec<&Locale> = self.locales.iter().collect();
        all.sort();
        all
    }
}

static SUPPORTED_LOCALES: Lazy<SupportedLocales> = Lazy::new(SupportedLocales::builtin);

/// The process-wide supported-locale database.
pub fn supported_locales() -> &'static SupportedLocales {
    &SUPPORTED_LOCALES
}

/// Locales whose primary order the collator reproduces: root order, or root
/// order plus a tailoring. Scripts and alphabets that need a CLDR table
/// (CJK, Thai, Indic, Arabic, Hebrew, Vietnamese, the Cyrillic alphabets with
/// extra letters) stay out and surface as `UnsupportedLocale`.
const BUILTIN_LOCALES: &[&str] = &[
    "az", "bg", "bg-BG", "ca", "ca-ES", "cs", "cs-CZ", "da", "da-DK", "de", "de-AT", "de-CH",
    "de-DE", "de-LU", "el", "el-GR", "en", "en-AU", "en-CA", "en-GB", "en-IE", "en-IN",
    "en-NZ", "en-US", "en-ZA", "es", "es-AR", "es-CL", "es-CO", "es-ES", "es-MX", "es-PE",
    "es-US", "es-VE", "et", "et-EE", "fi", "fi-FI", "fr", "fr-BE", "fr-CA", "fr-CH", "fr-FR",
    "fr-LU", "ga", "ga-IE", "hr", "hr-HR", "hu", "hu-HU", "id", "id-ID", "is", "is-IS", "it",
    "it-CH", "it-IT", "lt", "lt-LT", "lv", "lv-LV", "ms", "ms-MY", "nb", "nb-NO", "nl",
    "nl-BE", "nl-NL", "no", "no-NO", "no-NO-NY", "pl", "pl-PL", "pt", "pt-BR", "pt-PT", "ro",
    "ro-RO", "ru", "ru-RU", "sk", "sk-SK", "sl", "sl-SI", "sv", "sv-FI", "sv-SE", "tr",
    "tr-TR",
];
