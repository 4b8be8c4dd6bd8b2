//! Localisation context for bilingual (`_en` / `_id`) content columns.
//!
//! `I18n` is built once from configuration and handed to whoever renders
//! content; there is no process-wide instance.

use crate::error::SiteError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Id,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Id];

    /// Column suffix for this locale, e.g. `title_en`.
    pub fn suffix(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Id => "id",
        }
    }

    /// Language name in that language, used as a listing header.
    pub fn native_name(&self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Id => "Bahasa Indonesia",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for Locale {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let primary = s
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match primary.as_str() {
            "en" => Ok(Locale::En),
            // `in` is the legacy ISO 639 code for Indonesian
            "id" | "in" => Ok(Locale::Id),
            _ => Err(SiteError::ValidationError(format!("Unsupported locale: {}", s))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct I18n {
    default_locale: Locale,
    fallback_locale: Locale,
}

impl I18n {
    pub fn new(default_locale: Locale) -> Self {
        Self {
            default_locale,
            fallback_locale: Locale::En,
        }
    }

    pub fn with_fallback(mut self, fallback: Locale) -> Self {
        self.fallback_locale = fallback;
        self
    }

    pub fn default_locale(&self) -> Locale {
        self.default_locale
    }

    pub fn fallback_locale(&self) -> Locale {
        self.fallback_locale
    }

    /// Picks the first supported language from an `Accept-Language` style
    /// list, honouring `q` weights. Falls back to the default locale.
    pub fn detect(&self, accept_language: Option<&str>) -> Locale {
        let Some(header) = accept_language else {
            return self.default_locale;
        };

        let mut candidates: Vec<(f32, usize, Locale)> = header
            .split(',')
            .enumerate()
            .filter_map(|(position, entry)| {
                let mut parts = entry.split(';');
                let tag = parts.next()?.trim();
                let weight = parts
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                let locale = tag.parse::<Locale>().ok()?;
                Some((weight, position, locale))
            })
            .filter(|(weight, _, _)| *weight > 0.0)
            .collect();

        candidates.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        candidates
            .first()
            .map(|(_, _, locale)| *locale)
            .unwrap_or(self.default_locale)
    }

    /// Reads `{field}_{locale}` from a row, then the fallback locale, then
    /// the bare `field`. Empty strings count as missing.
    pub fn localized(&self, record: &Value, field: &str, locale: Locale) -> Option<String> {
        self.candidates(field, locale)
            .into_iter()
            .filter_map(|key| record.get(&key))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|text| !text.is_empty())
            .map(str::to_string)
    }

    /// Same lookup order as [`I18n::localized`] for JSONB list columns.
    pub fn localized_list(&self, record: &Value, field: &str, locale: Locale) -> Vec<String> {
        self.candidates(field, locale)
            .into_iter()
            .filter_map(|key| record.get(&key))
            .filter_map(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .find(|items| !items.is_empty())
            .unwrap_or_default()
    }

    fn candidates(&self, field: &str, locale: Locale) -> Vec<String> {
        let mut keys = vec![format!("{}_{}", field, locale.suffix())];
        if self.fallback_locale != locale {
            keys.push(format!("{}_{}", field, self.fallback_locale.suffix()));
        }
        keys.push(field.to_string());
        keys
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new(Locale::En)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_locale_parsing() {
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!("en-US".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!("id_ID".parse::<Locale>().unwrap(), Locale::Id);
        assert_eq!("in".parse::<Locale>().unwrap(), Locale::Id);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn test_native_names() {
        let names: Vec<&str> = Locale::ALL.iter().map(Locale::native_name).collect();
        assert_eq!(names, vec!["English", "Bahasa Indonesia"]);
    }

    #[test]
    fn test_detect() {
        let i18n = I18n::new(Locale::En);
        assert_eq!(i18n.detect(None), Locale::En);
        assert_eq!(i18n.detect(Some("id-ID,id;q=0.9,en;q=0.8")), Locale::Id);
        assert_eq!(i18n.detect(Some("fr-FR,en;q=0.5,id;q=0.7")), Locale::Id);
        assert_eq!(i18n.detect(Some("fr-FR,de")), Locale::En);
        assert_eq!(i18n.detect(Some("id;q=0,en")), Locale::En);

        let indonesian = I18n::new(Locale::Id);
        assert_eq!(indonesian.detect(Some("ja")), Locale::Id);
    }

    #[test]
    fn test_localized_fallbacks() {
        let i18n = I18n::default();
        let row = json!({
            "title_en": "Web Development",
            "title_id": "Pengembangan Web",
            "subtitle_en": "Fast sites",
            "subtitle_id": "",
            "name": "Acme"
        });

        assert_eq!(i18n.localized(&row, "title", Locale::Id).as_deref(), Some("Pengembangan Web"));
        assert_eq!(i18n.localized(&row, "subtitle", Locale::Id).as_deref(), Some("Fast sites"));
        assert_eq!(i18n.localized(&row, "name", Locale::Id).as_deref(), Some("Acme"));
        assert_eq!(i18n.localized(&row, "missing", Locale::En), None);
    }

    #[test]
    fn test_localized_list() {
        let i18n = I18n::default();
        let row = json!({
            "features_en": ["SSL", "CDN"],
            "features_id": []
        });
        assert_eq!(i18n.localized_list(&row, "features", Locale::Id), vec!["SSL", "CDN"]);
        assert!(i18n.localized_list(&row, "details", Locale::En).is_empty());
    }
}
