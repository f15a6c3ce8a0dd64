//! Internationalization module
//!
//! Provides translations for Brazilian Portuguese (pt) and English (en),
//! along with the number conventions of each language.
//! Supports automatic language detection based on system locale.

mod en;
mod pt;

use std::collections::HashMap;

/// Internationalization manager
#[derive(Debug, Clone)]
pub struct I18n {
    current_lang: String,
    translations: HashMap<String, String>,
}

impl I18n {
    /// Create a new I18n instance with the specified language
    pub fn new(lang: &str) -> Self {
        let mut i18n = Self {
            current_lang: String::new(),
            translations: HashMap::new(),
        };
        i18n.set_language(lang);
        i18n
    }

    /// Set the current language
    pub fn set_language(&mut self, lang: &str) {
        let lang = if lang == "auto" {
            Self::detect_system_language()
        } else {
            lang.to_string()
        };

        self.translations = match lang.as_str() {
            "en" => en::get_translations(),
            _ => pt::get_translations(),
        };
        self.current_lang = if lang == "en" { lang } else { "pt".to_string() };

        log::debug!("Language set to: {}", self.current_lang);
    }

    /// Get a translated string by key
    pub fn get(&self, key: &str) -> String {
        self.translations
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Get a translated string and substitute `{name}` placeholders
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        args.iter().fold(self.get(key), |text, (name, value)| {
            text.replace(&format!("{{{}}}", name), value)
        })
    }

    /// Get the current language code
    pub fn current_language(&self) -> &str {
        &self.current_lang
    }

    /// Separator between integer and fractional digits
    pub fn decimal_separator(&self) -> char {
        if self.current_lang == "en" { '.' } else { ',' }
    }

    /// Separator between thousands groups
    pub fn group_separator(&self) -> char {
        if self.current_lang == "en" { ',' } else { '.' }
    }

    /// Detect system language
    fn detect_system_language() -> String {
        let lang_env = std::env::var("LC_ALL")
            .or_else(|_| std::env::var("LC_MESSAGES"))
            .or_else(|_| std::env::var("LANG"))
            .unwrap_or_default();

        // "pt_BR.UTF-8" -> "pt"
        let lang_code = lang_env
            .split(['_', '.', '-'])
            .next()
            .unwrap_or_default();

        match lang_code {
            "pt" => "pt".to_string(),
            _ => "en".to_string(),
        }
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("pt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_language_falls_back_to_portuguese() {
        let i18n = I18n::new("fr");
        assert_eq!(i18n.current_language(), "pt");
        assert_eq!(i18n.get("format.invalid_date"), "Data inv\u{00E1}lida");
    }

    #[test]
    fn test_missing_key_returns_key() {
        let i18n = I18n::new("en");
        assert_eq!(i18n.get("no.such.key"), "no.such.key");
    }

    #[test]
    fn test_format_placeholders() {
        let i18n = I18n::new("en");
        assert_eq!(
            i18n.format("validation.consumption_high", &[("percent", "227")]),
            "Consumption abnormally high (227% of average)"
        );
    }

    #[test]
    fn test_languages_share_keys() {
        let pt = I18n::new("pt").translations;
        let en = I18n::new("en").translations;
        let mut missing: Vec<_> = pt.keys().filter(|k| !en.contains_key(*k)).collect();
        missing.extend(en.keys().filter(|k| !pt.contains_key(*k)));
        assert!(missing.is_empty(), "keys missing in one language: {:?}", missing);
    }

    #[test]
    fn test_separators() {
        assert_eq!(I18n::new("pt").decimal_separator(), ',');
        assert_eq!(I18n::new("en").group_separator(), ',');
    }
}
