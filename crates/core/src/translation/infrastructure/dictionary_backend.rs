use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::shared::settings::SettingsError;
use crate::translation::domain::language_pair::LanguagePair;
use crate::translation::domain::translation_backend::TranslationBackend;
use crate::translation::domain::translation_error::TranslationError;

/// Last-resort local phrase dictionary.
///
/// Exact match on the trimmed, case-folded text only; no fuzzy matching.
/// A miss returns the input unchanged.
pub struct DictionaryBackend {
    entries: HashMap<String, String>,
    pair: Option<LanguagePair>,
}

impl DictionaryBackend {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.as_ref().trim().to_lowercase(), v.into()))
                .collect(),
            pair: None,
        }
    }

    /// Loads a flat JSON object `{"source phrase": "translation", ...}`.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: HashMap<String, String> =
            serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(entries))
    }

    /// Restricts the dictionary to one language pair.
    pub fn for_pair(mut self, pair: LanguagePair) -> Self {
        self.pair = Some(pair);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TranslationBackend for DictionaryBackend {
    fn name(&self) -> &str {
        "dictionary"
    }

    fn supports(&self, pair: &LanguagePair) -> bool {
        self.pair.as_ref().map_or(true, |p| p == pair)
    }

    fn translate(&self, text: &str, pair: &LanguagePair) -> Result<String, TranslationError> {
        if !self.supports(pair) {
            return Err(TranslationError::unsupported(pair));
        }
        Ok(self
            .entries
            .get(&text.trim().to_lowercase())
            .cloned()
            .unwrap_or_else(|| text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn en_zh() -> LanguagePair {
        LanguagePair::new("en", "zh")
    }

    #[test]
    fn test_exact_case_folded_match() {
        let dict = DictionaryBackend::new([("Hello", "你好")]);
        assert_eq!(dict.translate("  HELLO ", &en_zh()).unwrap(), "你好");
    }

    #[test]
    fn test_no_fuzzy_match() {
        let dict = DictionaryBackend::new([("hello", "你好")]);
        assert_eq!(dict.translate("hello!", &en_zh()).unwrap(), "hello!");
        assert_eq!(dict.translate("hell", &en_zh()).unwrap(), "hell");
    }

    #[test]
    fn test_restricted_pair() {
        let dict = DictionaryBackend::new([("hello", "你好")]).for_pair(en_zh());
        let en_es = LanguagePair::new("en", "es");
        assert!(dict.supports(&en_zh()));
        assert!(!dict.supports(&en_es));
        assert!(matches!(
            dict.translate("hello", &en_es),
            Err(TranslationError::UnsupportedLanguagePair { .. })
        ));
    }

    #[test]
    fn test_load_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Exit": "出口", "thank you": "谢谢"}}"#).unwrap();
        let dict = DictionaryBackend::load(file.path()).unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.translate("exit", &en_zh()).unwrap(), "出口");
    }

    #[test]
    fn test_load_rejects_non_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2]").unwrap();
        assert!(matches!(
            DictionaryBackend::load(file.path()),
            Err(SettingsError::Parse { .. })
        ));
    }
}
