use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::constants::HTTP_TIMEOUT_SECS;
use crate::translation::domain::language_pair::LanguagePair;
use crate::translation::domain::translation_backend::TranslationBackend;
use crate::translation::domain::translation_error::TranslationError;

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    api_key: &'a str,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

/// Hosted translation API speaking the LibreTranslate JSON shape:
/// `POST {q, source, target, format, api_key}` → `{translatedText}`.
///
/// Without an API key the backend reports itself unavailable so the
/// cascade falls through without a network round-trip.
pub struct HttpTranslationBackend {
    client: reqwest::blocking::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpTranslationBackend {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("falling back to default HTTP client: {e}");
                reqwest::blocking::Client::new()
            });
        Self {
            client,
            url: url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

impl TranslationBackend for HttpTranslationBackend {
    fn name(&self) -> &str {
        "http"
    }

    fn supports(&self, pair: &LanguagePair) -> bool {
        !pair.is_identity()
    }

    fn translate(&self, text: &str, pair: &LanguagePair) -> Result<String, TranslationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TranslationError::BackendUnavailable("missing API key".to_string()))?;

        let body = TranslateRequest {
            q: text,
            source: &pair.source,
            target: &pair.target,
            format: "text",
            api_key,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(|e| TranslationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Request(format!(
                "{} returned HTTP {status}",
                self.url
            )));
        }

        let parsed: TranslateResponse = response
            .json()
            .map_err(|e| TranslationError::InvalidResponse(e.to_string()))?;
        Ok(parsed.translated_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en_zh() -> LanguagePair {
        LanguagePair::new("en", "zh")
    }

    #[test]
    fn test_missing_key_is_unavailable() {
        let backend = HttpTranslationBackend::new("http://127.0.0.1:9/translate", None);
        assert!(!backend.has_credentials());
        assert!(matches!(
            backend.translate("hello", &en_zh()),
            Err(TranslationError::BackendUnavailable(_))
        ));
    }

    #[test]
    fn test_blank_key_is_treated_as_missing() {
        let backend =
            HttpTranslationBackend::new("http://127.0.0.1:9/translate", Some("  ".to_string()));
        assert!(!backend.has_credentials());
    }

    #[test]
    fn test_identity_pair_unsupported() {
        let backend = HttpTranslationBackend::new("http://127.0.0.1:9/translate", None);
        assert!(!backend.supports(&LanguagePair::new("en", "en")));
        assert!(backend.supports(&en_zh()));
    }

    #[test]
    fn test_unreachable_host_is_request_error() {
        let backend =
            HttpTranslationBackend::new("http://127.0.0.1:9/translate", Some("key".to_string()));
        assert!(matches!(
            backend.translate("hello", &en_zh()),
            Err(TranslationError::Request(_))
        ));
    }

    #[test]
    fn test_request_and_response_shapes() {
        let body = TranslateRequest {
            q: "hello",
            source: "en",
            target: "zh",
            format: "text",
            api_key: "k",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["q"], "hello");
        assert_eq!(json["format"], "text");

        let parsed: TranslateResponse =
            serde_json::from_str(r#"{"translatedText": "你好"}"#).unwrap();
        assert_eq!(parsed.translated_text, "你好");
    }
}
