use thiserror::Error;

/// Backend failures. None of these are fatal: the resolver treats every
/// variant as "try the next stage".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("unsupported language pair {from}->{to}")]
    UnsupportedLanguagePair { from: String, to: String },
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl TranslationError {
    pub fn unsupported(pair: &super::language_pair::LanguagePair) -> Self {
        TranslationError::UnsupportedLanguagePair {
            from: pair.source.clone(),
            to: pair.target.clone(),
        }
    }
}
