use crate::translation::domain::language_pair::LanguagePair;
use crate::translation::domain::translation_backend::TranslationBackend;
use crate::translation::domain::translation_error::TranslationError;

type TranslateFn = dyn Fn(&str, &LanguagePair) -> Result<String, TranslationError> + Send + Sync;
type SupportsFn = dyn Fn(&LanguagePair) -> bool + Send + Sync;

/// Adapts a host-provided closure into a cascade stage.
///
/// This is how on-device translators (platform frameworks, embedded
/// models) plug in without the core knowing about them.
pub struct CallbackBackend {
    name: String,
    translate: Box<TranslateFn>,
    supports: Box<SupportsFn>,
}

impl CallbackBackend {
    pub fn new<F>(name: impl Into<String>, translate: F) -> Self
    where
        F: Fn(&str, &LanguagePair) -> Result<String, TranslationError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            translate: Box::new(translate),
            supports: Box::new(|_| true),
        }
    }

    pub fn with_supports<F>(mut self, supports: F) -> Self
    where
        F: Fn(&LanguagePair) -> bool + Send + Sync + 'static,
    {
        self.supports = Box::new(supports);
        self
    }
}

impl TranslationBackend for CallbackBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, pair: &LanguagePair) -> bool {
        (self.supports)(pair)
    }

    fn translate(&self, text: &str, pair: &LanguagePair) -> Result<String, TranslationError> {
        (self.translate)(text, pair)
    }
}
