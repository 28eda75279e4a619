use super::language_pair::LanguagePair;
use super::translation_error::TranslationError;

/// One stage of the translation cascade.
///
/// Returning the input unchanged means "no translation found" and is not an
/// error; the resolver moves on to the next backend either way.
pub trait TranslationBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Capability probe. Unsupported pairs are skipped without a call.
    fn supports(&self, pair: &LanguagePair) -> bool;

    fn translate(&self, text: &str, pair: &LanguagePair) -> Result<String, TranslationError>;
}
