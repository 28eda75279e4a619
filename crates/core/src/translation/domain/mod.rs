pub mod language_pair;
pub mod translation_backend;
pub mod translation_cache;
pub mod translation_error;
