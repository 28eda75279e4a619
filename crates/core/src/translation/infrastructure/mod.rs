pub mod callback_backend;
pub mod dictionary_backend;
pub mod http_translation_backend;
