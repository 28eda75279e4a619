pub mod domain;
pub mod infrastructure;
pub mod translation_resolver;
