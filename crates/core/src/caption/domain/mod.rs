pub mod caption;
pub mod caption_synthesizer;
pub mod caption_templates;
