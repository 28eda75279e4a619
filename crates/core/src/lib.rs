pub mod annotation;
pub mod caption;
pub mod identity;
pub mod pipeline;
pub mod shared;
pub mod translation;
