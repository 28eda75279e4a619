pub mod annotation;
pub mod annotation_aggregator;
pub mod face_matcher;
