pub mod annotation_pipeline;
pub mod frame_gate;
pub mod infrastructure;
pub mod pipeline_logger;
