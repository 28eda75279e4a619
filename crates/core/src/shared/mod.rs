pub mod constants;
pub mod coordinate_mapper;
pub mod normalized_rect;
pub mod observation;
pub mod settings;
