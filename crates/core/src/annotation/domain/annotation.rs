use serde::{Deserialize, Serialize};

use crate::shared::coordinate_mapper::DisplayRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Text,
    Face,
}

/// Lifecycle of a tracked entity.
///
/// `Active`: observed this cycle. `Stale`: not observed, but younger than
/// the eviction threshold. Once an entity reaches the threshold it is
/// removed from the set on the next aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityState {
    Active,
    Stale,
}

/// A display-ready annotation for the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub display_rect: DisplayRect,
    pub translated_text: String,
    pub original_text: String,
    pub kind: AnnotationKind,
    pub confidence: f32,
    pub is_personalized: bool,
    pub state: EntityState,
}

/// The published annotation set for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSnapshot {
    pub sequence: u64,
    pub annotations: Vec<Annotation>,
}

impl AnnotationSnapshot {
    pub fn of_kind(&self, kind: AnnotationKind) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(move |a| a.kind == kind)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationStats {
    pub active_text_count: usize,
    pub active_face_count: usize,
    /// Captions currently held, active or stale.
    pub active_caption_count: usize,
    pub stale_count: usize,
}
