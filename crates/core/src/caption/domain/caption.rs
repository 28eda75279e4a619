use std::time::{Duration, Instant};

use crate::identity::domain::known_persons::PersonId;
use crate::shared::normalized_rect::NormalizedRect;

use super::caption_templates::CaptionBucket;

/// A caption for one tracked face.
///
/// Owned by the annotation aggregator. Never mutated in place: a newer
/// observation or a finished translation produces a replacement value.
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub face_ref: u64,
    pub bounding_box: NormalizedRect,
    pub original_text: String,
    pub translated_text: Option<String>,
    pub confidence: f32,
    pub created_at: Instant,
    pub is_personalized: bool,
    pub bucket: CaptionBucket,
    pub person_id: Option<PersonId>,
}

impl Caption {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    /// Translated text when available, otherwise the original caption.
    pub fn display_text(&self) -> &str {
        self.translated_text.as_deref().unwrap_or(&self.original_text)
    }

    pub fn with_translation(&self, translated: String) -> Caption {
        Caption {
            translated_text: Some(translated),
            ..self.clone()
        }
    }

    /// Same caption text, refreshed geometry and timestamp.
    pub fn refreshed(&self, bounding_box: NormalizedRect, confidence: f32, now: Instant) -> Caption {
        Caption {
            bounding_box,
            confidence,
            created_at: now,
            ..self.clone()
        }
    }
}
