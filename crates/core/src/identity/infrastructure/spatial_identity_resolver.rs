use crate::identity::domain::identity_resolver::IdentityResolver;
use crate::identity::domain::known_persons::{KnownPersonsDirectory, PersonId};
use crate::shared::constants::DEFAULT_CENTER_CONFIDENCE;
use crate::shared::observation::FaceObservation;

pub const LEFT_PERSON_ID: &str = "person_a";
pub const RIGHT_PERSON_ID: &str = "person_b";
pub const CENTER_PERSON_ID: &str = "person_c";

/// Placeholder identity heuristic based on where the face sits in the frame.
///
/// Left third → `person_a`, right third → `person_b`, center third with
/// enough confidence → `person_c`. Not recognition; swap in a real matcher
/// behind [`IdentityResolver`].
pub struct SpatialIdentityResolver {
    center_confidence: f32,
}

impl SpatialIdentityResolver {
    pub fn new(center_confidence: f32) -> Self {
        Self { center_confidence }
    }
}

impl Default for SpatialIdentityResolver {
    fn default() -> Self {
        Self::new(DEFAULT_CENTER_CONFIDENCE)
    }
}

impl IdentityResolver for SpatialIdentityResolver {
    fn identify(
        &self,
        face: &FaceObservation,
        directory: &KnownPersonsDirectory,
    ) -> Option<PersonId> {
        let (cx, _) = face.center();
        let candidate = if cx < 1.0 / 3.0 {
            LEFT_PERSON_ID
        } else if cx > 2.0 / 3.0 {
            RIGHT_PERSON_ID
        } else if face.confidence >= self.center_confidence {
            CENTER_PERSON_ID
        } else {
            return None;
        };

        directory
            .contains(candidate)
            .then(|| candidate.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::normalized_rect::NormalizedRect;
    use rstest::rstest;

    fn face_at(center_x: f64, confidence: f32) -> FaceObservation {
        FaceObservation {
            id: 0,
            bounds: NormalizedRect::new(center_x - 0.05, 0.4, 0.1, 0.2),
            confidence,
            landmarks: None,
            expression: None,
            tracking_id: None,
        }
    }

    fn full_directory() -> KnownPersonsDirectory {
        let mut dir = KnownPersonsDirectory::new();
        dir.add(LEFT_PERSON_ID, "Alice");
        dir.add(RIGHT_PERSON_ID, "Bob");
        dir.add(CENTER_PERSON_ID, "Carol");
        dir
    }

    #[rstest]
    #[case::left(0.15, 0.5, Some(LEFT_PERSON_ID))]
    #[case::right(0.85, 0.5, Some(RIGHT_PERSON_ID))]
    #[case::center_confident(0.5, 0.9, Some(CENTER_PERSON_ID))]
    #[case::center_at_threshold(0.5, 0.8, Some(CENTER_PERSON_ID))]
    #[case::center_unsure(0.5, 0.5, None)]
    fn test_identify_by_position(
        #[case] center_x: f64,
        #[case] confidence: f32,
        #[case] expected: Option<&str>,
    ) {
        let resolver = SpatialIdentityResolver::default();
        let result = resolver.identify(&face_at(center_x, confidence), &full_directory());
        assert_eq!(result.as_deref(), expected);
    }

    #[test]
    fn test_unknown_to_directory_is_none() {
        let resolver = SpatialIdentityResolver::default();
        let result = resolver.identify(&face_at(0.1, 0.99), &KnownPersonsDirectory::new());
        assert!(result.is_none());
    }

    #[test]
    fn test_deterministic() {
        let resolver = SpatialIdentityResolver::default();
        let dir = full_directory();
        let face = face_at(0.2, 0.7);
        let first = resolver.identify(&face, &dir);
        for _ in 0..10 {
            assert_eq!(resolver.identify(&face, &dir), first);
        }
    }

    #[test]
    fn test_custom_center_threshold() {
        let resolver = SpatialIdentityResolver::new(0.3);
        let result = resolver.identify(&face_at(0.5, 0.4), &full_directory());
        assert_eq!(result.as_deref(), Some(CENTER_PERSON_ID));
    }
}
