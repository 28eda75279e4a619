use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::identity::domain::known_persons::{KnownPersonsDirectory, PersonId};
use crate::shared::observation::FaceObservation;

use super::caption_templates::{CaptionBucket, TemplateSet, COUNT_PLACEHOLDER, NAME_PLACEHOLDER};

/// An untranslated caption plus the bucket it was drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedCaption {
    pub text: String,
    pub bucket: CaptionBucket,
    pub person_id: Option<PersonId>,
}

impl SynthesizedCaption {
    pub fn is_personalized(&self) -> bool {
        self.bucket == CaptionBucket::KnownPerson
    }
}

/// Turns a face observation into a caption string.
///
/// Resolution order, first match wins:
/// 1. identified person with a known name → known-person template
/// 2. expression present → happy / surprised / neutral template
/// 3. otherwise → unknown-person template
///
/// The template within a bucket is picked at random from an injected,
/// seedable RNG, so callers may only rely on bucket membership.
pub struct CaptionSynthesizer {
    templates: TemplateSet,
    rng: StdRng,
}

impl CaptionSynthesizer {
    pub fn new(templates: TemplateSet, rng: StdRng) -> Self {
        Self { templates, rng }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(TemplateSet::default(), StdRng::seed_from_u64(seed))
    }

    pub fn from_os_rng() -> Self {
        Self::new(TemplateSet::default(), StdRng::from_os_rng())
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Picks the bucket for a face, plus the person's name when known.
    pub fn classify<'a>(
        face: &FaceObservation,
        person_id: Option<&str>,
        directory: &'a KnownPersonsDirectory,
    ) -> (CaptionBucket, Option<&'a str>) {
        if let Some(name) = person_id.and_then(|id| directory.name(id)) {
            return (CaptionBucket::KnownPerson, Some(name));
        }
        match face.expression.as_deref() {
            Some(expression) => (CaptionBucket::for_expression(expression), None),
            None => (CaptionBucket::Unknown, None),
        }
    }

    pub fn synthesize(
        &mut self,
        face: &FaceObservation,
        person_id: Option<&str>,
        directory: &KnownPersonsDirectory,
    ) -> String {
        self.synthesize_caption(face, person_id, directory).text
    }

    pub fn synthesize_caption(
        &mut self,
        face: &FaceObservation,
        person_id: Option<&str>,
        directory: &KnownPersonsDirectory,
    ) -> SynthesizedCaption {
        let (bucket, name) = Self::classify(face, person_id, directory);
        let (bucket, template) = self.pick(bucket);
        let text = match name {
            Some(name) if bucket == CaptionBucket::KnownPerson => {
                template.replace(NAME_PLACEHOLDER, name)
            }
            _ => template,
        };
        SynthesizedCaption {
            text,
            bucket,
            person_id: name.and(person_id.map(str::to_string)),
        }
    }

    /// Caption for a group of faces, e.g. "3 people in view".
    pub fn synthesize_group(&mut self, count: usize) -> String {
        let (_, template) = self.pick(CaptionBucket::Group);
        template.replace(COUNT_PLACEHOLDER, &count.to_string())
    }

    /// Random template from `bucket`; an empty bucket falls back to the
    /// unknown-person templates.
    fn pick(&mut self, bucket: CaptionBucket) -> (CaptionBucket, String) {
        if let Some(t) = self.templates.templates(bucket).choose(&mut self.rng) {
            return (bucket, t.clone());
        }
        let fallback = self
            .templates
            .templates(CaptionBucket::Unknown)
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default();
        (CaptionBucket::Unknown, fallback)
    }
}
