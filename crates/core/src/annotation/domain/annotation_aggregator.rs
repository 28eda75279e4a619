use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use crate::caption::domain::caption::Caption;
use crate::caption::domain::caption_synthesizer::SynthesizedCaption;
use crate::shared::constants::{
    DEFAULT_MATCH_DISTANCE, DEFAULT_MAX_AGE_SECS, DEFAULT_MAX_FACES, DEFAULT_MAX_TEXTS,
    TRANSLATION_RETRY_BASE_CYCLES, TRANSLATION_RETRY_MAX_CYCLES,
};
use crate::shared::coordinate_mapper::{to_display_rect, Size};
use crate::shared::normalized_rect::NormalizedRect;
use crate::shared::observation::{FaceObservation, TextObservation};
use crate::translation::domain::translation_cache::normalize_key;

use super::annotation::{Annotation, AnnotationKind, AnnotationStats, EntityState};
use super::face_matcher::{match_faces, FaceContinuityPolicy, MatchCandidate};

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorConfig {
    pub max_age: Duration,
    pub max_faces: usize,
    pub max_texts: usize,
    pub continuity: FaceContinuityPolicy,
    pub max_match_distance: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(DEFAULT_MAX_AGE_SECS),
            max_faces: DEFAULT_MAX_FACES,
            max_texts: DEFAULT_MAX_TEXTS,
            continuity: FaceContinuityPolicy::default(),
            max_match_distance: DEFAULT_MATCH_DISTANCE,
        }
    }
}

/// Stable identity of an aggregated entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Face(u64),
    /// Normalized text content; OCR regions have no upstream identity.
    Text(String),
}

/// Text that needs translating, tagged with the generation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub key: EntityKey,
    pub generation: u64,
    pub text: String,
}

/// One face observation plus its freshly synthesized caption.
#[derive(Debug, Clone)]
pub struct FaceCaptionInput {
    pub observation: FaceObservation,
    pub caption: SynthesizedCaption,
}

/// Cycles left before a failed translation is requested again.
#[derive(Debug, Default)]
struct RetryBackoff {
    failures: u32,
    wait_cycles: u32,
}

impl RetryBackoff {
    fn fail(&mut self) {
        self.failures = self.failures.saturating_add(1);
        let shift = (self.failures - 1).min(16);
        self.wait_cycles = TRANSLATION_RETRY_BASE_CYCLES
            .saturating_mul(1 << shift)
            .min(TRANSLATION_RETRY_MAX_CYCLES);
    }

    /// Counts one cycle down; `true` once a request may go out.
    fn tick(&mut self) -> bool {
        if self.wait_cycles == 0 {
            return true;
        }
        self.wait_cycles -= 1;
        false
    }
}

#[derive(Debug)]
struct FaceEntry {
    caption: Caption,
    tracking_id: Option<u64>,
    generation: u64,
    state: EntityState,
    pending: bool,
    retry: RetryBackoff,
}

#[derive(Debug)]
struct TextEntry {
    original_text: String,
    bounds: NormalizedRect,
    confidence: f32,
    translated_text: Option<String>,
    created_at: Instant,
    generation: u64,
    state: EntityState,
    pending: bool,
    retry: RetryBackoff,
}

/// Merges per-frame text and face results into an aged, capped set.
///
/// Every `aggregate` call first evicts entries at or past `max_age`, even
/// for empty frames, so idle periods still age captions out. Translation
/// results carry a generation; a result for a superseded generation is
/// discarded, so the newest observation wins regardless of completion order.
pub struct AnnotationAggregator {
    config: AggregatorConfig,
    faces: BTreeMap<u64, FaceEntry>,
    texts: BTreeMap<String, TextEntry>,
    next_face_key: u64,
    next_generation: u64,
}

impl AnnotationAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            config,
            faces: BTreeMap::new(),
            texts: BTreeMap::new(),
            next_face_key: 1,
            next_generation: 1,
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Runs one aggregation cycle and returns the translations still needed.
    pub fn aggregate(
        &mut self,
        texts: &[TextObservation],
        faces: Vec<FaceCaptionInput>,
        now: Instant,
    ) -> Vec<TranslationRequest> {
        self.evict_expired(now);
        self.mark_all_stale();
        self.merge_faces(faces, now);
        self.merge_texts(texts, now);
        self.enforce_caps();
        self.take_translation_requests()
    }

    /// Removes entries whose age has reached `max_age`. Returns how many.
    pub fn evict_expired(&mut self, now: Instant) -> usize {
        let max_age = self.config.max_age;
        let before = self.faces.len() + self.texts.len();
        self.faces.retain(|_, e| e.caption.age(now) < max_age);
        self.texts
            .retain(|_, e| now.saturating_duration_since(e.created_at) < max_age);
        let evicted = before - (self.faces.len() + self.texts.len());
        if evicted > 0 {
            log::debug!("evicted {evicted} expired annotations");
        }
        evicted
    }

    /// Applies a finished translation. Returns `false` when the entity is
    /// gone or has moved on to a newer generation.
    pub fn apply_translation(&mut self, key: &EntityKey, generation: u64, translated: String) -> bool {
        match key {
            EntityKey::Face(id) => match self.faces.get_mut(id) {
                Some(entry) if entry.generation == generation => {
                    entry.caption = entry.caption.with_translation(translated);
                    entry.pending = false;
                    entry.retry = RetryBackoff::default();
                    true
                }
                _ => {
                    log::trace!("discarding superseded translation for face {id}");
                    false
                }
            },
            EntityKey::Text(text) => match self.texts.get_mut(text) {
                Some(entry) if entry.generation == generation => {
                    entry.translated_text = Some(translated);
                    entry.pending = false;
                    entry.retry = RetryBackoff::default();
                    true
                }
                _ => {
                    log::trace!("discarding superseded translation for {text:?}");
                    false
                }
            },
        }
    }

    /// Releases a request that was never run (e.g. dropped under load) so
    /// the next cycle asks again.
    pub fn abandon_translation(&mut self, key: &EntityKey, generation: u64) {
        if let Some((pending, _)) = self.request_slot(key, generation) {
            *pending = false;
        }
    }

    /// Records that no backend could translate the entity. It keeps showing
    /// its original text and asks again after a backoff that grows with each
    /// consecutive failure. Returns `false` for a superseded generation.
    pub fn defer_translation(&mut self, key: &EntityKey, generation: u64) -> bool {
        match self.request_slot(key, generation) {
            Some((pending, retry)) => {
                *pending = false;
                retry.fail();
                log::debug!(
                    "translation for {key:?} failed; retrying in {} cycles",
                    retry.wait_cycles
                );
                true
            }
            None => false,
        }
    }

    fn request_slot(
        &mut self,
        key: &EntityKey,
        generation: u64,
    ) -> Option<(&mut bool, &mut RetryBackoff)> {
        match key {
            EntityKey::Face(id) => self
                .faces
                .get_mut(id)
                .filter(|e| e.generation == generation)
                .map(|e| (&mut e.pending, &mut e.retry)),
            EntityKey::Text(text) => self
                .texts
                .get_mut(text)
                .filter(|e| e.generation == generation)
                .map(|e| (&mut e.pending, &mut e.retry)),
        }
    }

    /// Drops every translation (e.g. after a language change). In-flight
    /// results are invalidated by bumping each entity's generation.
    pub fn clear_translations(&mut self) {
        let mut next = self.next_generation;
        for entry in self.faces.values_mut() {
            entry.caption = Caption {
                translated_text: None,
                ..entry.caption.clone()
            };
            entry.generation = next;
            entry.pending = false;
            entry.retry = RetryBackoff::default();
            next += 1;
        }
        for entry in self.texts.values_mut() {
            entry.translated_text = None;
            entry.generation = next;
            entry.pending = false;
            entry.retry = RetryBackoff::default();
            next += 1;
        }
        self.next_generation = next;
    }

    /// Current set in display space: faces first, then text regions.
    pub fn annotations(&self, viewport: Size) -> Vec<Annotation> {
        let faces = self.faces.values().map(|e| Annotation {
            display_rect: to_display_rect(&e.caption.bounding_box, viewport),
            translated_text: e.caption.display_text().to_string(),
            original_text: e.caption.original_text.clone(),
            kind: AnnotationKind::Face,
            confidence: e.caption.confidence,
            is_personalized: e.caption.is_personalized,
            state: e.state,
        });
        let texts = self.texts.values().map(|e| Annotation {
            display_rect: to_display_rect(&e.bounds, viewport),
            translated_text: e
                .translated_text
                .clone()
                .unwrap_or_else(|| e.original_text.clone()),
            original_text: e.original_text.clone(),
            kind: AnnotationKind::Text,
            confidence: e.confidence,
            is_personalized: false,
            state: e.state,
        });
        faces.chain(texts).collect()
    }

    pub fn stats(&self) -> AnnotationStats {
        let active_faces = self
            .faces
            .values()
            .filter(|e| e.state == EntityState::Active)
            .count();
        let active_texts = self
            .texts
            .values()
            .filter(|e| e.state == EntityState::Active)
            .count();
        AnnotationStats {
            active_text_count: active_texts,
            active_face_count: active_faces,
            active_caption_count: self.faces.len(),
            stale_count: (self.faces.len() - active_faces) + (self.texts.len() - active_texts),
        }
    }

    pub fn captions(&self) -> impl Iterator<Item = &Caption> {
        self.faces.values().map(|e| &e.caption)
    }

    pub fn len(&self) -> usize {
        self.faces.len() + self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty() && self.texts.is_empty()
    }

    fn mark_all_stale(&mut self) {
        for e in self.faces.values_mut() {
            e.state = EntityState::Stale;
        }
        for e in self.texts.values_mut() {
            e.state = EntityState::Stale;
        }
    }

    fn merge_faces(&mut self, faces: Vec<FaceCaptionInput>, now: Instant) {
        if faces.is_empty() {
            return;
        }
        let candidates: Vec<MatchCandidate> = self
            .faces
            .iter()
            .map(|(key, e)| MatchCandidate {
                key: *key,
                tracking_id: e.tracking_id,
                bounds: e.caption.bounding_box,
            })
            .collect();
        let observations: Vec<FaceObservation> =
            faces.iter().map(|f| f.observation.clone()).collect();
        let matches = match_faces(
            &candidates,
            &observations,
            self.config.continuity,
            self.config.max_match_distance,
        );

        for (input, matched) in faces.into_iter().zip(matches) {
            match matched {
                Some(key) => self.continue_face(key, input, now),
                None => self.insert_face(input, now),
            }
        }
    }

    fn continue_face(&mut self, key: u64, input: FaceCaptionInput, now: Instant) {
        let generation = self.next_generation;
        let Some(entry) = self.faces.get_mut(&key) else {
            self.insert_face(input, now);
            return;
        };
        let bounds = input.observation.bounds.clamped();
        let same_caption = entry.caption.bucket == input.caption.bucket
            && entry.caption.person_id == input.caption.person_id;

        entry.caption = if same_caption {
            entry
                .caption
                .refreshed(bounds, input.observation.confidence, now)
        } else {
            entry.generation = generation;
            entry.pending = false;
            entry.retry = RetryBackoff::default();
            self.next_generation += 1;
            new_caption(key, bounds, &input, now)
        };
        entry.tracking_id = input.observation.tracking_id.or(entry.tracking_id);
        entry.state = EntityState::Active;
    }

    fn insert_face(&mut self, input: FaceCaptionInput, now: Instant) {
        let key = self.next_face_key;
        self.next_face_key += 1;
        let generation = self.bump_generation();
        let bounds = input.observation.bounds.clamped();
        self.faces.insert(
            key,
            FaceEntry {
                caption: new_caption(key, bounds, &input, now),
                tracking_id: input.observation.tracking_id,
                generation,
                state: EntityState::Active,
                pending: false,
                retry: RetryBackoff::default(),
            },
        );
    }

    fn merge_texts(&mut self, texts: &[TextObservation], now: Instant) {
        // Duplicate strings within a frame: the largest region wins.
        let mut frame: HashMap<String, &TextObservation> = HashMap::new();
        for obs in texts {
            let key = normalize_key(&obs.text);
            if key.is_empty() {
                continue;
            }
            let replace = frame
                .get(&key)
                .map_or(true, |kept| obs.bounds.clamped().area() > kept.bounds.clamped().area());
            if replace {
                frame.insert(key, obs);
            }
        }

        for (key, obs) in frame {
            let bounds = obs.bounds.clamped();
            if let Some(entry) = self.texts.get_mut(&key) {
                entry.original_text = obs.text.trim().to_string();
                entry.bounds = bounds;
                entry.confidence = obs.confidence;
                entry.created_at = now;
                entry.state = EntityState::Active;
                continue;
            }
            let generation = self.bump_generation();
            self.texts.insert(
                key,
                TextEntry {
                    original_text: obs.text.trim().to_string(),
                    bounds,
                    confidence: obs.confidence,
                    translated_text: None,
                    created_at: now,
                    generation,
                    state: EntityState::Active,
                    pending: false,
                    retry: RetryBackoff::default(),
                },
            );
        }
    }

    /// Drops the oldest entries beyond the configured caps.
    fn enforce_caps(&mut self) {
        if self.faces.len() > self.config.max_faces {
            let mut by_age: Vec<(Instant, u64)> = self
                .faces
                .iter()
                .map(|(k, e)| (e.caption.created_at, *k))
                .collect();
            by_age.sort();
            let excess = self.faces.len() - self.config.max_faces;
            for (_, key) in by_age.into_iter().take(excess) {
                self.faces.remove(&key);
            }
        }
        if self.texts.len() > self.config.max_texts {
            let mut by_age: Vec<(Instant, String)> = self
                .texts
                .iter()
                .map(|(k, e)| (e.created_at, k.clone()))
                .collect();
            by_age.sort();
            let excess = self.texts.len() - self.config.max_texts;
            for (_, key) in by_age.into_iter().take(excess) {
                self.texts.remove(&key);
            }
        }
    }

    /// Requests for active, untranslated entries not already in flight or
    /// backing off after a failure.
    fn take_translation_requests(&mut self) -> Vec<TranslationRequest> {
        let mut requests = Vec::new();
        for (key, e) in self.faces.iter_mut() {
            if e.state == EntityState::Active
                && e.caption.translated_text.is_none()
                && !e.pending
                && e.retry.tick()
            {
                e.pending = true;
                requests.push(TranslationRequest {
                    key: EntityKey::Face(*key),
                    generation: e.generation,
                    text: e.caption.original_text.clone(),
                });
            }
        }
        for (key, e) in self.texts.iter_mut() {
            if e.state == EntityState::Active
                && e.translated_text.is_none()
                && !e.pending
                && e.retry.tick()
            {
                e.pending = true;
                requests.push(TranslationRequest {
                    key: EntityKey::Text(key.clone()),
                    generation: e.generation,
                    text: e.original_text.clone(),
                });
            }
        }
        requests
    }

    fn bump_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }
}

fn new_caption(key: u64, bounds: NormalizedRect, input: &FaceCaptionInput, now: Instant) -> Caption {
    Caption {
        face_ref: key,
        bounding_box: bounds,
        original_text: input.caption.text.clone(),
        translated_text: None,
        confidence: input.observation.confidence,
        created_at: now,
        is_personalized: input.caption.is_personalized(),
        bucket: input.caption.bucket,
        person_id: input.caption.person_id.clone(),
    }
}
