use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use serde::Serialize;

use crate::annotation::domain::annotation::AnnotationSnapshot;
use crate::annotation::domain::annotation_aggregator::{
    AggregatorConfig, AnnotationAggregator, FaceCaptionInput, TranslationRequest,
};
use crate::caption::domain::caption_synthesizer::CaptionSynthesizer;
use crate::identity::domain::identity_resolver::IdentityResolver;
use crate::identity::domain::known_persons::{KnownPersonsDirectory, PersonId};
use crate::identity::infrastructure::spatial_identity_resolver::SpatialIdentityResolver;
use crate::pipeline::infrastructure::translation_worker_pool::TranslationWorkerPool;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::constants::{
    DEFAULT_JOB_QUEUE_CAPACITY, DEFAULT_TRANSLATION_WORKERS, DEFAULT_VIEWPORT_HEIGHT,
    DEFAULT_VIEWPORT_WIDTH, SUBSCRIBER_CHANNEL_CAPACITY,
};
use crate::shared::coordinate_mapper::Size;
use crate::shared::observation::FrameObservations;
use crate::shared::settings::{Settings, SettingsError};
use crate::translation::domain::language_pair::LanguagePair;
use crate::translation::domain::translation_backend::TranslationBackend;
use crate::translation::infrastructure::dictionary_backend::DictionaryBackend;
use crate::translation::infrastructure::http_translation_backend::HttpTranslationBackend;
use crate::translation::translation_resolver::{ResolverStats, TranslationResolver};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub viewport: Size,
    pub aggregator: AggregatorConfig,
    pub translation_workers: usize,
    pub job_queue_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            viewport: Size::new(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT),
            aggregator: AggregatorConfig::default(),
            translation_workers: DEFAULT_TRANSLATION_WORKERS,
            job_queue_capacity: DEFAULT_JOB_QUEUE_CAPACITY,
        }
    }
}

impl PipelineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            viewport: Size::new(settings.viewport_width, settings.viewport_height),
            aggregator: AggregatorConfig {
                max_age: Duration::from_secs(settings.max_age_secs),
                max_faces: settings.max_faces,
                max_texts: settings.max_texts,
                continuity: settings.continuity,
                max_match_distance: settings.match_distance,
            },
            translation_workers: settings.translation_workers,
            job_queue_capacity: settings.job_queue_capacity,
        }
    }
}

/// Counts reported to the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub active_text_count: usize,
    pub active_face_count: usize,
    pub active_caption_count: usize,
    pub cache_size: usize,
    pub dropped_jobs: u64,
    pub skipped_frames: u64,
}

/// Per-frame orchestration: identify → caption → aggregate → dispatch → publish.
///
/// `process_frame` runs synchronously on the caller's thread and only does
/// cheap work; anything that may block on backend I/O goes to the worker
/// pool, and its result lands in the aggregator for the next snapshot.
/// Readers take the last published snapshot without waiting on a frame.
pub struct AnnotationPipeline {
    identity: Box<dyn IdentityResolver>,
    directory: RwLock<KnownPersonsDirectory>,
    synthesizer: Mutex<CaptionSynthesizer>,
    resolver: Arc<TranslationResolver>,
    aggregator: Arc<Mutex<AnnotationAggregator>>,
    workers: TranslationWorkerPool,
    viewport: Mutex<Size>,
    snapshot: RwLock<Arc<AnnotationSnapshot>>,
    subscribers: Mutex<Vec<Sender<Arc<AnnotationSnapshot>>>>,
    // Held for the whole synchronous pass, so frames never interleave.
    frame_state: Mutex<FrameState>,
    logger: Mutex<Box<dyn PipelineLogger>>,
}

#[derive(Default)]
struct FrameState {
    last_sequence: Option<u64>,
    skipped: u64,
}

impl AnnotationPipeline {
    pub fn new(
        config: PipelineConfig,
        resolver: TranslationResolver,
        identity: Box<dyn IdentityResolver>,
        synthesizer: CaptionSynthesizer,
    ) -> Self {
        let resolver = Arc::new(resolver);
        let aggregator = Arc::new(Mutex::new(AnnotationAggregator::new(config.aggregator)));
        let workers = spawn_workers(
            config.translation_workers,
            config.job_queue_capacity,
            resolver.clone(),
            aggregator.clone(),
        );

        Self {
            identity,
            directory: RwLock::new(KnownPersonsDirectory::new()),
            synthesizer: Mutex::new(synthesizer),
            resolver,
            aggregator,
            workers,
            viewport: Mutex::new(config.viewport),
            snapshot: RwLock::new(Arc::new(AnnotationSnapshot::default())),
            subscribers: Mutex::new(Vec::new()),
            frame_state: Mutex::new(FrameState::default()),
            logger: Mutex::new(Box::new(NullPipelineLogger)),
        }
    }

    /// Builds the default cascade from settings: `on_device` backends first,
    /// then HTTP (when `api_url` is set), then the dictionary (when
    /// `dictionary_path` is set).
    pub fn from_settings(
        settings: &Settings,
        api_key: Option<String>,
        on_device: Vec<Box<dyn TranslationBackend>>,
    ) -> Result<Self, SettingsError> {
        let pair = LanguagePair::new(&settings.source_language, &settings.target_language);
        let mut resolver = TranslationResolver::new(pair, settings.cache_capacity);
        for backend in on_device {
            resolver = resolver.with_backend(backend);
        }
        if let Some(url) = &settings.api_url {
            resolver = resolver.with_backend(Box::new(HttpTranslationBackend::new(url, api_key)));
        }
        if let Some(path) = &settings.dictionary_path {
            let dictionary = DictionaryBackend::load(path)?;
            log::info!("loaded {} dictionary entries from {}", dictionary.len(), path.display());
            resolver = resolver.with_backend(Box::new(dictionary));
        }

        let synthesizer = match settings.seed {
            Some(seed) => CaptionSynthesizer::seeded(seed),
            None => CaptionSynthesizer::from_os_rng(),
        };
        let directory: KnownPersonsDirectory = settings
            .known_persons
            .iter()
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect();

        Ok(Self::new(
            PipelineConfig::from_settings(settings),
            resolver,
            Box::new(SpatialIdentityResolver::new(settings.center_confidence)),
            synthesizer,
        )
        .with_directory(directory))
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = Mutex::new(logger);
        self
    }

    pub fn with_directory(mut self, directory: KnownPersonsDirectory) -> Self {
        self.directory = RwLock::new(directory);
        self
    }

    pub fn process_frame(&self, frame: &FrameObservations) -> bool {
        self.process_frame_at(frame, Instant::now())
    }

    /// Runs one frame at logical time `now`. Returns `false` when the frame
    /// is older than one already processed and was skipped.
    pub fn process_frame_at(&self, frame: &FrameObservations, now: Instant) -> bool {
        let mut frame_state = lock(&self.frame_state);
        if frame_state
            .last_sequence
            .is_some_and(|last| frame.sequence <= last)
        {
            frame_state.skipped += 1;
            log::debug!("skipping out-of-order frame {}", frame.sequence);
            return false;
        }
        frame_state.last_sequence = Some(frame.sequence);

        let mut timings = Vec::with_capacity(4);

        let start = Instant::now();
        let directory = read(&self.directory);
        let person_ids: Vec<Option<PersonId>> = frame
            .faces
            .iter()
            .map(|face| self.identity.identify(face, &directory))
            .collect();
        timings.push(("identify", elapsed_ms(start)));

        let start = Instant::now();
        let faces: Vec<FaceCaptionInput> = {
            let mut synthesizer = lock(&self.synthesizer);
            frame
                .faces
                .iter()
                .zip(person_ids)
                .map(|(face, person_id)| FaceCaptionInput {
                    caption: synthesizer.synthesize_caption(face, person_id.as_deref(), &directory),
                    observation: face.clone(),
                })
                .collect()
        };
        drop(directory);
        timings.push(("caption", elapsed_ms(start)));

        let start = Instant::now();
        let requests = lock(&self.aggregator).aggregate(&frame.texts, faces, now);
        timings.push(("aggregate", elapsed_ms(start)));

        let start = Instant::now();
        let request_count = requests.len();
        let (cached, rejected) = self.dispatch(requests);
        let viewport = *lock(&self.viewport);
        let annotations = {
            let mut aggregator = lock(&self.aggregator);
            for (request, translated) in cached {
                aggregator.apply_translation(&request.key, request.generation, translated);
            }
            for request in &rejected {
                aggregator.abandon_translation(&request.key, request.generation);
            }
            aggregator.annotations(viewport)
        };
        timings.push(("dispatch", elapsed_ms(start)));

        self.publish(AnnotationSnapshot {
            sequence: frame.sequence,
            annotations,
        });

        let mut logger = lock(&self.logger);
        for (stage, ms) in timings {
            logger.timing(stage, ms);
        }
        logger.metric("faces", frame.faces.len() as f64);
        logger.metric("texts", frame.texts.len() as f64);
        logger.metric("translation_requests", request_count as f64);
        logger.metric("dropped_jobs", rejected.len() as f64);
        logger.frame(frame.sequence);
        true
    }

    /// Serves cache hits inline and queues the rest. Returns the inline
    /// results and the jobs the queue had no room for.
    fn dispatch(
        &self,
        requests: Vec<TranslationRequest>,
    ) -> (Vec<(TranslationRequest, String)>, Vec<TranslationRequest>) {
        let mut cached = Vec::new();
        let mut rejected = Vec::new();
        for request in requests {
            if let Some(hit) = self.resolver.translate_cached(&request.text) {
                cached.push((request, hit));
                continue;
            }
            if let Err(request) = self.workers.submit(request) {
                rejected.push(request);
            }
        }
        (cached, rejected)
    }

    /// Waits for queued translations, then republishes the current state
    /// under the last sequence.
    pub fn flush(&self) {
        self.workers.wait_idle();
        let _frame_state = lock(&self.frame_state);
        let viewport = *lock(&self.viewport);
        let annotations = lock(&self.aggregator).annotations(viewport);
        let sequence = self.snapshot().sequence;
        self.publish(AnnotationSnapshot {
            sequence,
            annotations,
        });
    }

    pub fn snapshot(&self) -> Arc<AnnotationSnapshot> {
        read(&self.snapshot).clone()
    }

    /// Receives every snapshot published after this call. A subscriber that
    /// falls behind misses updates rather than stalling the frame thread.
    pub fn subscribe(&self) -> Receiver<Arc<AnnotationSnapshot>> {
        let (tx, rx) = crossbeam_channel::bounded(SUBSCRIBER_CHANNEL_CAPACITY);
        lock(&self.subscribers).push(tx);
        rx
    }

    pub fn stats(&self) -> Stats {
        let annotation_stats = lock(&self.aggregator).stats();
        Stats {
            active_text_count: annotation_stats.active_text_count,
            active_face_count: annotation_stats.active_face_count,
            active_caption_count: annotation_stats.active_caption_count,
            cache_size: self.resolver.cache_len(),
            dropped_jobs: self.workers.dropped_jobs(),
            skipped_frames: lock(&self.frame_state).skipped,
        }
    }

    pub fn resolver_stats(&self) -> ResolverStats {
        self.resolver.stats()
    }

    pub fn language_pair(&self) -> LanguagePair {
        self.resolver.language_pair()
    }

    /// Switches languages. Clears the translation cache and every held
    /// translation; in-flight results for the old pair are discarded.
    pub fn set_languages(&self, source: &str, target: &str) {
        self.resolver.set_languages(source, target);
        lock(&self.aggregator).clear_translations();
        lock(&self.logger).info(&format!(
            "languages set to {}",
            self.resolver.language_pair()
        ));
    }

    pub fn set_viewport(&self, viewport: Size) {
        *lock(&self.viewport) = viewport;
    }

    /// Adds or renames a known person. Takes effect from the next frame.
    pub fn add_person(&self, id: impl Into<PersonId>, name: impl Into<String>) {
        let id = id.into();
        write(&self.directory).add(id.clone(), name);
        log::info!("known person {id} updated");
    }

    pub fn remove_person(&self, id: &str) -> bool {
        let removed = write(&self.directory).remove(id).is_some();
        if removed {
            log::info!("known person {id} removed");
        }
        removed
    }

    pub fn known_persons(&self) -> KnownPersonsDirectory {
        read(&self.directory).clone()
    }

    pub fn log_summary(&self) {
        lock(&self.logger).summary();
    }

    fn publish(&self, snapshot: AnnotationSnapshot) {
        let snapshot = Arc::new(snapshot);
        *write(&self.snapshot) = snapshot.clone();
        lock(&self.subscribers).retain(|tx| match tx.try_send(snapshot.clone()) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => false,
        });
    }
}

fn spawn_workers(
    workers: usize,
    queue_capacity: usize,
    resolver: Arc<TranslationResolver>,
    aggregator: Arc<Mutex<AnnotationAggregator>>,
) -> TranslationWorkerPool {
    TranslationWorkerPool::new(workers, queue_capacity, move |request: TranslationRequest| {
        match panic::catch_unwind(AssertUnwindSafe(|| resolver.resolve(&request.text))) {
            Ok(Some(translated)) => {
                lock(&aggregator).apply_translation(&request.key, request.generation, translated);
            }
            Ok(None) => {
                lock(&aggregator).defer_translation(&request.key, request.generation);
            }
            Err(payload) => {
                lock(&aggregator).abandon_translation(&request.key, request.generation);
                panic::resume_unwind(payload);
            }
        }
    })
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::domain::annotation::{AnnotationKind, EntityState};
    use crate::annotation::domain::face_matcher::FaceContinuityPolicy;
    use crate::shared::normalized_rect::NormalizedRect;
    use crate::shared::observation::{FaceObservation, TextObservation};
    use crate::translation::infrastructure::callback_backend::CallbackBackend;
    use crate::translation::domain::translation_error::TranslationError;
    use approx::assert_relative_eq;
    use std::io::Write as _;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tagging_resolver() -> TranslationResolver {
        TranslationResolver::new(LanguagePair::new("en", "zh"), 64).with_backend(Box::new(
            CallbackBackend::new("tagger", |text, pair| Ok(format!("{text}:{}", pair.target))),
        ))
    }

    fn pipeline(resolver: TranslationResolver) -> AnnotationPipeline {
        AnnotationPipeline::new(
            PipelineConfig {
                viewport: Size::new(200.0, 100.0),
                ..PipelineConfig::default()
            },
            resolver,
            Box::new(SpatialIdentityResolver::default()),
            CaptionSynthesizer::seeded(7),
        )
    }

    fn text_frame(sequence: u64, text: &str) -> FrameObservations {
        FrameObservations {
            sequence,
            texts: vec![TextObservation {
                id: 1,
                text: text.to_string(),
                bounds: NormalizedRect::new(0.1, 0.7, 0.2, 0.1),
                confidence: 0.9,
            }],
            faces: Vec::new(),
        }
    }

    fn face_frame(sequence: u64, x: f64) -> FrameObservations {
        FrameObservations {
            sequence,
            texts: Vec::new(),
            faces: vec![FaceObservation {
                id: 1,
                bounds: NormalizedRect::new(x, 0.4, 0.1, 0.1),
                confidence: 0.9,
                landmarks: None,
                expression: Some("big smile".to_string()),
                tracking_id: None,
            }],
        }
    }

    #[test]
    fn test_text_translated_after_flush() {
        let p = pipeline(tagging_resolver());
        assert!(p.process_frame(&text_frame(1, "Exit")));
        p.flush();

        let snapshot = p.snapshot();
        assert_eq!(snapshot.sequence, 1);
        let a = &snapshot.annotations[0];
        assert_eq!(a.kind, AnnotationKind::Text);
        assert_eq!(a.original_text, "Exit");
        assert_eq!(a.translated_text, "Exit:zh");
        assert_eq!(a.state, EntityState::Active);
    }

    #[test]
    fn test_display_rect_is_flipped_into_viewport() {
        let p = pipeline(tagging_resolver());
        p.process_frame(&text_frame(1, "Exit"));
        let rect = p.snapshot().annotations[0].display_rect;
        assert_relative_eq!(rect.x, 20.0, epsilon = 1e-9);
        assert_relative_eq!(rect.y, 20.0, epsilon = 1e-9);
        assert_relative_eq!(rect.width, 40.0, epsilon = 1e-9);
        assert_relative_eq!(rect.height, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cached_translation_lands_in_same_frame() {
        let p = pipeline(tagging_resolver());
        let t = Instant::now();
        p.process_frame_at(&text_frame(1, "Exit"), t);
        p.flush();

        // Age the entity out, then see the same text again: served from cache.
        p.process_frame_at(&text_frame(2, "exit"), t + Duration::from_secs(31));
        let snapshot = p.snapshot();
        assert_eq!(snapshot.annotations.len(), 1);
        assert_eq!(snapshot.annotations[0].translated_text, "Exit:zh");
        assert_eq!(p.resolver_stats().cache_hits, 1);
    }

    #[test]
    fn test_out_of_order_frame_skipped() {
        let p = pipeline(tagging_resolver());
        assert!(p.process_frame(&text_frame(5, "A")));
        assert!(!p.process_frame(&text_frame(4, "B")));
        assert!(!p.process_frame(&text_frame(5, "C")));
        assert_eq!(p.snapshot().sequence, 5);
        assert_eq!(p.stats().skipped_frames, 2);
    }

    #[test]
    fn test_known_person_gets_personalized_caption() {
        let p = pipeline(tagging_resolver());
        p.add_person("person_a", "Alice");
        p.process_frame(&face_frame(1, 0.05));

        let snapshot = p.snapshot();
        let face = snapshot.of_kind(AnnotationKind::Face).next().unwrap();
        assert!(face.is_personalized);
        assert!(face.original_text.contains("Alice"));
    }

    #[test]
    fn test_removed_person_falls_back_to_expression() {
        let p = pipeline(tagging_resolver());
        p.add_person("person_a", "Alice");
        assert!(p.remove_person("person_a"));
        assert!(!p.remove_person("person_a"));
        p.process_frame(&face_frame(1, 0.05));

        let snapshot = p.snapshot();
        let face = snapshot.of_kind(AnnotationKind::Face).next().unwrap();
        assert!(!face.is_personalized);
    }

    #[test]
    fn test_language_switch_retranslates() {
        let p = pipeline(tagging_resolver());
        p.process_frame(&text_frame(1, "Exit"));
        p.flush();
        assert_eq!(p.stats().cache_size, 1);

        p.set_languages("en", "ja");
        assert_eq!(p.stats().cache_size, 0);
        assert_eq!(p.language_pair(), LanguagePair::new("en", "ja"));

        p.process_frame(&text_frame(2, "Exit"));
        p.flush();
        assert_eq!(p.snapshot().annotations[0].translated_text, "Exit:ja");
    }

    #[test]
    fn test_subscriber_receives_each_publish() {
        let p = pipeline(tagging_resolver());
        let rx = p.subscribe();
        let gone = p.subscribe();
        drop(gone);

        p.process_frame(&text_frame(1, "A"));
        p.process_frame(&text_frame(2, "B"));
        let seqs: Vec<u64> = rx.try_iter().map(|s| s.sequence).collect();
        assert_eq!(seqs, vec![1, 2]);
        assert_eq!(lock(&p.subscribers).len(), 1);
    }

    #[test]
    fn test_idle_frames_still_evict() {
        let p = pipeline(tagging_resolver());
        let t = Instant::now();
        p.process_frame_at(&text_frame(1, "Exit"), t);
        let idle = |sequence| FrameObservations {
            sequence,
            ..FrameObservations::default()
        };
        p.process_frame_at(&idle(2), t + Duration::from_secs(29));
        assert_eq!(p.snapshot().annotations.len(), 1);
        p.process_frame_at(&idle(3), t + Duration::from_secs(31));
        assert!(p.snapshot().annotations.is_empty());
    }

    #[test]
    fn test_stats_counts_active_entities() {
        let p = pipeline(tagging_resolver());
        let mut frame = face_frame(1, 0.5);
        frame.texts = text_frame(1, "Exit").texts;
        p.process_frame(&frame);
        let stats = p.stats();
        assert_eq!(stats.active_face_count, 1);
        assert_eq!(stats.active_text_count, 1);
        assert_eq!(stats.active_caption_count, 1);
    }

    #[test]
    fn test_unresolved_text_shows_original() {
        let resolver = TranslationResolver::new(LanguagePair::new("en", "zh"), 16);
        let p = pipeline(resolver);
        p.process_frame(&text_frame(1, "xyz123"));
        p.flush();
        assert_eq!(p.snapshot().annotations[0].translated_text, "xyz123");
        assert_eq!(p.stats().cache_size, 0);
    }

    #[test]
    fn test_text_in_view_retried_after_backend_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let flaky = {
            let calls = calls.clone();
            CallbackBackend::new("flaky", move |text, pair| {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(TranslationError::Request("timed out".to_string()))
                } else {
                    Ok(format!("{text}:{}", pair.target))
                }
            })
        };
        let resolver =
            TranslationResolver::new(LanguagePair::new("en", "zh"), 16).with_backend(Box::new(flaky));
        let p = pipeline(resolver);

        p.process_frame(&text_frame(1, "Exit"));
        p.flush();
        assert_eq!(p.snapshot().annotations[0].translated_text, "Exit");

        for sequence in 2..=20 {
            p.process_frame(&text_frame(sequence, "Exit"));
            p.flush();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(p.snapshot().annotations[0].translated_text, "Exit:zh");
        assert_eq!(p.stats().cache_size, 1);
    }

    #[test]
    fn test_panicking_backend_does_not_stall_entity() {
        let resolver = TranslationResolver::new(LanguagePair::new("en", "zh"), 16)
            .with_backend(Box::new(CallbackBackend::new("broken", |_, _| panic!("boom"))));
        let p = pipeline(resolver);
        p.process_frame(&text_frame(1, "Exit"));
        p.flush();
        // The request was abandoned, so the next sighting asks again.
        p.process_frame(&text_frame(2, "Exit"));
        p.flush();
        assert_eq!(p.snapshot().annotations[0].translated_text, "Exit");
    }

    #[test]
    fn test_from_settings_builds_dictionary_cascade() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"hello": "你好"}}"#).unwrap();

        let mut settings = Settings {
            dictionary_path: Some(file.path().to_path_buf()),
            seed: Some(1),
            continuity: FaceContinuityPolicy::TrackingOnly,
            ..Settings::default()
        };
        settings
            .known_persons
            .insert("person_b".to_string(), "Bob".to_string());

        let p = AnnotationPipeline::from_settings(&settings, None, Vec::new()).unwrap();
        assert!(p.known_persons().contains("person_b"));

        p.process_frame(&text_frame(1, "Hello"));
        p.flush();
        assert_eq!(p.snapshot().annotations[0].translated_text, "你好");
    }

    #[test]
    fn test_from_settings_reports_missing_dictionary() {
        let settings = Settings {
            dictionary_path: Some("/nonexistent/dictionary.json".into()),
            ..Settings::default()
        };
        let result = AnnotationPipeline::from_settings(&settings, None, Vec::new());
        assert!(matches!(result, Err(SettingsError::Read { .. })));
    }
}
