use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::shared::constants::DEFAULT_CACHE_CAPACITY;

use super::domain::language_pair::LanguagePair;
use super::domain::translation_backend::TranslationBackend;
use super::domain::translation_cache::{normalize_key, TranslationCache};

/// Counters for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Callers that waited on another caller's in-flight request.
    pub coalesced: u64,
    /// Requests where no stage produced a translation.
    pub unresolved: u64,
    pub backend_successes: BTreeMap<String, u64>,
}

struct ResolverState {
    cache: TranslationCache,
    pair: LanguagePair,
    /// Bumped on every language change so in-flight results from the old
    /// pair never land in the new cache.
    epoch: u64,
}

/// One in-flight resolution that concurrent duplicate callers wait on.
struct InFlight {
    result: Mutex<Option<Option<String>>>,
    ready: Condvar,
}

impl InFlight {
    fn new() -> Self {
        Self {
            result: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    fn complete(&self, outcome: Option<String>) {
        let mut guard = lock(&self.result);
        if guard.is_none() {
            *guard = Some(outcome);
        }
        self.ready.notify_all();
    }

    fn wait(&self) -> Option<String> {
        let mut guard = lock(&self.result);
        loop {
            if let Some(ref outcome) = *guard {
                return outcome.clone();
            }
            guard = self
                .ready
                .wait(guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }
}

type InFlightKey = (String, u64);

enum Role {
    Hit(String),
    Waiter(Arc<InFlight>),
    Leader(Arc<InFlight>),
}

/// Completes and unregisters an in-flight slot even if a backend panics,
/// so waiting callers are never stranded.
struct LeaderGuard<'a> {
    resolver: &'a TranslationResolver,
    key: InFlightKey,
    slot: Arc<InFlight>,
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        lock(&self.resolver.in_flight).remove(&self.key);
        self.slot.complete(None);
    }
}

/// Cascading multi-backend translator with a write-through cache.
///
/// Resolution order: cache → each backend in priority order (skipping
/// those that don't support the pair) → original text. A stage "fails" if
/// it errors or returns the input unchanged. Backend errors never escape:
/// the worst outcome is the untranslated input.
pub struct TranslationResolver {
    backends: Vec<Box<dyn TranslationBackend>>,
    state: Mutex<ResolverState>,
    in_flight: Mutex<HashMap<InFlightKey, Arc<InFlight>>>,
    stats: Mutex<ResolverStats>,
}

impl TranslationResolver {
    pub fn new(pair: LanguagePair, cache_capacity: usize) -> Self {
        Self {
            backends: Vec::new(),
            state: Mutex::new(ResolverState {
                cache: TranslationCache::new(cache_capacity),
                pair,
                epoch: 0,
            }),
            in_flight: Mutex::new(HashMap::new()),
            stats: Mutex::new(ResolverStats::default()),
        }
    }

    /// Appends a backend at the lowest priority so far.
    pub fn with_backend(mut self, backend: Box<dyn TranslationBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn language_pair(&self) -> LanguagePair {
        lock(&self.state).pair.clone()
    }

    /// Switches the active pair and clears the cache wholesale.
    pub fn set_languages(&self, source: &str, target: &str) {
        let pair = LanguagePair::new(source, target);
        let mut state = lock(&self.state);
        state.cache.clear();
        state.epoch += 1;
        log::info!("translation languages set to {pair}; cache cleared");
        state.pair = pair;
    }

    pub fn cache_len(&self) -> usize {
        lock(&self.state).cache.len()
    }

    pub fn stats(&self) -> ResolverStats {
        lock(&self.stats).clone()
    }

    /// Non-blocking fast path: cached translation or `None`.
    pub fn translate_cached(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        let hit = {
            let mut state = lock(&self.state);
            let pair = state.pair.clone();
            state.cache.get(text, &pair)
        };
        self.record(|s| match hit {
            Some(_) => s.cache_hits += 1,
            None => s.cache_misses += 1,
        });
        hit
    }

    /// Full resolution. May block on backend I/O, so call it off the frame
    /// thread. Returns `text` unchanged when nothing translates it.
    pub fn translate(&self, text: &str) -> String {
        self.resolve(text).unwrap_or_else(|| text.to_string())
    }

    /// Like `translate`, but `None` when no stage produced a translation,
    /// so the caller can tell a failed cascade from a real result.
    pub fn resolve(&self, text: &str) -> Option<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let (pair, epoch) = {
            let mut state = lock(&self.state);
            let pair = state.pair.clone();
            if let Some(hit) = state.cache.get(trimmed, &pair) {
                drop(state);
                self.record(|s| s.cache_hits += 1);
                return Some(hit);
            }
            (pair, state.epoch)
        };

        let key = (normalize_key(trimmed), epoch);
        let role = {
            let mut in_flight = lock(&self.in_flight);
            match in_flight.get(&key) {
                Some(slot) => Role::Waiter(slot.clone()),
                // A leader may have cached the result and unregistered since
                // the first lookup. Leaders cache before unregistering.
                None => match self.cached(trimmed, epoch) {
                    Some(hit) => Role::Hit(hit),
                    None => {
                        let slot = Arc::new(InFlight::new());
                        in_flight.insert(key.clone(), slot.clone());
                        Role::Leader(slot)
                    }
                },
            }
        };

        let slot = match role {
            Role::Hit(hit) => {
                self.record(|s| s.cache_hits += 1);
                return Some(hit);
            }
            Role::Waiter(slot) => {
                self.record(|s| {
                    s.cache_misses += 1;
                    s.coalesced += 1;
                });
                return slot.wait();
            }
            Role::Leader(slot) => slot,
        };
        self.record(|s| s.cache_misses += 1);

        let guard = LeaderGuard {
            resolver: self,
            key,
            slot,
        };
        let outcome = self.run_cascade(trimmed, &pair);

        if let Some(ref translated) = outcome {
            let mut state = lock(&self.state);
            if state.epoch == epoch {
                state.cache.insert(trimmed, translated, &pair);
            }
        } else {
            self.record(|s| s.unresolved += 1);
        }

        guard.slot.complete(outcome.clone());
        drop(guard);
        outcome
    }

    /// Cache lookup that only answers for the given epoch.
    fn cached(&self, text: &str, epoch: u64) -> Option<String> {
        let mut state = lock(&self.state);
        if state.epoch != epoch {
            return None;
        }
        let pair = state.pair.clone();
        state.cache.get(text, &pair)
    }

    fn run_cascade(&self, text: &str, pair: &LanguagePair) -> Option<String> {
        for backend in &self.backends {
            let name = backend.name();
            if !backend.supports(pair) {
                log::debug!("{name}: skipping unsupported pair {pair}");
                continue;
            }
            match backend.translate(text, pair) {
                Ok(out) if is_translation(text, &out) => {
                    self.record(|s| *s.backend_successes.entry(name.to_string()).or_default() += 1);
                    return Some(out.trim().to_string());
                }
                Ok(_) => log::debug!("{name}: no translation for {text:?}"),
                Err(e) => log::debug!("{name}: {e}; falling through"),
            }
        }
        None
    }

    fn record(&self, update: impl FnOnce(&mut ResolverStats)) {
        update(&mut lock(&self.stats));
    }
}

impl Default for TranslationResolver {
    fn default() -> Self {
        Self::new(
            LanguagePair::new(
                crate::shared::constants::DEFAULT_SOURCE_LANGUAGE,
                crate::shared::constants::DEFAULT_TARGET_LANGUAGE,
            ),
            DEFAULT_CACHE_CAPACITY,
        )
    }
}

fn is_translation(input: &str, output: &str) -> bool {
    let out = output.trim();
    !out.is_empty() && out != input.trim()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
