use std::collections::{BTreeMap, HashMap};

use super::language_pair::LanguagePair;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationCacheEntry {
    pub source_text: String,
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug)]
struct Slot {
    entry: TranslationCacheEntry,
    last_used: u64,
}

/// Cache key for a piece of source text: trimmed and case-folded.
pub fn normalize_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Bounded least-recently-used translation cache.
///
/// Entries are keyed by normalized source text and only returned for the
/// pair they were stored under. Callers clear the whole cache when the
/// active pair changes.
#[derive(Debug)]
pub struct TranslationCache {
    capacity: usize,
    slots: HashMap<String, Slot>,
    /// `last_used` tick → key, oldest first.
    recency: BTreeMap<u64, String>,
    tick: u64,
}

impl TranslationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            slots: HashMap::new(),
            recency: BTreeMap::new(),
            tick: 0,
        }
    }

    pub fn get(&mut self, text: &str, pair: &LanguagePair) -> Option<String> {
        let key = normalize_key(text);
        let tick = self.next_tick();
        let slot = self.slots.get_mut(&key)?;
        if slot.entry.source_lang != pair.source || slot.entry.target_lang != pair.target {
            return None;
        }
        self.recency.remove(&slot.last_used);
        slot.last_used = tick;
        self.recency.insert(tick, key);
        Some(slot.entry.translated_text.clone())
    }

    pub fn insert(&mut self, text: &str, translated: &str, pair: &LanguagePair) {
        let key = normalize_key(text);
        let tick = self.next_tick();
        if let Some(old) = self.slots.remove(&key) {
            self.recency.remove(&old.last_used);
        }
        while self.slots.len() >= self.capacity {
            if !self.evict_oldest() {
                break;
            }
        }
        self.slots.insert(
            key.clone(),
            Slot {
                entry: TranslationCacheEntry {
                    source_text: key.clone(),
                    translated_text: translated.to_string(),
                    source_lang: pair.source.clone(),
                    target_lang: pair.target.clone(),
                },
                last_used: tick,
            },
        );
        self.recency.insert(tick, key);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.recency.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict_oldest(&mut self) -> bool {
        match self.recency.pop_first() {
            Some((_, key)) => {
                self.slots.remove(&key);
                true
            }
            None => false,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en_zh() -> LanguagePair {
        LanguagePair::new("en", "zh")
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Hello World \n"), "hello world");
    }

    #[test]
    fn test_lookup_is_case_and_whitespace_insensitive() {
        let mut cache = TranslationCache::new(8);
        cache.insert("Hello", "你好", &en_zh());
        assert_eq!(cache.get("  hello ", &en_zh()).as_deref(), Some("你好"));
        assert_eq!(cache.get("HELLO", &en_zh()).as_deref(), Some("你好"));
    }

    #[test]
    fn test_other_pair_misses() {
        let mut cache = TranslationCache::new(8);
        cache.insert("hello", "你好", &en_zh());
        assert!(cache.get("hello", &LanguagePair::new("en", "es")).is_none());
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = TranslationCache::new(2);
        cache.insert("a", "1", &en_zh());
        cache.insert("b", "2", &en_zh());
        // Touch "a" so "b" becomes the oldest.
        assert!(cache.get("a", &en_zh()).is_some());
        cache.insert("c", "3", &en_zh());

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b", &en_zh()).is_none());
        assert!(cache.get("a", &en_zh()).is_some());
        assert!(cache.get("c", &en_zh()).is_some());
    }

    #[test]
    fn test_reinsert_replaces_without_growing() {
        let mut cache = TranslationCache::new(2);
        cache.insert("a", "1", &en_zh());
        cache.insert("A", "uno", &en_zh());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a", &en_zh()).as_deref(), Some("uno"));
    }

    #[test]
    fn test_clear() {
        let mut cache = TranslationCache::new(4);
        cache.insert("a", "1", &en_zh());
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("a", &en_zh()).is_none());
    }

    #[test]
    fn test_zero_capacity_still_holds_one() {
        let mut cache = TranslationCache::new(0);
        cache.insert("a", "1", &en_zh());
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.len(), 1);
    }
}
