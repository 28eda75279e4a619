/// Captions and text annotations older than this are evicted.
pub const DEFAULT_MAX_AGE_SECS: u64 = 30;

pub const DEFAULT_CACHE_CAPACITY: usize = 4096;

pub const DEFAULT_MAX_FACES: usize = 32;
pub const DEFAULT_MAX_TEXTS: usize = 64;

/// Max center distance (normalized units) for a face to continue an existing caption.
pub const DEFAULT_MATCH_DISTANCE: f64 = 0.15;

/// Center-third faces need at least this confidence to be identified.
pub const DEFAULT_CENTER_CONFIDENCE: f32 = 0.8;

/// Aggregation cycles an entity waits before retrying a failed translation.
/// Doubles per consecutive failure, up to the max.
pub const TRANSLATION_RETRY_BASE_CYCLES: u32 = 4;
pub const TRANSLATION_RETRY_MAX_CYCLES: u32 = 256;

pub const DEFAULT_TRANSLATION_WORKERS: usize = 2;
pub const DEFAULT_JOB_QUEUE_CAPACITY: usize = 64;

pub const DEFAULT_SOURCE_LANGUAGE: &str = "en";
pub const DEFAULT_TARGET_LANGUAGE: &str = "zh";

pub const DEFAULT_VIEWPORT_WIDTH: f64 = 1920.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 1080.0;

pub const HTTP_TIMEOUT_SECS: u64 = 5;

pub const SETTINGS_DIR_NAME: &str = "CaptionLens";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Snapshots buffered per subscriber before updates are skipped.
pub const SUBSCRIBER_CHANNEL_CAPACITY: usize = 8;
