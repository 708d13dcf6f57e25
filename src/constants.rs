/// Maximum retries for optimistic-concurrency progress updates before the
/// conflict is surfaced to the caller.
pub const MAX_CAS_RETRIES: u32 = 20;

/// SM-2 defaults and floor.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const DEFAULT_INTERVAL_DAYS: u32 = 1;

/// Mastery increment per quality point on a graded attempt.
pub const MASTERY_STEP_PER_QUALITY: f64 = 0.1;

/// Mastery floor and repetition floor for the `mastered` status.
pub const MASTERY_THRESHOLD: f64 = 0.8;
pub const MASTERED_MIN_REPETITIONS: u32 = 3;

/// Typing speed is capped; anything above is rejected as malformed input.
pub const MAX_TYPING_WPM: f64 = 999.99;

/// List endpoint paging bounds.
pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Heatmap bucket upper bounds (inclusive) for levels 1..=3; above the last
/// bound the level is 4, and a zero count is always level 0.
pub const HEATMAP_BUCKETS: [u64; 3] = [3, 7, 11];

/// Consecutive failures after which an external provider is marked degraded.
pub const DEGRADE_AFTER_FAILURES: u32 = 3;

/// Per-call adapter timeouts (seconds).
pub const DICTIONARY_TIMEOUT_SECS: u64 = 10;
pub const TTS_TIMEOUT_SECS: u64 = 15;
pub const STT_TIMEOUT_SECS: u64 = 30;

/// Adapter cache TTLs (seconds).
pub const DICTIONARY_CACHE_TTL_SECS: u64 = 3_600;
pub const TTS_CACHE_TTL_SECS: u64 = 7_200;

/// Keystroke-error counters accept printable ASCII plus this whitelist.
pub const KEY_WHITELIST: &[char] = &['\t', '\n', ' '];
