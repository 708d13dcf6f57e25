pub const ITEMS: &str = "items";
pub const ITEMS_BY_FREQUENCY: &str = "items_by_frequency";
pub const DICTIONARIES: &str = "dictionaries";
pub const DICTIONARY_WORDS: &str = "dictionary_words";
pub const PROGRESS: &str = "progress";
pub const PROGRESS_DUE_INDEX: &str = "progress_due_index";
pub const ATTEMPTS: &str = "attempts";
pub const DAILY_STATS: &str = "daily_stats";
pub const KEY_ERRORS: &str = "key_errors";
pub const LEARNING_PLANS: &str = "learning_plans";
pub const PRONUNCIATION_ATTEMPTS: &str = "pronunciation_attempts";
pub const META: &str = "meta";
