//! Key composition for every tree. Keys are plain UTF-8 with `:` separators;
//! timestamps are zero-padded so lexicographic order equals time order.

pub fn item_key(item_id: &str) -> String {
    item_id.to_string()
}

pub fn item_freq_index_key(variant: &str, frequency_rank: u32, item_id: &str) -> String {
    format!("{}:{:010}:{}", variant, frequency_rank, item_id)
}

pub fn item_freq_index_prefix(variant: &str) -> String {
    format!("{}:", variant)
}

/// Extracts `(frequency_rank, item_id)` from an `items_by_frequency` key.
pub fn parse_item_freq_index_key(key: &[u8]) -> Option<(u32, String)> {
    let text = std::str::from_utf8(key).ok()?;
    let mut parts = text.splitn(3, ':');
    let _variant = parts.next()?;
    let rank = parts.next()?.parse::<u32>().ok()?;
    let item_id = parts.next()?;
    Some((rank, item_id.to_string()))
}

pub fn dictionary_key(dictionary_id: &str) -> String {
    dictionary_id.to_string()
}

pub fn dictionary_word_key(dictionary_id: &str, chapter: u32, item_id: &str) -> String {
    format!("{}:{:04}:{}", dictionary_id, chapter, item_id)
}

pub fn dictionary_prefix(dictionary_id: &str) -> String {
    format!("{}:", dictionary_id)
}

pub fn dictionary_chapter_prefix(dictionary_id: &str, chapter: u32) -> String {
    format!("{}:{:04}:", dictionary_id, chapter)
}

pub fn progress_key(user_id: &str, word_id: &str) -> String {
    format!("{}:{}", user_id, word_id)
}

pub fn progress_prefix(user_id: &str) -> String {
    format!("{}:", user_id)
}

pub fn progress_due_key(user_id: &str, due_ts_ms: i64, word_id: &str) -> String {
    let ts = due_ts_ms.max(0) as u64;
    format!("{}:{:020}:{}", user_id, ts, word_id)
}

pub fn progress_due_prefix(user_id: &str) -> String {
    format!("{}:", user_id)
}

/// Extracts `(due_ts_ms, word_id)` from a `progress_due_index` key.
pub fn parse_progress_due_key(key: &[u8]) -> Option<(i64, String)> {
    let text = std::str::from_utf8(key).ok()?;
    let mut parts = text.splitn(3, ':');
    let _user = parts.next()?;
    let ts = parts.next()?.parse::<u64>().ok()?;
    let word_id = parts.next()?;
    Some((i64::try_from(ts).ok()?, word_id.to_string()))
}

pub fn attempt_key(user_id: &str, timestamp_ms: i64, attempt_id: &str) -> String {
    let ts = timestamp_ms.max(0) as u64;
    format!("{}:{:020}:{}", user_id, ts, attempt_id)
}

pub fn attempt_prefix(user_id: &str) -> String {
    format!("{}:", user_id)
}

/// Inclusive-start bound for a window scan over a user's attempts.
pub fn attempt_window_start(user_id: &str, start_ts_ms: i64) -> String {
    format!("{}:{:020}:", user_id, start_ts_ms.max(0) as u64)
}

/// Exclusive-end bound for a window scan over a user's attempts.
pub fn attempt_window_end(user_id: &str, end_ts_ms: i64) -> String {
    format!("{}:{:020}:", user_id, end_ts_ms.max(0) as u64)
}

pub fn daily_stats_key(user_id: &str, date: &str) -> String {
    format!("{}:{}", user_id, date)
}

pub fn daily_stats_prefix(user_id: &str) -> String {
    format!("{}:", user_id)
}

/// Key-error counters key on the character's code point so that separator
/// characters cannot break the key format.
pub fn key_error_key(user_id: &str, key_char: char) -> String {
    format!("{}:{:08}", user_id, key_char as u32)
}

pub fn key_error_prefix(user_id: &str) -> String {
    format!("{}:", user_id)
}

pub fn plan_key(user_id: &str, plan_id: &str) -> String {
    format!("{}:{}", user_id, plan_id)
}

pub fn plan_prefix(user_id: &str) -> String {
    format!("{}:", user_id)
}

pub fn pronunciation_key(user_id: &str, timestamp_ms: i64, attempt_id: &str) -> String {
    let ts = timestamp_ms.max(0) as u64;
    format!("{}:{:020}:{}", user_id, ts, attempt_id)
}

pub fn pronunciation_prefix(user_id: &str) -> String {
    format!("{}:", user_id)
}
