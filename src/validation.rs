//! Shared input validation, used by the ingest service and the item routes.

use crate::constants::MAX_TYPING_WPM;

/// Surface forms: non-empty after trimming, bounded length.
pub fn validate_surface_text(text: &str) -> Result<(), &'static str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("text must not be empty");
    }
    if trimmed.chars().count() > 512 {
        return Err("text must not exceed 512 characters");
    }
    Ok(())
}

/// Typing speed must sit in [0, 999.99] WPM and be a real number.
pub fn validate_typing_speed(wpm: f64) -> Result<(), &'static str> {
    if !wpm.is_finite() {
        return Err("typing speed must be a finite number");
    }
    if wpm < 0.0 {
        return Err("typing speed must not be negative");
    }
    if wpm > MAX_TYPING_WPM {
        return Err("typing speed exceeds the supported maximum");
    }
    Ok(())
}

/// Attempt scores are percentages.
pub fn validate_score(score: f64) -> Result<(), &'static str> {
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return Err("score must be within [0, 100]");
    }
    Ok(())
}

/// BCP-47-ish language tags: `en`, `en-US`, `zh-CN`.
pub fn validate_language_tag(language: &str) -> Result<(), &'static str> {
    let ok = !language.is_empty()
        && language.len() <= 16
        && language
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-');
    if ok {
        Ok(())
    } else {
        Err("invalid language tag")
    }
}
