//! Pronunciation evaluation: recognize the learner's audio, then score it
//! against the target word on the 0-100 scale.
//!
//! Scoring is pure and deterministic for a given (target, recognized,
//! confidence) triple; only the recognition step talks to the outside world.

use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::adapters::{AdapterError, AdapterHub};
use crate::store::operations::pronunciation::PronunciationAttempt;
use crate::store::{Store, StoreError};
use crate::validation;

/// Weights for the overall score: accuracy dominates, fluency and
/// completeness refine.
const ACCURACY_WEIGHT: f64 = 0.5;
const FLUENCY_WEIGHT: f64 = 0.3;
const COMPLETENESS_WEIGHT: f64 = 0.2;

/// Overall scores at or above this count as a successful attempt.
const SUCCESS_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    #[serde(default)]
    pub word_id: Option<String>,
    pub target_word: String,
    pub audio_base64: String,
    pub language: String,
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Classic two-row Levenshtein over characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(prev[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

/// Edit-distance similarity between the normalized target and recognition,
/// as a percentage of the longer string. The distance never exceeds that
/// length, so the score lands in [0, 100] without clamping; two empty
/// strings are a perfect match.
pub fn accuracy_score(target: &str, recognized: &str) -> f64 {
    let target = normalize(target);
    let recognized = normalize(recognized);
    let max_len = target.chars().count().max(recognized.chars().count()).max(1);
    let distance = levenshtein(&target, &recognized);
    (1.0 - distance as f64 / max_len as f64) * 100.0
}

/// Recognizer confidence mapped onto coarse fluency bands.
pub fn fluency_score(confidence: f64) -> f64 {
    if confidence >= 0.9 {
        95.0
    } else if confidence >= 0.7 {
        80.0
    } else if confidence >= 0.5 {
        65.0
    } else {
        50.0
    }
}

/// Share of target tokens covered by the recognition. A target token counts
/// as covered when it contains, or is contained in, any recognized token, so
/// split and fused compounds still match.
pub fn completeness_score(target: &str, recognized: &str) -> f64 {
    let target = normalize(target);
    let recognized = normalize(recognized);
    let target_tokens: Vec<&str> = target.split_whitespace().collect();
    if target_tokens.is_empty() {
        return 0.0;
    }
    let recognized_tokens: Vec<&str> = recognized.split_whitespace().collect();

    let covered = target_tokens
        .iter()
        .filter(|token| {
            recognized_tokens
                .iter()
                .any(|candidate| token.contains(candidate) || candidate.contains(*token))
        })
        .count();

    covered as f64 / target_tokens.len() as f64 * 100.0
}

pub fn overall_score(accuracy: f64, fluency: f64, completeness: f64) -> f64 {
    (accuracy * ACCURACY_WEIGHT + fluency * FLUENCY_WEIGHT + completeness * COMPLETENESS_WEIGHT)
        .round()
}

fn suggestions_for(
    target: &str,
    recognized: &str,
    accuracy: f64,
    fluency: f64,
    overall: f64,
) -> Vec<String> {
    let mut out = Vec::new();
    if normalize(recognized).is_empty() {
        out.push("No speech was detected, try recording again closer to the microphone".to_string());
        return out;
    }
    if accuracy < 70.0 {
        out.push(format!(
            "The recording sounded like \"{}\" rather than \"{}\", practice it slowly",
            recognized.trim(),
            target.trim()
        ));
    }
    if fluency < 65.0 {
        out.push("Speak a little more clearly and evenly".to_string());
    }
    if overall >= 90.0 {
        out.push("Excellent, that sounded spot on".to_string());
    } else if out.is_empty() && accuracy < 100.0 {
        out.push("Close, pay attention to the exact vowel sounds".to_string());
    }
    out
}

fn audio_ref(audio_base64: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(audio_base64.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Recognizes and scores one spoken attempt, persisting the result. A
/// provider outage degrades to an unsuccessful fallback-tagged attempt
/// rather than an error; undecodable audio is the caller's fault and maps
/// to a validation error.
pub async fn evaluate(
    store: &Store,
    adapters: &AdapterHub,
    user_id: &str,
    request: &EvaluateRequest,
) -> Result<PronunciationAttempt, StoreError> {
    validation::validate_surface_text(&request.target_word)
        .map_err(|msg| StoreError::Validation(format!("target word: {msg}")))?;
    validation::validate_language_tag(&request.language)
        .map_err(|msg| StoreError::Validation(msg.to_string()))?;
    if request.audio_base64.is_empty() {
        return Err(StoreError::Validation("audio payload is empty".to_string()));
    }

    if let Some(word_id) = &request.word_id {
        store.get_active_item(word_id)?;
    }

    let now = Utc::now();
    let base = PronunciationAttempt {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        word_id: request.word_id.clone(),
        target_word: request.target_word.clone(),
        recognized_text: String::new(),
        language: request.language.clone(),
        audio_ref: audio_ref(&request.audio_base64),
        accuracy_score: 0.0,
        fluency_score: 0.0,
        completeness_score: 0.0,
        overall_score: 0.0,
        suggestions: Vec::new(),
        source: "fallback".to_string(),
        success: false,
        created_at: now,
    };

    let attempt = match adapters
        .stt
        .transcribe(&request.audio_base64, &request.language)
        .await
    {
        Ok(transcription) => {
            let accuracy = accuracy_score(&request.target_word, &transcription.text);
            let fluency = fluency_score(transcription.confidence);
            let completeness = completeness_score(&request.target_word, &transcription.text);
            let overall = overall_score(accuracy, fluency, completeness);
            PronunciationAttempt {
                recognized_text: transcription.text.clone(),
                accuracy_score: accuracy,
                fluency_score: fluency,
                completeness_score: completeness,
                overall_score: overall,
                suggestions: suggestions_for(
                    &request.target_word,
                    &transcription.text,
                    accuracy,
                    fluency,
                    overall,
                ),
                source: transcription.source,
                success: overall >= SUCCESS_THRESHOLD,
                ..base
            }
        }
        Err(AdapterError::Malformed(message)) => {
            return Err(StoreError::Validation(format!(
                "audio could not be decoded: {message}"
            )));
        }
        Err(AdapterError::Unavailable(message)) => {
            tracing::warn!(%message, "STT unavailable, recording fallback attempt");
            PronunciationAttempt {
                suggestions: vec![
                    "Speech recognition is temporarily unavailable, try again later".to_string(),
                ],
                ..base
            }
        }
    };

    store.create_pronunciation_attempt(&attempt)?;
    Ok(attempt)
}
