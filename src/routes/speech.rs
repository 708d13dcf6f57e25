use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

use crate::extractors::JsonBody;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::validation;

pub fn router() -> Router<AppState> {
    Router::new().route("/tts", post(synthesize))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeBody {
    text: String,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default = "default_voice")]
    voice: String,
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_voice() -> String {
    "default".to_string()
}

async fn synthesize(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SynthesizeBody>,
) -> Result<impl IntoResponse, AppError> {
    validation::validate_surface_text(&body.text)
        .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;
    validation::validate_language_tag(&body.language)
        .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;

    let audio = state
        .adapters
        .tts
        .synthesize(&body.text, &body.language, &body.voice)
        .await;
    Ok(ok(audio))
}
