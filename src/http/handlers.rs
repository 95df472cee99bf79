use super::state::AppState;
use crate::error::RelayResult;
use crate::llm::persona_prompt;
use crate::protocol::messages::ErrorResponse;
use crate::protocol::{GenerateRequest, ResponseEnvelope};
use crate::tts::VoiceParams;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use base64::Engine;
use std::convert::Infallible;
use tracing::{error, info};

// ============================================================================
// Handlers
// ============================================================================

/// POST /generate
/// Reply to the user's text and return it as text, speech and word timings
pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> impl IntoResponse {
    info!(
        "Generate request: {} chars, session {:?}, profanity level {}",
        req.text.chars().count(),
        req.session_id,
        req.profanity_level
    );

    let envelope = match run_exchange(&state, &req).await {
        Ok(envelope) => envelope,
        Err(e) => {
            error!("Generate request failed: {}", e);
            return failure(e.to_string());
        }
    };

    let payload = match serde_json::to_vec(&envelope) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            return failure(e.to_string());
        }
    };

    info!(
        "Responding with {} words, {} bytes",
        envelope.timings.len(),
        payload.len()
    );

    // One document, written in pieces; clients accumulate until it parses
    let pieces: Vec<Result<Vec<u8>, Infallible>> = payload
        .chunks(state.response_chunk_bytes)
        .map(|piece| Ok(piece.to_vec()))
        .collect();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Body::from_stream(futures::stream::iter(pieces)),
    )
        .into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn run_exchange(state: &AppState, req: &GenerateRequest) -> RelayResult<ResponseEnvelope> {
    let system_prompt = persona_prompt(req.profanity_level);

    // The session lock spans history read through history append
    let text_response = match &req.session_id {
        Some(session_id) => {
            let conversation = state.sessions.checkout(session_id).await;
            let mut conversation = conversation.lock().await;

            let reply = state
                .chat
                .complete(&system_prompt, &conversation.turns, &req.text)
                .await?;

            conversation.record_exchange(&req.text, &reply);
            conversation.touch();
            reply
        }
        None => state.chat.complete(&system_prompt, &[], &req.text).await?,
    };

    let params = VoiceParams {
        voice_id: req.voice_id.clone(),
        stability: req.stability,
        similarity_boost: req.similarity_boost,
        style: req.style,
        use_speaker_boost: req.use_speaker_boost,
    };
    let speech = state.speech.synthesize(&text_response, &params).await?;

    let timings = speech.alignment.to_words();

    Ok(ResponseEnvelope {
        text_response,
        audio_base64: base64::engine::general_purpose::STANDARD.encode(&speech.audio),
        timings,
    })
}

fn failure(detail: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { detail }),
    )
        .into_response()
}
