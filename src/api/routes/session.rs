//! Session control endpoints.
//!
//! The recording page's buttons and panels, as HTTP:
//! - Starting a session (POST /session/start)
//! - Pausing / resuming (POST /session/pause, POST /session/resume)
//! - Finishing and persisting (POST /session/finish)
//! - Status (GET /session/status)
//! - Live transcript view (GET /session/transcript)

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::session::clock::ClockHandle;
use crate::session::status::SessionStatusHandle;
use crate::transcript::LiveTranscriptView;

/// Commands forwarded to the session machine loop.
#[derive(Debug, Clone)]
pub enum ApiCommand {
    SessionStart {
        meeting_id: i64,
        title: Option<String>,
    },
    SessionPause,
    SessionResume,
    SessionFinish,
}

/// Shared state for session routes.
#[derive(Clone)]
pub struct SessionRoutesState {
    pub tx: mpsc::Sender<ApiCommand>,
    pub status: SessionStatusHandle,
    pub clock: ClockHandle,
    pub view: LiveTranscriptView,
}

/// Request body for the start endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct SessionStartRequest {
    pub meeting_id: i64,
    pub title: Option<String>,
}

pub fn router(state: SessionRoutesState) -> Router {
    Router::new()
        .route("/session/start", post(start_session))
        .route("/session/pause", post(pause_session))
        .route("/session/resume", post(resume_session))
        .route("/session/finish", post(finish_session))
        .route("/session/status", get(session_status))
        .route("/session/transcript", get(session_transcript))
        .with_state(state)
}

async fn start_session(
    State(state): State<SessionRoutesState>,
    Json(request): Json<SessionStartRequest>,
) -> Result<Json<Value>, StatusCode> {
    info!(
        "Session start command received via API (meeting {})",
        request.meeting_id
    );

    let command = ApiCommand::SessionStart {
        meeting_id: request.meeting_id,
        title: request.title,
    };

    match state.tx.send(command).await {
        Ok(_) => {
            // Small delay to let the machine process the command.
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

            let status = state.status.get().await;
            Ok(Json(json!({
                "success": true,
                "phase": status.phase.as_str(),
                "meeting_id": status.meeting_id,
                "session_id": status.session_id.map(|id| id.to_string()),
            })))
        }
        Err(e) => {
            error!("Failed to send session start command: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn pause_session(
    State(state): State<SessionRoutesState>,
) -> Result<Json<Value>, StatusCode> {
    info!("Session pause command received via API");
    forward_command(&state, ApiCommand::SessionPause).await
}

async fn resume_session(
    State(state): State<SessionRoutesState>,
) -> Result<Json<Value>, StatusCode> {
    info!("Session resume command received via API");
    forward_command(&state, ApiCommand::SessionResume).await
}

async fn finish_session(
    State(state): State<SessionRoutesState>,
) -> Result<Json<Value>, StatusCode> {
    info!("Session finish command received via API");

    match state.tx.send(ApiCommand::SessionFinish).await {
        Ok(_) => {
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

            let status = state.status.get().await;
            Ok(Json(json!({
                "success": true,
                "phase": status.phase.as_str(),
                "meeting_id": status.meeting_id,
                "duration_seconds": status.recording.duration_seconds,
                "sentence_count": state.view.snapshot().sentence_count,
                "last_error": status.last_error,
            })))
        }
        Err(e) => {
            error!("Failed to send session finish command: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn forward_command(
    state: &SessionRoutesState,
    command: ApiCommand,
) -> Result<Json<Value>, StatusCode> {
    match state.tx.send(command).await {
        Ok(_) => {
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

            let status = state.status.get().await;
            Ok(Json(json!({
                "success": true,
                "phase": status.phase.as_str(),
                "meeting_id": status.meeting_id,
            })))
        }
        Err(e) => {
            error!("Failed to send session command: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn session_status(State(state): State<SessionRoutesState>) -> Json<Value> {
    let status = state.status.get().await;

    Json(json!({
        "phase": status.phase.as_str(),
        "meeting_id": status.meeting_id,
        "session_id": status.session_id.map(|id| id.to_string()),
        "title": status.title,
        "elapsed_seconds": state.clock.elapsed_seconds(),
        "stream_done": status.stream_done,
        "recording": {
            "audio_file_url": status.recording.audio_file_url,
            "audio_format": status.recording.audio_format,
            "audio_file_size": status.recording.audio_file_size,
            "duration_seconds": status.recording.duration_seconds,
        },
        "last_error": status.last_error,
    }))
}

/// The live transcript view: finalized rows keyed by position, the
/// transient preview, and the sentence count.
async fn session_transcript(State(state): State<SessionRoutesState>) -> Json<Value> {
    let snapshot = state.view.snapshot();

    Json(json!({
        "items": snapshot.items,
        "preview": snapshot.preview,
        "sentence_count": snapshot.sentence_count,
    }))
}
