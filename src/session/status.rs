//! Session status types and shared state handle.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Phase of a recording session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Recording,
    Paused,
    Finishing,
    Completed,
    Error,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Finishing => "finishing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

/// Metadata about the session audio, filled in from the speech service's
/// upload notices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingUpload {
    pub audio_file_url: String,
    pub audio_format: String,
    pub audio_file_size: Option<u64>,
    pub duration_seconds: u64,
}

impl Default for RecordingUpload {
    fn default() -> Self {
        Self {
            audio_file_url: String::new(),
            audio_format: "wav".to_string(),
            audio_file_size: None,
            duration_seconds: 0,
        }
    }
}

/// Current session state, readable by API handlers.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub meeting_id: Option<i64>,
    pub session_id: Option<Uuid>,
    pub title: Option<String>,
    pub recording: RecordingUpload,
    /// The speech service confirmed the stream is complete.
    pub stream_done: bool,
    pub last_error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            meeting_id: None,
            session_id: None,
            title: None,
            recording: RecordingUpload::default(),
            stream_done: false,
            last_error: None,
        }
    }
}

/// Thread-safe handle shared between the machine, the stream task, and API
/// handlers.
#[derive(Clone, Default)]
pub struct SessionStatusHandle {
    inner: Arc<Mutex<SessionState>>,
}

impl SessionStatusHandle {
    pub async fn get(&self) -> SessionState {
        self.inner.lock().await.clone()
    }

    pub async fn start_recording(&self, meeting_id: i64, session_id: Uuid, title: Option<String>) {
        let mut state = self.inner.lock().await;
        *state = SessionState::default();
        state.phase = SessionPhase::Recording;
        state.meeting_id = Some(meeting_id);
        state.session_id = Some(session_id);
        state.title = title;
    }

    pub async fn set_phase(&self, phase: SessionPhase) {
        let mut state = self.inner.lock().await;
        state.phase = phase;
    }

    pub async fn set_error(&self, error: String) {
        let mut state = self.inner.lock().await;
        state.phase = SessionPhase::Error;
        state.last_error = Some(error);
    }

    pub async fn set_upload(&self, file_url: String, format: Option<String>, size: Option<u64>) {
        let mut state = self.inner.lock().await;
        state.recording.audio_file_url = file_url;
        if let Some(format) = format {
            state.recording.audio_format = format;
        }
        state.recording.audio_file_size = size.or(state.recording.audio_file_size);
    }

    pub async fn set_duration(&self, duration_seconds: u64) {
        let mut state = self.inner.lock().await;
        state.recording.duration_seconds = duration_seconds;
    }

    pub async fn mark_stream_done(&self, file_url: Option<String>) {
        let mut state = self.inner.lock().await;
        state.stream_done = true;
        if let Some(url) = file_url {
            state.recording.audio_file_url = url;
        }
    }

    pub async fn complete(&self) {
        let mut state = self.inner.lock().await;
        state.phase = SessionPhase::Completed;
    }

    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        *state = SessionState::default();
    }
}
