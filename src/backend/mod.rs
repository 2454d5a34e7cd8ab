//! Client for the meeting backend.
//!
//! Two calls: fetch meeting metadata at session start, and persist the
//! finished session (recording metadata plus transcript segments).

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::session::status::RecordingUpload;
use crate::transcript::SentenceRecord;

/// Meeting metadata owned by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeetingInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// One persisted transcript segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    pub speaker_id: String,
    pub speaker_name: String,
    /// Numeric label parsed from digits in the speaker id; 0 when absent.
    pub speaker_label: u32,
    pub text: String,
    /// Milliseconds from recording start.
    pub start_time: u64,
    pub end_time: u64,
    pub sequence_order: usize,
}

/// Recording metadata as the backend stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingPayload {
    pub audio_file_url: String,
    pub audio_format: String,
    pub audio_file_size: Option<u64>,
    pub duration_seconds: u64,
}

/// Body of POST /api/meetings/{id}/finish.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishSessionRequest {
    /// Total recording duration in seconds.
    pub duration: u64,
    /// ISO-8601 wall-clock end of the meeting.
    pub end_time: String,
    pub recording: RecordingPayload,
    pub transcripts: Vec<TranscriptSegment>,
}

impl FinishSessionRequest {
    /// Map the reconciled sentences and upload metadata into the backend's
    /// persistence shape.
    pub fn from_session(
        duration_seconds: u64,
        recording: &RecordingUpload,
        sentences: &[SentenceRecord],
    ) -> Self {
        let transcripts = sentences
            .iter()
            .enumerate()
            .map(|(index, sentence)| TranscriptSegment {
                speaker_id: sentence.speaker.clone(),
                speaker_name: sentence.speaker.clone(),
                speaker_label: speaker_label(&sentence.speaker),
                text: sentence.text.clone(),
                start_time: sentence.start_ts,
                end_time: if sentence.end_ts > 0 {
                    sentence.end_ts
                } else {
                    sentence.start_ts
                },
                sequence_order: index,
            })
            .collect();

        Self {
            duration: duration_seconds,
            end_time: chrono::Utc::now().to_rfc3339(),
            recording: RecordingPayload {
                audio_file_url: recording.audio_file_url.clone(),
                audio_format: recording.audio_format.clone(),
                audio_file_size: recording.audio_file_size,
                duration_seconds,
            },
            transcripts,
        }
    }
}

/// Digits embedded in a speaker id become its numeric label
/// ("speaker_2" → 2). Ids without digits map to 0.
pub fn speaker_label(speaker_id: &str) -> u32 {
    let digits: String = speaker_id
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse().unwrap_or(0)
}

/// Trait for the meeting persistence service, decoupled from HTTP so the
/// session machine can be driven against a test double.
#[async_trait]
pub trait MeetingBackend: Send + Sync {
    /// Fetch meeting metadata (title, participants, keywords).
    async fn fetch_meeting(&self, meeting_id: i64) -> Result<MeetingInfo>;

    /// Persist a finished session.
    async fn finish_meeting(&self, meeting_id: i64, payload: &FinishSessionRequest) -> Result<()>;
}

/// HTTP implementation against the meeting backend's REST API.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Re-send a parked finish payload from the recovery store.
    pub async fn finish_meeting_raw(&self, meeting_id: i64, payload_json: &str) -> Result<()> {
        let payload: FinishSessionRequest =
            serde_json::from_str(payload_json).context("Corrupt pending payload")?;
        self.finish_meeting(meeting_id, &payload).await
    }
}

#[async_trait]
impl MeetingBackend for BackendClient {
    async fn fetch_meeting(&self, meeting_id: i64) -> Result<MeetingInfo> {
        let url = format!("{}/api/meetings/{}", self.base_url, meeting_id);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("Meeting lookup request failed")?;

        if !response.status().is_success() {
            bail!("Meeting lookup returned {}", response.status());
        }

        response
            .json::<MeetingInfo>()
            .await
            .context("Invalid meeting response body")
    }

    async fn finish_meeting(
        &self,
        meeting_id: i64,
        payload: &FinishSessionRequest,
    ) -> Result<()> {
        let url = format!("{}/api/meetings/{}/finish", self.base_url, meeting_id);
        info!(
            "Saving meeting {} ({} transcript segments)",
            meeting_id,
            payload.transcripts.len()
        );

        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .context("Finish request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Finish returned {}: {}", status, body);
        }

        Ok(())
    }
}
