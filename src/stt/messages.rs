//! Wire types for the realtime speech service.
//!
//! Client → service: JSON actions plus binary PCM frames. Service → client:
//! JSON messages tagged by `type`.

use serde::{Deserialize, Serialize};

use crate::transcript::RecognitionEvent;

/// Actions sent to the speech service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientAction {
    Start { language: String },
    Pause,
    Resume,
    Stop,
}

/// Messages received from the speech service.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Stream state notices: recording, stopping, paused, resumed.
    Status { message: String },
    /// A recognition result. Older service builds tag these `data`.
    #[serde(alias = "data")]
    Transcription(TranscriptionPayload),
    /// The captured audio landed in object storage.
    AudioUploaded {
        file_url: String,
        audio_format: Option<String>,
        file_size: Option<u64>,
    },
    /// The stream is complete; nothing further will arrive.
    Done {
        #[serde(rename = "fullText")]
        full_text: Option<String>,
        #[serde(rename = "sentenceCount")]
        sentence_count: Option<usize>,
        file_url: Option<String>,
    },
    Error { message: String },
}

/// Body of a transcription message. Timestamps appear in camelCase or
/// snake_case depending on the service build, so both spellings parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptionPayload {
    #[serde(default)]
    pub text: String,
    #[serde(rename = "fullText", default)]
    pub full_text: Option<String>,
    #[serde(rename = "isFinal", default)]
    pub is_final: bool,
    #[serde(rename = "isSentenceEnd", default)]
    pub is_sentence_end: bool,
    #[serde(rename = "startTimestamp", alias = "start_timestamp", default)]
    pub start_timestamp: Option<u64>,
    #[serde(rename = "endTimestamp", alias = "end_timestamp", default)]
    pub end_timestamp: Option<u64>,
    #[serde(default)]
    pub speaker: Option<String>,
}

impl From<TranscriptionPayload> for RecognitionEvent {
    fn from(payload: TranscriptionPayload) -> Self {
        RecognitionEvent {
            text: payload.text,
            full_text: payload.full_text,
            is_final: payload.is_final,
            is_sentence_end: payload.is_sentence_end,
            start_timestamp: payload.start_timestamp,
            end_timestamp: payload.end_timestamp,
            speaker: payload.speaker,
        }
    }
}
