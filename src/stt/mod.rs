//! Client for the realtime speech service.
//!
//! Transport-level concerns only: connecting, relaying actions and audio
//! frames, decoding service messages. What the events mean is the
//! transcript reconciler's business.

pub mod messages;
pub mod stream;

pub use messages::{ClientAction, ServerMessage, TranscriptionPayload};
pub use stream::SttStream;

use thiserror::Error;

/// Faults raised by the speech-service transport.
#[derive(Debug, Error)]
pub enum SttError {
    #[error("invalid speech service url: {0}")]
    InvalidUrl(String),
    #[error("websocket failure: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("unencodable action: {0}")]
    Encode(#[from] serde_json::Error),
}
