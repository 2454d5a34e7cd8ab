//! WebSocket stream to the speech service.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};
use url::Url;

use super::messages::{ClientAction, ServerMessage};
use super::SttError;

pub struct SttStream {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl SttStream {
    /// Connect and announce the session language.
    pub async fn connect(url: &str, language: &str) -> Result<Self, SttError> {
        let parsed =
            Url::parse(url).map_err(|e| SttError::InvalidUrl(format!("{}: {}", url, e)))?;
        if parsed.scheme() != "ws" && parsed.scheme() != "wss" {
            return Err(SttError::InvalidUrl(format!(
                "{}: expected a ws:// or wss:// endpoint",
                url
            )));
        }

        let (ws, _) = connect_async(parsed.as_str()).await?;
        info!("Connected to speech service at {}", url);

        let mut stream = Self { ws };
        stream
            .send_action(&ClientAction::Start {
                language: language.to_string(),
            })
            .await?;

        Ok(stream)
    }

    pub async fn send_action(&mut self, action: &ClientAction) -> Result<(), SttError> {
        let payload = serde_json::to_string(action)?;
        debug!("Sending action to speech service: {}", payload);
        self.ws.send(Message::Text(payload)).await?;
        Ok(())
    }

    /// Forward a frame of raw PCM audio.
    pub async fn send_audio(&mut self, frame: Vec<u8>) -> Result<(), SttError> {
        self.ws.send(Message::Binary(frame)).await?;
        Ok(())
    }

    /// Next decoded message. `None` means the service closed the stream.
    ///
    /// Undecodable text frames are dropped with a warning rather than
    /// tearing the session down.
    pub async fn next_message(&mut self) -> Result<Option<ServerMessage>, SttError> {
        while let Some(frame) = self.ws.next().await {
            match frame? {
                Message::Text(text) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(message) => return Ok(Some(message)),
                    Err(e) => {
                        warn!("Dropping unparseable speech service message ({}): {}", e, text)
                    }
                },
                Message::Binary(data) => {
                    debug!("Ignoring {} byte binary frame from speech service", data.len());
                }
                Message::Close(frame) => {
                    info!("Speech service closed the stream: {:?}", frame);
                    return Ok(None);
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }

        Ok(None)
    }

    pub async fn close(&mut self) {
        if let Err(e) = self.ws.close(None).await {
            debug!("Error closing speech service stream: {}", e);
        }
    }
}
