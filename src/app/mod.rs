//! Service wiring and the session command loop.

use crate::api::{ApiCommand, ApiServer, SessionRoutesState};
use crate::audio::MicAudioSource;
use crate::backend::BackendClient;
use crate::config::Config;
use crate::session::{SessionMachine, SessionStatusHandle};
use crate::transcript::LiveTranscriptView;
use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info};

pub async fn run_service() -> Result<()> {
    info!("Starting notula service");

    let config = Config::load()?;

    let (tx, mut rx) = mpsc::channel::<ApiCommand>(10);

    let mic_source = MicAudioSource::new(config.stt.sample_rate)?;
    let backend = BackendClient::new(&config.backend.base_url);
    let status_handle = SessionStatusHandle::default();
    let view = LiveTranscriptView::default();

    let mut machine = SessionMachine::new(
        Box::new(mic_source),
        Box::new(backend),
        config.stt.clone(),
        config.session.clone(),
        status_handle.clone(),
        view.clone(),
    );

    let api_server = ApiServer::new(
        config.api.port,
        SessionRoutesState {
            tx,
            status: status_handle.clone(),
            clock: machine.clock_handle(),
            view: view.clone(),
        },
    );
    tokio::spawn(async move {
        if let Err(e) = api_server.start().await {
            error!("Control API failed: {}", e);
        }
    });

    info!("notula is ready!");
    info!(
        "Start a session: curl -X POST http://127.0.0.1:{}/session/start \
         -H 'Content-Type: application/json' -d '{{\"meeting_id\": 1}}'",
        config.api.port
    );

    while let Some(command) = rx.recv().await {
        match command {
            ApiCommand::SessionStart { meeting_id, title } => {
                match machine.start(meeting_id, title).await {
                    Ok(result) => info!(
                        "Recording started for meeting {} (session {})",
                        result.meeting_id, result.session_id
                    ),
                    Err(e) => error!("Failed to start session: {}", e),
                }
            }
            ApiCommand::SessionPause => {
                if let Err(e) = machine.pause().await {
                    error!("Failed to pause session: {}", e);
                }
            }
            ApiCommand::SessionResume => {
                if let Err(e) = machine.resume().await {
                    error!("Failed to resume session: {}", e);
                }
            }
            ApiCommand::SessionFinish => match machine.finish().await {
                Ok(result) => info!(
                    "Session finished: meeting {}, {}s, {} sentences",
                    result.meeting_id, result.duration_seconds, result.sentence_count
                ),
                Err(e) => error!("Failed to finish session: {}", e),
            },
        }
    }

    Ok(())
}
