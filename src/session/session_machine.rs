//! Recording session orchestrator.
//!
//! Drives the live transcription pipeline:
//! start → (pause | resume)* → finish → persist
//!
//! All dependencies are injected via the constructor, no concrete types
//! hardcoded. The spawned stream task is the single writer over the
//! transcript state; the machine itself only ever reads snapshots of it.

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audio::AudioSource;
use crate::backend::{FinishSessionRequest, MeetingBackend};
use crate::config::{SessionConfig, SttConfig};
use crate::db::{self, pending::PendingUploadRepository};
use crate::stt::{ClientAction, ServerMessage, SttStream};
use crate::transcript::{policy_for_language, LiveTranscriptView, TranscriptReconciler};

use super::clock::{ClockHandle, RecordingClock};
use super::status::{SessionPhase, SessionStatusHandle};

/// Result returned from starting a session.
pub struct SessionStartResult {
    pub meeting_id: i64,
    pub session_id: Uuid,
}

/// Result returned from finishing a session.
pub struct SessionFinishResult {
    pub meeting_id: i64,
    pub duration_seconds: u64,
    pub sentence_count: usize,
}

/// Commands the machine forwards to the stream task.
enum StreamCommand {
    Pause,
    Resume,
    Stop,
}

pub struct SessionMachine {
    mic_source: Box<dyn AudioSource>,
    backend: Box<dyn MeetingBackend>,
    stt: SttConfig,
    session_config: SessionConfig,
    status: SessionStatusHandle,
    view: LiveTranscriptView,
    clock: RecordingClock,
    transcript: Option<Arc<Mutex<TranscriptReconciler>>>,
    stream_task: Option<JoinHandle<()>>,
    stream_commands: Option<mpsc::UnboundedSender<StreamCommand>>,
}

impl SessionMachine {
    pub fn new(
        mic_source: Box<dyn AudioSource>,
        backend: Box<dyn MeetingBackend>,
        stt: SttConfig,
        session_config: SessionConfig,
        status: SessionStatusHandle,
        view: LiveTranscriptView,
    ) -> Self {
        Self {
            mic_source,
            backend,
            stt,
            session_config,
            status,
            view,
            clock: RecordingClock::new(),
            transcript: None,
            stream_task: None,
            stream_commands: None,
        }
    }

    pub fn clock_handle(&self) -> ClockHandle {
        self.clock.handle()
    }

    /// Start a recording session for a meeting.
    pub async fn start(&mut self, meeting_id: i64, title: Option<String>) -> Result<SessionStartResult> {
        let current = self.status.get().await;
        if current.phase == SessionPhase::Recording || current.phase == SessionPhase::Paused {
            bail!(
                "Session already in progress (meeting id: {}). Finish it first.",
                current.meeting_id.unwrap_or(0)
            );
        }

        // Meeting metadata is advisory: the session still records when the
        // backend is unreachable.
        let meeting = match self.backend.fetch_meeting(meeting_id).await {
            Ok(meeting) => Some(meeting),
            Err(e) => {
                warn!("Could not load meeting {}: {}", meeting_id, e);
                None
            }
        };

        let fallback_speaker = meeting
            .as_ref()
            .and_then(|m| m.participants.first().cloned())
            .unwrap_or_else(|| self.session_config.fallback_speaker.clone());
        let title = title.or_else(|| meeting.as_ref().and_then(|m| m.title.clone()));
        let session_id = Uuid::new_v4();

        self.view.reset();
        self.clock.start();

        let policy = policy_for_language(&self.stt.language)?;
        let reconciler = TranscriptReconciler::new(
            policy,
            fallback_speaker,
            self.clock.handle(),
            Box::new(self.view.clone()),
        );
        let transcript = Arc::new(Mutex::new(reconciler));
        self.transcript = Some(transcript.clone());

        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        self.mic_source.start(frame_tx)?;

        let stream = match SttStream::connect(&self.stt.url, &self.stt.language).await {
            Ok(stream) => stream,
            Err(e) => {
                let _ = self.mic_source.stop();
                self.clock.stop();
                self.transcript = None;
                self.status.set_error(e.to_string()).await;
                return Err(e).context("Failed to connect to the speech service");
            }
        };

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        self.stream_commands = Some(command_tx);

        let status = self.status.clone();
        self.stream_task = Some(tokio::spawn(run_stream(
            stream, frame_rx, command_rx, transcript, status,
        )));

        self.status
            .start_recording(meeting_id, session_id, title)
            .await;

        info!(
            "Session {} recording started for meeting {}",
            session_id, meeting_id
        );

        Ok(SessionStartResult {
            meeting_id,
            session_id,
        })
    }

    /// Pause recognition and the recording clock.
    pub async fn pause(&mut self) -> Result<()> {
        let state = self.status.get().await;
        if state.phase != SessionPhase::Recording {
            bail!(
                "No active recording to pause (current phase: {})",
                state.phase.as_str()
            );
        }

        self.send_command(StreamCommand::Pause)?;
        self.clock.pause();
        self.mic_source.pause();
        self.status.set_phase(SessionPhase::Paused).await;

        info!("Session paused");
        Ok(())
    }

    /// Resume a paused session.
    pub async fn resume(&mut self) -> Result<()> {
        let state = self.status.get().await;
        if state.phase != SessionPhase::Paused {
            bail!(
                "No paused session to resume (current phase: {})",
                state.phase.as_str()
            );
        }

        self.send_command(StreamCommand::Resume)?;
        self.clock.resume();
        self.mic_source.resume();
        self.status.set_phase(SessionPhase::Recording).await;

        info!("Session resumed");
        Ok(())
    }

    /// Finish the session and persist the transcript.
    pub async fn finish(&mut self) -> Result<SessionFinishResult> {
        let state = self.status.get().await;
        if state.phase != SessionPhase::Recording && state.phase != SessionPhase::Paused {
            bail!(
                "No session in progress (current phase: {})",
                state.phase.as_str()
            );
        }

        let meeting_id = state.meeting_id.unwrap_or(0);
        let session_id = state
            .session_id
            .map(|id| id.to_string())
            .unwrap_or_default();

        self.status.set_phase(SessionPhase::Finishing).await;

        if let Err(e) = self.send_command(StreamCommand::Stop) {
            warn!("Could not signal stop to the speech service: {}", e);
        }

        // Grace period for the service to flush its trailing upload/done
        // messages before the stream task is torn down.
        if let Some(mut task) = self.stream_task.take() {
            let grace = Duration::from_millis(self.session_config.stop_grace_ms);
            if tokio::time::timeout(grace, &mut task).await.is_err() {
                debug!(
                    "Speech service did not settle within {}ms, closing",
                    grace.as_millis()
                );
                task.abort();
            }
        }
        self.stream_commands = None;

        let duration_seconds = self.clock.stop();
        if let Err(e) = self.mic_source.stop() {
            warn!("Failed to stop mic: {}", e);
        }
        self.status.set_duration(duration_seconds).await;

        let sentences = match self.transcript.take() {
            Some(transcript) => transcript.lock().await.sentences().to_vec(),
            None => Vec::new(),
        };

        let state = self.status.get().await;
        let payload =
            FinishSessionRequest::from_session(duration_seconds, &state.recording, &sentences);
        let sentence_count = payload.transcripts.len();

        match self.backend.finish_meeting(meeting_id, &payload).await {
            Ok(()) => {
                self.status.complete().await;
                info!(
                    "Meeting {} saved: {}s, {} transcript segments",
                    meeting_id, duration_seconds, sentence_count
                );
            }
            Err(e) => {
                error!("Failed to save meeting {}: {}", meeting_id, e);
                // Park the payload so `notula pending flush` can retry.
                if let Err(db_err) = self.park_payload(meeting_id, &session_id, &payload) {
                    error!("Failed to park finish payload: {}", db_err);
                } else {
                    info!("Finish payload parked for meeting {}", meeting_id);
                }
                self.status.set_error(e.to_string()).await;
            }
        }

        Ok(SessionFinishResult {
            meeting_id,
            duration_seconds,
            sentence_count,
        })
    }

    fn send_command(&self, command: StreamCommand) -> Result<()> {
        match &self.stream_commands {
            Some(tx) => tx
                .send(command)
                .map_err(|_| anyhow::anyhow!("Speech service stream is gone")),
            None => bail!("No speech service stream for this session"),
        }
    }

    fn park_payload(
        &self,
        meeting_id: i64,
        session_id: &str,
        payload: &FinishSessionRequest,
    ) -> Result<()> {
        let conn = db::init_db()?;
        let json = serde_json::to_string(payload).context("Failed to serialize finish payload")?;
        PendingUploadRepository::insert(&conn, meeting_id, session_id, &json)?;
        Ok(())
    }
}

/// Stream task: relays mic frames out and folds service messages into the
/// transcript. Events are processed strictly one at a time, so `ingest`
/// always runs to completion before the next event is pulled.
async fn run_stream(
    mut stream: SttStream,
    mut frames: mpsc::UnboundedReceiver<Vec<u8>>,
    mut commands: mpsc::UnboundedReceiver<StreamCommand>,
    transcript: Arc<Mutex<TranscriptReconciler>>,
    status: SessionStatusHandle,
) {
    let mut stopping = false;

    loop {
        tokio::select! {
            Some(command) = commands.recv() => {
                let action = match command {
                    StreamCommand::Pause => ClientAction::Pause,
                    StreamCommand::Resume => ClientAction::Resume,
                    StreamCommand::Stop => {
                        stopping = true;
                        ClientAction::Stop
                    }
                };
                if let Err(e) = stream.send_action(&action).await {
                    warn!("Failed to send action to speech service: {}", e);
                    if stopping {
                        break;
                    }
                }
            }
            Some(frame) = frames.recv(), if !stopping => {
                if let Err(e) = stream.send_audio(frame).await {
                    warn!("Failed to forward audio frame: {}", e);
                    break;
                }
            }
            message = stream.next_message() => {
                match message {
                    Ok(Some(message)) => {
                        if handle_message(message, &transcript, &status).await {
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("Speech service stream ended");
                        break;
                    }
                    Err(e) => {
                        warn!("Speech service stream error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    stream.close().await;
}

/// Fold one service message into session state. Returns true when the
/// stream is complete.
async fn handle_message(
    message: ServerMessage,
    transcript: &Arc<Mutex<TranscriptReconciler>>,
    status: &SessionStatusHandle,
) -> bool {
    match message {
        ServerMessage::Status { message } => {
            debug!("Speech service status: {}", message);
        }
        ServerMessage::Transcription(payload) => {
            let mut reconciler = transcript.lock().await;
            reconciler.ingest(payload.into());
        }
        ServerMessage::AudioUploaded {
            file_url,
            audio_format,
            file_size,
        } => {
            info!("Session audio uploaded: {}", file_url);
            status.set_upload(file_url, audio_format, file_size).await;
        }
        ServerMessage::Done {
            sentence_count,
            file_url,
            ..
        } => {
            info!(
                "Speech service reported stream done ({} sentences)",
                sentence_count.unwrap_or(0)
            );
            status.mark_stream_done(file_url).await;
            return true;
        }
        ServerMessage::Error { message } => {
            // Recognition errors degrade the transcript, they never kill
            // the session.
            warn!("Speech service error: {}", message);
        }
    }

    false
}
