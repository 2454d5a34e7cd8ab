//! Control API for notula.
//!
//! Provides HTTP endpoints for:
//! - Session control (start, pause, resume, finish)
//! - Live transcript view
//! - Pending upload inspection

pub mod error;
pub mod routes;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tracing::info;

pub use routes::session::{ApiCommand, SessionRoutesState, SessionStartRequest};

pub struct ApiServer {
    port: u16,
    session_state: SessionRoutesState,
}

impl ApiServer {
    pub fn new(port: u16, session_state: SessionRoutesState) -> Self {
        Self {
            port,
            session_state,
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = Router::new()
            // Root and version endpoints
            .route("/", get(status))
            .route("/version", get(version))
            // Session control and live view
            .merge(routes::session::router(self.session_state))
            // Recovery store inspection
            .nest("/pending", routes::pending::router())
            .layer(ServiceBuilder::new());

        let listener = tokio::net::TcpListener::bind(&format!("127.0.0.1:{}", self.port)).await?;

        info!("Control API listening on http://127.0.0.1:{}", self.port);
        info!("Endpoints:");
        info!("  GET  /                    - Service info");
        info!("  GET  /version             - Version info");
        info!("  POST /session/start       - Start recording a meeting");
        info!("  POST /session/pause       - Pause the session");
        info!("  POST /session/resume      - Resume the session");
        info!("  POST /session/finish      - Finish and persist the session");
        info!("  GET  /session/status      - Session status");
        info!("  GET  /session/transcript  - Live transcript view");
        info!("  GET  /pending             - List parked finish payloads");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "notula",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "notula"
    }))
}
