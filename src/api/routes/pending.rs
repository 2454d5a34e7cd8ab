//! Pending upload inspection endpoints.

use axum::{extract::Query, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::api::error::{ApiError, ApiResult};
use crate::db::{self, pending::PendingUploadRepository};

pub fn router() -> Router {
    Router::new().route("/", get(list_pending))
}

async fn list_pending(Query(params): Query<HashMap<String, String>>) -> ApiResult<Json<Value>> {
    let limit: usize = params
        .get("limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(20);

    let entries = tokio::task::spawn_blocking(move || {
        let conn = db::init_db()?;
        PendingUploadRepository::list(&conn, limit)
    })
    .await
    .map_err(|e| ApiError::internal(e.to_string()))??;

    let entries: Vec<Value> = entries
        .iter()
        .map(|entry| {
            json!({
                "id": entry.id,
                "meeting_id": entry.meeting_id,
                "session_id": entry.session_id,
                "created_at": entry.created_at,
            })
        })
        .collect();

    Ok(Json(json!({ "pending": entries })))
}
