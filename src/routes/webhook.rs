//! CMS cache-invalidation webhook.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct RevalidatePayload {
    #[serde(rename = "_type")]
    pub doc_type: String,
}

/// `POST /api/revalidate?secret=...` with a `{_type}` body.
///
/// Secret mismatch is a 401; a configured-empty secret rejects everything.
/// Unknown document types revalidate zero tags rather than erroring, so a
/// CMS schema addition cannot break publishing.
pub async fn revalidate(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    Json(payload): Json<RevalidatePayload>,
) -> Response {
    let config = state.config.load_full();
    let expected = &config.webhook.secret;
    let provided = params.get("secret").map(String::as_str).unwrap_or("");
    if expected.is_empty() || provided != expected {
        tracing::warn!("Revalidation webhook rejected: secret mismatch");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid secret" })),
        )
            .into_response();
    }

    let tags = config
        .webhook
        .tag_map
        .get(&payload.doc_type)
        .cloned()
        .unwrap_or_default();
    let dropped = state.content.invalidate(&tags);

    tracing::info!(
        doc_type = %payload.doc_type,
        tags = ?tags,
        dropped,
        "Cache revalidated"
    );

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    Json(json!({
        "revalidated": true,
        "tags": tags,
        "now": now,
    }))
    .into_response()
}
