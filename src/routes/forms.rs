//! Form submission endpoints.
//!
//! Thin adapters: extract the requester fingerprint and the raw payload,
//! hand both to the pipeline, map the outcome onto the wire.

use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    response::Response,
    Json,
};
use serde_json::Value;
use std::net::SocketAddr;

use crate::forms::schema::RawForm;
use crate::forms::FormKind;
use crate::http::request::client_fingerprint;
use crate::http::response::submission_response;
use crate::http::server::AppState;
use crate::session::SessionUser;

async fn submit(
    state: AppState,
    kind: FormKind,
    addr: SocketAddr,
    headers: HeaderMap,
    body: Value,
    user: Option<&SessionUser>,
) -> Response {
    let identity = client_fingerprint(&headers, addr);
    let raw = RawForm::from_value(body);
    let outcome = state.pipeline.submit(kind, raw, &identity, user).await;
    submission_response(outcome)
}

pub async fn submit_newsletter(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    submit(state, FormKind::Newsletter, addr, headers, body, None).await
}

pub async fn submit_quote(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    submit(state, FormKind::Quote, addr, headers, body, None).await
}

pub async fn submit_inquiry(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    submit(state, FormKind::Inquiry, addr, headers, body, None).await
}

pub async fn submit_comment(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    submit(state, FormKind::Comment, addr, headers, body, None).await
}

pub async fn submit_application(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    submit(state, FormKind::Application, addr, headers, body, None).await
}

/// Profile updates sit under a protected path; the guard has already
/// validated the session and attached the user.
pub async fn submit_profile(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    user: SessionUser,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    submit(
        state,
        FormKind::Profile,
        addr,
        headers,
        body,
        Some(&user),
    )
    .await
}
