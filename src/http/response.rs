//! Uniform wire shape for form submissions.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::forms::dispatcher::{rate_limited_message, SubmissionOutcome, GENERIC_FAILURE};
use crate::forms::schema::FieldErrors;

/// The reply every form endpoint returns.
#[derive(Debug, Serialize)]
pub struct SubmissionReply {
    pub success: bool,
    pub message: String,
    #[serde(rename = "fieldErrors", skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
}

impl SubmissionReply {
    fn ok(message: String) -> Self {
        Self {
            success: true,
            message,
            field_errors: None,
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            field_errors: None,
        }
    }
}

/// Map a pipeline outcome onto status code, headers and body.
pub fn submission_response(outcome: SubmissionOutcome) -> Response {
    match outcome {
        SubmissionOutcome::Accepted { message } => {
            (StatusCode::OK, Json(SubmissionReply::ok(message))).into_response()
        }
        SubmissionOutcome::Invalid { field_errors } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(SubmissionReply {
                success: false,
                message: "Please correct the highlighted fields.".to_string(),
                field_errors: Some(field_errors),
            }),
        )
            .into_response(),
        SubmissionOutcome::RateLimited { retry_after_secs } => (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after_secs.to_string())],
            Json(SubmissionReply::fail(rate_limited_message(
                retry_after_secs,
            ))),
        )
            .into_response(),
        // Spam and persistence failures share one generic message; the
        // distinction lives in logs and metrics only.
        SubmissionOutcome::Rejected => (
            StatusCode::BAD_REQUEST,
            Json(SubmissionReply::fail(GENERIC_FAILURE)),
        )
            .into_response(),
        SubmissionOutcome::Failed => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SubmissionReply::fail(GENERIC_FAILURE)),
        )
            .into_response(),
    }
}
