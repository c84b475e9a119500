//! Newsletter unsubscribe endpoint.
//!
//! Keyed by the opaque per-subscriber token minted at signup. A valid,
//! active token deactivates the subscription and confirms by email; an
//! invalid or already-inactive token redirects to a query-flagged state on
//! the newsletter page instead of erroring.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::http::server::AppState;
use crate::notifications::{dispatch, OutboundEmail};

const NEWSLETTER_PAGE: &str = "/newsletter";

#[derive(Debug, Deserialize)]
pub struct UnsubscribeParams {
    #[serde(default)]
    pub token: String,
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    Query(params): Query<UnsubscribeParams>,
) -> Response {
    if params.token.is_empty() {
        return flagged("invalid");
    }

    let row = match state.store.find_subscriber_by_token(&params.token).await {
        Ok(row) => row,
        Err(e) => {
            tracing::error!(error = %e, "Unsubscribe lookup failed");
            return flagged("error");
        }
    };
    let Some(row) = row else {
        return flagged("invalid");
    };
    if !row.active {
        return flagged("inactive");
    }

    if let Err(e) = state.store.deactivate_subscriber(&params.token).await {
        tracing::error!(error = %e, "Unsubscribe update failed");
        return flagged("error");
    }
    tracing::info!(email = %row.email, "Subscriber unsubscribed");

    dispatch(
        state.mailer.clone(),
        OutboundEmail {
            to: row.email.clone(),
            subject: "You have been unsubscribed".to_string(),
            html: "<p>You will no longer receive the WasteCare newsletter. \
                   Subscribe again any time from our website.</p>"
                .to_string(),
            reply_to: None,
        },
    );

    Html(
        "<!doctype html><html><head><title>Unsubscribed</title></head>\
         <body><h1>You're unsubscribed</h1>\
         <p>You will no longer receive our newsletter.</p></body></html>"
            .to_string(),
    )
    .into_response()
}

fn flagged(flag: &str) -> Response {
    Redirect::temporary(&format!("{NEWSLETTER_PAGE}?unsubscribe={flag}")).into_response()
}
