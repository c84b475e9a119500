//! Server-rendered page handler.
//!
//! Presentation is deliberately thin: the handler exists so the session
//! guard has real routes to gate and so CMS fetches flow through the
//! tag-indexed cache. A missing document renders the fallback shell, never
//! an error.

use axum::{
    extract::{Path, State},
    response::Html,
};

use crate::http::server::AppState;

pub async fn render_root(State(state): State<AppState>) -> Html<String> {
    render(&state, "home").await
}

pub async fn render_page(State(state): State<AppState>, Path(path): Path<String>) -> Html<String> {
    let slug = path.trim_matches('/').replace('/', "-");
    render(&state, &slug).await
}

async fn render(state: &AppState, slug: &str) -> Html<String> {
    match state.content.fetch("page", slug, &["pages"]).await {
        Some(doc) => {
            let title = doc
                .get("title")
                .and_then(|t| t.as_str())
                .unwrap_or("WasteCare");
            Html(shell(title))
        }
        None => Html(shell("WasteCare")),
    }
}

fn shell(title: &str) -> String {
    format!(
        "<!doctype html><html><head><title>{}</title></head>\
         <body><h1>{}</h1></body></html>",
        title, title
    )
}
