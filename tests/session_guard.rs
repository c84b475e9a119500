//! Integration coverage of the session-aware route guard.

mod common;

use serde_json::{json, Value};

use common::{TestApp, REFRESHED_COOKIE, VALID_SESSION_COOKIE};

#[tokio::test]
async fn protected_path_without_session_redirects_to_login() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/dashboard"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 307);
    assert_eq!(
        response.headers()["location"],
        "/login?redirectTo=%2Fdashboard"
    );
}

#[tokio::test]
async fn parameterized_protected_path_redirects_with_full_target() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/requests/req-42/edit"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 307);
    assert_eq!(
        response.headers()["location"],
        "/login?redirectTo=%2Frequests%2Freq-42%2Fedit"
    );
}

#[tokio::test]
async fn protected_path_with_session_passes_and_refreshes_cookies() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/dashboard"))
        .header("cookie", VALID_SESSION_COOKIE)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let refreshed: Vec<_> = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(refreshed.contains(&REFRESHED_COOKIE.to_string()));
}

#[tokio::test]
async fn login_with_session_redirects_to_landing() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/login"))
        .header("cookie", VALID_SESSION_COOKIE)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 307);
    assert_eq!(response.headers()["location"], "/dashboard");
}

#[tokio::test]
async fn login_without_session_passes_through() {
    let app = TestApp::spawn().await;

    let response = app.client.get(app.url("/login")).send().await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn public_path_without_session_passes_through_unchanged() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/services/skip-hire"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.headers().get("set-cookie").is_none());
}

#[tokio::test]
async fn profile_update_requires_a_session() {
    let app = TestApp::spawn().await;

    let body = json!({ "name": "Jane Doe", "phone": "0772423092" });
    let response = app.post_form("/api/account/profile", &body).await;
    // The guard redirects before the handler ever runs.
    assert_eq!(response.status(), 307);
    assert!(app.store.profile("user-1").is_none());
}

#[tokio::test]
async fn profile_update_with_session_persists_the_caller_row() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/account/profile"))
        .header("cookie", VALID_SESSION_COOKIE)
        .json(&json!({ "name": "Jane Doe", "address": "Plot 14, Kampala" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let reply: Value = response.json().await.unwrap();
    assert_eq!(reply["success"], true);

    let profile = app.store.profile("user-1").unwrap();
    assert_eq!(profile.name, "Jane Doe");
    assert_eq!(profile.address.as_deref(), Some("Plot 14, Kampala"));
}
