//! Webhook and unsubscribe endpoint coverage.

mod common;

use serde_json::{json, Value};

use common::TestApp;

#[tokio::test]
async fn revalidate_rejects_wrong_secret() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/revalidate?secret=wrong"))
        .json(&json!({ "_type": "post" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = app
        .client
        .post(app.url("/api/revalidate"))
        .json(&json!({ "_type": "post" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn revalidate_reports_mapped_tags() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/revalidate?secret=test-secret"))
        .json(&json!({ "_type": "service" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let reply: Value = response.json().await.unwrap();
    assert_eq!(reply["revalidated"], true);
    let tags: Vec<&str> = reply["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["services", "pages"]);
    assert!(reply["now"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn revalidate_handles_unknown_types_without_erroring() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/revalidate?secret=test-secret"))
        .json(&json!({ "_type": "brand-new-type" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let reply: Value = response.json().await.unwrap();
    assert_eq!(reply["revalidated"], true);
    assert_eq!(reply["tags"].as_array().unwrap().len(), 0);
}

async fn subscribe(app: &TestApp, email: &str) -> String {
    let response = app
        .post_form(
            "/api/forms/newsletter",
            &json!({
                "email": email,
                "frequency": "weekly",
                "honeypot": ""
            }),
        )
        .await;
    assert_eq!(response.status(), 200);
    app.store.subscriber(email).unwrap().token
}

#[tokio::test]
async fn unsubscribe_deactivates_and_confirms() {
    let app = TestApp::spawn().await;
    let token = subscribe(&app, "leaver@example.com").await;

    let response = app
        .client
        .get(app.url(&format!("/newsletter/unsubscribe?token={token}")))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("unsubscribed"));
    assert!(!app.store.subscriber("leaver@example.com").unwrap().active);

    app.mailer
        .wait_for(|sent| {
            sent.iter()
                .any(|e| e.to == "leaver@example.com" && e.subject.contains("unsubscribed"))
        })
        .await;
}

#[tokio::test]
async fn unsubscribe_twice_redirects_with_inactive_flag() {
    let app = TestApp::spawn().await;
    let token = subscribe(&app, "leaver@example.com").await;

    let url = app.url(&format!("/newsletter/unsubscribe?token={token}"));
    app.client.get(&url).send().await.unwrap();

    let response = app.client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), 307);
    assert_eq!(
        response.headers()["location"],
        "/newsletter?unsubscribe=inactive"
    );
}

#[tokio::test]
async fn unsubscribe_with_bad_token_redirects_with_invalid_flag() {
    let app = TestApp::spawn().await;

    for path in [
        "/newsletter/unsubscribe?token=no-such-token",
        "/newsletter/unsubscribe",
    ] {
        let response = app.client.get(app.url(path)).send().await.unwrap();
        assert_eq!(response.status(), 307);
        assert_eq!(
            response.headers()["location"],
            "/newsletter?unsubscribe=invalid"
        );
    }
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = TestApp::spawn().await;
    let response = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn pages_render_fallback_when_content_is_absent() {
    let app = TestApp::spawn().await;

    let response = app.client.get(app.url("/")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("WasteCare"));
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = TestApp::spawn().await;
    let response = app.client.get(app.url("/health")).send().await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
