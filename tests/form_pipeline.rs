//! End-to-end coverage of the form submission pipeline.

mod common;

use serde_json::{json, Value};

use common::TestApp;

fn valid_quote() -> Value {
    json!({
        "name": "Jane Doe",
        "email": "jane@example.com",
        "phone": "+256 772 423 092",
        "serviceType": "residential",
        "location": "Kampala",
        "message": "Weekly pickup for a four-bin household, please."
    })
}

#[tokio::test]
async fn quote_with_short_message_is_rejected() {
    let app = TestApp::spawn().await;

    let mut body = valid_quote();
    body["message"] = json!("Fifteen chars..");
    let response = app.post_form("/api/forms/quote", &body).await;

    assert_eq!(response.status(), 422);
    let reply: Value = response.json().await.unwrap();
    assert_eq!(reply["success"], false);
    assert!(reply["fieldErrors"]["message"][0]
        .as_str()
        .unwrap()
        .contains("at least 20"));
    assert_eq!(app.store.quote_count(), 0);
}

#[tokio::test]
async fn valid_quote_is_persisted_and_alerts_admin_once() {
    let app = TestApp::spawn().await;

    let response = app.post_form("/api/forms/quote", &valid_quote()).await;

    assert_eq!(response.status(), 200);
    let reply: Value = response.json().await.unwrap();
    assert_eq!(reply["success"], true);
    assert_eq!(app.store.quote_count(), 1);

    let admin = "info@wastecare.example";
    app.mailer
        .wait_for(|sent| sent.iter().any(|e| e.to == admin))
        .await;
    let alerts = app.mailer.sent_to(admin);
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].subject.contains("residential"));
    assert_eq!(alerts[0].reply_to.as_deref(), Some("jane@example.com"));
}

#[tokio::test]
async fn newsletter_signup_with_disposable_email_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/api/forms/newsletter",
            &json!({
                "email": "test@guerrillamail.com",
                "frequency": "weekly",
                "honeypot": ""
            }),
        )
        .await;

    assert_eq!(response.status(), 422);
    let reply: Value = response.json().await.unwrap();
    assert!(reply["fieldErrors"]["email"][0]
        .as_str()
        .unwrap()
        .contains("Disposable"));
    assert!(app.store.subscriber("test@guerrillamail.com").is_none());
}

#[tokio::test]
async fn newsletter_signup_subscribes_and_confirms() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/api/forms/newsletter",
            &json!({
                "email": "Member@Example.com",
                "name": "Jane",
                "frequency": "M",
                "honeypot": ""
            }),
        )
        .await;

    assert_eq!(response.status(), 200);
    // Email was normalized before persisting.
    let row = app.store.subscriber("member@example.com").unwrap();
    assert!(row.active);

    app.mailer
        .wait_for(|sent| sent.iter().any(|e| e.to == "member@example.com"))
        .await;
    let confirmations = app.mailer.sent_to("member@example.com");
    assert!(confirmations[0].html.contains(&row.token));
}

#[tokio::test]
async fn honeypot_rejection_is_generic_and_unpersisted() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/api/forms/comment",
            &json!({
                "postSlug": "recycling-tips",
                "name": "Spam Bot",
                "email": "bot@example.com",
                "content": "Nice post, very informative!",
                "honeypot": "https://spam.example"
            }),
        )
        .await;

    assert_eq!(response.status(), 400);
    let reply: Value = response.json().await.unwrap();
    assert_eq!(reply["success"], false);
    // No field-level detail for spam rejections.
    assert!(reply.get("fieldErrors").is_none());
    assert!(!reply["message"].as_str().unwrap().contains("honeypot"));
    assert_eq!(app.store.comment_count(), 0);
}

#[tokio::test]
async fn spam_phrases_in_comment_content_are_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/api/forms/comment",
            &json!({
                "postSlug": "recycling-tips",
                "name": "Promoter",
                "email": "promo@example.com",
                "content": "Get Rich Quick with this one trick",
                "honeypot": ""
            }),
        )
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(app.store.comment_count(), 0);
}

#[tokio::test]
async fn clean_comment_is_persisted() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/api/forms/comment",
            &json!({
                "postSlug": "recycling-tips",
                "name": "Reader",
                "email": "reader@example.com",
                "content": "We switched to weekly pickups and it works great.",
                "honeypot": ""
            }),
        )
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(app.store.comment_count(), 1);
}

#[tokio::test]
async fn rate_limit_kicks_in_past_the_ceiling() {
    let mut config = TestApp::test_config();
    config.rate_limit.quote.ceiling = 2;
    config.rate_limit.quote.window_secs = 600;
    let app = TestApp::spawn_with(config).await;

    for _ in 0..2 {
        let response = app.post_form("/api/forms/quote", &valid_quote()).await;
        assert_eq!(response.status(), 200);
    }
    let response = app.post_form("/api/forms/quote", &valid_quote()).await;
    assert_eq!(response.status(), 429);
    assert!(response.headers().contains_key("retry-after"));
    let reply: Value = response.json().await.unwrap();
    assert!(reply["message"].as_str().unwrap().contains("minute"));
    assert_eq!(app.store.quote_count(), 2);
}

#[tokio::test]
async fn unknown_fields_are_rejected() {
    let app = TestApp::spawn().await;

    let mut body = valid_quote();
    body["isAdmin"] = json!(true);
    let response = app.post_form("/api/forms/quote", &body).await;

    assert_eq!(response.status(), 422);
    let reply: Value = response.json().await.unwrap();
    assert_eq!(reply["fieldErrors"]["isAdmin"][0], "Unknown field");
}

#[tokio::test]
async fn inquiry_requires_phone() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/api/forms/inquiry",
            &json!({
                "serviceSlug": "skip-hire",
                "name": "Jane Doe",
                "email": "jane@example.com",
                "phone": "",
                "message": "Do you hire out mid-size skips for renovations?",
                "location": "Entebbe"
            }),
        )
        .await;

    assert_eq!(response.status(), 422);
    let reply: Value = response.json().await.unwrap();
    assert!(reply["fieldErrors"]["phone"][0]
        .as_str()
        .unwrap()
        .contains("required"));
}

#[tokio::test]
async fn application_with_oversized_resume_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/api/forms/application",
            &json!({
                "name": "Jane Doe",
                "email": "jane@example.com",
                "phone": "0772423092",
                "position": "driver",
                "resume": {
                    "filename": "resume.pdf",
                    "contentType": "application/pdf",
                    "sizeBytes": 50 * 1024 * 1024
                }
            }),
        )
        .await;

    assert_eq!(response.status(), 422);
    assert_eq!(app.store.application_count(), 0);
}

#[tokio::test]
async fn valid_application_is_persisted() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/api/forms/application",
            &json!({
                "name": "Jane Doe",
                "email": "jane@example.com",
                "phone": "0772423092",
                "position": "driver",
                "coverNote": "Five years of route driving experience.",
                "resume": {
                    "filename": "resume.pdf",
                    "contentType": "application/pdf",
                    "sizeBytes": 120_000
                }
            }),
        )
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(app.store.application_count(), 1);

    let admin = "info@wastecare.example";
    app.mailer
        .wait_for(|sent| sent.iter().any(|e| e.to == admin))
        .await;
    assert!(app.mailer.sent_to(admin)[0].subject.contains("driver"));
}

#[tokio::test]
async fn malformed_body_is_a_client_error() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/api/forms/quote"))
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}
