use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::path_regex;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::assert_is_redirect_to;
use crate::helpers::sheet_row_json;
use crate::helpers::spawn_app;

#[tokio::test]
async fn subscribe_sends_a_code_and_redirects_to_the_verify_page() {
    let app = spawn_app().await;
    app.mock_sheet_row_missing().await;
    Mock::given(method("POST"))
        .and(path("/email"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app
        .post_subscribe("email=john%40foo.com&topics=Technology&topics=Sports".to_string())
        .await;

    assert_is_redirect_to(&response, "/verify?email=john%40foo.com");
}

#[tokio::test]
async fn the_emailed_code_is_six_digits() {
    let app = spawn_app().await;
    app.mock_sheet_row_missing().await;
    app.mock_email_ok().await;

    app.post_subscribe("email=john%40foo.com&topics=Finance".to_string())
        .await;

    let code = app.extract_otp().await;
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn subscribe_returns_400_for_invalid_input() {
    let app = spawn_app().await;
    let cases = vec![
        ("topics=Technology", "missing email"),
        ("email=&topics=Technology", "empty email"),
        ("email=not-an-email&topics=Technology", "malformed email"),
        ("email=john%40foo.com", "no topics"),
        ("email=john%40foo.com&topics=Astrology", "unknown topic"),
        ("email=john%40foo.com&topics=technology", "wrong topic case"),
    ];

    for (body, case) in cases {
        let response = app.post_subscribe(body.to_string()).await;
        assert_eq!(response.status().as_u16(), 400, "no 400 for {case}");
    }
}

#[tokio::test]
async fn an_active_subscriber_is_sent_to_manage_instead() {
    let app = spawn_app().await;
    Mock::given(method("GET"))
        .and(path_regex("^/v1/sheets/.*/rows/.+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(sheet_row_json("john@foo.com", &["Technology"], "active")),
        )
        .mount(&app.sheet_server)
        .await;
    // no code may be emailed in this case
    Mock::given(method("POST"))
        .and(path("/email"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let response = app
        .post_subscribe("email=john%40foo.com&topics=Technology".to_string())
        .await;

    assert_is_redirect_to(&response, "/manage");
}

#[tokio::test]
async fn a_paused_subscriber_goes_through_verification_again() {
    let app = spawn_app().await;
    Mock::given(method("GET"))
        .and(path_regex("^/v1/sheets/.*/rows/.+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(sheet_row_json("john@foo.com", &["Sports"], "unsubscribed")),
        )
        .mount(&app.sheet_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/email"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app
        .post_subscribe("email=john%40foo.com&topics=Sports".to_string())
        .await;

    assert_is_redirect_to(&response, "/verify?email=john%40foo.com");
}

#[tokio::test]
async fn subscribe_returns_500_when_the_email_relay_fails() {
    let app = spawn_app().await;
    app.mock_sheet_row_missing().await;
    Mock::given(method("POST"))
        .and(path("/email"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.email_server)
        .await;

    let response = app
        .post_subscribe("email=john%40foo.com&topics=Technology".to_string())
        .await;

    assert_eq!(response.status().as_u16(), 500);
}

#[tokio::test]
async fn subscribe_returns_500_when_the_sheet_store_fails() {
    let app = spawn_app().await;
    Mock::given(method("GET"))
        .and(path_regex("^/v1/sheets/.*/rows/.+$"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.sheet_server)
        .await;

    let response = app
        .post_subscribe("email=john%40foo.com&topics=Technology".to_string())
        .await;

    assert_eq!(response.status().as_u16(), 500);
}

#[tokio::test]
async fn the_subscribe_form_lists_every_topic() {
    let app = spawn_app().await;

    let response = app.get("/subscribe").await;
    assert!(response.status().is_success());

    let html = response.text().await.unwrap();
    for topic in ["Technology", "Sports", "Politics", "Finance"] {
        assert!(html.contains(topic), "{topic} missing from form");
    }
}
