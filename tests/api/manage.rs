use wiremock::matchers::method;
use wiremock::matchers::path_regex;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::assert_is_redirect_to;
use crate::helpers::sheet_row_json;
use crate::helpers::spawn_app;

#[tokio::test]
async fn without_a_session_the_page_asks_for_an_email() {
    let app = spawn_app().await;

    let response = app.get("/manage").await;
    assert!(response.status().is_success());

    let html = response.text().await.unwrap();
    assert!(html.contains("Verify your email"));
    assert!(html.contains(r#"action="/resend""#));
}

#[tokio::test]
async fn changing_preferences_without_a_session_is_bounced_back() {
    let app = spawn_app().await;

    let response = app.post_manage("action=pause".to_string()).await;
    assert_is_redirect_to(&response, "/manage");

    // nothing may have reached the store
    let requests = app.sheet_server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn with_a_session_the_page_shows_the_stored_preferences() {
    let app = spawn_app().await;
    // first lookup (during subscribe) misses, later ones return the row
    Mock::given(method("GET"))
        .and(path_regex("^/v1/sheets/.*/rows/.+$"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&app.sheet_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/v1/sheets/.*/rows/.+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(sheet_row_json("john@foo.com", &["Technology"], "active")),
        )
        .mount(&app.sheet_server)
        .await;
    app.mock_email_ok().await;
    app.mock_sheet_upsert_ok().await;

    let response = app
        .post_subscribe("email=john%40foo.com&topics=Technology".to_string())
        .await;
    assert_eq!(response.status().as_u16(), 303);
    let code = app.extract_otp().await;
    app.post_verify(format!("email=john%40foo.com&code={code}"))
        .await;

    let response = app.get("/manage").await;
    assert!(response.status().is_success());
    let html = response.text().await.unwrap();
    assert!(html.contains("Update preferences"));
    assert!(html.contains("Pause subscription"));
}

#[tokio::test]
async fn updating_topics_rewrites_the_row() {
    let app = spawn_app().await;
    Mock::given(method("GET"))
        .and(path_regex("^/v1/sheets/.*/rows/.+$"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&app.sheet_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/v1/sheets/.*/rows/.+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(sheet_row_json("john@foo.com", &["Technology"], "active")),
        )
        .mount(&app.sheet_server)
        .await;
    app.mock_email_ok().await;
    app.mock_sheet_upsert_ok().await;

    app.post_subscribe("email=john%40foo.com&topics=Technology".to_string())
        .await;
    let code = app.extract_otp().await;
    app.post_verify(format!("email=john%40foo.com&code={code}"))
        .await;

    let response = app
        .post_manage("action=update&topics=Finance&topics=Politics".to_string())
        .await;
    assert_is_redirect_to(&response, "/manage");

    let requests = app.sheet_server.received_requests().await.unwrap();
    let last_put = requests
        .iter()
        .filter(|r| r.method.as_str() == "PUT")
        .last()
        .expect("row rewritten");
    let row: serde_json::Value = last_put.body_json().unwrap();
    assert_eq!(row["topics"], serde_json::json!(["Finance", "Politics"]));
}

#[tokio::test]
async fn pausing_and_resuming_flip_the_stored_status() {
    let app = spawn_app().await;
    app.subscribe_and_verify("john@foo.com", "Sports").await;
    Mock::given(method("PATCH"))
        .and(path_regex("^/v1/sheets/.*/rows/.+$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.sheet_server)
        .await;

    let response = app.post_manage("action=pause".to_string()).await;
    assert_is_redirect_to(&response, "/manage");

    let response = app.post_manage("action=resume".to_string()).await;
    assert_is_redirect_to(&response, "/manage");

    let patches: Vec<serde_json::Value> = app
        .sheet_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "PATCH")
        .map(|r| r.body_json().unwrap())
        .collect();
    assert_eq!(patches[0]["status"], "unsubscribed");
    assert_eq!(patches[1]["status"], "active");
}

#[tokio::test]
async fn an_invalid_topic_selection_changes_nothing() {
    let app = spawn_app().await;
    app.subscribe_and_verify("john@foo.com", "Sports").await;
    let writes_before = app
        .sheet_server
        .received_requests()
        .await
        .unwrap()
        .len();

    let response = app
        .post_manage("action=update&topics=Astrology".to_string())
        .await;
    assert_is_redirect_to(&response, "/manage");

    let response = app.post_manage("action=update".to_string()).await;
    assert_is_redirect_to(&response, "/manage");

    let writes_after = app
        .sheet_server
        .received_requests()
        .await
        .unwrap()
        .len();
    assert_eq!(writes_before, writes_after);
}
