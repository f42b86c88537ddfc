use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;

async fn mock_headlines(
    news_server: &MockServer,
    expect: u64,
) {
    let body = serde_json::json!({
        "status": "ok",
        "articles": [
            {
                "title": "Big news",
                "description": "Something happened",
                "source": { "name": "Reuters" },
                "url": "https://example.com/1",
                "publishedAt": "2026-08-20T00:00:00Z"
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/v2/top-headlines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expect)
        .mount(news_server)
        .await;
}

#[tokio::test]
async fn trending_shows_a_section_per_topic() {
    let app = spawn_app().await;
    mock_headlines(&app.news_server, 4).await;

    let response = app.get("/trending").await;
    assert!(response.status().is_success());

    let html = response.text().await.unwrap();
    for topic in ["Technology", "Sports", "Politics", "Finance"] {
        assert!(html.contains(topic), "{topic} section missing");
    }
    assert!(html.contains("Big news"));
    assert!(html.contains("Reuters"));
}

#[tokio::test]
async fn a_second_visit_is_served_from_the_cache() {
    let app = spawn_app().await;
    // one upstream fetch per topic, despite two page loads
    mock_headlines(&app.news_server, 4).await;

    let first = app.get("/trending").await;
    assert!(first.status().is_success());

    let second = app.get("/trending").await;
    assert!(second.status().is_success());
    // the expect(4) above is asserted when `app.news_server` drops
}

#[tokio::test]
async fn a_failing_aggregator_does_not_take_the_page_down() {
    let app = spawn_app().await;
    Mock::given(method("GET"))
        .and(path("/v2/top-headlines"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.news_server)
        .await;

    let response = app.get("/trending").await;
    assert!(response.status().is_success());

    let html = response.text().await.unwrap();
    assert!(html.contains("No news available"));
}

#[tokio::test]
async fn the_configured_page_size_is_passed_upstream() {
    let app = spawn_app().await;
    // trending_page_size is 8 in the base configuration
    Mock::given(method("GET"))
        .and(path("/v2/top-headlines"))
        .and(query_param("pageSize", "8"))
        .and(query_param("language", "en"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "status": "ok", "articles": [] })),
        )
        .expect(4)
        .mount(&app.news_server)
        .await;

    let response = app.get("/trending").await;
    assert!(response.status().is_success());
}

#[tokio::test]
async fn the_homepage_renders_even_when_news_is_unavailable() {
    let app = spawn_app().await;
    // nothing mounted on the news server; every fetch 404s

    let response = app.get("/").await;
    assert!(response.status().is_success());

    let html = response.text().await.unwrap();
    assert!(html.contains("Subscribe"));
    assert!(html.contains("No news available"));
}
