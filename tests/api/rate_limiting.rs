use crate::helpers::spawn_app_with;

#[tokio::test]
async fn requests_beyond_the_quota_get_429() {
    let app = spawn_app_with(|cfg| {
        cfg.rate_limit.max_requests = 3;
    })
    .await;

    // all requests come from the same address, so they share one counter
    for _ in 0..3 {
        let response = app
            .post_verify("email=nobody%40foo.com&code=123456".to_string())
            .await;
        assert_eq!(response.status().as_u16(), 401);
    }

    let response = app
        .post_verify("email=nobody%40foo.com&code=123456".to_string())
        .await;
    assert_eq!(response.status().as_u16(), 429);
}

#[tokio::test]
async fn subscribe_and_verify_draw_from_the_same_quota() {
    let app = spawn_app_with(|cfg| {
        cfg.rate_limit.max_requests = 2;
    })
    .await;
    app.mock_sheet_row_missing().await;
    app.mock_email_ok().await;

    let response = app
        .post_subscribe("email=john%40foo.com&topics=Technology".to_string())
        .await;
    assert_eq!(response.status().as_u16(), 303);

    let response = app
        .post_verify("email=john%40foo.com&code=000000".to_string())
        .await;
    assert_ne!(response.status().as_u16(), 429);

    let response = app
        .post_verify("email=john%40foo.com&code=000000".to_string())
        .await;
    assert_eq!(response.status().as_u16(), 429);
}

#[tokio::test]
async fn reads_are_not_rate_limited() {
    let app = spawn_app_with(|cfg| {
        cfg.rate_limit.max_requests = 1;
    })
    .await;

    for _ in 0..5 {
        let response = app.get("/health_check").await;
        assert!(response.status().is_success());
    }
}
