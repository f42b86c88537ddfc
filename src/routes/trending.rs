use actix_web::web;
use actix_web::HttpResponse;
use actix_web_flash_messages::IncomingFlashMessages;
use tera::Tera;

use super::render;
use crate::news::trending_digest;
use crate::news::NewsCache;
use crate::news::NewsClient;
use crate::startup::TrendingPageSize;

/// `GET /trending`
///
/// All topics, straight from the aggregator (through the cache). Topics
/// whose fetch failed render as an empty section; the page never 500s on the
/// aggregator's behalf.
pub async fn trending(
    tera: web::Data<Tera>,
    flash: IncomingFlashMessages,
    news_client: web::Data<NewsClient>,
    news_cache: web::Data<NewsCache>,
    page_size: web::Data<TrendingPageSize>,
) -> Result<HttpResponse, actix_web::Error> {
    let digest = trending_digest(&news_client, &news_cache, page_size.0).await;

    let mut ctx = tera::Context::new();
    ctx.insert(
        "trending",
        &digest
            .iter()
            .map(|(topic, articles)| {
                serde_json::json!({ "topic": topic.as_str(), "articles": articles })
            })
            .collect::<Vec<_>>(),
    );
    render(&tera, "trending.html", ctx, &flash)
}

/// `GET /thank-you`
pub async fn thank_you(
    tera: web::Data<Tera>,
    flash: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    render(&tera, "thank_you.html", tera::Context::new(), &flash)
}
