use actix_web::web;
use actix_web::HttpResponse;
use actix_web_flash_messages::IncomingFlashMessages;
use tera::Tera;

use super::render;
use crate::news::trending_digest;
use crate::news::NewsCache;
use crate::news::NewsClient;
use crate::session_state::TypedSession;
use crate::sheet_store::SheetStore;
use crate::sheet_store::SubscriberStatus;
use crate::utils::error_500;

/// Fewer stories on the homepage than on `/trending`
const HOME_PAGE_SIZE: u32 = 5;

/// `GET /`
///
/// Homepage with a trending teaser and, for a visitor with a verified
/// session, their subscription state. A store failure here is logged and
/// rendered as "not subscribed" instead of failing the whole page.
pub async fn home(
    tera: web::Data<Tera>,
    flash: IncomingFlashMessages,
    session: TypedSession,
    sheet: web::Data<SheetStore>,
    news_client: web::Data<NewsClient>,
    news_cache: web::Data<NewsCache>,
) -> Result<HttpResponse, actix_web::Error> {
    let trending = trending_digest(&news_client, &news_cache, HOME_PAGE_SIZE).await;

    let user_email = session.get_email().map_err(error_500)?;
    let is_subscribed = match &user_email {
        Some(email) => match sheet.get_subscriber(email).await {
            Ok(row) => row.is_some_and(|r| r.status == SubscriberStatus::Active),
            Err(e) => {
                tracing::error!(error = ?e, "could not check subscription status");
                false
            }
        },
        None => false,
    };

    let mut ctx = tera::Context::new();
    ctx.insert(
        "trending",
        &trending
            .iter()
            .map(|(topic, articles)| {
                serde_json::json!({ "topic": topic.as_str(), "articles": articles })
            })
            .collect::<Vec<_>>(),
    );
    ctx.insert("user_email", &user_email);
    ctx.insert("is_subscribed", &is_subscribed);
    render(&tera, "home.html", ctx, &flash)
}
