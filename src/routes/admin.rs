use std::collections::HashMap;

use actix_web::web;
use actix_web::HttpResponse;
use actix_web_flash_messages::IncomingFlashMessages;
use tera::Tera;

use super::render;
use crate::domain::Topic;
use crate::sheet_store::SheetStore;
use crate::sheet_store::SubscriberRow;
use crate::sheet_store::SubscriberStatus;
use crate::utils::error_500;

const RECENT_SIGNUPS: usize = 10;

/// Subscriber counts shown on the dashboard, computed from a full row
/// listing. The sheet is small by assumption; if it ever stops being small,
/// counting belongs on the store side.
struct Stats {
    total: usize,
    active: usize,
    unsubscribed: usize,
    per_topic: HashMap<&'static str, usize>,
    recent: Vec<SubscriberRow>,
}

fn compute_stats(mut rows: Vec<SubscriberRow>) -> Stats {
    let total = rows.len();
    let active = rows
        .iter()
        .filter(|r| r.status == SubscriberStatus::Active)
        .count();

    let mut per_topic = HashMap::new();
    for topic in Topic::ALL {
        let count = rows.iter().filter(|r| r.topics.contains(&topic)).count();
        per_topic.insert(topic.as_str(), count);
    }

    rows.sort_by(|a, b| b.subscribed_at.cmp(&a.subscribed_at));
    rows.truncate(RECENT_SIGNUPS);

    Stats {
        total,
        active,
        unsubscribed: total - active,
        per_topic,
        recent: rows,
    }
}

/// `GET /admin`
///
/// Minimal view of subscriber counts. A store failure is a 500 with the
/// cause in the logs, per the no-masking rule for external services.
#[tracing::instrument(name = "Rendering admin dashboard", skip(tera, flash, sheet))]
pub async fn admin_dashboard(
    tera: web::Data<Tera>,
    flash: IncomingFlashMessages,
    sheet: web::Data<SheetStore>,
) -> Result<HttpResponse, actix_web::Error> {
    let rows = sheet.list_subscribers().await.map_err(|e| {
        tracing::error!(error = ?e, "could not list subscribers");
        error_500(e)
    })?;
    let stats = compute_stats(rows);

    let mut ctx = tera::Context::new();
    ctx.insert("total", &stats.total);
    ctx.insert("active", &stats.active);
    ctx.insert("unsubscribed", &stats.unsubscribed);
    ctx.insert("per_topic", &stats.per_topic);
    ctx.insert("recent", &stats.recent);
    render(&tera, "admin.html", ctx, &flash)
}
