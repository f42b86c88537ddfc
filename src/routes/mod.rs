mod about;
mod admin;
mod health_check;
mod home;
mod logout;
mod manage;
mod subscriptions;
mod trending;
mod unsubscribe;
mod verify;

pub use about::about;
pub use admin::admin_dashboard;
pub use health_check::health_check;
pub use home::home;
pub use logout::logout;
pub use manage::manage;
pub use manage::manage_form;
pub use subscriptions::subscribe;
pub use subscriptions::subscribe_form;
pub use trending::thank_you;
pub use trending::trending;
pub use unsubscribe::unsubscribe;
pub use unsubscribe::unsubscribe_form;
pub use verify::resend;
pub use verify::verify;
pub use verify::verify_form;

use actix_web::http::header::ContentType;
use actix_web::HttpResponse;
use actix_web_flash_messages::IncomingFlashMessages;
use tera::Tera;

use crate::utils::error_500;

/// Walk the `source` chain so the whole cause of a failure ends up in the
/// logs, not just the outermost message
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

/// Render a Tera template to a HTML response, injecting any flash messages
/// left by the previous request under the `messages` key
pub fn render(
    tera: &Tera,
    template: &str,
    mut ctx: tera::Context,
    flash: &IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let messages: Vec<_> = flash
        .iter()
        .map(|m| {
            serde_json::json!({
                "level": format!("{:?}", m.level()).to_lowercase(),
                "content": m.content(),
            })
        })
        .collect();
    ctx.insert("messages", &messages);

    let body = tera.render(template, &ctx).map_err(error_500)?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(body))
}
