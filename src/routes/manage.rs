use actix_web::web;
use actix_web::HttpResponse;
use actix_web_flash_messages::FlashMessage;
use actix_web_flash_messages::IncomingFlashMessages;
use tera::Tera;

use super::render;
use super::verify::session_email;
use crate::domain::Topic;
use crate::session_state::TypedSession;
use crate::sheet_store::SheetStore;
use crate::sheet_store::SubscriberStatus;
use crate::utils::error_500;
use crate::utils::redirect;

/// `GET /manage`
///
/// Without a verified session this renders the email form (which feeds the
/// OTP flow via `/resend`); with one, the current preferences and
/// pause/resume state.
pub async fn manage_form(
    tera: web::Data<Tera>,
    flash: IncomingFlashMessages,
    session: TypedSession,
    sheet: web::Data<SheetStore>,
) -> Result<HttpResponse, actix_web::Error> {
    let mut ctx = tera::Context::new();
    ctx.insert("topics", &Topic::ALL.map(|t| t.as_str()));

    let email = session_email(&session)?;
    let row = match &email {
        Some(email) => sheet.get_subscriber(email).await.map_err(error_500)?,
        None => None,
    };

    ctx.insert("user_email", &email);
    match row {
        Some(row) => {
            ctx.insert("subscribed", &true);
            ctx.insert(
                "current",
                &row.topics.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
            );
            ctx.insert("active", &(row.status == SubscriberStatus::Active));
        }
        None => {
            ctx.insert("subscribed", &false);
            ctx.insert("current", &Vec::<&str>::new());
            ctx.insert("active", &false);
        }
    }
    render(&tera, "manage.html", ctx, &flash)
}

/// `POST /manage`
///
/// Multi-valued form: an `action` field (`update` / `pause` / `resume`) plus
/// one `topics` entry per checked box. Requires a verified session; everyone
/// else is bounced back to the email form.
#[tracing::instrument(name = "Updating subscription", skip(form, session, sheet))]
pub async fn manage(
    form: web::Form<Vec<(String, String)>>,
    session: TypedSession,
    sheet: web::Data<SheetStore>,
) -> Result<HttpResponse, actix_web::Error> {
    let email = match session_email(&session)? {
        Some(email) => email,
        None => {
            FlashMessage::error("Please verify your email first.").send();
            return Ok(redirect("/manage"));
        }
    };

    let mut action = String::new();
    let mut raw_topics = Vec::new();
    for (key, value) in form.0 {
        match key.as_str() {
            "action" => action = value,
            "topics" => raw_topics.push(value),
            _ => {}
        }
    }

    match action.as_str() {
        "update" => {
            let topics = match raw_topics
                .iter()
                .map(|t| Topic::parse(t))
                .collect::<Result<Vec<_>, _>>()
            {
                Ok(topics) if !topics.is_empty() => topics,
                _ => {
                    FlashMessage::error("Please select valid categories only.").send();
                    return Ok(redirect("/manage"));
                }
            };
            let mut row = match sheet.get_subscriber(&email).await.map_err(error_500)? {
                Some(row) => row,
                None => {
                    FlashMessage::error("You are not subscribed yet.").send();
                    return Ok(redirect("/subscribe"));
                }
            };
            row.topics = topics;
            sheet.upsert_subscriber(&row).await.map_err(error_500)?;
            FlashMessage::success("Preferences updated.").send();
        }
        "pause" => {
            sheet
                .set_status(&email, SubscriberStatus::Unsubscribed)
                .await
                .map_err(error_500)?;
            FlashMessage::success("Your subscription has been paused.").send();
        }
        "resume" => {
            sheet
                .set_status(&email, SubscriberStatus::Active)
                .await
                .map_err(error_500)?;
            FlashMessage::success("Your subscription has been reactivated.").send();
        }
        _ => {
            FlashMessage::error("Invalid action.").send();
        }
    }

    Ok(redirect("/manage"))
}
