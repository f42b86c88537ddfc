use actix_web::web;
use actix_web::HttpResponse;
use actix_web_flash_messages::FlashMessage;
use actix_web_flash_messages::IncomingFlashMessages;
use serde::Deserialize;
use tera::Tera;

use super::render;
use crate::domain::SubscriberEmail;
use crate::session_state::TypedSession;
use crate::sheet_store::SheetStore;
use crate::sheet_store::SubscriberStatus;
use crate::utils::error_500;
use crate::utils::redirect;

/// `GET /unsubscribe`
pub async fn unsubscribe_form(
    tera: web::Data<Tera>,
    flash: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    render(&tera, "unsubscribe.html", tera::Context::new(), &flash)
}

#[derive(Deserialize)]
pub struct UnsubscribeFormData {
    email: String,
    /// `pause` keeps the row with status flipped; `delete` removes it
    action: String,
}

/// `POST /unsubscribe`
#[tracing::instrument(name = "Unsubscribing", skip(form, session, sheet), fields(action = %form.action))]
pub async fn unsubscribe(
    form: web::Form<UnsubscribeFormData>,
    session: TypedSession,
    sheet: web::Data<SheetStore>,
) -> Result<HttpResponse, actix_web::Error> {
    let email = match SubscriberEmail::parse(form.0.email) {
        Ok(email) => email,
        Err(_) => {
            FlashMessage::error("Please enter a valid email address.").send();
            return Ok(redirect("/unsubscribe"));
        }
    };

    let row = sheet
        .get_subscriber(email.as_ref())
        .await
        .map_err(error_500)?;
    if row.is_none() {
        FlashMessage::error("Email not found. You may not be subscribed.").send();
        return Ok(redirect("/unsubscribe"));
    }

    match form.0.action.as_str() {
        "pause" => {
            sheet
                .set_status(email.as_ref(), SubscriberStatus::Unsubscribed)
                .await
                .map_err(error_500)?;
            FlashMessage::success(
                "Your subscription has been paused. You can reactivate it anytime.",
            )
            .send();
        }
        "delete" => {
            sheet
                .delete_subscriber(email.as_ref())
                .await
                .map_err(error_500)?;
            // if the visitor deleted their own subscription, drop the session too
            if session
                .get_email()
                .map_err(error_500)?
                .is_some_and(|s| s == email.as_ref())
            {
                session.log_out();
            }
            FlashMessage::success("You have been unsubscribed and your data removed.").send();
        }
        _ => {
            FlashMessage::error("Invalid action selected.").send();
            return Ok(redirect("/unsubscribe"));
        }
    }

    Ok(redirect("/"))
}
