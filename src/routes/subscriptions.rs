use std::fmt::Debug;

use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use actix_web_flash_messages::FlashMessage;
use actix_web_flash_messages::IncomingFlashMessages;
use anyhow::Context;
use tera::Tera;

use super::error_chain_fmt;
use super::render;
use crate::domain::OtpCode;
use crate::domain::SubscriberEmail;
use crate::domain::Topic;
use crate::email_client::EmailClient;
use crate::rate_limit::RateLimited;
use crate::rate_limit::RateLimiter;
use crate::sheet_store::SheetStore;
use crate::sheet_store::SubscriberStatus;
use crate::utils::client_ip;
use crate::utils::redirect;
use crate::verification::PendingProfile;
use crate::verification::VerificationStore;

/// Articles per topic in a digest, until the subscriber says otherwise
pub(super) const DEFAULT_MAX_ITEMS: u32 = 3;

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    RateLimited(#[from] RateLimited),
    // the visitor sees a generic failure notice; the cause chain goes to the logs
    #[error("Something went wrong on our side. Please try again later.")]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for SubscribeError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)?;
        Ok(())
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `GET /subscribe`
pub async fn subscribe_form(
    tera: web::Data<Tera>,
    flash: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let mut ctx = tera::Context::new();
    ctx.insert("topics", &Topic::ALL.map(|t| t.as_str()));
    render(&tera, "subscribe.html", ctx, &flash)
}

/// The OTP email, in both flavours the relay expects
pub(super) fn verification_email_bodies(
    code: &OtpCode,
    ttl_minutes: i64,
) -> (String, String) {
    let html = format!(
        "<h1>Verify your newsletter subscription</h1>\
         <p>Your verification code is <strong>{code}</strong>.</p>\
         <p>This code expires in {ttl_minutes} minutes. \
         If you didn't request it, you can ignore this email.</p>",
        code = code.as_ref(),
    );
    let text = format!(
        "Your verification code is {}. It expires in {} minutes.",
        code.as_ref(),
        ttl_minutes,
    );
    (html, text)
}

#[tracing::instrument(
    name = "Sending verification code by email",
    skip(email_client, code)
)]
pub(super) async fn send_verification_email(
    email_client: &EmailClient,
    recipient: &SubscriberEmail,
    code: &OtpCode,
    ttl_minutes: i64,
) -> Result<(), reqwest::Error> {
    let (html, text) = verification_email_bodies(code, ttl_minutes);
    email_client
        .send_email(recipient, "Verify your newsletter subscription", &html, &text)
        .await
}

/// `POST /subscribe`
///
/// Multi-valued form (one `topics` entry per checked box), hence the
/// pair-list extractor instead of a struct.
///
/// Starts the flow: validates input, records a pending verification with the
/// requested preferences, and emails the code. The subscriber row is only
/// written after `POST /verify` succeeds.
#[tracing::instrument(
    name = "Starting subscription",
    skip(form, request, limiter, verifications, sheet, email_client),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn subscribe(
    form: web::Form<Vec<(String, String)>>,
    request: HttpRequest,
    limiter: web::Data<RateLimiter>,
    verifications: web::Data<VerificationStore>,
    sheet: web::Data<SheetStore>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, SubscribeError> {
    limiter.check(&client_ip(&request))?;

    let mut raw_email = None;
    let mut raw_topics = Vec::new();
    for (key, value) in form.0 {
        match key.as_str() {
            "email" => raw_email = Some(value),
            "topics" => raw_topics.push(value),
            _ => {}
        }
    }

    let email = SubscriberEmail::parse(raw_email.unwrap_or_default())
        .map_err(SubscribeError::InvalidInput)?;
    tracing::Span::current().record("subscriber_email", tracing::field::display(&email));

    let topics = raw_topics
        .iter()
        .map(|t| Topic::parse(t))
        .collect::<Result<Vec<_>, _>>()
        .map_err(SubscribeError::InvalidInput)?;
    if topics.is_empty() {
        return Err(SubscribeError::InvalidInput(
            "Select at least one topic".to_string(),
        ));
    }

    let existing = sheet
        .get_subscriber(email.as_ref())
        .await
        .context("could not check subscription status")?;
    if existing.is_some_and(|row| row.status == SubscriberStatus::Active) {
        FlashMessage::info("You are already subscribed. Manage your preferences below.").send();
        return Ok(redirect("/manage"));
    }

    let code = verifications.issue(
        &email,
        PendingProfile {
            topics,
            max_items: DEFAULT_MAX_ITEMS,
        },
    );
    send_verification_email(&email_client, &email, &code, verifications.ttl_minutes())
        .await
        .context("could not send verification code")?;

    FlashMessage::success("We sent a verification code to your email.").send();
    Ok(redirect(&format!(
        "/verify?email={}",
        urlencoding::encode(email.as_ref())
    )))
}
