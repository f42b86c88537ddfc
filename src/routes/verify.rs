use std::fmt::Debug;

use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use actix_web_flash_messages::FlashMessage;
use actix_web_flash_messages::IncomingFlashMessages;
use anyhow::Context;
use serde::Deserialize;
use tera::Tera;

use super::error_chain_fmt;
use super::render;
use super::subscriptions::send_verification_email;
use super::subscriptions::DEFAULT_MAX_ITEMS;
use crate::domain::OtpCode;
use crate::domain::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::rate_limit::RateLimited;
use crate::rate_limit::RateLimiter;
use crate::session_state::TypedSession;
use crate::sheet_store::SheetStore;
use crate::sheet_store::SubscriberRow;
use crate::utils::client_ip;
use crate::utils::error_500;
use crate::utils::redirect;
use crate::verification::VerificationStore;
use crate::verification::VerifyError;

#[derive(thiserror::Error)]
pub enum VerifyActionError {
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    RateLimited(#[from] RateLimited),
    // NotFound / Expired / Mismatch / TooManyAttempts; the enum's Display
    // text is what the visitor sees
    #[error(transparent)]
    Rejected(#[from] VerifyError),
    #[error("Something went wrong on our side. Please try again later.")]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for VerifyActionError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)?;
        Ok(())
    }
}

impl ResponseError for VerifyActionError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Rejected(_) => StatusCode::UNAUTHORIZED,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Deserialize)]
pub struct VerifyQuery {
    email: Option<String>,
}

/// `GET /verify`
pub async fn verify_form(
    query: web::Query<VerifyQuery>,
    tera: web::Data<Tera>,
    flash: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    let mut ctx = tera::Context::new();
    ctx.insert("email", query.email.as_deref().unwrap_or(""));
    render(&tera, "verify.html", ctx, &flash)
}

#[derive(Deserialize)]
pub struct VerifyFormData {
    email: String,
    code: String,
}

/// `POST /verify`
///
/// Completes the flow: a matching, unexpired code consumes the pending
/// record, persists the subscriber row (when preferences were captured at
/// subscribe time) and opens a session for the verified address.
#[tracing::instrument(
    name = "Verifying code",
    skip(form, request, limiter, verifications, sheet, session),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn verify(
    form: web::Form<VerifyFormData>,
    request: HttpRequest,
    limiter: web::Data<RateLimiter>,
    verifications: web::Data<VerificationStore>,
    sheet: web::Data<SheetStore>,
    session: TypedSession,
) -> Result<HttpResponse, VerifyActionError> {
    limiter.check(&client_ip(&request))?;

    let email = SubscriberEmail::parse(form.0.email).map_err(VerifyActionError::InvalidInput)?;
    tracing::Span::current().record("subscriber_email", tracing::field::display(&email));
    let code = OtpCode::parse(form.0.code).map_err(VerifyActionError::InvalidInput)?;

    let profile = verifications.verify(&email, &code).map_err(|e| {
        tracing::warn!(error = %e, "verification rejected");
        e
    })?;

    // a row is written only now, never at subscribe time. An empty profile
    // means the code was issued for manage access; the existing row (if any)
    // is left untouched.
    if !profile.topics.is_empty() {
        let max_items = match profile.max_items {
            0 => DEFAULT_MAX_ITEMS,
            n => n,
        };
        let row = SubscriberRow::new(&email, profile.topics, max_items);
        sheet
            .upsert_subscriber(&row)
            .await
            .context("could not persist subscriber")?;
    }

    session.renew();
    session
        .insert_email(email.as_ref())
        .context("could not store session")?;

    FlashMessage::success("Subscription verified!").send();
    Ok(redirect("/thank-you"))
}

#[derive(Deserialize)]
pub struct ResendFormData {
    email: String,
}

/// `POST /resend`
///
/// Issues a fresh code for the address, keeping any preferences captured
/// earlier, and emails it. Also the entry point for manage access: verifying
/// a code issued here opens a session without touching the stored row.
#[tracing::instrument(
    name = "Resending verification code",
    skip(form, request, limiter, verifications, email_client)
)]
pub async fn resend(
    form: web::Form<ResendFormData>,
    request: HttpRequest,
    limiter: web::Data<RateLimiter>,
    verifications: web::Data<VerificationStore>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, VerifyActionError> {
    limiter.check(&client_ip(&request))?;

    let email = SubscriberEmail::parse(form.0.email).map_err(VerifyActionError::InvalidInput)?;

    let code = verifications.reissue(&email);
    send_verification_email(&email_client, &email, &code, verifications.ttl_minutes())
        .await
        .context("could not send verification code")?;

    FlashMessage::success("We sent you a fresh verification code.").send();
    Ok(redirect(&format!(
        "/verify?email={}",
        urlencoding::encode(email.as_ref())
    )))
}

/// Session guard shared by the pages that require a verified address; `None`
/// redirects to `/manage`'s email form rather than erroring
pub(super) fn session_email(session: &TypedSession) -> Result<Option<String>, actix_web::Error> {
    session.get_email().map_err(error_500)
}
