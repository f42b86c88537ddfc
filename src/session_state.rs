use std::future::ready;
use std::future::Ready;

use actix_session::Session;
use actix_session::SessionExt;
use actix_session::SessionGetError;
use actix_session::SessionInsertError;
use actix_web::FromRequest;

/// Wrapper around `actix_session::Session`, so the session key lives in one
/// place instead of being a stringly-typed constant at every callsite. A
/// session exists only after a visitor has proven control of their address
/// via OTP.
pub struct TypedSession(Session);

impl TypedSession {
    const EMAIL_KEY: &'static str = "email";

    pub fn renew(&self) { self.0.renew(); }

    pub fn insert_email(
        &self,
        email: &str,
    ) -> Result<(), SessionInsertError> {
        self.0.insert(Self::EMAIL_KEY, email)
    }

    pub fn get_email(&self) -> Result<Option<String>, SessionGetError> {
        self.0.get(Self::EMAIL_KEY)
    }

    pub fn log_out(&self) { self.0.purge() }
}

impl FromRequest for TypedSession {
    // reuse the error type of `Session`'s own `FromRequest` impl
    type Error = <Session as FromRequest>::Error;

    type Future = Ready<Result<TypedSession, Self::Error>>;

    // session management needs no I/O, so the extractor resolves immediately
    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        ready(Ok(TypedSession(req.get_session())))
    }
}
