use std::fmt::Debug;
use std::fmt::Display;

use actix_web::http::header::LOCATION;
use actix_web::HttpRequest;
use actix_web::HttpResponse;

/// Convert arbitrary error types to `actix_web::Error` with HTTP 500
pub fn error_500<T>(e: T) -> actix_web::Error
where
    T: Debug + Display + 'static,
{
    actix_web::error::ErrorInternalServerError(e)
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

/// Client identity used as the rate-limit key. Honours `X-Forwarded-For`
/// (via `realip_remote_addr`) so limiting still works behind the usual
/// reverse proxy; falls back to the peer address.
pub fn client_ip(req: &HttpRequest) -> String {
    let info = req.connection_info();
    let addr = info.realip_remote_addr().unwrap_or("unknown");
    // peer addresses come with a port attached; one client must map to one key
    match addr.parse::<std::net::SocketAddr>() {
        Ok(sock) => sock.ip().to_string(),
        Err(_) => addr.to_string(),
    }
}
