use actix_web::web;
use actix_web::HttpResponse;
use actix_web_flash_messages::IncomingFlashMessages;
use tera::Tera;

use super::render;

/// `GET /about`
pub async fn about(
    tera: web::Data<Tera>,
    flash: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    render(&tera, "about.html", tera::Context::new(), &flash)
}
