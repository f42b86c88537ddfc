use actix_web::HttpResponse;
use actix_web_flash_messages::FlashMessage;

use crate::session_state::TypedSession;
use crate::utils::redirect;

/// `GET /logout`
pub async fn logout(session: TypedSession) -> HttpResponse {
    session.log_out();
    FlashMessage::info("You have been logged out.").send();
    redirect("/")
}
