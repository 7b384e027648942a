//! GET /ws - upgrade to the live event channel.

use crate::actors::WsSession;
use crate::state::ApiState;
use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;

/// Upgrade the request to a WebSocket session. The session receives
/// every queue lifecycle event emitted after it connects; no backfill.
#[get("/ws")]
pub async fn ws_entry(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<ApiState>,
) -> Result<HttpResponse, Error> {
    ws::start(WsSession::new(state.registry.clone()), &req, stream)
}
