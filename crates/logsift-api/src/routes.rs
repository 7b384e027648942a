//! Route table for the HTTP server.
//!
//! Everything under `/api` requires the bearer token; the WebSocket
//! endpoint is open, matching the live channel contract (connect and
//! listen, no client protocol).

use crate::handlers;
use crate::middleware::BearerAuth;
use crate::state::ApiState;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, state: ApiState, auth_token: &str) {
    cfg.app_data(web::Data::new(state))
        .service(handlers::health::liveness)
        .service(handlers::ws::ws_entry)
        .service(handlers::files::download_blob)
        .service(
            web::scope("/api")
                .wrap(BearerAuth::new(auth_token))
                .service(handlers::upload::upload_logs)
                .service(handlers::queue_status::queue_status)
                .service(handlers::stats::stats_overview)
                .service(handlers::stats::stats_by_file),
        );
}
