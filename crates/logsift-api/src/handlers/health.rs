//! GET / - liveness probe.

use actix_web::{get, HttpResponse};

#[get("/")]
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(concat!("logsift v", env!("CARGO_PKG_VERSION"), "\n"))
}
