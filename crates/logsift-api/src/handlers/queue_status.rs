//! GET /api/queue-status - point-in-time job counts.

use crate::models::QueueStatusResponse;
use crate::state::ApiState;
use actix_web::{get, web, HttpResponse};

#[get("/queue-status")]
pub async fn queue_status(state: web::Data<ApiState>) -> HttpResponse {
    let stats = state.queue.stats();
    HttpResponse::Ok().json(QueueStatusResponse {
        completed: stats.completed,
        waiting: stats.waiting,
        active: stats.active,
    })
}
