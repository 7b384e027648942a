//! GET /api/stats and GET /api/stats/{fileId} - analysis results.

use crate::models::ErrorResponse;
use crate::state::ApiState;
use actix_web::{get, web, HttpResponse};
use logsift_commons::FileId;
use logsift_store::aggregate;

/// Cross-file rollup: total errors, top keywords, unique IP count.
#[get("/stats")]
pub async fn stats_overview(state: web::Data<ApiState>) -> HttpResponse {
    match state.results.select_all().await {
        Ok(records) => HttpResponse::Ok().json(aggregate(&records)),
        Err(e) => {
            log::error!("Failed to read results for overview: {}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new("result store unavailable"))
        }
    }
}

/// Stats for a single analyzed file; 404 when no result exists.
#[get("/stats/{file_id}")]
pub async fn stats_by_file(
    state: web::Data<ApiState>,
    path: web::Path<String>,
) -> HttpResponse {
    let file_id = FileId::new(path.into_inner());
    match state.results.select_by_file_id(&file_id).await {
        Ok(Some(stats)) => HttpResponse::Ok().json(stats),
        Ok(None) => HttpResponse::NotFound()
            .json(ErrorResponse::new(format!("no stats for file {}", file_id))),
        Err(e) => {
            log::error!("Failed to read stats for {}: {}", file_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new("result store unavailable"))
        }
    }
}
