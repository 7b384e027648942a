//! GET /files/{file_name} - download a stored blob.

use crate::models::ErrorResponse;
use crate::state::ApiState;
use actix_web::{get, web, HttpResponse};
use logsift_filestore::FilestoreError;

/// Serves a raw uploaded log file back to the client.
///
/// Blob names are flat (`{fileId}-{sanitized name}`), so any path
/// separator in the request is an attempted traversal and gets rejected.
#[get("/files/{file_name}")]
pub async fn download_blob(
    state: web::Data<ApiState>,
    path: web::Path<String>,
) -> HttpResponse {
    let file_name = path.into_inner();
    if file_name.contains("..") || file_name.contains('/') || file_name.contains('\\') {
        return HttpResponse::BadRequest().json(ErrorResponse::new("invalid file name"));
    }

    match state.blobs.load(&file_name).await {
        Ok(data) => HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .append_header((
                "Content-Disposition",
                format!("inline; filename=\"{}\"", file_name),
            ))
            .body(data),
        Err(FilestoreError::NotFound(_)) => {
            HttpResponse::NotFound().json(ErrorResponse::new("file not found"))
        }
        Err(e) => {
            log::warn!("Blob download failed for {}: {}", file_name, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("storage unavailable"))
        }
    }
}
