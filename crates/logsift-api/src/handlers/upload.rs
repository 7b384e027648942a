//! POST /api/upload-logs - accept a log file and enqueue its job.

use crate::models::{ErrorResponse, UploadResponse};
use crate::state::ApiState;
use actix_multipart::Multipart;
use actix_web::{post, web, HttpResponse};
use bytes::BytesMut;
use futures_util::TryStreamExt;
use logsift_commons::{FileId, JobDescriptor};

/// Upload one log file as multipart form data, store it in the blob
/// store, and enqueue an analysis job. Responds 202 with the job id.
#[post("/upload-logs")]
pub async fn upload_logs(state: web::Data<ApiState>, mut payload: Multipart) -> HttpResponse {
    let upload = match read_file_field(&mut payload).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            return HttpResponse::BadRequest()
                .json(ErrorResponse::new("no file field in upload"));
        }
        Err(e) => {
            log::warn!("Rejected malformed upload: {}", e);
            return HttpResponse::BadRequest().json(ErrorResponse::new(e));
        }
    };

    let file_id = FileId::generate();
    let blob = match state
        .blobs
        .store(&file_id, &upload.file_name, upload.data.freeze())
        .await
    {
        Ok(blob) => blob,
        Err(e) => {
            log::error!("Failed to store upload: {}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::new("failed to store file"));
        }
    };

    let job_id = match state.queue.enqueue(JobDescriptor {
        file_id: file_id.clone(),
        file_path: blob.file_path,
    }) {
        Ok(job_id) => job_id,
        Err(e) => {
            log::error!("Failed to enqueue job for {}: {}", file_id, e);
            return HttpResponse::ServiceUnavailable()
                .json(ErrorResponse::new("queue unavailable"));
        }
    };

    log::info!(
        "Accepted upload {} ({} bytes) as job {}",
        file_id,
        blob.size,
        job_id
    );
    HttpResponse::Accepted().json(UploadResponse {
        message: "File uploaded and queued for processing",
        job_id,
        file_id,
    })
}

struct Upload {
    file_name: String,
    data: BytesMut,
}

/// Pull the first file field out of the multipart stream.
async fn read_file_field(payload: &mut Multipart) -> Result<Option<Upload>, String> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| format!("multipart error: {}", e))?
    {
        let Some(file_name) = field
            .content_disposition()
            .get_filename()
            .map(|s| s.to_string())
        else {
            // Not a file field; skip it.
            continue;
        };

        let mut data = BytesMut::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| format!("upload stream error: {}", e))?
        {
            data.extend_from_slice(&chunk);
        }
        return Ok(Some(Upload { file_name, data }));
    }
    Ok(None)
}
