use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

use crate::errors::AppError;
use crate::models::upload::UploadRecord;
use crate::registry::UploadRegistry;
use crate::utils::storage::Storage;

const PDF_MIME: &str = "application/pdf";
const UPLOAD_FIELD: &str = "pdfs";
const MAX_FILES_PER_BATCH: usize = 10;

#[derive(Serialize)]
struct FileDetail {
    message: String,
    filename: String,
}

#[derive(Serialize)]
struct UploadResponse {
    #[serde(rename = "fileDetails")]
    file_details: Vec<FileDetail>,
    #[serde(rename = "FileNumber")]
    file_number: usize,
}

#[derive(Deserialize)]
pub struct RecentQuery {
    // Read as a raw string: a malformed count falls back to the full
    // listing instead of rejecting the request.
    #[serde(rename = "FileNumber")]
    file_number: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/upload").route(web::post().to(upload_pdfs)))
        .service(web::resource("/get-pdf/{filename}").route(web::get().to(get_pdf)))
        .service(web::resource("/get-recent-pdfs").route(web::get().to(get_recent_pdfs)));
}

pub async fn upload_pdfs(
    storage: web::Data<Storage>,
    registry: web::Data<UploadRegistry>,
    mut payload: Multipart,
) -> Result<HttpResponse, actix_web::Error> {
    let mut staged: Vec<PathBuf> = Vec::new();

    // Stage the whole batch first; commit is all-or-nothing, so one bad
    // part throws away everything staged so far.
    if let Err(err) = stage_batch(&storage, &mut payload, &mut staged).await {
        discard_staged(&staged).await;
        return Err(err.into());
    }

    if staged.is_empty() {
        return Err(AppError::Validation("No files uploaded.".to_string()).into());
    }

    let mut file_details = Vec::with_capacity(staged.len());
    let mut records = Vec::with_capacity(staged.len());
    for path in &staged {
        let filename = match storage.commit(path).await {
            Ok(filename) => filename,
            Err(err) => {
                log::error!("Failed to commit staged upload: {err}");
                // Files renamed before the failure are already out of
                // staging; discard whatever is still left there.
                discard_staged(&staged).await;
                return Err(AppError::Internal("Failed to store file.".to_string()).into());
            }
        };
        file_details.push(FileDetail {
            message: "File uploaded successfully.".to_string(),
            filename: filename.clone(),
        });
        records.push(UploadRecord::new(filename));
    }

    let file_number = records.len();
    registry.append_batch(records);

    Ok(HttpResponse::Ok().json(UploadResponse { file_details, file_number }))
}

async fn stage_batch(
    storage: &Storage,
    payload: &mut Multipart,
    staged: &mut Vec<PathBuf>,
) -> Result<(), AppError> {
    let mut saw_part = false;
    loop {
        let mut field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            // A body with no parts at all surfaces as a stream error on
            // the first poll; that is an empty batch, not a bad payload.
            Err(_) if !saw_part => break,
            Err(err) => {
                log::warn!("Multipart stream error: {err}");
                return Err(AppError::Validation("Malformed upload payload.".to_string()));
            }
        };
        saw_part = true;

        // Only file parts under the expected field name count; anything
        // else is drained and ignored.
        if field.name() != UPLOAD_FIELD {
            continue;
        }
        if staged.len() == MAX_FILES_PER_BATCH {
            return Err(AppError::Validation(
                "Too many files; at most 10 per upload.".to_string(),
            ));
        }
        // The declared content type may be absent; that is rejected the
        // same way as a non-PDF declaration.
        if field.content_type().map(|m| m.essence_str()) != Some(PDF_MIME) {
            return Err(AppError::Validation("Only PDF files are allowed.".to_string()));
        }

        let path = storage.staging_path();
        let mut file = tokio::fs::File::create(&path).await.map_err(|err| {
            log::error!("Failed to create staging file: {err}");
            AppError::Internal("Failed to store file.".to_string())
        })?;
        // Track the path before writing so a partial write still gets
        // cleaned up by the caller.
        staged.push(path);

        while let Some(chunk) = field.try_next().await.map_err(|err| {
            log::warn!("Multipart stream error: {err}");
            AppError::Validation("Malformed upload payload.".to_string())
        })? {
            file.write_all(&chunk).await.map_err(|err| {
                log::error!("Failed to write staging file: {err}");
                AppError::Internal("Failed to store file.".to_string())
            })?;
        }
        file.flush().await.map_err(|err| {
            log::error!("Failed to flush staging file: {err}");
            AppError::Internal("Failed to store file.".to_string())
        })?;
    }
    Ok(())
}

async fn discard_staged(staged: &[PathBuf]) {
    for path in staged {
        if let Err(err) = tokio::fs::remove_file(path).await {
            // Already-committed files have left the staging area
            if err.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove staged file: {err}");
            }
        }
    }
}

pub async fn get_pdf(
    storage: web::Data<Storage>,
    filename: web::Path<String>,
) -> Result<HttpResponse, actix_web::Error> {
    let filename = filename.into_inner();
    let path = storage
        .resolve(&filename)
        .ok_or_else(|| AppError::Validation("Invalid filename.".to_string()))?;

    log::debug!("Looking for file {filename}");

    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(HttpResponse::Ok().content_type(PDF_MIME).body(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::NotFound("File not found.".to_string()).into())
        }
        Err(err) => {
            log::error!("Failed to read {filename}: {err}");
            Err(AppError::Internal("Error sending file.".to_string()).into())
        }
    }
}

pub async fn get_recent_pdfs(
    registry: web::Data<UploadRegistry>,
    query: web::Query<RecentQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    let limit = query
        .file_number
        .as_deref()
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|n| *n > 0);

    let records = registry.recent(limit);
    if records.is_empty() {
        return Err(AppError::NotFound("No PDF files found.".to_string()).into());
    }

    Ok(HttpResponse::Ok().json(records))
}
