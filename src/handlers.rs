use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::HealthResponse;
use crate::AppState;

pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::default())
}

#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn predict(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let contents = read_upload(&mut payload).await?;
    tracing::debug!(bytes = contents.len(), "Received upload");

    let state = state.into_inner();
    let prediction = web::block(move || state.classify(&contents))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))??;

    tracing::info!(
        predicted_class = prediction.predicted_class,
        "Prediction complete"
    );
    Ok(HttpResponse::Ok().json(prediction))
}

/// Read the first field of the form, whatever it is called.
///
/// A form that ends before any field starts surfaces from the multipart parser as
/// `Incomplete`; that is a missing upload, not a broken one.
async fn read_upload(payload: &mut Multipart) -> Result<Vec<u8>, ServiceError> {
    let field = match payload.next().await {
        Some(Ok(field)) => field,
        Some(Err(MultipartError::Incomplete)) | None => return Err(ServiceError::MissingFile),
        Some(Err(e)) => return Err(ServiceError::Upload(e.to_string())),
    };
    read_field(field).await
}

async fn read_field(mut field: Field) -> Result<Vec<u8>, ServiceError> {
    let mut contents = Vec::new();
    while let Some(chunk) = field.next().await {
        let data = chunk.map_err(|e| ServiceError::Upload(e.to_string()))?;
        contents.extend_from_slice(&data);
    }
    Ok(contents)
}
