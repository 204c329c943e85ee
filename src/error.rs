use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

/// Errors raised while serving a single request.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The multipart form carried no field at all
    #[error("no file was uploaded")]
    MissingFile,

    /// The multipart stream could not be read
    #[error("could not read upload: {0}")]
    Upload(String),

    /// The uploaded bytes are not an image the decoder understands
    #[error("invalid image file: {0}")]
    Decode(#[from] image::ImageError),

    /// The forward pass failed or produced unusable scores
    #[error("inference error: {0}")]
    Inference(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::MissingFile => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Upload(_) | ServiceError::Decode(_) => StatusCode::BAD_REQUEST,
            ServiceError::Inference(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Rejected request");
        }

        HttpResponse::build(status).json(ErrorBody {
            detail: self.to_string(),
        })
    }
}
