//! HTTP service exposing a pre-trained ECG image classifier.
//!
//! The model is loaded once at startup and shared read-only by every worker.
//! `POST /predict/` decodes an uploaded image, resizes it to the network's input,
//! runs the forward pass and returns the label with per-class probabilities.

pub mod classifier;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod preprocessing;

use std::sync::Arc;

use actix_web::web;

pub use classifier::{Classifier, OnnxClassifier};
pub use config::{ApiConfig, CLASS_LABELS, INPUT_SIZE};
pub use error::ServiceError;
pub use models::{HealthResponse, PredictionResponse};

/// State shared by all workers for the life of the process.
pub struct AppState {
    classifier: Arc<dyn Classifier>,
    labels: &'static [&'static str],
    input_size: u32,
}

impl AppState {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            labels: &CLASS_LABELS,
            input_size: INPUT_SIZE,
        }
    }

    /// Decode, preprocess and classify one upload. CPU bound.
    pub fn classify(&self, contents: &[u8]) -> Result<PredictionResponse, ServiceError> {
        let input = preprocessing::preprocess(contents, self.input_size)?;
        let scores = self.classifier.predict(&input)?;
        PredictionResponse::from_scores(self.labels, &scores)
    }
}

/// Register the service routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(handlers::root)))
        .service(web::resource("/predict/").route(web::post().to(handlers::predict)));
}
