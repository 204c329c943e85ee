use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::error::ServiceError;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            message: "ECG Model API is running!",
        }
    }
}

/// Per-class scores, serialized as a JSON object in label order.
#[derive(Debug, Clone, PartialEq)]
pub struct Probabilities(Vec<(&'static str, f64)>);

#[cfg(test)]
impl Probabilities {
    pub(crate) fn get(&self, label: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(name, _)| *name == label)
            .map(|&(_, p)| p)
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

impl Serialize for Probabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, p) in &self.0 {
            map.serialize_entry(label, p)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    pub predicted_class: &'static str,
    pub probabilities: Probabilities,
}

impl PredictionResponse {
    /// Map a raw output vector onto the label list.
    ///
    /// Ties resolve to the first maximum. Each score is rounded on its own, so the
    /// rounded values need not sum to 1.
    pub fn from_scores(
        labels: &[&'static str],
        scores: &[f32],
    ) -> Result<Self, ServiceError> {
        if scores.len() != labels.len() {
            return Err(ServiceError::inference(format!(
                "model produced {} scores for {} classes",
                scores.len(),
                labels.len()
            )));
        }
        if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
            return Err(ServiceError::inference(format!(
                "model produced a non-finite score ({bad})"
            )));
        }

        let mut best = 0;
        for (idx, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = idx;
            }
        }

        let probabilities = labels
            .iter()
            .zip(scores)
            .map(|(&label, &score)| (label, round4(score)))
            .collect();

        Ok(Self {
            predicted_class: labels[best],
            probabilities: Probabilities(probabilities),
        })
    }
}

fn round4(score: f32) -> f64 {
    let text = format!("{:.4}", score as f64);
    // formatting a finite float always yields a parseable decimal
    text.parse().unwrap_or(score as f64)
}
