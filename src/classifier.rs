use std::path::Path;

use anyhow::Context;
use ndarray::Array4;
use tract_onnx::prelude::*;

use crate::error::ServiceError;

/// A loaded network mapping an NHWC image tensor to one score per class.
///
/// Implementations are shared read-only between request handlers, so `predict`
/// must be safe to call concurrently.
pub trait Classifier: Send + Sync {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ServiceError>;
}

/// ONNX export of the trained CNN, executed with tract.
pub struct OnnxClassifier {
    plan: TypedRunnableModel<TypedModel>,
}

impl OnnxClassifier {
    /// Load, optimize and validate the model at `path`.
    ///
    /// A run on a blank input must yield exactly `num_classes` scores.
    pub fn load(
        path: impl AsRef<Path>,
        input_size: u32,
        num_classes: usize,
    ) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let side = input_size as usize;

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("failed to read ONNX model {}", path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, side, side, 3)),
            )?
            .into_optimized()
            .context("failed to optimize model")?
            .into_runnable()
            .context("failed to make model runnable")?;

        let classifier = Self { plan };
        check_alignment(&classifier, side, num_classes)?;

        Ok(classifier)
    }
}

/// Run a blank input through `classifier` and require one score per class label.
fn check_alignment(
    classifier: &dyn Classifier,
    side: usize,
    num_classes: usize,
) -> anyhow::Result<()> {
    let blank = Array4::<f32>::zeros((1, side, side, 3));
    let scores = classifier
        .predict(&blank)
        .context("inference on a blank input failed")?;
    anyhow::ensure!(
        scores.len() == num_classes,
        "model outputs {} scores but {} class labels are configured",
        scores.len(),
        num_classes
    );
    Ok(())
}

fn to_tensor(input: &Array4<f32>) -> Result<Tensor, ServiceError> {
    let data = input.as_standard_layout();
    let data = data
        .as_slice()
        .ok_or_else(|| ServiceError::inference("input tensor is not contiguous"))?;
    Tensor::from_shape(input.shape(), data).map_err(|e| ServiceError::inference(e.to_string()))
}

fn first_output_scores(outputs: &[TValue]) -> Result<Vec<f32>, ServiceError> {
    let output = outputs
        .first()
        .ok_or_else(|| ServiceError::inference("model returned no outputs"))?;
    let scores = output
        .to_array_view::<f32>()
        .map_err(|e| ServiceError::inference(e.to_string()))?;
    Ok(scores.iter().copied().collect())
}

impl Classifier for OnnxClassifier {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ServiceError> {
        let tensor = to_tensor(input)?;
        let result = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| ServiceError::inference(e.to_string()))?;
        first_output_scores(&result)
    }
}
