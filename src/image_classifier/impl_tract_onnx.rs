use crate::error::Error;
use crate::image_classifier::interface::ImageClassifier;
use crate::image_classifier::models::model_config::{InputSpec, ModelConfig};
use std::path::Path;
use tract_onnx::prelude::*;

pub struct ImageClassifierTractOnnx {
    model: TypedRunnableModel<TypedModel>,
    labels: Vec<String>,
    config: ModelConfig,
}

impl ImageClassifierTractOnnx {
    pub fn new(config: ModelConfig) -> Result<Self, Error> {
        let labels = load_labels(&config.labels_path)?;

        let model = tract_onnx::onnx()
            .model_for_path(&config.onnx_model_path)
            .and_then(|model| {
                model.with_input_fact(0, f32::fact(config.input_spec.tensor_shape()).into())
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| {
                Error::Config(format!(
                    "could not load model {}: {}",
                    config.onnx_model_path.display(),
                    e
                ))
            })?;

        Ok(Self {
            model,
            labels,
            config,
        })
    }
}

/// One label per line, blank lines skipped.
pub fn load_labels(path: &Path) -> Result<Vec<String>, Error> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("could not read labels {}: {}", path.display(), e)))?;

    Ok(parse_labels(&contents))
}

fn parse_labels(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

impl ImageClassifier for ImageClassifierTractOnnx {
    fn input_spec(&self) -> &InputSpec {
        &self.config.input_spec
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn scores(&self, input: Tensor) -> Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>> {
        let outputs = self
            .model
            .run(tvec!(input.into_tvalue()))
            .map_err(|e| e.to_string())?;

        let output = outputs
            .first()
            .ok_or("model returned no outputs")?
            .to_array_view::<f32>()
            .map_err(|e| e.to_string())?;

        Ok(output.iter().copied().collect())
    }
}
