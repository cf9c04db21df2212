use super::models::model_config::InputSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tract_onnx::prelude::Tensor;

/// Most predictions shown to the user for one image.
pub const MAX_PREDICTIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Probability in `[0, 1]`.
    pub confidence: f32,
}

impl Prediction {
    pub fn percentage(&self) -> f32 {
        self.confidence * 100.0
    }
}

/// Ranked predictions from one classification run, highest confidence first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionSet(Vec<Prediction>);

impl PredictionSet {
    /// Keeps at most [`MAX_PREDICTIONS`] entries of an already ranked list.
    pub fn from_ranked(mut predictions: Vec<Prediction>) -> Self {
        predictions.truncate(MAX_PREDICTIONS);
        Self(predictions)
    }

    #[cfg(test)]
    pub fn predictions(&self) -> &[Prediction] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Reads back a `prediction_set` column written by [`PredictionSet::encode`].
    #[allow(dead_code)]
    pub fn decode(encoded: &str) -> Result<Self, serde_json::Error> {
        let predictions: Vec<Prediction> = serde_json::from_str(encoded)?;
        Ok(Self::from_ranked(predictions))
    }
}

impl fmt::Display for PredictionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, prediction) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "{}. {} (Confidence: {:.2}%)",
                i + 1,
                prediction.label,
                prediction.percentage()
            )?;
        }
        Ok(())
    }
}

/// An opaque scoring function over a fixed label vocabulary.
pub trait ImageClassifier {
    fn input_spec(&self) -> &InputSpec;

    fn labels(&self) -> &[String];

    /// Runs the model once on a normalized input and returns one raw score per output class.
    fn scores(&self, input: Tensor) -> Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>>;
}
