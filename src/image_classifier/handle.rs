use crate::error::{Error, UnsupportedImageError};
use crate::image_classifier::interface::{
    ImageClassifier, Prediction, PredictionSet, MAX_PREDICTIONS,
};
use crate::image_classifier::models::model_config::ScoreKind;
use crate::image_classifier::tract::image::normalize;
use image::DynamicImage;
use std::sync::Arc;
use tract_onnx::prelude::Tensor;

/// Rounding slack allowed on model probabilities before they are clamped.
const PROBABILITY_TOLERANCE: f32 = 1e-4;

/// The classifier loaded at startup. Cloning shares the same model.
#[derive(Clone)]
pub struct ClassifierHandle {
    classifier: Arc<dyn ImageClassifier + Send + Sync>,
}

impl ClassifierHandle {
    pub fn new(classifier: Arc<dyn ImageClassifier + Send + Sync>) -> Self {
        Self { classifier }
    }

    pub fn normalize(&self, image: &DynamicImage) -> Result<Tensor, UnsupportedImageError> {
        normalize(image, self.classifier.input_spec())
    }

    pub fn classify(&self, input: Tensor) -> Result<PredictionSet, Error> {
        let spec = self.classifier.input_spec();
        let expected = spec.tensor_shape();
        if input.shape() != expected.as_slice() {
            return Err(Error::classification(format!(
                "input tensor has shape {:?}, model expects {:?}",
                input.shape(),
                expected
            )));
        }

        let scores = self
            .classifier
            .scores(input)
            .map_err(Error::Classification)?;

        rank(scores, self.classifier.labels(), spec.score_kind)
    }
}

/// Turns raw model output into the top predictions, highest probability first.
/// Equal probabilities keep the model's output order.
pub fn rank(scores: Vec<f32>, labels: &[String], score_kind: ScoreKind) -> Result<PredictionSet, Error> {
    if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
        return Err(Error::classification(format!("model produced a non-finite score ({bad})")));
    }

    let scores = match scores.len().checked_sub(labels.len()) {
        Some(0) => scores,
        // exports with a leading background class
        Some(1) => scores[1..].to_vec(),
        _ => {
            return Err(Error::classification(format!(
                "model produced {} scores for {} labels",
                scores.len(),
                labels.len()
            )))
        }
    };

    let probabilities = match score_kind {
        ScoreKind::Logits => softmax(&scores),
        ScoreKind::Probabilities => {
            let bounds = -PROBABILITY_TOLERANCE..=1.0 + PROBABILITY_TOLERANCE;
            if let Some(bad) = scores.iter().find(|p| !bounds.contains(*p)) {
                return Err(Error::classification(format!(
                    "model produced {bad}, which is not a probability"
                )));
            }
            scores.into_iter().map(|p| p.clamp(0.0, 1.0)).collect()
        }
    };

    let mut ranked: Vec<(usize, f32)> = probabilities.into_iter().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let predictions = ranked
        .into_iter()
        .take(MAX_PREDICTIONS)
        .map(|(index, confidence)| Prediction {
            label: labels[index].clone(),
            confidence,
        })
        .collect();

    Ok(PredictionSet::from_ranked(predictions))
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_classifier::impl_fake::ImageClassifierFake;
    use crate::image_classifier::models::model_config::{InputSpec, TensorLayout};

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn dog_classifier() -> ImageClassifierFake {
        ImageClassifierFake::new(
            labels(&["setter", "golden retriever", "tabby", "labrador", "toaster"]),
            vec![0.03, 0.82, 0.02, 0.10, 0.03],
        )
    }

    #[test]
    fn test_rank_takes_top_three_descending() {
        let set = rank(
            vec![0.03, 0.82, 0.02, 0.10, 0.03],
            &labels(&["setter", "golden retriever", "tabby", "labrador", "toaster"]),
            ScoreKind::Probabilities,
        )
        .unwrap();

        let names: Vec<&str> = set.predictions().iter().map(|p| p.label.as_str()).collect();
        assert_eq!(names, vec!["golden retriever", "labrador", "setter"]);
    }

    #[test]
    fn test_rank_ties_keep_native_order() {
        let set = rank(
            vec![0.25, 0.25, 0.25, 0.25],
            &labels(&["a", "b", "c", "d"]),
            ScoreKind::Probabilities,
        )
        .unwrap();

        let names: Vec<&str> = set.predictions().iter().map(|p| p.label.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_rank_short_vocabulary_returns_fewer_entries() {
        let set = rank(vec![0.4, 0.6], &labels(&["cat", "dog"]), ScoreKind::Probabilities).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.predictions()[0].label, "dog");
    }

    #[test]
    fn test_rank_applies_softmax_to_logits() {
        let set = rank(vec![2.0, 1.0, 0.1, -3.0], &labels(&["a", "b", "c", "d"]), ScoreKind::Logits)
            .unwrap();

        let confidences: Vec<f32> = set.predictions().iter().map(|p| p.confidence).collect();
        assert!(confidences.iter().all(|c| (0.0..=1.0).contains(c)));
        assert!(confidences.windows(2).all(|w| w[0] >= w[1]));
        assert!((confidences[0] - 0.6561).abs() < 0.001);
    }

    #[test]
    fn test_rank_drops_background_class() {
        let set = rank(
            vec![0.9, 0.05, 0.03, 0.02],
            &labels(&["a", "b", "c"]),
            ScoreKind::Probabilities,
        )
        .unwrap();

        assert_eq!(set.predictions()[0].label, "a");
        assert_eq!(set.predictions()[0].confidence, 0.05);
    }

    #[test]
    fn test_rank_clamps_rounding_error_in_probabilities() {
        let set = rank(vec![1.000_000_1, 0.0], &labels(&["a", "b"]), ScoreKind::Probabilities)
            .unwrap();

        assert_eq!(set.predictions()[0].label, "a");
        assert_eq!(set.predictions()[0].confidence, 1.0);
        assert_eq!(set.predictions()[1].confidence, 0.0);
    }

    #[test]
    fn test_rank_rejects_mismatched_vocabulary() {
        let result = rank(vec![0.5, 0.5], &labels(&["a", "b", "c"]), ScoreKind::Probabilities);

        assert!(matches!(result, Err(Error::Classification(_))));
    }

    #[test]
    fn test_rank_rejects_non_probabilities() {
        let result = rank(vec![1.5, -0.5], &labels(&["a", "b"]), ScoreKind::Probabilities);
        assert!(matches!(result, Err(Error::Classification(_))));

        let result = rank(vec![f32::NAN, 0.5], &labels(&["a", "b"]), ScoreKind::Logits);
        assert!(matches!(result, Err(Error::Classification(_))));
    }

    #[test]
    fn test_classify_scores_once_and_scales_to_percentages() {
        let classifier = Arc::new(dog_classifier());
        let handle = ClassifierHandle::new(classifier.clone());

        let input = handle.normalize(&DynamicImage::new_rgb8(640, 480)).unwrap();
        let set = handle.classify(input).unwrap();

        let percentages: Vec<String> = set
            .predictions()
            .iter()
            .map(|p| format!("{:.2}", p.percentage()))
            .collect();
        assert_eq!(percentages, vec!["82.00", "10.00", "3.00"]);
        assert_eq!(classifier.invocations(), 1);
    }

    #[test]
    fn test_classify_rejects_wrong_tensor_shape() {
        let classifier = Arc::new(dog_classifier());
        let handle = ClassifierHandle::new(classifier.clone());
        let spec = InputSpec {
            layout: TensorLayout::Nhwc,
            ..classifier.input_spec().clone()
        };

        let input = normalize(&DynamicImage::new_rgb8(10, 10), &spec).unwrap();
        let result = handle.classify(input);

        assert!(matches!(result, Err(Error::Classification(_))));
        assert_eq!(classifier.invocations(), 0);
    }

    #[test]
    fn test_classify_wraps_model_failure() {
        let handle = ClassifierHandle::new(Arc::new(dog_classifier().failing("model unavailable")));

        let input = handle.normalize(&DynamicImage::new_rgb8(10, 10)).unwrap();
        let err = handle.classify(input).unwrap_err();

        assert!(matches!(err, Error::Classification(_)));
        assert!(err.to_string().contains("model unavailable"));
    }
}
