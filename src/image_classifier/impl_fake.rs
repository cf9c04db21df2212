use crate::image_classifier::interface::ImageClassifier;
use crate::image_classifier::models::model_config::{InputSpec, ScoreKind};
use rand::distr::{Distribution, Uniform};
use std::sync::atomic::{AtomicUsize, Ordering};
use tract_onnx::prelude::Tensor;

enum Scores {
    #[cfg(test)]
    Fixed(Vec<f32>),
    Random,
}

pub struct ImageClassifierFake {
    input_spec: InputSpec,
    labels: Vec<String>,
    scores: Scores,
    failure: Option<String>,
    invocations: AtomicUsize,
}

impl ImageClassifierFake {
    /// Always answers with `scores`, one per label.
    #[cfg(test)]
    pub fn new(labels: Vec<String>, scores: Vec<f32>) -> Self {
        Self::with_scores(labels, Scores::Fixed(scores))
    }

    /// Answers with a fresh random distribution over a small object vocabulary.
    pub fn random() -> Self {
        let labels = [
            "dog", "cat", "person", "car", "chair", "table", "bird", "tree", "bicycle", "book",
            "laptop", "phone", "cup", "bottle", "keyboard", "mouse", "plant", "clock",
        ]
        .iter()
        .map(|l| l.to_string())
        .collect();

        Self::with_scores(labels, Scores::Random)
    }

    fn with_scores(labels: Vec<String>, scores: Scores) -> Self {
        Self {
            input_spec: InputSpec {
                score_kind: ScoreKind::Probabilities,
                ..InputSpec::default()
            },
            labels,
            scores,
            failure: None,
            invocations: AtomicUsize::new(0),
        }
    }

    #[cfg(test)]
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    #[cfg(test)]
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    fn random_distribution(&self) -> Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>> {
        let mut rng = rand::rng();

        let weight_dist = Uniform::new(0.0f32, 1.0)?;

        let weights: Vec<f32> = self
            .labels
            .iter()
            .map(|_| weight_dist.sample(&mut rng))
            .collect();
        let total: f32 = weights.iter().sum();

        Ok(weights.into_iter().map(|w| w / total).collect())
    }
}

impl ImageClassifier for ImageClassifierFake {
    fn input_spec(&self) -> &InputSpec {
        &self.input_spec
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn scores(&self, _input: Tensor) -> Result<Vec<f32>, Box<dyn std::error::Error + Send + Sync>> {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.failure {
            return Err(message.clone().into());
        }

        match &self.scores {
            #[cfg(test)]
            Scores::Fixed(scores) => Ok(scores.clone()),
            Scores::Random => self.random_distribution(),
        }
    }
}
