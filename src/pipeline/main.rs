use crate::config::Config;
use crate::error::{Error, PersistenceError, UnsupportedImageError};
use crate::feedback_store::interface::{FeedbackRecord, FeedbackStore};
use crate::image_classifier::handle::ClassifierHandle;
use crate::image_classifier::interface::PredictionSet;
use crate::image_classifier::tract::image::{image_dimensions, load_image};
use crate::library::logger::interface::Logger;
use crate::pipeline::core::{init, transition, Effect, Event, State};
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;

/// Runs one user action at a time: classify an image, then attach feedback to
/// the predictions that were shown.
pub struct Pipeline {
    config: Config,
    logger: Arc<dyn Logger + Send + Sync>,
    classifier: ClassifierHandle,
    feedback_store: Arc<dyn FeedbackStore + Send + Sync>,
    state: State,
}

impl Pipeline {
    pub fn new(
        config: Config,
        logger: Arc<dyn Logger + Send + Sync>,
        classifier: ClassifierHandle,
        feedback_store: Arc<dyn FeedbackStore + Send + Sync>,
    ) -> Result<Self, Error> {
        feedback_store.initialize()?;

        let (state, _) = init();

        Ok(Self {
            config,
            logger: logger.with_namespace("pipeline"),
            classifier,
            feedback_store,
            state,
        })
    }

    #[cfg(test)]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Checks the header dimensions before decoding, so oversized files are
    /// never loaded.
    pub fn classify_path(&mut self, path: &Path) -> Result<PredictionSet, Error> {
        let image_reference = path.to_string_lossy().to_string();

        let loaded = image_dimensions(path)
            .and_then(|(width, height)| self.check_dimensions(width, height))
            .and_then(|_| load_image(path));

        match loaded {
            Ok(image) => self.classify_image(&image_reference, &image),
            Err(err) => self.finish_classification(image_reference, Err(err.into())),
        }
    }

    /// Same as [`Pipeline::classify_path`] for an image that is already decoded.
    pub fn classify_image(
        &mut self,
        image_reference: &str,
        image: &DynamicImage,
    ) -> Result<PredictionSet, Error> {
        self.log_info(&format!("Classifying {}", image_reference));

        let result = self
            .check_dimensions(image.width(), image.height())
            .map_err(Error::from)
            .and_then(|_| self.run_classifier(image));

        self.finish_classification(image_reference.to_string(), result)
    }

    pub fn submit_feedback(&mut self, feedback_text: &str) -> Result<FeedbackRecord, Error> {
        let effects = self.dispatch(Event::FeedbackSubmitted(feedback_text.to_string()));

        match effects.into_iter().next() {
            Some(effect) => self.run_effect(effect),
            None => Err(Error::NoPendingPrediction),
        }
    }

    /// Drops pending predictions without storing anything.
    pub fn clear(&mut self) {
        self.dispatch(Event::Cleared);
    }

    fn check_dimensions(&self, width: u32, height: u32) -> Result<(), UnsupportedImageError> {
        if width > self.config.max_image_width || height > self.config.max_image_height {
            return Err(UnsupportedImageError::TooLarge {
                width,
                height,
                max_width: self.config.max_image_width,
                max_height: self.config.max_image_height,
            });
        }
        Ok(())
    }

    fn run_classifier(&self, image: &DynamicImage) -> Result<PredictionSet, Error> {
        let input = self.classifier.normalize(image)?;
        self.classifier.classify(input)
    }

    fn finish_classification(
        &mut self,
        image_reference: String,
        result: Result<PredictionSet, Error>,
    ) -> Result<PredictionSet, Error> {
        match result {
            Ok(predictions) => {
                self.dispatch(Event::Classified {
                    image_reference,
                    predictions: predictions.clone(),
                });
                Ok(predictions)
            }
            Err(err) => {
                self.log_error(&format!("Could not classify {}: {}", image_reference, err));
                Err(err)
            }
        }
    }

    fn run_effect(&mut self, effect: Effect) -> Result<FeedbackRecord, Error> {
        match effect {
            Effect::Reject(rejection) => {
                let err = Error::from(rejection);
                self.log_error(&format!("Feedback rejected: {}", err));
                Err(err)
            }
            Effect::AppendFeedback {
                image_reference,
                predictions,
                feedback_text,
            } => {
                let saved = predictions
                    .encode()
                    .map_err(PersistenceError::from)
                    .and_then(|prediction_set| {
                        self.feedback_store
                            .append(&image_reference, &prediction_set, &feedback_text)
                            .map(|id| FeedbackRecord {
                                id,
                                image_reference,
                                prediction_set,
                                feedback_text,
                            })
                    });

                match saved {
                    Ok(record) => {
                        self.dispatch(Event::FeedbackSaved(record.clone()));
                        Ok(record)
                    }
                    Err(err) => {
                        self.log_error(&format!("Could not store feedback: {}", err));
                        self.dispatch(Event::FeedbackFailed);
                        Err(Error::Persistence(err))
                    }
                }
            }
        }
    }

    fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        self.log_info(&format!("Event: {}", describe(&event)));

        let state = std::mem::take(&mut self.state);
        let (state, effects) = transition(state, event);
        self.state = state;
        effects
    }

    // A failing logger never fails the user's action.
    fn log_info(&self, message: &str) {
        let _ = self.logger.info(message);
    }

    fn log_error(&self, message: &str) {
        let _ = self.logger.error(message);
    }
}

fn describe(event: &Event) -> String {
    match event {
        Event::Classified {
            image_reference,
            predictions,
        } => format!(
            "Classified {} ({} predictions)",
            image_reference,
            predictions.len()
        ),
        Event::FeedbackSubmitted(text) => format!("FeedbackSubmitted ({} chars)", text.len()),
        Event::FeedbackSaved(record) => format!("FeedbackSaved (id {})", record.id),
        Event::FeedbackFailed => "FeedbackFailed".to_string(),
        Event::Cleared => "Cleared".to_string(),
    }
}
