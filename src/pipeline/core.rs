use crate::error::Error;
use crate::feedback_store::interface::FeedbackRecord;
use crate::image_classifier::interface::PredictionSet;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum State {
    #[default]
    Idle,
    Classified {
        image_reference: String,
        predictions: PredictionSet,
    },
}

#[derive(Debug)]
pub enum Event {
    Classified {
        image_reference: String,
        predictions: PredictionSet,
    },
    FeedbackSubmitted(String),
    FeedbackSaved(FeedbackRecord),
    FeedbackFailed,
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyFeedback,
    NoPendingPrediction,
}

impl From<Rejection> for Error {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::EmptyFeedback => Error::EmptyFeedback,
            Rejection::NoPendingPrediction => Error::NoPendingPrediction,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AppendFeedback {
        image_reference: String,
        predictions: PredictionSet,
        feedback_text: String,
    },
    Reject(Rejection),
}

pub fn init() -> (State, Vec<Effect>) {
    (State::Idle, vec![])
}

pub fn transition(state: State, event: Event) -> (State, Vec<Effect>) {
    match (state, event) {
        // The latest classification always replaces whatever was pending.
        (
            _,
            Event::Classified {
                image_reference,
                predictions,
            },
        ) => (
            State::Classified {
                image_reference,
                predictions,
            },
            vec![],
        ),

        (state, Event::FeedbackSubmitted(text)) if text.trim().is_empty() => {
            (state, vec![Effect::Reject(Rejection::EmptyFeedback)])
        }
        (State::Idle, Event::FeedbackSubmitted(_)) => (
            State::Idle,
            vec![Effect::Reject(Rejection::NoPendingPrediction)],
        ),
        (
            State::Classified {
                image_reference,
                predictions,
            },
            Event::FeedbackSubmitted(text),
        ) => {
            let effect = Effect::AppendFeedback {
                image_reference: image_reference.clone(),
                predictions: predictions.clone(),
                feedback_text: text.trim().to_string(),
            };
            (
                State::Classified {
                    image_reference,
                    predictions,
                },
                vec![effect],
            )
        }

        (_, Event::FeedbackSaved(_)) => (State::Idle, vec![]),
        // Predictions stay pending so the user can retry.
        (state, Event::FeedbackFailed) => (state, vec![]),

        (_, Event::Cleared) => (State::Idle, vec![]),
    }
}
