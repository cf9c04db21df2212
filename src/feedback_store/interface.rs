use crate::error::PersistenceError;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackRecord {
    pub id: i64,
    pub image_reference: String,
    /// Encoded with [`crate::image_classifier::interface::PredictionSet::encode`].
    pub prediction_set: String,
    pub feedback_text: String,
}

/// Append-only log of feedback. Rows are never updated or deleted.
pub trait FeedbackStore {
    /// Creates the schema if it is missing. Safe to call on every start.
    fn initialize(&self) -> Result<(), PersistenceError>;

    /// Inserts one row and returns the id the store assigned to it.
    fn append(
        &self,
        image_reference: &str,
        prediction_set: &str,
        feedback_text: &str,
    ) -> Result<i64, PersistenceError>;
}
