use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported image: {0}")]
    UnsupportedImage(#[from] UnsupportedImageError),

    #[error("classification failed: {0}")]
    Classification(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to store feedback: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("no predictions to give feedback on, classify an image first")]
    NoPendingPrediction,

    #[error("feedback cannot be empty")]
    EmptyFeedback,

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn classification(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Error::Classification(message.into())
    }
}

#[derive(Debug, Error)]
pub enum UnsupportedImageError {
    #[error("only JPEG and PNG images are accepted")]
    Format,

    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },

    #[error("image is {width}x{height}, please upload an image no larger than {max_width}x{max_height} pixels")]
    TooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("could not encode predictions: {0}")]
    Encode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message_names_the_bound() {
        let err: Error = UnsupportedImageError::TooLarge {
            width: 4000,
            height: 3500,
            max_width: 3000,
            max_height: 3000,
        }
        .into();

        let message = err.to_string();
        assert!(message.contains("4000x3500"));
        assert!(message.contains("3000x3000"));
    }

    #[test]
    fn test_classification_wraps_message() {
        let err = Error::classification("model unavailable");
        assert_eq!(err.to_string(), "classification failed: model unavailable");
    }
}
