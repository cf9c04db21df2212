use crate::image_classifier::models::model_config::ModelConfig;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub max_image_width: u32,
    pub max_image_height: u32,
    pub logger_timezone: chrono::FixedOffset,
    /// `None` runs the random demo classifier.
    pub model: Option<ModelConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("feedback.db"),
            max_image_width: 3000,
            max_image_height: 3000,
            logger_timezone: local_offset(),
            model: None,
        }
    }
}

fn local_offset() -> chrono::FixedOffset {
    *chrono::Local::now().offset()
}
