use clap::Parser;
use config::Config;
use error::Error;
use feedback_store::impl_sqlite::FeedbackStoreSqlite;
use image_classifier::handle::ClassifierHandle;
use image_classifier::impl_fake::ImageClassifierFake;
use image_classifier::impl_tract_onnx::ImageClassifierTractOnnx;
use image_classifier::interface::ImageClassifier;
use image_classifier::models::model_config::{
    InputSpec, ModelConfig, Normalization, ScoreKind, TensorLayout,
};
use library::logger::impl_console::LoggerConsole;
use library::logger::interface::Logger;
use pipeline::main::Pipeline;
use std::path::PathBuf;
use std::sync::Arc;

mod config;
mod error;
mod feedback_store;
mod image_classifier;
mod library;
mod pipeline;
mod shell;

/// Classify images and record feedback on the predictions.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// SQLite file feedback is appended to
    #[arg(long, env = "IMAGE_FEEDBACK_DATABASE", default_value = "feedback.db")]
    database: PathBuf,

    /// ONNX image classifier; without it a random demo classifier is used
    #[arg(long, env = "IMAGE_FEEDBACK_MODEL", requires = "labels")]
    model: Option<PathBuf>,

    /// Class labels for the model, one per line
    #[arg(long, env = "IMAGE_FEEDBACK_LABELS", requires = "model")]
    labels: Option<PathBuf>,

    /// Largest accepted width and height in pixels
    #[arg(long, env = "IMAGE_FEEDBACK_MAX_DIMENSION", default_value_t = 3000)]
    max_dimension: u32,

    /// Width and height of the square model input in pixels
    #[arg(long, env = "IMAGE_FEEDBACK_INPUT_SIZE", default_value_t = 224)]
    input_size: u32,

    /// Axis order of the model input tensor
    #[arg(long, value_enum, env = "IMAGE_FEEDBACK_LAYOUT", default_value_t = TensorLayout::Nchw)]
    layout: TensorLayout,

    /// Pixel scaling the model was trained with
    #[arg(
        long,
        value_enum,
        env = "IMAGE_FEEDBACK_NORMALIZATION",
        default_value_t = Normalization::ImageNet
    )]
    normalization: Normalization,

    /// Whether the model output is already a probability distribution
    #[arg(long, value_enum, env = "IMAGE_FEEDBACK_SCORES", default_value_t = ScoreKind::Logits)]
    scores: ScoreKind,
}

impl Args {
    fn into_config(self) -> Config {
        let model = match (self.model, self.labels) {
            (Some(onnx_model_path), Some(labels_path)) => Some(ModelConfig {
                onnx_model_path,
                labels_path,
                input_spec: InputSpec {
                    width: self.input_size,
                    height: self.input_size,
                    layout: self.layout,
                    normalization: self.normalization,
                    score_kind: self.scores,
                },
            }),
            _ => None,
        };

        Config {
            database_path: self.database,
            max_image_width: self.max_dimension,
            max_image_height: self.max_dimension,
            model,
            ..Config::default()
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Args::parse().into_config();

    let logger = Arc::new(LoggerConsole::new(config.logger_timezone));

    let image_classifier: Arc<dyn ImageClassifier + Send + Sync> = match &config.model {
        Some(model_config) => Arc::new(ImageClassifierTractOnnx::new(model_config.clone())?),
        None => {
            let _ = logger.info("No model configured, using the random demo classifier");
            Arc::new(ImageClassifierFake::random())
        }
    };

    let feedback_store = Arc::new(FeedbackStoreSqlite::new(
        &config.database_path,
        logger.clone(),
    ));

    let mut pipeline = Pipeline::new(
        config,
        logger,
        ClassifierHandle::new(image_classifier),
        feedback_store,
    )
    .map_err(|e: Error| format!("could not open feedback store: {}", e))?;

    shell::run(&mut pipeline, std::io::stdin().lock(), std::io::stdout())?;

    Ok(())
}
