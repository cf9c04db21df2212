use clap::ValueEnum;
use std::path::PathBuf;

/// Mean and standard deviation per RGB channel of the ImageNet training set.
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TensorLayout {
    /// `[1, 3, height, width]`
    Nchw,
    /// `[1, height, width, 3]`
    Nhwc,
}

/// How 8-bit channel intensities are scaled before reaching the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Normalization {
    /// `v / 255`, range `[0, 1]`.
    UnitRange,
    /// `v / 127.5 - 1`, range `[-1, 1]`. MobileNetV2 as trained in Keras.
    Symmetric,
    /// Unit range shifted and scaled by the ImageNet channel statistics.
    #[value(name = "imagenet")]
    ImageNet,
}

impl Normalization {
    pub fn apply(&self, value: u8, channel: usize) -> f32 {
        let v = value as f32;
        match self {
            Normalization::UnitRange => v / 255.0,
            Normalization::Symmetric => v / 127.5 - 1.0,
            Normalization::ImageNet => (v / 255.0 - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel],
        }
    }

    /// Inclusive bounds every normalized value falls into.
    #[cfg(test)]
    pub fn range(&self) -> (f32, f32) {
        match self {
            Normalization::UnitRange => (0.0, 1.0),
            Normalization::Symmetric => (-1.0, 1.0),
            Normalization::ImageNet => {
                let low = (0..3)
                    .map(|c| -IMAGENET_MEAN[c] / IMAGENET_STD[c])
                    .fold(f32::INFINITY, f32::min);
                let high = (0..3)
                    .map(|c| (1.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c])
                    .fold(f32::NEG_INFINITY, f32::max);
                (low, high)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScoreKind {
    Probabilities,
    Logits,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub width: u32,
    pub height: u32,
    pub layout: TensorLayout,
    pub normalization: Normalization,
    pub score_kind: ScoreKind,
}

impl InputSpec {
    pub fn tensor_shape(&self) -> [usize; 4] {
        let (h, w) = (self.height as usize, self.width as usize);
        match self.layout {
            TensorLayout::Nchw => [1, 3, h, w],
            TensorLayout::Nhwc => [1, h, w, 3],
        }
    }
}

impl Default for InputSpec {
    // mobilenetv2-7.onnx from the ONNX model zoo
    fn default() -> Self {
        Self {
            width: 224,
            height: 224,
            layout: TensorLayout::Nchw,
            normalization: Normalization::ImageNet,
            score_kind: ScoreKind::Logits,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub onnx_model_path: PathBuf,
    pub labels_path: PathBuf,
    pub input_spec: InputSpec,
}
