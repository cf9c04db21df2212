use crate::error::UnsupportedImageError;
use crate::image_classifier::models::model_config::{InputSpec, TensorLayout};
use image::{imageops, DynamicImage, ImageError, ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tract_onnx::prelude::*;

/// Decodes a JPEG or PNG file. Other extensions are refused without being
/// read; the decoder itself is chosen from the file contents.
pub fn load_image(path: &Path) -> Result<DynamicImage, UnsupportedImageError> {
    Ok(open_reader(path)?.decode()?)
}

/// Reads only the header of the file to get its pixel dimensions.
pub fn image_dimensions(path: &Path) -> Result<(u32, u32), UnsupportedImageError> {
    Ok(open_reader(path)?.into_dimensions()?)
}

fn open_reader(path: &Path) -> Result<ImageReader<BufReader<File>>, UnsupportedImageError> {
    ensure_supported_format(ImageFormat::from_path(path).ok())?;

    let reader = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(ImageError::from)?;

    ensure_supported_format(reader.format())?;
    Ok(reader)
}

fn ensure_supported_format(format: Option<ImageFormat>) -> Result<(), UnsupportedImageError> {
    match format {
        Some(ImageFormat::Jpeg) | Some(ImageFormat::Png) => Ok(()),
        _ => Err(UnsupportedImageError::Format),
    }
}

/// Converts an image of any size and colour type into the model input tensor,
/// batch axis included.
pub fn normalize(image: &DynamicImage, spec: &InputSpec) -> Result<Tensor, UnsupportedImageError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(UnsupportedImageError::Empty {
            width: image.width(),
            height: image.height(),
        });
    }

    let rgb = image
        .resize_exact(spec.width, spec.height, imageops::FilterType::Triangle)
        .to_rgb8();
    let (h, w) = (spec.height as usize, spec.width as usize);
    let normalization = spec.normalization;

    let tensor = match spec.layout {
        TensorLayout::Nchw => tract_ndarray::Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
            normalization.apply(rgb.get_pixel(x as u32, y as u32)[c], c)
        }),
        TensorLayout::Nhwc => tract_ndarray::Array4::from_shape_fn((1, h, w, 3), |(_, y, x, c)| {
            normalization.apply(rgb.get_pixel(x as u32, y as u32)[c], c)
        }),
    };

    Ok(tensor.into_tensor())
}
