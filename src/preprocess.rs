use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GrayAlphaImage, GrayImage, ImageFormat, LumaA};
use imageproc::contrast::{ThresholdType, threshold as ip_threshold};

use crate::compose::{flatten_onto, pad_to_canvas, tint};
use crate::config::{PreprocessOptions, ResizeSpec};
use crate::{LogoError, LogoResult};

/// Percentiles that map to black and white when stretching contrast.
const NORMALIZE_LOWER_PERCENTILE: f64 = 0.01;
const NORMALIZE_UPPER_PERCENTILE: f64 = 0.99;

/// A single transformation step applied to the working raster.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterOperation {
    Resize(ResizeSpec),
    Flatten { background: [u8; 3] },
    Greyscale,
    Normalize,
    Threshold { cutoff: u8 },
    Tint { color: [u8; 3] },
}

impl RasterOperation {
    pub fn apply(&self, input: &DynamicImage) -> DynamicImage {
        match self {
            RasterOperation::Resize(spec) => resize_to_box(input, *spec),
            RasterOperation::Flatten { background } => {
                DynamicImage::ImageRgb8(flatten_onto(&input.to_rgba8(), *background))
            }
            RasterOperation::Greyscale => input.grayscale(),
            RasterOperation::Normalize => normalize_contrast(input),
            RasterOperation::Threshold { cutoff } => threshold_image(input, *cutoff),
            RasterOperation::Tint { color } => DynamicImage::ImageRgba8(tint(&input.to_rgba8(), *color)),
        }
    }
}

/// Run a list of operations against the provided source image, returning the transformed raster.
pub fn apply_operations(source: &DynamicImage, operations: &[RasterOperation]) -> DynamicImage {
    let mut current = source.clone();
    for op in operations {
        current = op.apply(&current);
    }
    current
}

/// Produce the operation sequence described by a set of preprocessing options.
pub fn operations_from_options(options: &PreprocessOptions) -> Vec<RasterOperation> {
    let mut operations = Vec::new();
    if let Some(spec) = options.resize {
        operations.push(RasterOperation::Resize(spec));
    }
    if let Some(background) = options.flatten {
        operations.push(RasterOperation::Flatten { background });
    }
    if options.greyscale {
        operations.push(RasterOperation::Greyscale);
    }
    if options.normalize {
        operations.push(RasterOperation::Normalize);
    }
    if let Some(cutoff) = options.threshold {
        operations.push(RasterOperation::Threshold { cutoff });
    }
    if let Some(color) = options.tint {
        operations.push(RasterOperation::Tint { color });
    }
    if let Some(spec) = options.downscale {
        operations.push(RasterOperation::Resize(spec));
    }
    operations
}

/// A PNG-encoded raster ready for vectorization, with its pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRaster {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PreparedRaster {
    pub fn from_image(image: &DynamicImage) -> LogoResult<Self> {
        Ok(Self {
            png: encode_png(image)?,
            width: image.width(),
            height: image.height(),
        })
    }

    pub fn decode(&self) -> LogoResult<DynamicImage> {
        Ok(image::load_from_memory(&self.png)?)
    }
}

/// Decode `bytes`, apply the configured steps, and re-encode the result as PNG.
pub fn preprocess(bytes: &[u8], options: &PreprocessOptions) -> LogoResult<PreparedRaster> {
    let source = image::load_from_memory(bytes)?;
    if source.width() == 0 || source.height() == 0 {
        return Err(LogoError::MalformedInput("image has no pixels".to_string()));
    }
    let operations = operations_from_options(options);
    let processed = apply_operations(&source, &operations);
    tracing::debug!(
        source_width = source.width(),
        source_height = source.height(),
        width = processed.width(),
        height = processed.height(),
        steps = operations.len(),
        "raster preprocessed"
    );
    PreparedRaster::from_image(&processed)
}

pub fn encode_png(image: &DynamicImage) -> LogoResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Aspect-preserving resize into the box, optionally padded onto an exact-size canvas.
pub fn resize_to_box(image: &DynamicImage, spec: ResizeSpec) -> DynamicImage {
    if image.width() == 0 || image.height() == 0 || spec.width == 0 || spec.height == 0 {
        return image.clone();
    }
    let resized = image.resize(spec.width, spec.height, FilterType::Lanczos3);
    match spec.padding {
        Some(color) => DynamicImage::ImageRgba8(pad_to_canvas(
            &resized.to_rgba8(),
            spec.width,
            spec.height,
            color,
        )),
        None => resized,
    }
}

/// Binary threshold: values below `cutoff` become 0, values at or above become 255.
pub fn threshold_mask(gray: &GrayImage, cutoff: u8) -> GrayImage {
    if cutoff == 0 {
        let (w, h) = gray.dimensions();
        return GrayImage::from_pixel(w, h, image::Luma([255]));
    }
    // imageproc maps `> thr` to white
    ip_threshold(gray, cutoff - 1, ThresholdType::Binary)
}

/// Threshold the luminance of `image`, keeping its alpha channel if it has one.
pub fn threshold_image(image: &DynamicImage, cutoff: u8) -> DynamicImage {
    let binary = threshold_mask(&image.to_luma8(), cutoff);
    if !image.color().has_alpha() {
        return DynamicImage::ImageLuma8(binary);
    }
    let alpha = image.to_luma_alpha8();
    let out = GrayAlphaImage::from_fn(binary.width(), binary.height(), |x, y| {
        LumaA([binary.get_pixel(x, y)[0], alpha.get_pixel(x, y)[1]])
    });
    DynamicImage::ImageLumaA8(out)
}

/// Find the luminance values at the lower and upper stretch percentiles.
///
/// Returns `None` when the histogram is too narrow to stretch.
pub fn stretch_bounds(histogram: &[u64; 256]) -> Option<(u8, u8)> {
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return None;
    }
    let lower_target = total as f64 * NORMALIZE_LOWER_PERCENTILE;
    let upper_target = total as f64 * NORMALIZE_UPPER_PERCENTILE;

    let mut cumulative = 0u64;
    let mut low = None;
    let mut high = None;
    for (value, count) in histogram.iter().enumerate() {
        cumulative += count;
        if low.is_none() && cumulative as f64 > lower_target {
            low = Some(value as u8);
        }
        if high.is_none() && cumulative as f64 >= upper_target {
            high = Some(value as u8);
        }
    }

    match (low, high) {
        (Some(low), Some(high)) if high > low => Some((low, high)),
        _ => None,
    }
}

fn stretch_value(value: u8, low: u8, high: u8) -> u8 {
    let span = u32::from(high - low);
    let offset = u32::from(value.saturating_sub(low));
    ((offset * 255 + span / 2) / span).min(255) as u8
}

/// Stretch the luminance histogram to the full 0-255 range.
///
/// Colour input is converted to greyscale first. Fully transparent pixels do not
/// contribute to the histogram.
pub fn normalize_contrast(image: &DynamicImage) -> DynamicImage {
    let gray = image.to_luma_alpha8();
    let mut histogram = [0u64; 256];
    for px in gray.pixels() {
        if px[1] > 0 {
            histogram[px[0] as usize] += 1;
        }
    }

    let Some((low, high)) = stretch_bounds(&histogram) else {
        return image.grayscale();
    };

    if image.color().has_alpha() {
        let out = GrayAlphaImage::from_fn(gray.width(), gray.height(), |x, y| {
            let LumaA([l, a]) = *gray.get_pixel(x, y);
            LumaA([stretch_value(l, low, high), a])
        });
        DynamicImage::ImageLumaA8(out)
    } else {
        let out = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            image::Luma([stretch_value(gray.get_pixel(x, y)[0], low, high)])
        });
        DynamicImage::ImageLuma8(out)
    }
}
