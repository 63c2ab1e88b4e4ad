use image::DynamicImage;
use visioncortex::PathSimplifyMode;
use vtracer::{ColorImage, ColorMode, Config, Hierarchical, SvgFile, convert};

use crate::config::TraceSettings;
use crate::{LogoError, LogoResult};

use super::RasterVectorizer;

/// Largest potrace `alphamax`; corresponds to a 180 degree corner threshold.
const ALPHA_MAX_LIMIT: f64 = 1.334;

/// Options handed to VTracer, derived from [`TraceSettings`].
#[derive(Debug, Clone)]
pub struct TraceOptions {
    pub tracer_mode: PathSimplifyMode,
    pub tracer_filter_speckle: usize,
    pub tracer_corner_threshold: i32,
    pub tracer_length_threshold: f64,
    pub tracer_max_iterations: usize,
    pub tracer_splice_threshold: i32,
    pub tracer_path_precision: Option<u32>,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            tracer_mode: PathSimplifyMode::Spline,
            tracer_filter_speckle: 4,
            tracer_corner_threshold: 60,
            tracer_length_threshold: 4.0,
            tracer_max_iterations: 10,
            tracer_splice_threshold: 45,
            tracer_path_precision: Some(2),
        }
    }
}

impl From<&TraceSettings> for TraceOptions {
    fn from(settings: &TraceSettings) -> Self {
        let speckle = (f64::from(settings.turd_size)).sqrt().ceil() as usize;
        let corner = (settings.alpha_max / ALPHA_MAX_LIMIT * 180.0).round().clamp(0.0, 180.0);
        let length = (3.5 + 2.5 * settings.opt_tolerance).clamp(3.5, 10.0);
        Self {
            tracer_mode: if settings.opt_curve {
                PathSimplifyMode::Spline
            } else {
                PathSimplifyMode::Polygon
            },
            tracer_filter_speckle: speckle,
            tracer_corner_threshold: corner as i32,
            tracer_length_threshold: length,
            ..Self::default()
        }
    }
}

/// VTracer-based SVG vectorizer in binary colour mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct VtracerSvgVectorizer;

impl RasterVectorizer for VtracerSvgVectorizer {
    type Options = TraceSettings;

    fn vectorize(&self, raster: &DynamicImage, options: &Self::Options) -> LogoResult<String> {
        trace_to_svg_string(raster, options)
    }
}

/// Trace the foreground regions of `raster` into an SVG string.
pub fn trace_to_svg_string(raster: &DynamicImage, settings: &TraceSettings) -> LogoResult<String> {
    if raster.width() == 0 || raster.height() == 0 {
        return Err(LogoError::Vectorization(
            "cannot trace an image with no pixels".to_string(),
        ));
    }
    let color_img = raster_to_color_image(raster, settings.threshold.to_byte(), settings.black_on_white);
    let svg_file = trace(color_img, &TraceOptions::from(settings))?;
    Ok(svg_file.to_string())
}

/// Trace a ColorImage into an SVG using VTracer with the given options.
pub fn trace(img: ColorImage, options: &TraceOptions) -> LogoResult<SvgFile> {
    let cfg = Config {
        color_mode: ColorMode::Binary,
        hierarchical: Hierarchical::Stacked,
        mode: options.tracer_mode,
        filter_speckle: options.tracer_filter_speckle,
        color_precision: 6,
        layer_difference: 16,
        corner_threshold: options.tracer_corner_threshold,
        length_threshold: options.tracer_length_threshold,
        max_iterations: options.tracer_max_iterations,
        splice_threshold: options.tracer_splice_threshold,
        path_precision: options.tracer_path_precision,
    };

    convert(img, cfg).map_err(LogoError::Vectorization)
}

/// Build the binary image VTracer sees: dark pixels are foreground.
///
/// Alpha is composited onto white first. With `black_on_white` false the result is
/// inverted so light regions get traced instead.
pub fn raster_to_color_image(raster: &DynamicImage, threshold: u8, black_on_white: bool) -> ColorImage {
    let gray = raster.to_luma_alpha8();
    let (w, h) = gray.dimensions();
    let (w_usize, h_usize) = (w as usize, h as usize);
    let mut rgba = vec![0u8; 4 * w_usize * h_usize];

    for (i, px) in gray.pixels().enumerate() {
        let [l, a] = px.0;
        let on_white = 255 - ((255 - u16::from(l)) * u16::from(a) / 255) as u8;
        let base = if on_white >= threshold { 255 } else { 0 };
        let v = if black_on_white { base } else { 255 - base };
        let idx = i * 4;
        rgba[idx] = v;
        rgba[idx + 1] = v;
        rgba[idx + 2] = v;
        rgba[idx + 3] = 255;
    }

    ColorImage {
        pixels: rgba,
        width: w_usize,
        height: h_usize,
    }
}
