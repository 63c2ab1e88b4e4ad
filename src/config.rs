use std::fmt;
use std::str::FromStr;

use crate::{LogoError, LogoResult};

/// Side length, in pixels, of every SVG mark handed back to callers.
pub const OUTPUT_SIZE: u32 = 50;

/// Brand colour used when nothing else is configured.
pub const DEFAULT_BRAND_COLOR: BrandColor = BrandColor([0xD2, 0xD7, 0xEB]);

const WHITE: [u8; 3] = [255, 255, 255];

/// The single colour every visible element of the output is forced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrandColor(pub [u8; 3]);

impl BrandColor {
    pub fn rgb(&self) -> [u8; 3] {
        self.0
    }

    /// Channel values scaled to 0.0-1.0, as used by an SVG colour matrix.
    pub fn unit_channels(&self) -> [f64; 3] {
        self.0.map(|c| f64::from(c) / 255.0)
    }
}

impl Default for BrandColor {
    fn default() -> Self {
        DEFAULT_BRAND_COLOR
    }
}

impl fmt::Display for BrandColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

impl FromStr for BrandColor {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let hex = value.trim().strip_prefix('#').unwrap_or(value.trim());
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("brand colour must look like #RRGGBB, got `{value}`"));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
        Ok(Self([channel(0)?, channel(2)?, channel(4)?]))
    }
}

/// Processing variant selected per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingMode {
    Simple,
    Enhanced,
    HighQuality,
    VectorService,
    ColorEmbed,
    RasterEmbed,
}

impl ProcessingMode {
    pub const ALL: [ProcessingMode; 6] = [
        ProcessingMode::Simple,
        ProcessingMode::Enhanced,
        ProcessingMode::HighQuality,
        ProcessingMode::VectorService,
        ProcessingMode::ColorEmbed,
        ProcessingMode::RasterEmbed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::Simple => "simple",
            ProcessingMode::Enhanced => "enhanced",
            ProcessingMode::HighQuality => "high-quality",
            ProcessingMode::VectorService => "vector-service",
            ProcessingMode::ColorEmbed => "color-embed",
            ProcessingMode::RasterEmbed => "raster-embed",
        }
    }

    /// Whether this mode needs the remote vectorization service.
    pub fn uses_remote_vectorizer(&self) -> bool {
        matches!(self, ProcessingMode::VectorService)
    }

    /// Look up the constant parameter set for this mode.
    pub fn parameters(&self, brand: BrandColor) -> VectorizationParameters {
        match self {
            ProcessingMode::Simple => VectorizationParameters {
                preprocess: PreprocessOptions {
                    resize: Some(ResizeSpec::inside(200, 200)),
                    flatten: Some(WHITE),
                    greyscale: true,
                    threshold: Some(128),
                    ..PreprocessOptions::default()
                },
                strategy: Strategy::Trace(TraceSettings {
                    threshold: Threshold::Unit(0.5),
                    turd_size: 10,
                    ..TraceSettings::default()
                }),
            },
            ProcessingMode::Enhanced => VectorizationParameters {
                preprocess: PreprocessOptions {
                    resize: Some(ResizeSpec::inside(300, 300)),
                    greyscale: true,
                    normalize: true,
                    threshold: Some(128),
                    ..PreprocessOptions::default()
                },
                strategy: Strategy::Trace(TraceSettings {
                    threshold: Threshold::Unit(0.5),
                    turd_size: 4,
                    alpha_max: 1.334,
                    ..TraceSettings::default()
                }),
            },
            ProcessingMode::HighQuality => VectorizationParameters {
                preprocess: PreprocessOptions {
                    resize: Some(ResizeSpec::inside(300, 300)),
                    flatten: Some(WHITE),
                    greyscale: true,
                    normalize: true,
                    threshold: Some(140),
                    ..PreprocessOptions::default()
                },
                strategy: Strategy::Trace(TraceSettings {
                    threshold: Threshold::Byte(128),
                    turd_size: 2,
                    alpha_max: 1.0,
                    ..TraceSettings::default()
                }),
            },
            ProcessingMode::VectorService => VectorizationParameters {
                preprocess: PreprocessOptions {
                    resize: Some(ResizeSpec::inside(OUTPUT_SIZE, OUTPUT_SIZE)),
                    ..PreprocessOptions::default()
                },
                strategy: Strategy::Remote(RemoteVectorizeParameters::default()),
            },
            ProcessingMode::ColorEmbed => VectorizationParameters {
                preprocess: PreprocessOptions {
                    resize: Some(ResizeSpec::inside(200, 200)),
                    flatten: Some(WHITE),
                    tint: Some(brand.rgb()),
                    downscale: Some(ResizeSpec::inside(OUTPUT_SIZE, OUTPUT_SIZE)),
                    ..PreprocessOptions::default()
                },
                strategy: Strategy::Embed(EmbedStyle::ColorMatrix),
            },
            ProcessingMode::RasterEmbed => VectorizationParameters {
                preprocess: PreprocessOptions {
                    resize: Some(ResizeSpec::inside(OUTPUT_SIZE, OUTPUT_SIZE)),
                    flatten: Some(brand.rgb()),
                    ..PreprocessOptions::default()
                },
                strategy: Strategy::Embed(EmbedStyle::Plain),
            },
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingMode {
    type Err = LogoError;

    fn from_str(value: &str) -> LogoResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "simple" | "potrace" => Ok(ProcessingMode::Simple),
            "enhanced" => Ok(ProcessingMode::Enhanced),
            "high-quality" | "hq" => Ok(ProcessingMode::HighQuality),
            "vector-service" | "vectorizer" => Ok(ProcessingMode::VectorService),
            "color-embed" | "color" => Ok(ProcessingMode::ColorEmbed),
            "raster-embed" => Ok(ProcessingMode::RasterEmbed),
            other => Err(LogoError::MalformedInput(format!(
                "unknown processing mode `{other}`"
            ))),
        }
    }
}

/// Full parameter set for one mode: how to prepare the raster and how to turn it into SVG.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorizationParameters {
    pub preprocess: PreprocessOptions,
    pub strategy: Strategy,
}

/// The three mutually exclusive ways of producing the SVG document.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Trace(TraceSettings),
    Remote(RemoteVectorizeParameters),
    Embed(EmbedStyle),
}

/// How the raster-embed envelope is decorated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedStyle {
    /// A bare `<image>` element.
    Plain,
    /// An `<image>` recoloured through a `feColorMatrix` filter.
    ColorMatrix,
}

/// Bounding box for an aspect-preserving resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSpec {
    pub width: u32,
    pub height: u32,
    /// When set, the result is centred on an exact `width`x`height` canvas of this RGBA colour.
    pub padding: Option<[u8; 4]>,
}

impl ResizeSpec {
    /// Fit inside the box without padding.
    pub const fn inside(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            padding: None,
        }
    }

    /// Fit inside the box and pad the remainder with `color`.
    pub const fn contain(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self {
            width,
            height,
            padding: Some(color),
        }
    }
}

/// Options describing how the background-free raster is prepared, applied in field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreprocessOptions {
    pub resize: Option<ResizeSpec>,
    /// Opaque colour to composite transparency onto.
    pub flatten: Option<[u8; 3]>,
    pub greyscale: bool,
    pub normalize: bool,
    /// Binary cutoff on the 0-255 scale.
    pub threshold: Option<u8>,
    pub tint: Option<[u8; 3]>,
    /// Second resize applied after every other step.
    pub downscale: Option<ResizeSpec>,
}

/// A tracer threshold given either on the 0-1 scale or the 0-255 scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    Unit(f32),
    Byte(u8),
}

impl Threshold {
    /// Normalise to the 0-255 scale.
    pub fn to_byte(self) -> u8 {
        match self {
            Threshold::Unit(value) => {
                let scaled = (value.clamp(0.0, 1.0) * 255.0).round() as i32;
                scaled.clamp(0, 255) as u8
            }
            Threshold::Byte(value) => value,
        }
    }
}

/// Potrace-style tracing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceSettings {
    pub threshold: Threshold,
    /// Trace dark regions when true, light regions when false.
    pub black_on_white: bool,
    /// Connected components smaller than this many pixels are dropped.
    pub turd_size: u32,
    /// Corner smoothing, 0.0 (sharp) to 1.334 (no corners).
    pub alpha_max: f64,
    pub opt_curve: bool,
    pub opt_tolerance: f64,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            threshold: Threshold::Byte(128),
            black_on_white: true,
            turd_size: 2,
            alpha_max: 1.0,
            opt_curve: true,
            opt_tolerance: 0.2,
        }
    }
}

/// Fields sent to the remote vectorization service.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteVectorizeParameters {
    pub mode: &'static str,
    pub file_format: &'static str,
    pub size_unit: &'static str,
    pub width: u32,
    pub height: u32,
    pub max_colors: u32,
    pub min_area: u32,
    pub simplify: u32,
    pub anti_aliased: &'static str,
}

impl Default for RemoteVectorizeParameters {
    fn default() -> Self {
        Self {
            mode: "production",
            file_format: "svg",
            size_unit: "px",
            width: OUTPUT_SIZE,
            height: OUTPUT_SIZE,
            max_colors: 2,
            min_area: 5,
            simplify: 3,
            anti_aliased: "auto",
        }
    }
}

impl RemoteVectorizeParameters {
    /// Form fields in the order the service documents them.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("mode", self.mode.to_string()),
            ("output.file_format", self.file_format.to_string()),
            ("output.size.unit", self.size_unit.to_string()),
            ("output.size.width", self.width.to_string()),
            ("output.size.height", self.height.to_string()),
            ("processing.max_colors", self.max_colors.to_string()),
            ("processing.min_area", self.min_area.to_string()),
            ("processing.simplify", self.simplify.to_string()),
            ("processing.anti_aliased", self.anti_aliased.to_string()),
        ]
    }
}
