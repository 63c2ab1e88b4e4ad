use std::sync::Arc;

use crate::background::BackgroundRemover;
use crate::config::{BrandColor, ProcessingMode, Strategy};
use crate::decode::decode_data_uri;
use crate::preprocess::preprocess;
use crate::svg::normalize_svg;
use crate::vectorizer::{RasterVectorizer, VectorOutput};
use crate::vectorizer::embed::{RASTER_EMBED_NOTE, embed_png};
use crate::vectorizer::remote::RemoteVectorizer;
use crate::vectorizer::vtracer::VtracerSvgVectorizer;
use crate::LogoResult;

/// The finished mark for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedLogo {
    pub svg: String,
    pub mode: ProcessingMode,
    /// False when the SVG only wraps a raster.
    pub is_vector: bool,
    pub note: Option<&'static str>,
}

/// Runs decode, background removal, preprocessing, vectorization and normalization in order.
#[derive(Clone)]
pub struct LogoPipeline {
    remover: Arc<dyn BackgroundRemover>,
    vectorizer: Arc<dyn RemoteVectorizer>,
    brand: BrandColor,
    default_mode: ProcessingMode,
}

impl LogoPipeline {
    pub fn new(remover: Arc<dyn BackgroundRemover>, vectorizer: Arc<dyn RemoteVectorizer>) -> Self {
        Self {
            remover,
            vectorizer,
            brand: BrandColor::default(),
            default_mode: ProcessingMode::Enhanced,
        }
    }

    /// Set the colour every fill and stroke is forced to.
    pub fn with_brand_color(mut self, brand: BrandColor) -> Self {
        self.brand = brand;
        self
    }

    /// Set the mode used when a request does not name one.
    pub fn with_default_mode(mut self, mode: ProcessingMode) -> Self {
        self.default_mode = mode;
        self
    }

    pub fn brand_color(&self) -> BrandColor {
        self.brand
    }

    pub fn default_mode(&self) -> ProcessingMode {
        self.default_mode
    }

    pub fn background_remover(&self) -> &dyn BackgroundRemover {
        self.remover.as_ref()
    }

    /// Turn a data-URI image into a normalized brand-coloured SVG.
    ///
    /// Credentials for every collaborator the mode needs are checked before
    /// anything is decoded or sent over the network.
    pub async fn process(&self, data_uri: &str, mode: Option<ProcessingMode>) -> LogoResult<ProcessedLogo> {
        let mode = mode.unwrap_or(self.default_mode);
        self.remover.ensure_configured()?;
        if mode.uses_remote_vectorizer() {
            self.vectorizer.ensure_configured()?;
        }

        let bytes = decode_data_uri(data_uri)?;
        tracing::info!(mode = %mode, bytes = bytes.len(), "processing logo");

        let foreground = self.remover.remove_background(bytes).await?;

        let params = mode.parameters(self.brand);
        let preprocess_options = params.preprocess.clone();
        let prepared =
            tokio::task::spawn_blocking(move || preprocess(&foreground, &preprocess_options)).await??;
        tracing::info!(
            width = prepared.width,
            height = prepared.height,
            "raster prepared"
        );

        let output = match params.strategy {
            Strategy::Trace(settings) => {
                let view_box = (prepared.width, prepared.height);
                let svg = tokio::task::spawn_blocking(move || {
                    let raster = prepared.decode()?;
                    VtracerSvgVectorizer.vectorize(&raster, &settings)
                })
                .await??;
                VectorOutput {
                    svg,
                    view_box,
                    is_vector: true,
                }
            }
            Strategy::Remote(remote) => {
                let svg = self.vectorizer.vectorize(prepared.png, &remote).await?;
                VectorOutput {
                    svg,
                    view_box: (remote.width, remote.height),
                    is_vector: true,
                }
            }
            Strategy::Embed(style) => embed_png(&prepared.png, style, self.brand),
        };

        let svg = normalize_svg(&output.svg, output.view_box, self.brand)?;
        tracing::info!(
            mode = %mode,
            vector = output.is_vector,
            bytes = svg.len(),
            "logo processed"
        );

        Ok(ProcessedLogo {
            svg,
            mode,
            is_vector: output.is_vector,
            note: (!output.is_vector).then_some(RASTER_EMBED_NOTE),
        })
    }
}
