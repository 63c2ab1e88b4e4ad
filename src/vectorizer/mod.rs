use image::DynamicImage;

use crate::LogoResult;

pub mod embed;
pub mod remote;
pub mod vtracer;

/// A local algorithm that turns a prepared raster into SVG text.
pub trait RasterVectorizer {
    type Options;

    fn vectorize(&self, raster: &DynamicImage, options: &Self::Options) -> LogoResult<String>;
}

/// SVG produced by one of the vectorization strategies, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorOutput {
    pub svg: String,
    /// Width and height of the coordinate space the content was drawn in.
    pub view_box: (u32, u32),
    /// False when the document only wraps an embedded raster.
    pub is_vector: bool,
}
