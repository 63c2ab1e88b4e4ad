pub mod background;
pub mod compose;
pub mod config;
pub mod decode;
pub mod error;
#[cfg(feature = "server")]
pub mod http;
pub mod pipeline;
pub mod preprocess;
pub mod svg;
mod upstream;
pub mod vectorizer;

pub use background::{BackgroundRemover, RemoveBgClient};
pub use config::{BrandColor, ProcessingMode};
pub use error::{LogoError, LogoResult};
pub use pipeline::{LogoPipeline, ProcessedLogo};
pub use svg::normalize_svg;
pub use vectorizer::remote::{RemoteVectorizer, VectorizerAiClient};
pub use vectorizer::vtracer::{TraceOptions, VtracerSvgVectorizer, trace_to_svg_string};
pub use vectorizer::{RasterVectorizer, VectorOutput};
