use thiserror::Error;

/// Result type alias for operations that may fail with [`LogoError`].
pub type LogoResult<T> = std::result::Result<T, LogoError>;

/// Fallback message used when a failure carries nothing more specific.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to process image.";

/// Error types that can occur while turning a logo into an SVG mark.
///
/// Every variant is terminal for the request that produced it. The display
/// string is the human-readable message returned to the caller.
#[derive(Debug, Error)]
pub enum LogoError {
    /// The request body or data URI could not be understood.
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    /// A credential required by the selected mode is missing.
    #[error("{0}")]
    Configuration(String),
    /// A remote service rejected the configured credential.
    #[error("{0}")]
    Authentication(String),
    /// The background-removal account has no credits left.
    #[error("{0}")]
    QuotaExceeded(String),
    /// A remote service is throttling requests.
    #[error("{0}")]
    RateLimit(String),
    /// A remote service refused the uploaded image.
    #[error("{0}")]
    BadRequest(String),
    /// Tracing or SVG post-processing failed.
    #[error("Vectorization failed: {0}")]
    Vectorization(String),
    /// Any other remote failure, with the response body when one was received.
    #[error("{message}")]
    Upstream {
        message: String,
        details: Option<serde_json::Value>,
    },
    /// Image decoding or encoding error.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
    /// A blocking processing task panicked or was cancelled.
    #[error("Processing task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl LogoError {
    /// Upstream failure without a usable remote message.
    pub fn upstream_generic(details: Option<serde_json::Value>) -> Self {
        Self::Upstream {
            message: GENERIC_FAILURE_MESSAGE.to_string(),
            details,
        }
    }

    /// Extra diagnostic payload that accompanies the message, if any.
    pub fn details(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Upstream { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    /// Short machine-friendly name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "malformed_input",
            Self::Configuration(_) => "configuration",
            Self::Authentication(_) => "authentication",
            Self::QuotaExceeded(_) => "quota_exceeded",
            Self::RateLimit(_) => "rate_limit",
            Self::BadRequest(_) => "bad_request",
            Self::Vectorization(_) => "vectorization",
            Self::Upstream { .. } => "upstream",
            Self::Image(_) => "image",
            Self::Worker(_) => "worker",
        }
    }
}
