use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::Form;

use crate::config::RemoteVectorizeParameters;
use crate::upstream::{png_part, transport_error, upstream_from_body};
use crate::{LogoError, LogoResult};

pub const DEFAULT_VECTORIZER_URL: &str = "https://api.vectorizer.ai/v1/convert";

const SERVICE: &str = "Vectorizer.ai";

/// A hosted service that vectorizes a raster into SVG text.
#[async_trait]
pub trait RemoteVectorizer: Send + Sync {
    /// Fail fast when the credentials are missing, before any network traffic.
    fn ensure_configured(&self) -> LogoResult<()>;

    async fn vectorize(&self, png: Vec<u8>, params: &RemoteVectorizeParameters) -> LogoResult<String>;
}

/// Which credential scheme the vectorization service is called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthScheme {
    #[default]
    Bearer,
    Basic,
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthScheme::Bearer => "bearer",
            AuthScheme::Basic => "basic",
        })
    }
}

impl FromStr for AuthScheme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bearer" => Ok(AuthScheme::Bearer),
            "basic" => Ok(AuthScheme::Basic),
            other => Err(format!("vectorizer auth must be `bearer` or `basic`, got `{other}`")),
        }
    }
}

/// Resolved credentials for one of the two schemes.
#[derive(Clone, PartialEq, Eq)]
pub enum VectorizerAuth {
    Bearer { api_key: String },
    Basic { api_id: String, api_secret: String },
}

impl fmt::Debug for VectorizerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorizerAuth::Bearer { .. } => f.write_str("Bearer(..)"),
            VectorizerAuth::Basic { .. } => f.write_str("Basic(..)"),
        }
    }
}

impl VectorizerAuth {
    /// Pick the credentials for `scheme`; blank values count as missing.
    pub fn resolve(
        scheme: AuthScheme,
        api_key: Option<String>,
        api_id: Option<String>,
        api_secret: Option<String>,
    ) -> Option<Self> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match scheme {
            AuthScheme::Bearer => present(api_key).map(|api_key| VectorizerAuth::Bearer { api_key }),
            AuthScheme::Basic => match (present(api_id), present(api_secret)) {
                (Some(api_id), Some(api_secret)) => Some(VectorizerAuth::Basic { api_id, api_secret }),
                _ => None,
            },
        }
    }

    fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            VectorizerAuth::Bearer { api_key } => request.bearer_auth(api_key),
            VectorizerAuth::Basic { api_id, api_secret } => request.basic_auth(api_id, Some(api_secret)),
        }
    }
}

/// Client for the vectorizer.ai HTTP API.
#[derive(Debug, Clone)]
pub struct VectorizerAiClient {
    client: reqwest::Client,
    scheme: AuthScheme,
    auth: Option<VectorizerAuth>,
    endpoint: String,
}

impl VectorizerAiClient {
    pub fn new(scheme: AuthScheme, auth: Option<VectorizerAuth>) -> Self {
        Self {
            client: reqwest::Client::new(),
            scheme,
            auth,
            endpoint: DEFAULT_VECTORIZER_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn auth(&self) -> LogoResult<&VectorizerAuth> {
        self.auth.as_ref().ok_or_else(|| {
            LogoError::Configuration(match self.scheme {
                AuthScheme::Bearer => "Vectorizer API key is not configured. Please add VECTORIZER_API_KEY to your environment variables.".to_string(),
                AuthScheme::Basic => "Vectorizer API credentials are not configured. Please add VECTORIZER_API_ID and VECTORIZER_API_SECRET to your environment variables.".to_string(),
            })
        })
    }
}

#[async_trait]
impl RemoteVectorizer for VectorizerAiClient {
    fn ensure_configured(&self) -> LogoResult<()> {
        self.auth().map(|_| ())
    }

    async fn vectorize(&self, png: Vec<u8>, params: &RemoteVectorizeParameters) -> LogoResult<String> {
        let auth = self.auth()?;
        let input_len = png.len();
        let form = params
            .form_fields()
            .into_iter()
            .fold(Form::new().part("image", png_part(png, "logo.png")?), |form, (name, value)| {
                form.text(name, value)
            });

        tracing::info!(
            bytes = input_len,
            width = params.width,
            height = params.height,
            scheme = %self.scheme,
            "calling remote vectorizer"
        );
        let response = auth
            .apply(self.client.post(&self.endpoint))
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| transport_error(SERVICE, e))?;
        if !status.is_success() {
            tracing::error!(status = %status, "remote vectorizer rejected the request");
            return Err(classify_failure(status, &body));
        }

        let svg = String::from_utf8(body.to_vec())
            .map_err(|_| LogoError::Vectorization("remote vectorizer returned non UTF-8 output".to_string()))?;
        if !svg.contains("<svg") {
            return Err(LogoError::Vectorization(
                "remote vectorizer did not return an SVG document".to_string(),
            ));
        }
        tracing::info!(bytes = svg.len(), "remote vectorization complete");
        Ok(svg)
    }
}

/// Map a non-2xx vectorizer response to the error taxonomy.
pub fn classify_failure(status: StatusCode, body: &[u8]) -> LogoError {
    match status {
        StatusCode::UNAUTHORIZED => LogoError::Authentication(
            "API authentication failed. Please check your API keys.".to_string(),
        ),
        StatusCode::FORBIDDEN => LogoError::Authentication(
            "API access forbidden. Please check your API subscription and keys.".to_string(),
        ),
        StatusCode::TOO_MANY_REQUESTS => {
            LogoError::RateLimit("API rate limit exceeded. Please try again later.".to_string())
        }
        StatusCode::BAD_REQUEST => LogoError::BadRequest(
            "Bad request. The image may be corrupted or in an unsupported format.".to_string(),
        ),
        _ => upstream_from_body(body),
    }
}
