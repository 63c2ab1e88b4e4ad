use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::Form;

use crate::upstream::{body_details, png_part, transport_error, upstream_from_body};
use crate::{LogoError, LogoResult};

pub const DEFAULT_REMOVE_BG_URL: &str = "https://api.remove.bg/v1.0/removebg";
pub const DEFAULT_REMOVE_BG_ACCOUNT_URL: &str = "https://api.remove.bg/v1.0/account";
pub const ENV_REMOVE_BG_API_KEY: &str = "REMOVEBG_API_KEY";

const SERVICE: &str = "Remove.bg";

/// A service that erases the background of an image, returning PNG bytes with transparency.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Fail fast when the credential is missing, before any network traffic.
    fn ensure_configured(&self) -> LogoResult<()>;

    async fn remove_background(&self, image: Vec<u8>) -> LogoResult<Vec<u8>>;

    /// Remaining credits on the account, for the status endpoint.
    async fn account_credits(&self) -> LogoResult<f64> {
        Err(LogoError::Configuration(
            "account lookup is not supported by this background remover".to_string(),
        ))
    }
}

/// Client for the remove.bg HTTP API.
#[derive(Debug, Clone)]
pub struct RemoveBgClient {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    account_endpoint: String,
}

impl RemoveBgClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            endpoint: DEFAULT_REMOVE_BG_URL.to_string(),
            account_endpoint: DEFAULT_REMOVE_BG_ACCOUNT_URL.to_string(),
        }
    }

    /// Override the removal endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Override the account lookup endpoint.
    pub fn with_account_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.account_endpoint = endpoint.into();
        self
    }

    fn api_key(&self) -> LogoResult<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            LogoError::Configuration(format!(
                "Remove.bg API key is not configured. Please add {ENV_REMOVE_BG_API_KEY} to your environment variables."
            ))
        })
    }
}

#[async_trait]
impl BackgroundRemover for RemoveBgClient {
    fn ensure_configured(&self) -> LogoResult<()> {
        self.api_key().map(|_| ())
    }

    async fn remove_background(&self, image: Vec<u8>) -> LogoResult<Vec<u8>> {
        let api_key = self.api_key()?;
        let input_len = image.len();
        let form = Form::new()
            .part("image_file", png_part(image, "image.png")?)
            .text("size", "auto")
            .text("format", "png");

        tracing::info!(bytes = input_len, "calling background removal service");
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Api-Key", api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| transport_error(SERVICE, e))?;
        if !status.is_success() {
            tracing::error!(status = %status, "background removal rejected the request");
            return Err(classify_failure(status, &body));
        }

        tracing::info!(bytes = body.len(), "background removed");
        Ok(body.to_vec())
    }

    async fn account_credits(&self) -> LogoResult<f64> {
        let api_key = self.api_key()?;
        let response = self
            .client
            .get(&self.account_endpoint)
            .header("X-Api-Key", api_key)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| transport_error(SERVICE, e))?;
        if !status.is_success() {
            return Err(upstream_from_body(&body));
        }

        let details = body_details(&body);
        details
            .as_ref()
            .and_then(|value| value.pointer("/data/attributes/credits/total"))
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| LogoError::Upstream {
                message: "Remove.bg account response did not include a credit total".to_string(),
                details,
            })
    }
}

/// Map a non-2xx remove.bg response to the error taxonomy.
pub fn classify_failure(status: StatusCode, body: &[u8]) -> LogoError {
    match status {
        StatusCode::PAYMENT_REQUIRED => LogoError::QuotaExceeded(
            "Remove.bg credits exhausted. Please check your account.".to_string(),
        ),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LogoError::Authentication("Remove.bg API key is invalid.".to_string())
        }
        _ => upstream_from_body(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod classify_failure {
        use super::*;

        #[test]
        fn payment_required_is_quota() {
            let err = classify_failure(StatusCode::PAYMENT_REQUIRED, b"");
            assert!(matches!(err, LogoError::QuotaExceeded(_)));
            assert!(err.to_string().contains("credits exhausted"));
        }

        #[test]
        fn forbidden_is_authentication() {
            let err = classify_failure(StatusCode::FORBIDDEN, b"");
            assert!(matches!(err, LogoError::Authentication(_)));
            assert_eq!(err.to_string(), "Remove.bg API key is invalid.");
        }

        #[test]
        fn other_status_passes_remote_title_through() {
            let body = br#"{"errors":[{"title":"Could not identify foreground in image."}]}"#;
            let err = classify_failure(StatusCode::BAD_REQUEST, body);
            assert_eq!(err.to_string(), "Could not identify foreground in image.");
            assert!(err.details().is_some());
        }

        #[test]
        fn other_status_without_message_is_generic() {
            let err = classify_failure(StatusCode::INTERNAL_SERVER_ERROR, b"");
            assert_eq!(err.to_string(), "Failed to process image.");
        }
    }

    #[test]
    fn missing_key_is_configuration_error() {
        let client = RemoveBgClient::new(None);
        let err = client.ensure_configured().unwrap_err();
        assert!(matches!(err, LogoError::Configuration(_)));
        assert!(err.to_string().contains("REMOVEBG_API_KEY"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        assert!(RemoveBgClient::new(Some("  ".into())).ensure_configured().is_err());
        assert!(RemoveBgClient::new(Some("key".into())).ensure_configured().is_ok());
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        // An unroutable endpoint would surface as an upstream error if a request were attempted.
        let client = RemoveBgClient::new(None).with_endpoint("http://127.0.0.1:9/never");
        let err = client.remove_background(vec![1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, LogoError::Configuration(_)));
    }

    mod wire {
        use super::*;
        use crate::upstream::stub::StubService;

        fn client_for(stub: &StubService) -> RemoveBgClient {
            RemoveBgClient::new(Some("rb-key-123".into()))
                .with_endpoint(&stub.url)
                .with_account_endpoint(&stub.url)
        }

        #[tokio::test]
        async fn removal_posts_the_documented_form() {
            let stub = StubService::start(200, "image/png", b"PNG-OUT").await;
            let out = client_for(&stub).remove_background(b"PNG-IN".to_vec()).await.unwrap();
            assert_eq!(out, b"PNG-OUT");

            let request = stub.only_request();
            assert_eq!(request.method, "POST");
            assert_eq!(request.path, "/v1/endpoint");
            assert_eq!(request.header("x-api-key"), Some("rb-key-123"));
            assert!(request.header("content-type").unwrap().starts_with("multipart/form-data; boundary="));
            assert_eq!(request.form_part_count(), 3);
            assert_eq!(request.form_field("size").as_deref(), Some("auto"));
            assert_eq!(request.form_field("format").as_deref(), Some("png"));
            let body = request.body_text();
            assert!(body.contains("name=\"image_file\"; filename=\"image.png\"\r\nContent-Type: image/png\r\n\r\nPNG-IN"));
        }

        #[tokio::test]
        async fn payment_required_response_is_quota() {
            let stub = StubService::start(402, "application/json", br#"{"errors":[{"title":"Insufficient credits"}]}"#).await;
            let err = client_for(&stub).remove_background(vec![1]).await.unwrap_err();
            assert!(matches!(err, LogoError::QuotaExceeded(_)));
        }

        #[tokio::test]
        async fn rejected_key_is_authentication() {
            let stub = StubService::start(403, "application/json", b"{}").await;
            let err = client_for(&stub).remove_background(vec![1]).await.unwrap_err();
            assert!(matches!(err, LogoError::Authentication(_)));
        }

        #[tokio::test]
        async fn remote_error_title_is_passed_through() {
            let stub = StubService::start(
                400,
                "application/json",
                br#"{"errors":[{"title":"Could not identify foreground in image."}]}"#,
            )
            .await;
            let err = client_for(&stub).remove_background(vec![1]).await.unwrap_err();
            assert_eq!(err.to_string(), "Could not identify foreground in image.");
            assert_eq!(
                err.details().unwrap()["errors"][0]["title"],
                "Could not identify foreground in image."
            );
        }

        #[tokio::test]
        async fn account_lookup_reads_the_credit_total() {
            let stub = StubService::start(
                200,
                "application/json",
                br#"{"data":{"attributes":{"credits":{"total":42.5,"subscription":40}}}}"#,
            )
            .await;
            let credits = client_for(&stub).account_credits().await.unwrap();
            assert_eq!(credits, 42.5);

            let request = stub.only_request();
            assert_eq!(request.method, "GET");
            assert_eq!(request.header("x-api-key"), Some("rb-key-123"));
            assert!(request.body.is_empty());
        }

        #[tokio::test]
        async fn account_response_without_total_is_upstream() {
            let stub = StubService::start(200, "application/json", br#"{"data":{}}"#).await;
            let err = client_for(&stub).account_credits().await.unwrap_err();
            assert!(matches!(err, LogoError::Upstream { .. }));
            assert!(err.details().is_some());
        }
    }
}
