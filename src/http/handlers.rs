use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::config::ProcessingMode;
use crate::pipeline::ProcessedLogo;
use crate::{LogoError, LogoResult};

const VECTORIZER_STATUS_HINT: &str = "Please check Vectorizer.ai dashboard for API status";

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub image: String,
    #[serde(default)]
    pub mode: Option<String>,
}

impl ProcessRequest {
    /// Parse a JSON body; any failure is the caller's malformed input.
    pub fn from_body(body: &[u8]) -> LogoResult<Self> {
        serde_json::from_slice(body)
            .map_err(|e| LogoError::MalformedInput(format!("invalid request body: {e}")))
    }

    /// The explicitly requested mode, if any. A blank string counts as absent.
    pub fn mode(&self) -> LogoResult<Option<ProcessingMode>> {
        self.mode
            .as_deref()
            .filter(|mode| !mode.trim().is_empty())
            .map(str::parse::<ProcessingMode>)
            .transpose()
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub svg: String,
    pub mode: &'static str,
    pub vector: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

impl From<ProcessedLogo> for ProcessResponse {
    fn from(logo: ProcessedLogo) -> Self {
        Self {
            success: true,
            svg: logo.svg,
            mode: logo.mode.as_str(),
            vector: logo.is_vector,
            note: logo.note,
        }
    }
}

/// Presence of one credential, without exposing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStatus {
    pub set: bool,
    pub length: usize,
    pub prefix: String,
}

impl KeyStatus {
    pub fn of(key: Option<&str>) -> Self {
        match key.filter(|k| !k.is_empty()) {
            Some(key) => Self {
                set: true,
                length: key.chars().count(),
                prefix: format!("{}...", key.chars().take(3).collect::<String>()),
            },
            None => Self {
                set: false,
                length: 0,
                prefix: "not set".to_string(),
            },
        }
    }
}

/// Credential summary captured at startup for the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyReport {
    pub remove_bg: KeyStatus,
    pub vectorizer: KeyStatus,
}

impl ApiKeyReport {
    pub fn new(remove_bg_key: Option<&str>, vectorizer_key: Option<&str>) -> Self {
        Self {
            remove_bg: KeyStatus::of(remove_bg_key),
            vectorizer: KeyStatus::of(vectorizer_key),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeysBody {
    pub remove_bg_key_set: bool,
    pub remove_bg_key_length: usize,
    pub remove_bg_key_prefix: String,
    pub vectorizer_key_set: bool,
    pub vectorizer_key_length: usize,
    pub vectorizer_key_prefix: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub success: bool,
    pub message: &'static str,
    pub api_keys: ApiKeysBody,
    pub remove_bg_test: String,
    pub vectorizer_test: &'static str,
}

pub async fn process_logo(
    state: AppState,
    pinned: Option<ProcessingMode>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ProcessResponse>, LogoError> {
    let body = body.map_err(|rejection| {
        LogoError::MalformedInput(format!("could not read request body: {}", rejection.body_text()))
    })?;
    let request = ProcessRequest::from_body(&body)?;
    let mode = request.mode()?.or(pinned);
    let logo = state.pipeline.process(&request.image, mode).await?;
    Ok(Json(ProcessResponse::from(logo)))
}

/// Report which credentials are configured and query the background-removal account.
pub async fn test_api(State(state): State<AppState>) -> Json<StatusResponse> {
    let keys = state.keys.as_ref();
    let remove_bg_test = if keys.remove_bg.set {
        match state.pipeline.background_remover().account_credits().await {
            Ok(credits) => format!("working - credits: {credits}"),
            Err(err) => format!("error: {err}"),
        }
    } else {
        "not tested".to_string()
    };
    tracing::info!(remove_bg = %remove_bg_test, "api status checked");

    Json(StatusResponse {
        success: true,
        message: "API Test Results",
        api_keys: ApiKeysBody {
            remove_bg_key_set: keys.remove_bg.set,
            remove_bg_key_length: keys.remove_bg.length,
            remove_bg_key_prefix: keys.remove_bg.prefix.clone(),
            vectorizer_key_set: keys.vectorizer.set,
            vectorizer_key_length: keys.vectorizer.length,
            vectorizer_key_prefix: keys.vectorizer.prefix.clone(),
        },
        remove_bg_test,
        vectorizer_test: VECTORIZER_STATUS_HINT,
    })
}

pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({ "error": "Method not allowed" })),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::to_bytes;
    use axum::response::Response;
    use serde_json::Value;

    use super::*;
    use crate::http::{LEGACY_ROUTES, router};
    use crate::pipeline::LogoPipeline;
    use crate::pipeline::fakes::{FakeRemover, FakeVectorizer};

    fn state_with(remover: FakeRemover) -> AppState {
        let pipeline = LogoPipeline::new(Arc::new(remover), Arc::new(FakeVectorizer::default()));
        AppState::new(pipeline, ApiKeyReport::new(Some("abcdef"), None))
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn png_data_uri() -> String {
        let img = image::RgbaImage::from_fn(64, 64, |x, _| {
            if x < 32 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        let png = crate::preprocess::encode_png(&image::DynamicImage::ImageRgba8(img)).unwrap();
        crate::decode::encode_data_uri("image/png", &png)
    }

    mod unit {
        use super::*;

        #[test]
        fn key_status_masks_credentials() {
            let status = KeyStatus::of(Some("sk_live_123"));
            assert_eq!(status.prefix, "sk_...");
            assert_eq!(status.length, 11);
            assert_eq!(KeyStatus::of(None).prefix, "not set");
            assert!(!KeyStatus::of(Some("")).set);
        }

        #[test]
        fn body_mode_parsing() {
            let req = ProcessRequest::from_body(br#"{"image":"x","mode":"hq"}"#).unwrap();
            assert_eq!(req.mode().unwrap(), Some(ProcessingMode::HighQuality));
            let req = ProcessRequest::from_body(br#"{"image":"x","mode":" "}"#).unwrap();
            assert_eq!(req.mode().unwrap(), None);
            assert!(ProcessRequest::from_body(br#"{"mode":"hq"}"#).is_err());
        }

        #[tokio::test]
        async fn success_body_shape() {
            let response = process_logo(
                state_with(FakeRemover::default()),
                Some(ProcessingMode::RasterEmbed),
                Ok(Bytes::from(serde_json::to_vec(&serde_json::json!({ "image": png_data_uri() })).unwrap())),
            )
            .await
            .into_response();
            assert_eq!(response.status(), StatusCode::OK);
            let body = json_body(response).await;
            assert_eq!(body["success"], true);
            assert_eq!(body["mode"], "raster-embed");
            assert_eq!(body["vector"], false);
            assert!(body["note"].is_string());
            assert!(body["svg"].as_str().unwrap().contains(r#"width="50""#));
        }

        #[tokio::test]
        async fn invalid_json_is_a_500_failure_body() {
            let response = process_logo(state_with(FakeRemover::default()), None, Ok(Bytes::from_static(b"{")))
                .await
                .into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body = json_body(response).await;
            assert_eq!(body["success"], false);
            assert!(body["error"].as_str().unwrap().starts_with("Malformed input"));
            assert!(body.get("details").is_none());
        }

        #[tokio::test]
        async fn unreadable_body_is_a_500_failure_body() {
            use axum::body::Body;
            use axum::extract::{FromRequest, Request};

            // Without a limit layer the extractor caps bodies at 2 MiB.
            let request = Request::new(Body::from(vec![b' '; 3 * 1024 * 1024]));
            let rejection = Bytes::from_request(request, &()).await.unwrap_err();
            let response = process_logo(state_with(FakeRemover::default()), None, Err(rejection))
                .await
                .into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body = json_body(response).await;
            assert_eq!(body["success"], false);
            assert!(body["error"].as_str().unwrap().starts_with("Malformed input"));
        }

        #[tokio::test]
        async fn upstream_details_are_returned() {
            let remover = FakeRemover {
                failure: Some(|| LogoError::Upstream {
                    message: "Could not identify foreground in image.".into(),
                    details: Some(serde_json::json!({ "errors": [{ "title": "Could not identify foreground in image." }] })),
                }),
                ..FakeRemover::default()
            };
            let body = serde_json::to_vec(&serde_json::json!({ "image": png_data_uri() })).unwrap();
            let response = process_logo(state_with(remover), None, Ok(Bytes::from(body)))
                .await
                .into_response();
            let body = json_body(response).await;
            assert_eq!(body["error"], "Could not identify foreground in image.");
            assert_eq!(body["details"]["errors"][0]["title"], "Could not identify foreground in image.");
        }

        #[tokio::test]
        async fn status_reports_credits() {
            let remover = FakeRemover {
                credits: Some(42.0),
                ..FakeRemover::default()
            };
            let Json(status) = test_api(State(state_with(remover))).await;
            assert_eq!(status.remove_bg_test, "working - credits: 42");
            assert_eq!(status.api_keys.remove_bg_key_prefix, "abc...");
            assert!(!status.api_keys.vectorizer_key_set);
            assert_eq!(status.api_keys.vectorizer_key_prefix, "not set");
        }
    }

    mod routing {
        use super::*;

        async fn send(method: reqwest::Method, path: &str, body: Vec<u8>) -> reqwest::Response {
            send_to(state_with(FakeRemover::default()), method, path, body).await
        }

        async fn send_to(state: AppState, method: reqwest::Method, path: &str, body: Vec<u8>) -> reqwest::Response {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let app = router(state);
            tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
            reqwest::Client::new()
                .request(method, format!("http://{addr}{path}"))
                .header("content-type", "application/json")
                .body(body)
                .send()
                .await
                .unwrap()
        }

        #[tokio::test]
        async fn options_is_ok_and_empty() {
            let response = send(reqwest::Method::OPTIONS, "/api/process-logo", Vec::new()).await;
            assert_eq!(response.status().as_u16(), 200);
            assert!(response.bytes().await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn other_methods_are_rejected_with_json() {
            for path in ["/api/process-logo", "/api/test-api", "/api/process-logo-hq"] {
                for method in [reqwest::Method::GET, reqwest::Method::PUT, reqwest::Method::DELETE] {
                    let response = send(method, path, Vec::new()).await;
                    assert_eq!(response.status().as_u16(), 405);
                    let body: Value = response.json().await.unwrap();
                    assert_eq!(body["error"], "Method not allowed");
                }
            }
        }

        #[tokio::test]
        async fn legacy_route_pins_its_mode() {
            let (path, mode) = LEGACY_ROUTES[3];
            let body = serde_json::to_vec(&serde_json::json!({ "image": png_data_uri() })).unwrap();
            let response = send(reqwest::Method::POST, path, body).await;
            assert_eq!(response.status().as_u16(), 200);
            let body: Value = response.json().await.unwrap();
            assert_eq!(body["mode"], mode.as_str());
        }

        #[tokio::test]
        async fn body_mode_overrides_the_pinned_one() {
            let body = serde_json::to_vec(&serde_json::json!({ "image": png_data_uri(), "mode": "color" })).unwrap();
            let response = send(reqwest::Method::POST, "/api/process-logo-simple", body).await;
            let body: Value = response.json().await.unwrap();
            assert_eq!(body["mode"], "color-embed");
        }

        #[tokio::test]
        async fn bodies_above_the_framework_default_are_accepted() {
            let padding = "x".repeat(3 * 1024 * 1024);
            let body = serde_json::to_vec(&serde_json::json!({
                "image": png_data_uri(),
                "mode": "raster-embed",
                "padding": padding,
            }))
            .unwrap();
            assert!(body.len() < crate::http::MAX_BODY_BYTES);
            let response = send(reqwest::Method::POST, "/api/process-logo", body).await;
            assert_eq!(response.status().as_u16(), 200);
            let body: Value = response.json().await.unwrap();
            assert_eq!(body["success"], true);
        }

        #[tokio::test]
        async fn body_limit_follows_the_state() {
            let state = state_with(FakeRemover::default()).with_body_limit(4096);
            let body = serde_json::to_vec(&serde_json::json!({
                "image": png_data_uri(),
                "mode": "raster-embed",
                "padding": "x".repeat(4096),
            }))
            .unwrap();
            let response = send_to(state, reqwest::Method::POST, "/api/process-logo", body).await;
            assert_eq!(response.status().as_u16(), 500);
            let body: Value = response.json().await.unwrap();
            assert_eq!(body["success"], false);
            assert!(body["error"].as_str().unwrap().starts_with("Malformed input"));
        }

        #[tokio::test]
        async fn malformed_body_is_a_500() {
            let response = send(reqwest::Method::POST, "/api/process-logo", b"not json".to_vec()).await;
            assert_eq!(response.status().as_u16(), 500);
            let body: Value = response.json().await.unwrap();
            assert_eq!(body["success"], false);
        }
    }
}
