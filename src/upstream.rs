//! Helpers shared by the clients of the remote image services.

use reqwest::multipart::Part;
use serde_json::Value;

use crate::{LogoError, LogoResult};

/// Parse a failed response body into something worth returning as `details`.
///
/// JSON bodies are kept structured; anything else is kept as lossy UTF-8 text.
pub fn body_details(body: &[u8]) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(body).into_owned())),
    }
}

/// Pull a human-readable message out of a remote error body.
///
/// Understands `{"errors": [{"title": ..}]}`, `{"message": ..}` and `{"error": ..}`,
/// where `error` may itself be an object carrying a `message`.
pub fn body_message(details: &Value) -> Option<String> {
    let text = |v: &Value| v.as_str().map(str::to_string);
    details
        .pointer("/errors/0/title")
        .and_then(text)
        .or_else(|| details.get("message").and_then(text))
        .or_else(|| details.get("error").and_then(text))
        .or_else(|| details.pointer("/error/message").and_then(text))
        .filter(|message| !message.trim().is_empty())
}

/// Upstream error carrying the remote message when there is one, the generic fallback otherwise.
pub fn upstream_from_body(body: &[u8]) -> LogoError {
    let details = body_details(body);
    match details.as_ref().and_then(body_message) {
        Some(message) => LogoError::Upstream { message, details },
        None => LogoError::upstream_generic(details),
    }
}

/// Map a transport-level failure (connect, TLS, body read) to an upstream error.
pub fn transport_error(service: &str, err: reqwest::Error) -> LogoError {
    tracing::error!(service, error = %err, "remote request failed before a response");
    LogoError::Upstream {
        message: format!("{service} request failed: {err}"),
        details: None,
    }
}

/// A PNG file part for a multipart upload.
pub fn png_part(bytes: Vec<u8>, file_name: &'static str) -> LogoResult<Part> {
    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("image/png")
        .map_err(|e| transport_error("multipart", e))
}

/// A local stand-in for a remote service: records every request and answers with a canned response.
#[cfg(test)]
pub(crate) mod stub {
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method, StatusCode, Uri, header};

    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: Method,
        pub path: String,
        pub headers: HeaderMap,
        pub body: Bytes,
    }

    impl RecordedRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers.get(name).and_then(|value| value.to_str().ok())
        }

        pub fn body_text(&self) -> String {
            String::from_utf8_lossy(&self.body).into_owned()
        }

        /// Value of a plain text field in a `multipart/form-data` body.
        pub fn form_field(&self, name: &str) -> Option<String> {
            let text = self.body_text();
            let marker = format!("name=\"{name}\"\r\n\r\n");
            let start = text.find(&marker)? + marker.len();
            let end = text[start..].find("\r\n")?;
            Some(text[start..start + end].to_string())
        }

        /// Number of parts in a `multipart/form-data` body.
        pub fn form_part_count(&self) -> usize {
            self.body_text().matches("Content-Disposition: form-data;").count()
        }
    }

    pub struct StubService {
        pub url: String,
        requests: Arc<Mutex<Vec<RecordedRequest>>>,
    }

    impl StubService {
        pub async fn start(status: u16, content_type: &'static str, reply: &'static [u8]) -> Self {
            let requests = Arc::new(Mutex::new(Vec::new()));
            let recorder = Arc::clone(&requests);
            let app = Router::new().fallback(move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
                let recorder = Arc::clone(&recorder);
                async move {
                    recorder.lock().unwrap().push(RecordedRequest {
                        method,
                        path: uri.path().to_string(),
                        headers,
                        body,
                    });
                    (
                        StatusCode::from_u16(status).unwrap(),
                        [(header::CONTENT_TYPE, content_type)],
                        Bytes::from_static(reply),
                    )
                }
            });
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
            Self {
                url: format!("http://{addr}/v1/endpoint"),
                requests,
            }
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn only_request(&self) -> RecordedRequest {
            let requests = self.requests();
            assert_eq!(requests.len(), 1, "expected exactly one request");
            requests[0].clone()
        }
    }
}
