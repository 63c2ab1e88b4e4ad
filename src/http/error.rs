use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::LogoError;

impl IntoResponse for LogoError {
    fn into_response(self) -> Response {
        match &self {
            LogoError::MalformedInput(_) | LogoError::Configuration(_) => {
                tracing::warn!(kind = self.kind(), error = %self, "request rejected");
            }
            _ => tracing::error!(kind = self.kind(), error = %self, "request failed"),
        }

        let mut body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });
        if let Some(details) = self.details() {
            body["details"] = details.clone();
        }
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
