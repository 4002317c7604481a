//! HTTP error responses for the stackpager server.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use stackpager_core::Error;

/// A core error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match self.0 {
            // The paging UI expects a bare one-element list here.
            Error::ProviderExhausted(msg) => (status, Json(json!([msg]))).into_response(),
            Error::CallerThrottled { retry_after } => {
                let body = json!({
                    "detail": format!("Request was throttled. Expected available in {retry_after} seconds.")
                });
                let mut response = (status, Json(body)).into_response();
                response.headers_mut().insert(
                    header::RETRY_AFTER,
                    HeaderValue::from_str(&retry_after.to_string()).unwrap_or_else(|_| HeaderValue::from_static("60")),
                );
                response
            }
            Error::InvalidInput(msg) | Error::ProviderError(msg) => (status, Json(json!({ "detail": msg }))).into_response(),
            other => {
                tracing::error!(error = %other, "internal error");
                (status, Json(json!({ "detail": "internal server error" }))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_exhausted_response() {
        let response = ApiError(Error::ProviderExhausted("Stackoverflow api limit exceed".into())).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body_json(response).await, json!(["Stackoverflow api limit exceed"]));
    }

    #[tokio::test]
    async fn test_throttled_response_has_retry_after() {
        let response = ApiError(Error::CallerThrottled { retry_after: 12 }).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "12");
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().contains("12 seconds"));
    }

    #[tokio::test]
    async fn test_invalid_input_response() {
        let response = ApiError(Error::InvalidInput("missing required parameter: start_date".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["detail"], "missing required parameter: start_date");
    }

    #[tokio::test]
    async fn test_provider_error_response() {
        let response = ApiError(Error::ProviderError("request timeout".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = ApiError(Error::Serialization("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["detail"], "internal server error");
    }
}
