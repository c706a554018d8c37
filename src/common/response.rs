use super::StatusCode;
use axum::{
    Json,
    http::StatusCode as HttpStatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// JSON body of every map endpoint
///
/// A successful answer carries the map snapshot (or name list) in `data`;
/// a failed one carries `error.code`, the [`StatusCode`] variant name.
///
/// ```
/// use mapkeeper::common::{ApiResponse, StatusCode};
///
/// let listed = ApiResponse::ok(vec!["office", "lobby"]);
/// assert_eq!(listed.status(), StatusCode::Ok);
///
/// let missing: ApiResponse<()> = ApiResponse::failure(StatusCode::NotFound, "Map not found: attic");
/// assert_eq!(missing.error_code(), Some("NotFound"));
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ApiError>,
    #[serde(skip)]
    status: StatusCode,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            status: StatusCode::Ok,
        }
    }

    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: status.to_string(),
                message: message.into(),
            }),
            status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (HttpStatusCode::from(self.status), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_failure_carries_status_and_code() {
        let response = ApiResponse::<()>::failure(StatusCode::ServiceUnavailable, "no maps")
            .into_response();
        assert_eq!(response.status(), HttpStatusCode::SERVICE_UNAVAILABLE);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "error": { "code": "ServiceUnavailable", "message": "no maps" }
            })
        );
    }
}
