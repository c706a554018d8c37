use crate::common::{ApiResponse, StatusCode};
use crate::lifecycle::LifecycleError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MapkeeperError>;

#[derive(Debug, Error)]
pub enum MapkeeperError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl MapkeeperError {
    pub fn status(&self) -> StatusCode {
        match self {
            MapkeeperError::Lifecycle(err) => match err {
                LifecycleError::NotFound(_) => StatusCode::NotFound,
                LifecycleError::Unavailable
                | LifecycleError::NotConfigured { .. }
                | LifecycleError::NoResourcesLoaded { .. } => StatusCode::ServiceUnavailable,
                _ => StatusCode::InternalServerError,
            },
            MapkeeperError::BadRequest(_) => StatusCode::BadRequest,
        }
    }
}

impl axum::response::IntoResponse for MapkeeperError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status == StatusCode::InternalServerError {
            tracing::error!("{}", self);
        }
        ApiResponse::<()>::failure(status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found: MapkeeperError = LifecycleError::not_found("attic").into();
        assert_eq!(not_found.status(), StatusCode::NotFound);
        assert_eq!(not_found.to_string(), "Map not found: attic");

        let unavailable: MapkeeperError = LifecycleError::Unavailable.into();
        assert_eq!(unavailable.status(), StatusCode::ServiceUnavailable);

        let bad = MapkeeperError::BadRequest("missing map".to_string());
        assert_eq!(bad.status(), StatusCode::BadRequest);

        let teardown: MapkeeperError = LifecycleError::teardown_failed("office", "busy").into();
        assert_eq!(teardown.status(), StatusCode::InternalServerError);
    }
}
