use axum::http::StatusCode as HttpStatusCode;
use strum_macros::{Display, EnumString};

/// Status codes the request layer can answer with
///
/// The variant name doubles as the machine-readable error `code` in
/// [`ApiResponse`](super::ApiResponse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum StatusCode {
    Ok,
    BadRequest,
    NotFound,
    InternalServerError,
    ServiceUnavailable,
}

impl From<StatusCode> for HttpStatusCode {
    fn from(status: StatusCode) -> Self {
        match status {
            StatusCode::Ok => HttpStatusCode::OK,
            StatusCode::BadRequest => HttpStatusCode::BAD_REQUEST,
            StatusCode::NotFound => HttpStatusCode::NOT_FOUND,
            StatusCode::InternalServerError => HttpStatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::ServiceUnavailable => HttpStatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_code_names() {
        assert_eq!(StatusCode::NotFound.to_string(), "NotFound");
        assert_eq!(
            StatusCode::from_str("ServiceUnavailable").unwrap(),
            StatusCode::ServiceUnavailable
        );
        assert_eq!(
            HttpStatusCode::from(StatusCode::BadRequest),
            HttpStatusCode::BAD_REQUEST
        );
    }
}
