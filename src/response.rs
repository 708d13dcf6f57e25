use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub code: String,
    pub message: String,
    pub trace_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub is_operational: bool,
}

impl AppError {
    pub fn bad_request(code: &str, message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: code.to_string(),
            message: message.to_string(),
            is_operational: true,
        }
    }

    pub fn unauthorized(message: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "AUTH_UNAUTHORIZED".to_string(),
            message: message.to_string(),
            is_operational: true,
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "NOT_FOUND".to_string(),
            message: message.to_string(),
            is_operational: true,
        }
    }

    pub fn conflict(code: &str, message: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            code: code.to_string(),
            message: message.to_string(),
            is_operational: true,
        }
    }

    pub fn payload_too_large(message: &str) -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            code: "PAYLOAD_TOO_LARGE".to_string(),
            message: message.to_string(),
            is_operational: true,
        }
    }

    pub fn internal(message: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR".to_string(),
            message: message.to_string(),
            is_operational: false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let exposed_message = if self.is_operational {
            self.message.clone()
        } else {
            "Internal server error".to_string()
        };

        if self.is_operational {
            tracing::warn!(status = %self.status, code = %self.code, error = %self.message, "API error");
        } else {
            tracing::error!(status = %self.status, code = %self.code, error = %self.message, "Internal API error");
        }

        (
            self.status,
            Json(ErrorBody {
                success: false,
                code: self.code,
                message: exposed_message,
                trace_id: None,
            }),
        )
            .into_response()
    }
}

// StoreError mapping:
// - Validation -> 400 (user input, message safe to expose)
// - NotFound -> 404
// - Conflict / CasRetryExhausted -> 409 (caller may retry)
// - Invariant -> 500, non-operational (requires operator attention)
// - everything else -> 500 with redacted message
impl From<crate::store::StoreError> for AppError {
    fn from(value: crate::store::StoreError) -> Self {
        use crate::store::StoreError;
        match &value {
            StoreError::Validation(msg) => AppError::bad_request("VALIDATION_ERROR", msg),
            StoreError::NotFound { entity, .. } => {
                AppError::not_found(&format!("{entity} not found"))
            }
            StoreError::Conflict { entity, .. } => AppError::conflict(
                "CONFLICTING_UPDATE",
                &format!("Concurrent update on {entity}, retry the request"),
            ),
            StoreError::CasRetryExhausted { entity, .. } => AppError::conflict(
                "CONFLICTING_UPDATE",
                &format!("Concurrent update on {entity}, retry the request"),
            ),
            _ => AppError::internal(&value.to_string()),
        }
    }
}

impl From<crate::srs::SrsError> for AppError {
    fn from(value: crate::srs::SrsError) -> Self {
        match value {
            crate::srs::SrsError::InvalidGrade(_) => {
                AppError::bad_request("VALIDATION_ERROR", &value.to_string())
            }
        }
    }
}

pub fn ok<T: Serialize>(data: T) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            data,
        }),
    )
}

pub fn created<T: Serialize>(data: T) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(ApiResponse {
            success: true,
            data,
        }),
    )
}

pub fn paginated<T: Serialize>(
    data: Vec<T>,
    total: u64,
    page: u64,
    per_page: u64,
) -> impl IntoResponse {
    let total_pages = if per_page > 0 {
        total.div_ceil(per_page)
    } else {
        0
    };
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            data: PaginatedResponse {
                data,
                total,
                page,
                per_page,
                total_pages,
            },
        }),
    )
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::response::IntoResponse;

    use crate::store::StoreError;

    use super::*;

    #[tokio::test]
    async fn internal_error_is_redacted() {
        let resp = AppError::internal("db crash").into_response();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("db crash"));
        assert!(text.contains("Internal server error"));
    }

    #[tokio::test]
    async fn bad_request_keeps_message() {
        let resp = AppError::bad_request("BAD_INPUT", "negative time").into_response();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("negative time"));
        assert!(text.contains("BAD_INPUT"));
    }

    #[tokio::test]
    async fn cas_exhaustion_maps_to_conflict() {
        let err: AppError = StoreError::CasRetryExhausted {
            entity: "progress".to_string(),
            key: "u1:w1".to_string(),
            attempts: 20,
        }
        .into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "CONFLICTING_UPDATE");
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let err: AppError = StoreError::NotFound {
            entity: "item".to_string(),
            key: "w1".to_string(),
        }
        .into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
