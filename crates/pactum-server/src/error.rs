//! API error mapping.
//!
//! Validation failures carry their detail back to the caller with a 422.
//! Anything that goes wrong inside the inference path is logged server-side
//! and surfaced as a generic 500: callers never see internal detail and
//! never receive a partial result.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use pactum_core::ValidationError;

#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    Inference(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<pactum_ai::ClassifierError> for ApiError {
    fn from(err: pactum_ai::ClassifierError) -> Self {
        Self::Inference(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": err.to_string() })),
            )
                .into_response(),
            Self::Inference(detail) => {
                tracing::error!(%detail, "inference failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_422() {
        let resp = ApiError::Validation(ValidationError::TextTooShort(9)).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn inference_maps_to_500() {
        let resp = ApiError::Inference("onnx blew up".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
