//! Wire types for the HTTP API beyond the pipeline's own request/result types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineError;

/// Error body: `{ "detail": "..." }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// An error returned from an HTTP handler.
#[derive(Debug)]
pub enum ApiError {
    /// Request body missing, malformed, or failing validation.
    Invalid(String),
    /// Any pipeline failure; all kinds collapse to one 500.
    Pipeline(PipelineError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ApiError::Invalid(msg) => msg.clone(),
            ApiError::Pipeline(e) => e.to_string(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        ApiError::Pipeline(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut detail = self.detail();
        if detail.trim().is_empty() {
            detail = status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string();
        }
        (status, Json(ErrorBody { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;

    #[test]
    fn pipeline_errors_are_500_with_message() {
        let err: ApiError =
            PipelineError::Generation(ProviderError::Malformed("empty generation".to_string()))
                .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.detail().contains("empty generation"));
    }

    #[test]
    fn empty_detail_gets_reason_phrase() {
        let res = ApiError::Invalid(String::new()).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
