use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Request-level errors for the prediction pipeline.
///
/// Every variant except `Internal` is a client error: the upload itself was
/// unusable and retrying the same file will fail the same way.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error("File must be a CSV")]
    NotCsv,

    #[error("Missing 'file' field in upload")]
    MissingFile,

    #[error("Invalid multipart payload: {0}")]
    Multipart(String),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing columns: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("Need at least {needed} rows, got {got}")]
    InsufficientRows { needed: usize, got: usize },

    #[error("Non-numeric value in column '{column}' at row {row}")]
    InvalidValue { column: String, row: usize },

    #[error("Error processing file: {0}")]
    Internal(String),
}

impl PredictError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PredictError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<anyhow::Error> for PredictError {
    fn from(err: anyhow::Error) -> Self {
        PredictError::Internal(format!("{err:#}"))
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_bad_request() {
        assert_eq!(PredictError::NotCsv.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            PredictError::MissingColumns(vec!["s2".to_string()]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PredictError::InsufficientRows { needed: 30, got: 7 }.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_is_server_error() {
        let err = PredictError::from(anyhow::anyhow!("weights corrupted"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_insufficient_rows_message() {
        let err = PredictError::InsufficientRows { needed: 30, got: 12 };
        assert_eq!(err.to_string(), "Need at least 30 rows, got 12");
    }
}
