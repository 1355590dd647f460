use crate::services::{
    completion_service::CompletionError, extraction::ExtractionFailure,
    graph_service::GraphStoreError,
};
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

/// Request-level failures. Enrichment and query-logging errors never end up
/// here: they are logged and swallowed where they happen.
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Completion(CompletionError),
    Extraction(ExtractionFailure),
    EmptyResult { message: String, raw: String },
    Graph(GraphStoreError),
    Unavailable(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<&'a str>,
}

impl ApiError {
    /// Provider text attached for diagnosis, if any.
    pub fn raw(&self) -> Option<&str> {
        match self {
            ApiError::Extraction(failure) => Some(&failure.raw),
            ApiError::EmptyResult { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "{}", msg),
            ApiError::Completion(err) => write!(f, "{}", err),
            ApiError::Extraction(failure) => write!(f, "{}", failure),
            ApiError::EmptyResult { message, .. } => write!(f, "{}", message),
            ApiError::Graph(err) => write!(f, "{}", err),
            ApiError::Unavailable(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Completion(_)
            | ApiError::Extraction(_)
            | ApiError::EmptyResult { .. }
            | ApiError::Graph(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
            raw: self.raw(),
        })
    }
}

impl From<CompletionError> for ApiError {
    fn from(err: CompletionError) -> Self {
        ApiError::Completion(err)
    }
}

impl From<ExtractionFailure> for ApiError {
    fn from(failure: ExtractionFailure) -> Self {
        ApiError::Extraction(failure)
    }
}

impl From<GraphStoreError> for ApiError {
    fn from(err: GraphStoreError) -> Self {
        ApiError::Graph(err)
    }
}
