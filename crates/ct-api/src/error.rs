use std::future::Future;

use axum::{Json, http::StatusCode, response::IntoResponse};
use ct_common::{CandidateId, ServiceError};
use serde::Serialize;
use thiserror::Error;

const MAX_PUBLIC_MESSAGE_CHARS: usize = 240;

tokio::task_local! {
    static CURRENT_REQUEST_ID: String;
}

/// Runs `fut` with `request_id` visible to error responses produced inside it.
pub async fn scope_request_id<Fut, T>(request_id: Option<String>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    match request_id {
        Some(id) => CURRENT_REQUEST_ID.scope(id, fut).await,
        None => fut.await,
    }
}

pub fn current_request_id() -> Option<String> {
    CURRENT_REQUEST_ID.try_with(Clone::clone).ok()
}

fn looks_like_path(word: &str) -> bool {
    word.starts_with('/') || word.starts_with("./") || word.contains('\\')
}

/// Client-facing rendition of an internal message: control characters and
/// filesystem locations removed, length capped.
fn public_text(raw: &str) -> String {
    let mut text = raw
        .split_whitespace()
        .map(|word| {
            let word: String = word.chars().filter(|c| !c.is_control()).collect();
            if looks_like_path(&word) {
                "<path>".to_string()
            } else {
                word
            }
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if let Some((cut, _)) = text.char_indices().nth(MAX_PUBLIC_MESSAGE_CHARS) {
        text.truncate(cut);
        text.push_str("...");
    }

    if text.is_empty() {
        "unexpected error".to_string()
    } else {
        text
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("candidate {0} not found")]
    CandidateNotFound(CandidateId),
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("not ready: {0}")]
    NotReady(String),
    #[error("candidate store failure: {0}")]
    Storage(String),
    #[error("report failure: {0}")]
    Report(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    request_id: Option<String>,
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::CandidateNotFound(_) => "candidate_not_found",
            ApiError::RateLimited => "rate_limited",
            ApiError::NotReady(_) => "not_ready",
            ApiError::Storage(_) => "storage_error",
            ApiError::Report(_) => "report_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::InvalidInput(detail) => public_text(detail),
            ApiError::CandidateNotFound(_) => "Candidate not found".to_string(),
            ApiError::RateLimited => "too many requests".to_string(),
            ApiError::NotReady(_) => "service not ready".to_string(),
            ApiError::Storage(_) => "candidate store unavailable".to_string(),
            ApiError::Report(detail) => {
                format!("Error generating report: {}", public_text(detail))
            }
            ApiError::Internal(_) => "internal server error".to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::CandidateNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Storage(_) | ApiError::Report(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let request_id = current_request_id();

        if status.is_server_error() {
            tracing::error!(
                code = self.code(),
                %status,
                request_id = ?request_id,
                error = %self,
                "request failed"
            );
        } else {
            tracing::warn!(
                code = self.code(),
                %status,
                request_id = ?request_id,
                error = %self,
                "request rejected"
            );
        }

        let body = ErrorBody {
            code: self.code(),
            message: self.public_message(),
            request_id,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Validation(err) => ApiError::InvalidInput(err.to_string()),
            ServiceError::Query(err) => ApiError::InvalidInput(err.to_string()),
            ServiceError::Storage(err) => ApiError::Storage(err.to_string()),
            ServiceError::Render(err) => ApiError::Report(err.to_string()),
        }
    }
}
