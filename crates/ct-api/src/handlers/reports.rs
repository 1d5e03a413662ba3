use axum::{
    extract::{Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
};
use ct_common::{ReportError, ServiceError};
use ct_metrics::REPORTS_GENERATED_TOTAL;
use serde::Deserialize;

use crate::SharedState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    #[serde(default = "default_k")]
    pub k: i64,
}

const fn default_k() -> i64 {
    10
}

/// Negative sizes select nobody rather than failing.
fn top_k_size(k: i64) -> usize {
    usize::try_from(k).unwrap_or(0)
}

pub async fn generate_report(
    State(state): State<SharedState>,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, ApiError> {
    let k = top_k_size(params.k);

    let bytes = state
        .with_service(move |service| {
            let path = service.generate_report(k)?;
            std::fs::read(&path).map_err(|source| {
                ServiceError::Render(ReportError::Io { path, source })
            })
        })
        .await?;

    metrics::counter!(REPORTS_GENERATED_TOTAL).increment(1);

    Ok((
        [
            (CONTENT_TYPE, "application/pdf"),
            (CONTENT_DISPOSITION, "attachment; filename=\"report.pdf\""),
        ],
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_sizes_clamp_to_zero() {
        assert_eq!(top_k_size(-3), 0);
        assert_eq!(top_k_size(0), 0);
        assert_eq!(top_k_size(7), 7);
    }
}
