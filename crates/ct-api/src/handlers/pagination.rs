use crate::error::ApiError;

pub const MAX_PER_PAGE: i64 = 100;

pub fn validate_pagination(page: i64, per_page: i64) -> Result<(usize, usize), ApiError> {
    // Pages past the end are answered with an empty slice.
    if page < 1 {
        return Err(ApiError::InvalidInput("page must be at least 1".into()));
    }

    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(ApiError::InvalidInput(format!(
            "per_page must be between 1 and {MAX_PER_PAGE}"
        )));
    }

    Ok((page as usize, per_page as usize))
}

/// Score bounds accepted by the listing endpoint.
pub fn validate_score_bound(name: &str, value: Option<f64>) -> Result<Option<f64>, ApiError> {
    match value {
        Some(bound) if !(0.0..=1.0).contains(&bound) => Err(ApiError::InvalidInput(format!(
            "{name} must be between 0 and 1"
        ))),
        other => Ok(other),
    }
}
