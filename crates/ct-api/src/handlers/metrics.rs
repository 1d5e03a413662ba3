use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;

pub async fn export() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        ct_metrics::render(),
    )
}
