use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH};
use tower_http::cors::{Any, CorsLayer};

/// Any origin may call the API; downloads expose their file name to the browser.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any)
        .expose_headers([CONTENT_DISPOSITION, CONTENT_LENGTH])
}
