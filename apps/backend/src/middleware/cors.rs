use std::env;

use actix_cors::Cors;
use actix_web::http::header;

/// Parse `CORS_ALLOWED_ORIGINS` (comma-separated, e.g.
/// `http://localhost:3000,https://app.oche.app`), dropping empty, "null"
/// and non-http(s) entries. Empty result means nothing valid was set.
fn configured_origins() -> Vec<String> {
    env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "null")
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .map(str::to_string)
        .collect()
}

/// Restrictive CORS: explicit origins only, the three methods the API
/// actually serves, and a localhost-only fallback when unconfigured.
pub fn cors_middleware() -> Cors {
    let mut origins = configured_origins();
    if origins.is_empty() {
        origins = vec![
            "http://localhost:3000".to_string(),
            "http://127.0.0.1:3000".to_string(),
        ];
    }

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .expose_headers(vec![
            // x-trace-id rides on problem responses, x-request-id on everything
            header::HeaderName::from_static("x-trace-id"),
            header::HeaderName::from_static("x-request-id"),
        ])
        .max_age(3600);

    for origin in &origins {
        cors = cors.allowed_origin(origin);
    }
    cors
}
