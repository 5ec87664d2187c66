use actix_web::web;

pub mod health;
pub mod matches;
pub mod realtime;

/// Configure application routes for tests and non-HttpServer contexts.
///
/// `main.rs` wires the same paths with CORS and request tracing on top; for
/// tests the raw paths suffice.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/health").configure(health::configure_routes));
    cfg.service(web::scope("/api/matches").configure(matches::configure_routes));
    cfg.service(web::scope("/api/ws").configure(realtime::configure_routes));
}
