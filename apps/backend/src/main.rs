use std::time::Duration;

use actix_web::{web, App, HttpServer};
use backend::db::txn::with_txn;
use backend::infra::state::build_state;
use backend::middleware::cors::cors_middleware;
use backend::middleware::request_trace::RequestTrace;
use backend::routes;
use backend::services::match_flow;
use backend::state::app_state::AppState;
use backend::state::security_config::SecurityConfig;
use backend::telemetry;
use tracing::{error, info};

/// How often the deadline sweep runs.
const EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment:
    // - Docker: Set via docker-compose env_file or docker run --env-file
    // - Local dev: Source env files manually (e.g., set -a; . ./.env; set +a)
    let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("BACKEND_PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse::<u16>()
        .unwrap_or_else(|_| {
            eprintln!("❌ BACKEND_PORT must be a valid port number");
            std::process::exit(1);
        });

    println!("🚀 Starting Oche Backend on http://{}:{}", host, port);

    let jwt = match std::env::var("BACKEND_JWT_SECRET") {
        Ok(jwt) => jwt,
        Err(_) => {
            eprintln!("❌ BACKEND_JWT_SECRET must be set");
            std::process::exit(1);
        }
    };
    let security_config = SecurityConfig::new(jwt.as_bytes());

    let app_state = match build_state().with_security(security_config).build().await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    println!("✅ Database connected");

    spawn_expiry_sweeper(app_state.clone());

    let data = web::Data::new(app_state);

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .wrap(RequestTrace)
            .app_data(data.clone())
            .route("/", web::get().to(routes::health::root))
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

/// Background deadline sweep: Sent past the challenge TTL and Ready/Lobby
/// past the join window move to Expired, locks cleared, rows published.
fn spawn_expiry_sweeper(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(EXPIRY_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;

            let now = time::OffsetDateTime::now_utc();
            let result = with_txn(&state.db, |txn| {
                Box::pin(async move { match_flow::expire_matches(txn, now).await })
            })
            .await;

            match result {
                Ok(expired) => {
                    for row in &expired {
                        state.feed.publish(row);
                    }
                    if !expired.is_empty() {
                        info!(count = expired.len(), "expiry sweep published");
                    }
                }
                Err(err) => error!(%err, "expiry sweep failed"),
            }
        }
    });
}
