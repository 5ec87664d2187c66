use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global JSON tracing subscriber.
///
/// `RUST_LOG` wins when set; the default keeps request and sweep logs
/// visible while quieting the SQL layers.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,sea_orm=warn"));

    let json_layer = fmt::layer()
        .json()
        .flatten_event(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .init();
}
