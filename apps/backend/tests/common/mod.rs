#![allow(dead_code)]

use backend::error::AppError;
use backend::errors::ErrorCode;

// Logging is auto-installed for every test binary that declares `mod common`.
#[ctor::ctor]
fn init_logging() {
    let filter = std::env::var("TEST_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .without_time()
        .try_init();
}

/// Assert that a fallible call failed with the given canonical error code.
pub fn assert_err_code<T: std::fmt::Debug>(result: Result<T, AppError>, expected: ErrorCode) {
    match result {
        Ok(v) => panic!("expected {:?}, got Ok({v:?})", expected.as_str()),
        Err(err) => assert_eq!(
            err.code(),
            expected,
            "expected error code {:?}, got {:?} ({err})",
            expected.as_str(),
            err.code().as_str(),
        ),
    }
}
