//! Task-local trace context for web requests.
//!
//! Exposes the current request's trace id from anywhere in the request
//! pipeline via Tokio task-local storage. Part of the web boundary; core and
//! service code should not import it.

use std::cell::RefCell;

use tokio::task_local;

task_local! {
    static TRACE_ID: RefCell<Option<String>>;
}

/// Trace id for the current task, or "unknown" outside a request context.
pub fn trace_id() -> String {
    let current = TRACE_ID.try_with(|cell| cell.borrow().clone());
    match current {
        Ok(Some(id)) => id,
        _ => "unknown".to_string(),
    }
}

/// Run a future with the given trace id in scope. Used by middleware.
pub async fn with_trace_id<F, R>(trace_id: String, future: F) -> R
where
    F: std::future::Future<Output = R>,
{
    TRACE_ID.scope(RefCell::new(Some(trace_id)), future).await
}
