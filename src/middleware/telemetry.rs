use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::errors::ReportableFailure;
use crate::notification::reporter::ErrorReport;
use crate::AppState;

/// Middleware: forwards every response marked with `ReportableFailure` to
/// the error reporter. Runs outside the auth gate so storage failures
/// during token validation are captured too.
pub async fn capture_failures(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    if let Some(ReportableFailure(detail)) = response.extensions().get::<ReportableFailure>() {
        state.reporter.report(
            ErrorReport::error(detail.clone())
                .with_tag("method", method.as_str())
                .with_tag("path", path)
                .with_extra("status", response.status().as_u16()),
        );
    }

    response
}
