use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{error, info, warn, Level};

/// Stamps every response with its wall time and logs `/api/` requests.
///
/// Headers: `X-Response-Time-Us` (microseconds) and `Server-Timing`
/// (`total;dur=<ms>`). The log level follows the status class.
pub async fn timing_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    let us = elapsed.as_micros() as u64;

    let headers = response.headers_mut();
    if let Ok(val) = us.to_string().parse() {
        headers.insert("X-Response-Time-Us", val);
    }
    let server_timing = format!("total;dur={:.3}", elapsed.as_secs_f64() * 1000.0);
    if let Ok(val) = server_timing.parse() {
        headers.insert("Server-Timing", val);
    }

    if !path.starts_with("/api/") {
        return response;
    }

    let status = response.status().as_u16();
    let level = level_for(response.status());
    if level == Level::ERROR {
        error!(%method, path = %path, status, us, "request");
    } else if level == Level::WARN {
        warn!(%method, path = %path, status, us, "request");
    } else {
        info!(%method, path = %path, status, us, "request");
    }

    response
}

/// 5xx are errors, 4xx warnings, everything else informational.
fn level_for(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::ERROR
    } else if status.is_client_error() {
        Level::WARN
    } else {
        Level::INFO
    }
}
