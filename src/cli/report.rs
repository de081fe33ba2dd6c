//! Console lines for visits, errors and the closing summary.

use colored::*;
use reqwest::StatusCode;

use workload::{ErrorEvent, TickStats, Visit};

/// Canonical reason phrase, or an empty string for unknown codes.
fn reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("")
}

/// `<status> <reason> <METHOD> <url>` without colours.
pub fn visit_line(visit: &Visit) -> String {
    let status = visit.response.status;
    format!("{} {} {} {}", status, reason(status), visit.request.method, visit.request.url)
}

/// Visit line coloured by status class.
pub fn colored_visit_line(visit: &Visit) -> ColoredString {
    let line = visit_line(visit);
    match visit.response.status {
        200..=299 => line.green(),
        300..=399 => line.cyan(),
        400..=499 => line.yellow(),
        _ => line.red(),
    }
}

pub fn error_line(error: &ErrorEvent) -> String {
    format!(
        "{} {} {}: {}",
        "ERROR".red(),
        error.request.method,
        error.request.url,
        error.error
    )
}

pub fn summary_line(stats: &TickStats, visits: u64, errors: u64) -> String {
    format!(
        "{} ticks, {} dropped, {} filter failures, {} visits, {} errors",
        stats.ticks, stats.dropped, stats.failed, visits, errors
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use workload::dispatch::ResponseMeta;
    use workload::{Headers, RequestTemplate, TransportError};

    fn visit(status: u16) -> Visit {
        Visit {
            request: RequestTemplate::new("http://h/x").with_method("POST").to_working(),
            response: ResponseMeta {
                status,
                headers: Headers::new(),
            },
            body: String::new(),
        }
    }

    #[test]
    fn test_visit_line() {
        assert_eq!(visit_line(&visit(200)), "200 OK POST http://h/x");
        assert_eq!(visit_line(&visit(404)), "404 Not Found POST http://h/x");
    }

    #[test]
    fn test_visit_line_unknown_status() {
        assert_eq!(visit_line(&visit(599)), "599  POST http://h/x");
    }

    #[test]
    fn test_error_line() {
        colored::control::set_override(false);
        let error = ErrorEvent {
            request: RequestTemplate::new("http://h/").to_working(),
            error: Arc::new(TransportError::ConnectionReset("ECONNRESET".to_string())),
        };
        assert_eq!(error_line(&error), "ERROR GET http://h/: Connection reset: ECONNRESET");
    }

    #[test]
    fn test_summary_line() {
        let stats = TickStats {
            ticks: 10,
            dropped: 2,
            failed: 1,
            dispatched: 7,
        };
        assert_eq!(
            summary_line(&stats, 6, 1),
            "10 ticks, 2 dropped, 1 filter failures, 6 visits, 1 errors"
        );
    }
}
