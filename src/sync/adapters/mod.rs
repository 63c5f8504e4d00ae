use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::models::{ReportWindow, SyncData};
use super::transport::TransportError;

pub mod amazon;
pub mod commission_junction;
pub mod generic_scrape;
pub mod page;
pub mod shareasale;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Failed to fetch report: {0}")]
    FetchFailed(String),
    #[error("Invalid credentials configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] TransportError),
    #[error("{0}")]
    ExtractionError(String),
}

/// One synchronization attempt against one affiliate network.
///
/// Implementations authenticate with their network, fetch activity for the
/// requested window and reduce it to normalized performance counters. A call
/// is a single execution attempt: no retries, no backoff, and every internal
/// failure surfaces as an `AdapterError` at this boundary.
#[async_trait]
pub trait NetworkAdapter {
    async fn fetch_performance(&self, window: ReportWindow) -> Result<SyncData, AdapterError>;
}

/// Coerces a vendor JSON value to an integer count. Vendors disagree on
/// whether counts arrive as numbers or strings; anything unparsable is 0.
pub(crate) fn lenient_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Coerces a vendor JSON value to a monetary amount; unparsable values are 0.
pub(crate) fn lenient_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_i64_coerces_strings_and_numbers() {
        assert_eq!(lenient_i64(&json!(42)), 42);
        assert_eq!(lenient_i64(&json!("17")), 17);
        assert_eq!(lenient_i64(&json!("3.9")), 3);
        assert_eq!(lenient_i64(&json!("not a number")), 0);
        assert_eq!(lenient_i64(&json!(null)), 0);
    }

    #[test]
    fn test_lenient_f64_coerces_strings_and_numbers() {
        assert_eq!(lenient_f64(&json!(12.5)), 12.5);
        assert_eq!(lenient_f64(&json!("5.00")), 5.0);
        assert_eq!(lenient_f64(&json!("")), 0.0);
        assert_eq!(lenient_f64(&json!([])), 0.0);
    }
}
