use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

use super::{lenient_f64, lenient_i64, AdapterError, NetworkAdapter};
use crate::sync::models::{CredentialBundle, ReportWindow, SyncData};
use crate::sync::transport::{HttpRequest, HttpTransport};

const DEFAULT_BASE_URL: &str = "https://api.shareasale.com";
const ACTION: &str = "activitySummary";

/// Credentials required by the ShareASale reporting API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareASaleCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub affiliate_id: String,
}

impl ShareASaleCredentials {
    /// Builds the typed view, or `None` when any required field is missing.
    /// A missing field must fail the sync before any request is issued.
    pub fn from_bundle(bundle: &CredentialBundle) -> Option<Self> {
        Some(Self {
            api_key: CredentialBundle::field(&bundle.api_key)?,
            api_secret: CredentialBundle::field(&bundle.api_secret)?,
            affiliate_id: CredentialBundle::field(&bundle.affiliate_id)?,
        })
    }
}

/// Fetches a ShareASale activity summary over the signed `w.cfm` endpoint and
/// reduces the returned activity records to summed performance counters.
pub struct ShareASaleAdapter {
    transport: Arc<dyn HttpTransport>,
    credentials: ShareASaleCredentials,
    base_url: String,
}

impl ShareASaleAdapter {
    pub fn new(transport: Arc<dyn HttpTransport>, credentials: ShareASaleCredentials) -> Self {
        Self {
            transport,
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Hex-encoded HMAC-SHA256 over `key:timestamp:affiliateId:action`,
    /// keyed by the API secret. Sent in `x-ShareASale-Authentication`.
    fn signature(&self, timestamp: &str) -> String {
        let payload = format!(
            "{}:{}:{}:{}",
            self.credentials.api_key, timestamp, self.credentials.affiliate_id, ACTION
        );
        let mut mac = Hmac::<Sha256>::new_from_slice(self.credentials.api_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn report_url(&self, window: ReportWindow) -> Result<String, AdapterError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            AdapterError::InvalidConfiguration(format!("invalid ShareASale base URL: {e}"))
        })?;
        url.set_path("/w.cfm");
        url.query_pairs_mut()
            .append_pair("action", ACTION)
            .append_pair("affiliateId", &self.credentials.affiliate_id)
            .append_pair("token", &self.credentials.api_key)
            .append_pair("dateStart", &window.start.format("%m/%d/%Y").to_string())
            .append_pair("dateEnd", &window.end.format("%m/%d/%Y").to_string())
            .append_pair("format", "json");
        Ok(url.into())
    }
}

#[async_trait]
impl NetworkAdapter for ShareASaleAdapter {
    async fn fetch_performance(&self, window: ReportWindow) -> Result<SyncData, AdapterError> {
        let timestamp = Utc::now().timestamp().to_string();
        let request = HttpRequest::get(self.report_url(window)?)
            .header("x-ShareASale-Date", &timestamp)
            .header("x-ShareASale-Authentication", self.signature(&timestamp));

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(AdapterError::FetchFailed(format!(
                "ShareASale API returned non-success status: {}",
                response.status
            )));
        }

        let parsed: serde_json::Value = serde_json::from_str(&response.body).map_err(|e| {
            AdapterError::FetchFailed(format!("ShareASale returned malformed JSON: {e}"))
        })?;

        // The activity summary is a flat array of per-day records. Missing or
        // malformed fields count as zero.
        let mut data = SyncData::default();
        for record in parsed.as_array().map(Vec::as_slice).unwrap_or_default() {
            data.clicks += record.get("clicks").map(lenient_i64).unwrap_or(0);
            data.conversions += record.get("sales").map(lenient_i64).unwrap_or(0);
            data.earnings += record.get("commission").map(lenient_f64).unwrap_or(0.0);
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::transport::testing::MockTransport;

    fn credentials() -> ShareASaleCredentials {
        ShareASaleCredentials {
            api_key: "key123".to_string(),
            api_secret: "secret456".to_string(),
            affiliate_id: "aff789".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sums_activity_records() {
        let transport = MockTransport::new();
        transport.push_response(
            200,
            r#"[
                {"clicks": 10, "sales": 2, "commission": "5.00"},
                {"clicks": 20, "sales": 3, "commission": "7.50"}
            ]"#,
        );

        let adapter = ShareASaleAdapter::new(Arc::new(transport.clone()), credentials())
            .with_base_url("https://shareasale.test");
        let data = adapter
            .fetch_performance(ReportWindow::trailing_days(30))
            .await
            .expect("fetch should succeed");

        assert_eq!(data.clicks, 30);
        assert_eq!(data.conversions, 5);
        assert_eq!(data.earnings, 12.5);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_request_carries_signature_headers_and_window() {
        let transport = MockTransport::new();
        transport.push_response(200, "[]");

        let adapter = ShareASaleAdapter::new(Arc::new(transport.clone()), credentials())
            .with_base_url("https://shareasale.test");
        adapter
            .fetch_performance(ReportWindow::trailing_days(30))
            .await
            .expect("fetch should succeed");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(request.url.contains("action=activitySummary"));
        assert!(request.url.contains("affiliateId=aff789"));
        assert!(request.url.contains("dateStart="));
        assert!(request.url.contains("dateEnd="));

        let header_names: Vec<&str> = request
            .headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert!(header_names.contains(&"x-ShareASale-Date"));
        assert!(header_names.contains(&"x-ShareASale-Authentication"));
    }

    #[test]
    fn test_signature_is_hmac_over_key_timestamp_affiliate_action() {
        let transport = MockTransport::new();
        let adapter = ShareASaleAdapter::new(Arc::new(transport), credentials());

        let mut mac = Hmac::<Sha256>::new_from_slice(b"secret456").unwrap();
        mac.update(b"key123:1700000000:aff789:activitySummary");
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(adapter.signature("1700000000"), expected);
    }

    #[test]
    fn test_from_bundle_requires_all_api_fields() {
        let complete = CredentialBundle {
            api_key: Some("key".to_string()),
            api_secret: Some("secret".to_string()),
            affiliate_id: Some("aff".to_string()),
            ..Default::default()
        };
        assert!(ShareASaleCredentials::from_bundle(&complete).is_some());

        for missing in ["api_key", "api_secret", "affiliate_id"] {
            let mut bundle = complete.clone();
            match missing {
                "api_key" => bundle.api_key = None,
                "api_secret" => bundle.api_secret = Some("  ".to_string()),
                _ => bundle.affiliate_id = None,
            }
            assert!(
                ShareASaleCredentials::from_bundle(&bundle).is_none(),
                "bundle missing {missing} should not build"
            );
        }
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let transport = MockTransport::new();
        transport.push_response(403, "signature rejected");

        let adapter = ShareASaleAdapter::new(Arc::new(transport), credentials())
            .with_base_url("https://shareasale.test");
        let err = adapter
            .fetch_performance(ReportWindow::trailing_days(30))
            .await
            .expect_err("fetch should fail");
        assert!(err.to_string().contains("403"));
    }
}
