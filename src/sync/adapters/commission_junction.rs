use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use super::{lenient_f64, lenient_i64, AdapterError, NetworkAdapter};
use crate::sync::models::{CredentialBundle, ReportWindow, SyncData};
use crate::sync::transport::{HttpRequest, HttpTransport};

const DEFAULT_BASE_URL: &str = "https://commissions.api.cj.com";

/// Credentials required by the CJ Affiliate commissions API: a personal
/// access token used as a bearer token, plus the publisher (affiliate) ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommissionJunctionCredentials {
    pub api_key: String,
    pub affiliate_id: String,
}

impl CommissionJunctionCredentials {
    pub fn from_bundle(bundle: &CredentialBundle) -> Option<Self> {
        Some(Self {
            api_key: CredentialBundle::field(&bundle.api_key)?,
            affiliate_id: CredentialBundle::field(&bundle.affiliate_id)?,
        })
    }
}

/// Fetches commission records from the CJ Affiliate REST API and reduces them
/// to summed performance counters.
pub struct CommissionJunctionAdapter {
    transport: Arc<dyn HttpTransport>,
    credentials: CommissionJunctionCredentials,
    base_url: String,
}

impl CommissionJunctionAdapter {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: CommissionJunctionCredentials,
    ) -> Self {
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

    fn report_url(&self, window: ReportWindow) -> Result<String, AdapterError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            AdapterError::InvalidConfiguration(format!("invalid CJ base URL: {e}"))
        })?;
        url.set_path("/v3/commissions");
        url.query_pairs_mut()
            .append_pair("start-date", &window.start.format("%Y-%m-%d").to_string())
            .append_pair("end-date", &window.end.format("%Y-%m-%d").to_string());
        Ok(url.into())
    }
}

#[async_trait]
impl NetworkAdapter for CommissionJunctionAdapter {
    async fn fetch_performance(&self, window: ReportWindow) -> Result<SyncData, AdapterError> {
        let request = HttpRequest::get(self.report_url(window)?)
            .header("Authorization", format!("Bearer {}", self.credentials.api_key))
            .header("requestor-cid", &self.credentials.affiliate_id);

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(AdapterError::FetchFailed(format!(
                "CJ API returned non-success status: {}",
                response.status
            )));
        }

        let parsed: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| AdapterError::FetchFailed(format!("CJ returned malformed JSON: {e}")))?;

        let mut data = SyncData::default();
        let records = parsed
            .get("records")
            .and_then(|r| r.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();
        for record in records {
            data.clicks += record.get("clicks").map(lenient_i64).unwrap_or(0);
            data.conversions += record.get("actions").map(lenient_i64).unwrap_or(0);
            data.earnings += record.get("pubCommission").map(lenient_f64).unwrap_or(0.0);
        }
        Ok(data)
    }
}
