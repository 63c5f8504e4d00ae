use std::sync::Arc;

use async_trait::async_trait;

use super::{page, AdapterError, NetworkAdapter};
use crate::sync::models::{CredentialBundle, ReportWindow, SyncData};
use crate::sync::transport::{HttpRequest, HttpTransport};

const DEFAULT_BASE_URL: &str = "https://affiliate-program.amazon.com";
const LOGIN_PATH: &str = "/home";
const REPORTS_PATH: &str = "/home/reports";

/// Amazon Associates has no reporting API for individual associates; the
/// account credentials are used to sign in to Associates Central.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmazonCredentials {
    pub username: String,
    pub password: String,
}

impl AmazonCredentials {
    pub fn from_bundle(bundle: &CredentialBundle) -> Option<Self> {
        Some(Self {
            username: CredentialBundle::field(&bundle.username)?,
            password: CredentialBundle::field(&bundle.password)?,
        })
    }
}

// Associates Central sign-in uses the shared Amazon auth portal markup.
const USERNAME_SELECTORS: &[&str] = &["input#ap_email", "input[name='email']"];
const PASSWORD_SELECTORS: &[&str] = &["input#ap_password", "input[name='password']"];

const CLICK_SELECTORS: &[&str] = &[
    "#ac-report-commission-clicks-total",
    ".ac-report-clicks .ac-metric-value",
    "[data-metric='clicks']",
];
const CONVERSION_SELECTORS: &[&str] = &[
    "#ac-report-commission-items-total",
    ".ac-report-ordered-items .ac-metric-value",
    "[data-metric='orderedItems']",
];
const EARNINGS_SELECTORS: &[&str] = &[
    "#ac-report-commission-earnings-total",
    ".ac-report-earnings .ac-metric-value",
    "[data-metric='earnings']",
];

/// Signs in to Associates Central and extracts the trailing report totals
/// from the rendered reports page.
pub struct AmazonAdapter {
    transport: Arc<dyn HttpTransport>,
    credentials: AmazonCredentials,
    base_url: String,
}

impl AmazonAdapter {
    pub fn new(transport: Arc<dyn HttpTransport>, credentials: AmazonCredentials) -> Self {
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
}

#[async_trait]
impl NetworkAdapter for AmazonAdapter {
    async fn fetch_performance(&self, _window: ReportWindow) -> Result<SyncData, AdapterError> {
        let session = self.transport.isolated_session()?;

        let login_url = format!("{}{}", self.base_url, LOGIN_PATH);
        let login_page = session.send(HttpRequest::get(&login_url)).await?;
        if !login_page.is_success() {
            return Err(AdapterError::FetchFailed(format!(
                "Amazon sign-in page returned status {}",
                login_page.status
            )));
        }

        let form = page::find_login_form(&login_page.body, USERNAME_SELECTORS, PASSWORD_SELECTORS)
            .ok_or_else(|| {
                AdapterError::ExtractionError(
                    "Amazon sign-in form not found: expected ap_email/ap_password inputs"
                        .to_string(),
                )
            })?;

        let submit_url = page::resolve_action(&login_url, form.action.as_deref())
            .map_err(|e| AdapterError::InvalidConfiguration(format!("invalid login URL: {e}")))?;

        let login_response = session
            .send(HttpRequest::post_form(
                submit_url,
                vec![
                    (form.username_field, self.credentials.username.clone()),
                    (form.password_field, self.credentials.password.clone()),
                ],
            ))
            .await?;
        if !login_response.is_success() {
            return Err(AdapterError::FetchFailed(format!(
                "Amazon sign-in returned status {}",
                login_response.status
            )));
        }

        let reports_url = format!("{}{}", self.base_url, REPORTS_PATH);
        let reports_page = session.send(HttpRequest::get(&reports_url)).await?;
        if !reports_page.is_success() {
            return Err(AdapterError::FetchFailed(format!(
                "Amazon reports page returned status {}",
                reports_page.status
            )));
        }

        Ok(SyncData {
            clicks: page::extract_metric(&reports_page.body, CLICK_SELECTORS) as i64,
            conversions: page::extract_metric(&reports_page.body, CONVERSION_SELECTORS) as i64,
            earnings: page::extract_metric(&reports_page.body, EARNINGS_SELECTORS),
            new_links: 0,
        })
    }
}
