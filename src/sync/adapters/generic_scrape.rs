use std::sync::Arc;

use async_trait::async_trait;

use super::{page, AdapterError, NetworkAdapter};
use crate::sync::models::{CredentialBundle, ReportWindow, SyncData};
use crate::sync::transport::{HttpRequest, HttpTransport};

/// Credentials required to scrape an arbitrary affiliate dashboard: where to
/// log in and what to log in with. `dashboard_url` is optional; without it
/// the post-login page is used for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeCredentials {
    pub login_url: String,
    pub username: String,
    pub password: String,
    pub dashboard_url: Option<String>,
}

impl ScrapeCredentials {
    pub fn from_bundle(bundle: &CredentialBundle) -> Option<Self> {
        Some(Self {
            login_url: CredentialBundle::field(&bundle.login_url)?,
            username: CredentialBundle::field(&bundle.username)?,
            password: CredentialBundle::field(&bundle.password)?,
            dashboard_url: CredentialBundle::field(&bundle.dashboard_url),
        })
    }
}

// Best-effort candidates; affiliate dashboards have no stable wire contract.
const USERNAME_SELECTORS: &[&str] = &[
    "input[type='email']",
    "input[name='email']",
    "input[name='username']",
    "input[name='login']",
    "input#username",
    "input#email",
];
const PASSWORD_SELECTORS: &[&str] = &["input[type='password']"];

const CLICK_SELECTORS: &[&str] = &[
    "[data-metric='clicks']",
    ".stat-clicks .value",
    ".clicks-value",
    "#total-clicks",
];
const CONVERSION_SELECTORS: &[&str] = &[
    "[data-metric='conversions']",
    ".stat-conversions .value",
    ".conversions-value",
    "#total-conversions",
];
const EARNINGS_SELECTORS: &[&str] = &[
    "[data-metric='earnings']",
    ".stat-earnings .value",
    ".earnings-value",
    "#total-earnings",
];

/// Syncs a network with no API by logging into its dashboard and extracting
/// metrics from the rendered HTML. The default adapter for any network
/// without a dedicated integration.
pub struct GenericScrapeAdapter {
    transport: Arc<dyn HttpTransport>,
    credentials: ScrapeCredentials,
}

impl GenericScrapeAdapter {
    pub fn new(transport: Arc<dyn HttpTransport>, credentials: ScrapeCredentials) -> Self {
        Self {
            transport,
            credentials,
        }
    }
}

#[async_trait]
impl NetworkAdapter for GenericScrapeAdapter {
    async fn fetch_performance(&self, _window: ReportWindow) -> Result<SyncData, AdapterError> {
        // One isolated cookie session per call, dropped on return regardless
        // of outcome.
        let session = self.transport.isolated_session()?;

        let login_page = session
            .send(HttpRequest::get(&self.credentials.login_url))
            .await?;
        if !login_page.is_success() {
            return Err(AdapterError::FetchFailed(format!(
                "login page returned status {}",
                login_page.status
            )));
        }

        let form = page::find_login_form(&login_page.body, USERNAME_SELECTORS, PASSWORD_SELECTORS)
            .ok_or_else(|| {
                AdapterError::ExtractionError(format!(
                    "Login form not found at {}: no known username/password selectors matched",
                    self.credentials.login_url
                ))
            })?;

        let submit_url = page::resolve_action(&self.credentials.login_url, form.action.as_deref())
            .map_err(|e| {
                AdapterError::InvalidConfiguration(format!("invalid login URL: {e}"))
            })?;

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
                "login submission returned status {}",
                login_response.status
            )));
        }

        let dashboard_body = match &self.credentials.dashboard_url {
            Some(url) => {
                let response = session.send(HttpRequest::get(url)).await?;
                if !response.is_success() {
                    return Err(AdapterError::FetchFailed(format!(
                        "dashboard returned status {}",
                        response.status
                    )));
                }
                response.body
            }
            None => login_response.body,
        };

        Ok(SyncData {
            clicks: page::extract_metric(&dashboard_body, CLICK_SELECTORS) as i64,
            conversions: page::extract_metric(&dashboard_body, CONVERSION_SELECTORS) as i64,
            earnings: page::extract_metric(&dashboard_body, EARNINGS_SELECTORS),
            new_links: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::transport::{testing::MockTransport, HttpMethod};

    const LOGIN_PAGE: &str = r#"
        <html><body>
            <form action="/do-login" method="post">
                <input type="email" name="email" />
                <input type="password" name="password" />
            </form>
        </body></html>
    "#;

    const DASHBOARD_PAGE: &str = r#"
        <html><body>
            <div class="stat-clicks"><span class="value">150</span></div>
            <div class="stat-conversions"><span class="value">4</span></div>
            <div class="stat-earnings"><span class="value">$37.20</span></div>
        </body></html>
    "#;

    fn credentials(dashboard_url: Option<&str>) -> ScrapeCredentials {
        ScrapeCredentials {
            login_url: "https://partners.example.com/login".to_string(),
            username: "affiliate@example.com".to_string(),
            password: "hunter2".to_string(),
            dashboard_url: dashboard_url.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn test_logs_in_and_extracts_dashboard_metrics() {
        let transport = MockTransport::new();
        transport.push_response(200, LOGIN_PAGE);
        transport.push_response(200, "<html><body>Welcome back</body></html>");
        transport.push_response(200, DASHBOARD_PAGE);

        let adapter = GenericScrapeAdapter::new(
            Arc::new(transport.clone()),
            credentials(Some("https://partners.example.com/dashboard")),
        );
        let data = adapter
            .fetch_performance(ReportWindow::trailing_days(30))
            .await
            .expect("scrape should succeed");

        assert_eq!(data.clicks, 150);
        assert_eq!(data.conversions, 4);
        assert_eq!(data.earnings, 37.2);

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].method, HttpMethod::Post);
        assert_eq!(requests[1].url, "https://partners.example.com/do-login");
        assert!(requests[1]
            .form
            .iter()
            .any(|(name, value)| name == "email" && value == "affiliate@example.com"));
        assert!(requests[1]
            .form
            .iter()
            .any(|(name, value)| name == "password" && value == "hunter2"));
    }

    #[tokio::test]
    async fn test_uses_post_login_page_without_dashboard_url() {
        let transport = MockTransport::new();
        transport.push_response(200, LOGIN_PAGE);
        transport.push_response(200, DASHBOARD_PAGE);

        let adapter = GenericScrapeAdapter::new(Arc::new(transport.clone()), credentials(None));
        let data = adapter
            .fetch_performance(ReportWindow::trailing_days(30))
            .await
            .expect("scrape should succeed");

        assert_eq!(data.clicks, 150);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_login_form_is_an_extraction_error() {
        let transport = MockTransport::new();
        transport.push_response(200, "<html><body><h1>No form here</h1></body></html>");

        let adapter = GenericScrapeAdapter::new(Arc::new(transport.clone()), credentials(None));
        let err = adapter
            .fetch_performance(ReportWindow::trailing_days(30))
            .await
            .expect_err("scrape should fail");

        assert!(err.to_string().contains("Login form not found"));
        // Fails before any credentials are submitted.
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_metrics_missing_from_dashboard_degrade_to_zero() {
        let transport = MockTransport::new();
        transport.push_response(200, LOGIN_PAGE);
        transport.push_response(200, "<html><body><p>No stats today</p></body></html>");

        let adapter = GenericScrapeAdapter::new(Arc::new(transport), credentials(None));
        let data = adapter
            .fetch_performance(ReportWindow::trailing_days(30))
            .await
            .expect("scrape should succeed");
        assert_eq!(data, SyncData::default());
    }
}
