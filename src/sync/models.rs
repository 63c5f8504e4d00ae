use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The credential fields stored (encrypted) on a program. All fields are
/// optional in storage; each adapter derives the typed view it needs at
/// dispatch time and fails fast when required fields are absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialBundle {
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub affiliate_id: Option<String>,
    pub tracking_id: Option<String>,
    pub login_url: Option<String>,
    pub dashboard_url: Option<String>,
}

impl CredentialBundle {
    /// Returns a field only if it is present and non-empty.
    pub fn field(value: &Option<String>) -> Option<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    }
}

/// Trailing reporting window requested from a network. All adapters sync a
/// 30-day window ending now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    pub fn trailing_days(days: i64) -> Self {
        let end = Utc::now();
        Self {
            start: end - Duration::days(days),
            end,
        }
    }
}

/// Normalized performance counters extracted from one network for one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncData {
    pub clicks: i64,
    pub conversions: i64,
    pub earnings: f64,
    pub new_links: i64,
}

/// Outcome of one synchronization attempt. This is a value, not an error:
/// the dispatcher converts every failure into a `SyncResult` and never
/// propagates an exception to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SyncData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncResult {
    pub fn ok(message: impl Into<String>, data: SyncData) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn failure_with(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error.into()),
        }
    }
}
