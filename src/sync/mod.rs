//! The affiliate network data-synchronization layer.
//!
//! Heterogeneous external sources (signed REST APIs, bearer-token APIs,
//! credential-gated dashboards with no API at all) are normalized into one
//! internal performance record. `SyncService` routes a program to the adapter
//! for its network, runs one synchronization attempt, and folds every failure
//! into a `SyncResult` value — callers never see an exception.

use std::sync::Arc;

use sea_orm::{DatabaseConnection, DbErr};
use tracing::{error, info};

use crate::db::services::program_service::{self, PerformanceDelta};
use crate::services::encryption_service::EncryptionService;

pub mod adapters;
pub mod models;
pub mod network;
pub mod transport;

use adapters::amazon::{AmazonAdapter, AmazonCredentials};
use adapters::commission_junction::{CommissionJunctionAdapter, CommissionJunctionCredentials};
use adapters::generic_scrape::{GenericScrapeAdapter, ScrapeCredentials};
use adapters::shareasale::{ShareASaleAdapter, ShareASaleCredentials};
use adapters::{AdapterError, NetworkAdapter};
use models::{CredentialBundle, ReportWindow, SyncData, SyncResult};
use network::NetworkKind;
use transport::{HttpTransport, ReqwestTransport, TransportError};

/// All adapters report a trailing 30-day window.
const SYNC_WINDOW_DAYS: i64 = 30;

/// Dispatches sync attempts to network adapters and persists the results.
///
/// Constructed once at startup and shared through the application state;
/// tests construct their own instance with a mock transport and database.
pub struct SyncService {
    db: DatabaseConnection,
    encryption: Arc<EncryptionService>,
    transport: Arc<dyn HttpTransport>,
}

impl SyncService {
    pub fn new(
        db: DatabaseConnection,
        encryption: Arc<EncryptionService>,
    ) -> Result<Self, TransportError> {
        Ok(Self::with_transport(
            db,
            encryption,
            Arc::new(ReqwestTransport::new()?),
        ))
    }

    pub fn with_transport(
        db: DatabaseConnection,
        encryption: Arc<EncryptionService>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            db,
            encryption,
            transport,
        }
    }

    /// Runs one synchronization attempt for a single program.
    ///
    /// Never returns an error: a missing program, bad credentials, or an
    /// adapter failure all come back as a failure `SyncResult`. The program
    /// row is written (counters + `last_synced_at`) only when the adapter
    /// succeeds; a failed sync leaves the row untouched.
    pub async fn sync_program(&self, program_id: i32) -> SyncResult {
        let program = match program_service::get_program_by_id(&self.db, program_id).await {
            Ok(Some(program)) => program,
            Ok(None) => return SyncResult::failure("Program not found"),
            Err(e) => {
                error!(program_id, error = %e, "Failed to load program for sync.");
                return SyncResult::failure_with("Failed to load program", e.to_string());
            }
        };

        let bundle = match self.decrypt_credentials(&program.credentials) {
            Ok(bundle) => bundle,
            Err(message) => {
                error!(program_id, "Failed to read program credentials for sync.");
                return SyncResult::failure_with("Failed to read program credentials", message);
            }
        };

        let kind = NetworkKind::from_name(&program.network);
        let window = ReportWindow::trailing_days(SYNC_WINDOW_DAYS);

        match self.run_adapter(kind, &bundle, window).await {
            Ok(data) => {
                let delta = PerformanceDelta {
                    clicks: data.clicks,
                    conversions: data.conversions,
                    earnings: data.earnings,
                };
                if let Err(e) =
                    program_service::record_sync_success(&self.db, program.id, &delta).await
                {
                    error!(program_id, error = %e, "Failed to persist sync results.");
                    return SyncResult::failure_with(
                        format!("Failed to record {} sync results", program.network),
                        e.to_string(),
                    );
                }
                info!(
                    program_id,
                    network = %program.network,
                    clicks = data.clicks,
                    conversions = data.conversions,
                    "Program synced."
                );
                SyncResult::ok(
                    format!("Successfully synced {} data", program.network),
                    data,
                )
            }
            Err(e) => SyncResult::failure_with(
                format!("Failed to sync {} data", program.network),
                e.to_string(),
            ),
        }
    }

    /// Runs synchronization for every sync-enabled, active program belonging
    /// to one user, sequentially and in load order. A failure for one program
    /// does not abort the batch; each program gets exactly one result, with
    /// its name prefixed onto the message.
    pub async fn sync_all_programs(&self, user_id: i32) -> Result<Vec<SyncResult>, DbErr> {
        let programs = program_service::get_programs_by_user_id(&self.db, user_id).await?;

        let mut results = Vec::new();
        for program in programs
            .iter()
            .filter(|p| p.sync_enabled && p.status == "active")
        {
            let mut result = self.sync_program(program.id).await;
            result.message = format!("{}: {}", program.name, result.message);
            results.push(result);
        }
        Ok(results)
    }

    fn decrypt_credentials(&self, encrypted: &[u8]) -> Result<CredentialBundle, String> {
        if encrypted.is_empty() {
            return Ok(CredentialBundle::default());
        }
        let plaintext = self
            .encryption
            .decrypt(encrypted)
            .map_err(|e| e.to_string())?;
        serde_json::from_slice(&plaintext).map_err(|e| e.to_string())
    }

    /// Builds the typed credential view for the routed network and runs its
    /// adapter. A view that cannot be built is a fail-fast configuration
    /// error: no request leaves the process.
    async fn run_adapter(
        &self,
        kind: NetworkKind,
        bundle: &CredentialBundle,
        window: ReportWindow,
    ) -> Result<SyncData, AdapterError> {
        match kind {
            NetworkKind::ShareASale => {
                let credentials = ShareASaleCredentials::from_bundle(bundle).ok_or_else(|| {
                    AdapterError::InvalidConfiguration(
                        "ShareASale sync requires an API key, API secret and affiliate ID"
                            .to_string(),
                    )
                })?;
                ShareASaleAdapter::new(self.transport.clone(), credentials)
                    .fetch_performance(window)
                    .await
            }
            NetworkKind::CommissionJunction => {
                let credentials =
                    CommissionJunctionCredentials::from_bundle(bundle).ok_or_else(|| {
                        AdapterError::InvalidConfiguration(
                            "Commission Junction sync requires an API key and affiliate ID"
                                .to_string(),
                        )
                    })?;
                CommissionJunctionAdapter::new(self.transport.clone(), credentials)
                    .fetch_performance(window)
                    .await
            }
            NetworkKind::AmazonAssociates => {
                let credentials = AmazonCredentials::from_bundle(bundle).ok_or_else(|| {
                    AdapterError::InvalidConfiguration(
                        "Amazon Associates sync requires the account email and password"
                            .to_string(),
                    )
                })?;
                AmazonAdapter::new(self.transport.clone(), credentials)
                    .fetch_performance(window)
                    .await
            }
            // Unregistered networks always route to dashboard scraping;
            // without login credentials this fails before any request leaves.
            NetworkKind::Unregistered => {
                let credentials = ScrapeCredentials::from_bundle(bundle).ok_or_else(|| {
                    AdapterError::InvalidConfiguration(
                        "Scraping sync requires a login URL, username and password".to_string(),
                    )
                })?;
                GenericScrapeAdapter::new(self.transport.clone(), credentials)
                    .fetch_performance(window)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use crate::db::entities::program;
    use crate::sync::transport::testing::MockTransport;

    const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    const SHAREASALE_BODY: &str = r#"[
        {"clicks": 10, "sales": 2, "commission": "5.00"},
        {"clicks": 20, "sales": 3, "commission": "7.50"}
    ]"#;

    fn encryption() -> Arc<EncryptionService> {
        Arc::new(EncryptionService::from_hex_key(KEY_HEX).unwrap())
    }

    fn encrypt_bundle(encryption: &EncryptionService, bundle: &CredentialBundle) -> Vec<u8> {
        encryption
            .encrypt(&serde_json::to_vec(bundle).unwrap())
            .unwrap()
    }

    fn shareasale_bundle() -> CredentialBundle {
        CredentialBundle {
            api_key: Some("key123".to_string()),
            api_secret: Some("secret456".to_string()),
            affiliate_id: Some("aff789".to_string()),
            ..Default::default()
        }
    }

    fn program_row(
        id: i32,
        name: &str,
        network: &str,
        credentials: Vec<u8>,
        sync_enabled: bool,
        status: &str,
    ) -> program::Model {
        let now = Utc::now();
        program::Model {
            id,
            user_id: 1,
            name: name.to_string(),
            network: network.to_string(),
            status: status.to_string(),
            credentials,
            sync_enabled,
            sync_frequency: "daily".to_string(),
            last_synced_at: None,
            total_clicks: 0,
            total_conversions: 0,
            total_earnings: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    fn update_count(log: &[sea_orm::Transaction]) -> usize {
        log.iter()
            .filter(|t| format!("{t:?}").contains("UPDATE"))
            .count()
    }

    #[tokio::test]
    async fn test_sync_program_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<program::Model>::new()])
            .into_connection();
        let transport = MockTransport::new();
        let service =
            SyncService::with_transport(db, encryption(), Arc::new(transport.clone()));

        let result = service.sync_program(42).await;

        assert!(!result.success);
        assert_eq!(result.message, "Program not found");
        assert!(result.data.is_none());
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_shareasale_sync_sums_records_and_stamps_timestamp() {
        let enc = encryption();
        let row = program_row(
            1,
            "Affiliate One",
            "ShareASale",
            encrypt_bundle(&enc, &shareasale_bundle()),
            true,
            "active",
        );
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let transport = MockTransport::new();
        transport.push_response(200, SHAREASALE_BODY);
        let service =
            SyncService::with_transport(db, enc, Arc::new(transport.clone()));

        let result = service.sync_program(1).await;

        assert!(result.success, "unexpected failure: {:?}", result);
        let data = result.data.expect("success carries data");
        assert_eq!(data.clicks, 30);
        assert_eq!(data.conversions, 5);
        assert_eq!(data.earnings, 12.5);
        assert_eq!(transport.request_count(), 1);

        let log = service.db.into_transaction_log();
        assert_eq!(update_count(&log), 1);
        assert!(
            format!("{log:?}").contains("last_synced_at"),
            "successful sync must stamp last_synced_at"
        );
    }

    #[tokio::test]
    async fn test_incomplete_shareasale_credentials_fail_before_any_request() {
        let enc = encryption();
        let mut bundle = shareasale_bundle();
        bundle.api_secret = None;
        let row = program_row(
            2,
            "Affiliate Two",
            "ShareASale",
            encrypt_bundle(&enc, &bundle),
            true,
            "active",
        );
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .into_connection();

        let transport = MockTransport::new();
        let service =
            SyncService::with_transport(db, enc, Arc::new(transport.clone()));

        let result = service.sync_program(2).await;

        assert!(!result.success);
        assert!(result.error.is_some());
        assert_eq!(transport.request_count(), 0, "no request may be issued");
        assert_eq!(update_count(&service.db.into_transaction_log()), 0);
    }

    #[tokio::test]
    async fn test_failed_sync_leaves_timestamp_unchanged() {
        let enc = encryption();
        let row = program_row(
            3,
            "Affiliate Three",
            "ShareASale",
            encrypt_bundle(&enc, &shareasale_bundle()),
            true,
            "active",
        );
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .into_connection();

        let transport = MockTransport::new();
        transport.push_error("connection refused");
        let service =
            SyncService::with_transport(db, enc, Arc::new(transport.clone()));

        let result = service.sync_program(3).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("connection refused"));
        assert_eq!(
            update_count(&service.db.into_transaction_log()),
            0,
            "failed sync must not write"
        );
    }

    #[tokio::test]
    async fn test_unknown_network_routes_to_scrape_and_reports_missing_selectors() {
        let enc = encryption();
        let bundle = CredentialBundle {
            login_url: Some("https://portal.example.net/login".to_string()),
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
            ..Default::default()
        };
        let row = program_row(
            4,
            "Affiliate Four",
            "Unknown Network",
            encrypt_bundle(&enc, &bundle),
            true,
            "active",
        );
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row]])
            .into_connection();

        let transport = MockTransport::new();
        transport.push_response(200, "<html><body><h1>Maintenance</h1></body></html>");
        let service = SyncService::with_transport(db, enc, Arc::new(transport.clone()));

        let result = service.sync_program(4).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Login form not found"));
        // The generic adapter was selected and did fetch the login page.
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_sync_all_filters_eligibility_and_isolates_failures() {
        let enc = encryption();
        let eligible_ok = program_row(
            1,
            "Affiliate One",
            "ShareASale",
            encrypt_bundle(&enc, &shareasale_bundle()),
            true,
            "active",
        );
        let sync_disabled = program_row(
            2,
            "Affiliate Two",
            "ShareASale",
            encrypt_bundle(&enc, &shareasale_bundle()),
            false,
            "active",
        );
        let eligible_failing = program_row(
            3,
            "Affiliate Three",
            "Unknown Network",
            Vec::new(), // no credentials at all
            true,
            "active",
        );

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![
                    eligible_ok.clone(),
                    sync_disabled.clone(),
                    eligible_failing.clone(),
                ],
                vec![eligible_ok],
                vec![eligible_failing],
            ])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let transport = MockTransport::new();
        transport.push_response(200, SHAREASALE_BODY);
        let service = SyncService::with_transport(db, enc, Arc::new(transport));

        let results = service.sync_all_programs(1).await.unwrap();

        assert_eq!(results.len(), 2, "one result per eligible program");
        assert!(results[0].success);
        assert!(results[0].message.starts_with("Affiliate One: "));
        assert!(!results[1].success);
        assert!(results[1].message.starts_with("Affiliate Three: "));
    }

    #[tokio::test]
    async fn test_repeated_sync_with_unchanged_external_data_is_idempotent() {
        let enc = encryption();
        let row = program_row(
            7,
            "Affiliate Seven",
            "ShareASale",
            encrypt_bundle(&enc, &shareasale_bundle()),
            true,
            "active",
        );
        let exec = MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row.clone()], vec![row]])
            .append_exec_results([exec.clone(), exec])
            .into_connection();

        let transport = MockTransport::new();
        transport.push_response(200, SHAREASALE_BODY);
        transport.push_response(200, SHAREASALE_BODY);
        let service = SyncService::with_transport(db, enc, Arc::new(transport));

        let first = service.sync_program(7).await;
        let second = service.sync_program(7).await;

        assert!(first.success && second.success);
        assert_eq!(first.data, second.data);
    }
}
