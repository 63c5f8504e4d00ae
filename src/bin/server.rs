use std::sync::Arc;

use dotenv::dotenv;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use afftrack::server::config::ServerConfig;
use afftrack::services::encryption_service::EncryptionService;
use afftrack::sync::SyncService;
use afftrack::web::create_axum_router;

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_logging();
    dotenv().ok();

    let config = match ServerConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Failed to load server configuration: {}", e);
            return Err(e.into());
        }
    };

    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(10);
    let db: DatabaseConnection = Database::connect(opt).await?;

    let key_bytes = hex::decode(&config.credential_encryption_key)
        .map_err(|e| format!("Failed to decode CREDENTIAL_ENCRYPTION_KEY: {e}"))?;
    let encryption = Arc::new(
        EncryptionService::new(&key_bytes)
            .map_err(|e| format!("Failed to create encryption service: {e}"))?,
    );

    let sync_service = Arc::new(
        SyncService::new(db.clone(), encryption.clone())
            .map_err(|e| format!("Failed to create sync service: {e}"))?,
    );

    let router = create_axum_router(db, encryption, sync_service, config.clone());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(address = %config.listen_addr, "HTTP server listening");
    axum::serve(listener, router).await?;

    Ok(())
}
