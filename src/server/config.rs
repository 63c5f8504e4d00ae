use std::env;

#[derive(Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub credential_encryption_key: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let listen_addr =
            env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        let credential_encryption_key = env::var("CREDENTIAL_ENCRYPTION_KEY").map_err(|_| {
            "CREDENTIAL_ENCRYPTION_KEY must be set as a 32-byte hex-encoded string".to_string()
        })?;

        Ok(ServerConfig {
            listen_addr,
            database_url,
            jwt_secret,
            credential_encryption_key,
        })
    }
}
