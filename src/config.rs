use std::env;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::payments::{PayPalConfig, PayPalEnvironment};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub paypal: PayPalConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let environment = env::var("PAYPAL_ENVIRONMENT")
            .map(|v| PayPalEnvironment::from_setting(&v))
            .unwrap_or(PayPalEnvironment::Sandbox);

        let client_id = env::var("PAYPAL_CLIENT_ID")
            .map_err(|_| AppError::Config("PAYPAL_CLIENT_ID is not set".into()))?;
        let secret_key = env::var("PAYPAL_SECRET_KEY")
            .map_err(|_| AppError::Config("PAYPAL_SECRET_KEY is not set".into()))?;

        let timeout_secs: u64 = env::var("PAYPAL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "paypal_sync.db".to_string()),
            paypal: PayPalConfig {
                client_id,
                secret_key,
                environment,
                base_url_override: env::var("PAYPAL_API_BASE").ok(),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}
