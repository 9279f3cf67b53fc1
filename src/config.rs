use std::{net::SocketAddr, time::Duration};

use clap::Parser;

use crate::errors::RelayError;

pub const PRODUCTION_VERIFY_URL: &str = "https://buy.itunes.apple.com/verifyReceipt";
pub const SANDBOX_VERIFY_URL: &str = "https://sandbox.itunes.apple.com/verifyReceipt";

/// Upper bound on the expiry window, 100 years.
pub const MAX_EXPIRY_WINDOW_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Where and how receipts are verified.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyEndpoints {
    pub production_url: String,
    pub sandbox_url: String,
    pub timeout: Duration,
}

impl Default for VerifyEndpoints {
    fn default() -> Self {
        Self {
            production_url: PRODUCTION_VERIFY_URL.to_string(),
            sandbox_url: SANDBOX_VERIFY_URL.to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

/// App Store subscription event relay
#[derive(Parser, Debug, Clone)]
#[command(name = "fractic-iap-relay")]
#[command(version)]
#[command(about = "Relays App Store subscription notifications and renewals to listeners")]
pub struct RelayConfig {
    /// App-specific shared secret, also expected as the notification password
    #[arg(long, env = "APP_STORE_SHARED_SECRET", hide_env_values = true)]
    pub shared_secret: String,

    /// Address the webhook server binds to
    #[arg(long, env = "RELAY_LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: SocketAddr,

    /// Path of the status update notification endpoint
    #[arg(long, env = "RELAY_WEBHOOK_PATH", default_value = "/app-store/notifications")]
    pub webhook_path: String,

    /// Seconds between expiration scans
    #[arg(long, env = "RELAY_SCAN_INTERVAL_SECS", default_value_t = 3600)]
    pub scan_interval_secs: u64,

    /// Subscriptions expiring within this many seconds are re-verified
    #[arg(long, env = "RELAY_EXPIRY_WINDOW_SECS", default_value_t = 86400)]
    pub expiry_window_secs: u64,

    #[arg(long, env = "RELAY_PRODUCTION_VERIFY_URL", default_value = PRODUCTION_VERIFY_URL)]
    pub production_verify_url: String,

    #[arg(long, env = "RELAY_SANDBOX_VERIFY_URL", default_value = SANDBOX_VERIFY_URL)]
    pub sandbox_verify_url: String,

    /// Timeout for a single verifyReceipt callout, in seconds
    #[arg(long, env = "RELAY_VERIFY_TIMEOUT_SECS", default_value_t = 20)]
    pub verify_timeout_secs: u64,

    /// Bound on draining in-flight requests at shutdown, in seconds
    #[arg(long, env = "RELAY_SHUTDOWN_GRACE_SECS", default_value_t = 15)]
    pub shutdown_grace_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.shared_secret.is_empty() {
            return Err(RelayError::Config("shared secret must not be empty".into()));
        }
        if self.scan_interval_secs == 0 {
            return Err(RelayError::Config("scan interval must be positive".into()));
        }
        if self.verify_timeout_secs == 0 {
            return Err(RelayError::Config("verify timeout must be positive".into()));
        }
        if self.expiry_window_secs > MAX_EXPIRY_WINDOW_SECS {
            return Err(RelayError::Config(format!(
                "expiry window must be at most {MAX_EXPIRY_WINDOW_SECS} seconds"
            )));
        }
        if !self.webhook_path.starts_with('/') {
            return Err(RelayError::Config(format!(
                "webhook path {:?} must start with '/'",
                self.webhook_path
            )));
        }
        Ok(())
    }

    pub fn verify_endpoints(&self) -> VerifyEndpoints {
        VerifyEndpoints {
            production_url: self.production_verify_url.clone(),
            sandbox_url: self.sandbox_verify_url.clone(),
            timeout: Duration::from_secs(self.verify_timeout_secs),
        }
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn expiry_window(&self) -> Result<chrono::Duration, RelayError> {
        i64::try_from(self.expiry_window_secs)
            .ok()
            .filter(|secs| *secs as u64 <= MAX_EXPIRY_WINDOW_SECS)
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                RelayError::Config(format!(
                    "expiry window of {} seconds is out of range",
                    self.expiry_window_secs
                ))
            })
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
