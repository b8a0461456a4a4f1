use crate::error::{ProviderError, Result};
use std::env;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_COUNTERPARTY_PATH: &str = "client_counterparties.yml";

/// Service configuration, read from the environment. `dotenv` has already
/// folded `.env` into the process environment by the time this runs.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub counterparty_enabled: bool,
    pub counterparty_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = match env::var("PROVIDER_PORT") {
            Ok(value) => value.parse::<u16>().map_err(|_| {
                ProviderError::Config(format!(
                    "PROVIDER_PORT must be a port number, got [{value}]"
                ))
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let counterparty_enabled = env::var("COUNTERPARTY_ENABLED")
            .map(|value| truthy(&value))
            .unwrap_or(false);

        // An empty path falls back to the default alongside the binary.
        let counterparty_path = env::var("COUNTERPARTY_PATH")
            .ok()
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_COUNTERPARTY_PATH));

        Ok(Self {
            port,
            counterparty_enabled,
            counterparty_path,
        })
    }
}

// Flag convention shared with the deployment scripts.
fn truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "y" | "yes" | "true")
}
