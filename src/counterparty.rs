use crate::error::Result;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Flat-file lookup of the counterparty label shown for a client.
///
/// The mapping file is re-read on every call so edits apply without a
/// restart. Disabled lookups and unmapped codes both come back as an empty
/// string; a missing or unreadable file while enabled is an error.
pub struct CounterpartyLookup {
    // None while the feature is disabled.
    path: Option<PathBuf>,
}

impl CounterpartyLookup {
    pub fn new(enabled: bool, path: impl Into<PathBuf>) -> Self {
        let path = enabled.then(|| path.into());
        match &path {
            Some(path) => debug!("Counterparty mapping path: [{}]", path.display()),
            None => debug!("Counterparty lookup is disabled"),
        }
        Self { path }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn lookup(&self, client_code: &str) -> Result<String> {
        let Some(path) = &self.path else {
            debug!("Counterparty lookup is disabled, returning empty string");
            return Ok(String::new());
        };

        let text = fs::read_to_string(path)?;
        // An empty file deserializes to None rather than an empty map.
        let mapping: Option<HashMap<String, Option<String>>> = serde_yaml::from_str(&text)?;
        let Some(mapping) = mapping else {
            debug!("Counterparty mapping [{}] is empty", path.display());
            return Ok(String::new());
        };

        let label = mapping.get(client_code).cloned().flatten().unwrap_or_default();
        if label.is_empty() {
            debug!("No counterparty mapped for [{client_code}]");
        } else {
            debug!("Counterparty for [{client_code}] is [{label}]");
        }
        Ok(label)
    }
}
