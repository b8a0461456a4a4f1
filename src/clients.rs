use crate::error::Result;
use crate::storage::ClientStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Read surface over the client directory.
pub struct ClientDirectory {
    clients: Arc<dyn ClientStore>,
}

/// Identification subset of a client record. An unset language renders as
/// an empty string rather than null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientData {
    pub code: String,
    pub country: String,
    pub language: String,
}

impl ClientDirectory {
    pub fn new(clients: Arc<dyn ClientStore>) -> Self {
        Self { clients }
    }

    /// Codes of active clients; records with a blank code are skipped.
    pub async fn get_clients(&self) -> Result<Vec<String>> {
        let records = self.clients.list_active().await?;
        Ok(records
            .into_iter()
            .map(|record| record.code)
            .filter(|code| !code.is_empty())
            .collect())
    }

    pub async fn get_client_data(&self, id: Uuid) -> Result<Option<ClientData>> {
        debug!("Requested client data for id [{id}]");
        let record = self.clients.find_by_id(id).await?;
        Ok(record.map(|record| ClientData {
            code: record.code,
            country: record.country,
            language: record.language.unwrap_or_default(),
        }))
    }

    /// Maps each known code to its client's language. Unknown codes are
    /// omitted, not errors; code case is taken as stored.
    pub async fn get_client_lang_list(&self, codes: &[String]) -> Result<HashMap<String, String>> {
        let records = self.clients.find_by_codes(codes).await?;
        Ok(records
            .into_iter()
            .filter(|record| !record.code.is_empty())
            .map(|record| (record.code, record.language.unwrap_or_default()))
            .collect())
    }
}
