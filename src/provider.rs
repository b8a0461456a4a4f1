use crate::domain::Delivery;
use crate::error::Result;
use crate::format::{format_v1, format_v2, V1Record, V2Record};
use crate::provenance::FileResolver;
use crate::query::{parse_timezone, QueryBuilder};
use crate::storage::{ComponentStore, DeliveryStore, LocationRegistry};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// Delivery search facade: translates search parameters, runs them against
/// the store, and shapes the rows into one of the two response schemas.
///
/// Absence of matching rows is `Ok(vec![])`; `Err` always means the request
/// itself failed. Callers decide how to render the difference.
pub struct DeliveryProvider {
    deliveries: Arc<dyn DeliveryStore>,
    query: QueryBuilder,
    files: FileResolver,
}

impl DeliveryProvider {
    pub fn new(
        deliveries: Arc<dyn DeliveryStore>,
        components: Arc<dyn ComponentStore>,
        registry: Arc<dyn LocationRegistry>,
    ) -> Self {
        Self {
            deliveries,
            query: QueryBuilder::new(components),
            files: FileResolver::new(registry),
        }
    }

    /// Legacy schema: flat rows, status straight from the comment field,
    /// file list as a single semicolon-joined string.
    pub async fn get_deliveries(
        &self,
        client_code: &str,
        params: &HashMap<String, String>,
        timezone: &str,
    ) -> Result<Vec<V1Record>> {
        info!("Looking for [{client_code}] deliveries with search params: {params:?}");
        match self.collect_v1(client_code, params, timezone).await {
            Ok(records) => Ok(records),
            Err(error) => {
                error!("Delivery search for [{client_code}] failed: {error}");
                Err(error)
            }
        }
    }

    /// V2 schema: adds the machine-readable creation date, lifecycle-aware
    /// status, and per-file provenance resolved through the registry.
    pub async fn get_deliveries_v2(
        &self,
        client_code: &str,
        params: &HashMap<String, String>,
        timezone: &str,
    ) -> Result<Vec<V2Record>> {
        info!("V2: looking for [{client_code}] deliveries with search params: {params:?}");
        match self.collect_v2(client_code, params, timezone).await {
            Ok(records) => Ok(records),
            Err(error) => {
                error!("V2 delivery search for [{client_code}] failed: {error}");
                Err(error)
            }
        }
    }

    async fn collect_v1(
        &self,
        client_code: &str,
        params: &HashMap<String, String>,
        timezone: &str,
    ) -> Result<Vec<V1Record>> {
        let rows = self.fetch(client_code, params, timezone).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let tz = parse_timezone(timezone)?;
        Ok(rows.iter().map(|delivery| format_v1(delivery, tz)).collect())
    }

    async fn collect_v2(
        &self,
        client_code: &str,
        params: &HashMap<String, String>,
        timezone: &str,
    ) -> Result<Vec<V2Record>> {
        let rows = self.fetch(client_code, params, timezone).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let tz = parse_timezone(timezone)?;
        let mut records = Vec::with_capacity(rows.len());
        for delivery in &rows {
            let files = self.files.resolve(delivery).await?;
            records.push(format_v2(delivery, files, tz));
        }
        Ok(records)
    }

    async fn fetch(
        &self,
        client_code: &str,
        params: &HashMap<String, String>,
        timezone: &str,
    ) -> Result<Vec<Delivery>> {
        let predicates = self.query.build(client_code, params, timezone).await?;
        let rows = self.deliveries.query(&predicates).await?;
        info!("Found {} records for client [{client_code}]", rows.len());
        Ok(rows)
    }
}
