use crate::domain::{ClientRecord, ComponentGroup, ComponentType, Delivery, LocationRecord};
use crate::error::Result;
use crate::query::PredicateSet;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Record store executing predicate sets over delivery rows.
///
/// The store owns predicate interpretation: a SQL-backed implementation
/// translates the variants into its own dialect, the in-memory one
/// evaluates them row by row. Rows come back ordered by creation date.
#[async_trait]
pub trait DeliveryStore: Send + Sync {
    async fn query(&self, predicates: &PredicateSet) -> Result<Vec<Delivery>>;
}

/// Catalog of component types and type groups.
#[async_trait]
pub trait ComponentStore: Send + Sync {
    async fn find_group(&self, code: &str) -> Result<Option<ComponentGroup>>;
    async fn find_type(&self, code: &str) -> Result<Option<ComponentType>>;
    async fn find_types_in(&self, codes: &[String]) -> Result<Vec<ComponentType>>;
}

/// Two-tier file location registry.
///
/// Both lookups are exact-path and return the newest matching record, or
/// `None` when the tier has never seen the path.
#[async_trait]
pub trait LocationRegistry: Send + Sync {
    /// Point-in-time tier: newest record effective at or before `as_of`.
    async fn find_historical(
        &self,
        full_path: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Option<LocationRecord>>;

    /// Current tier: newest record by input date.
    async fn find_current(&self, full_path: &str) -> Result<Option<LocationRecord>>;
}

/// Directory of client records.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn list_active(&self) -> Result<Vec<ClientRecord>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ClientRecord>>;
    async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<ClientRecord>>;
}
