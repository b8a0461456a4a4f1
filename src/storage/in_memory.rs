use super::traits::{ClientStore, ComponentStore, DeliveryStore, LocationRegistry};
use crate::domain::{ClientRecord, ComponentGroup, ComponentType, Delivery, LocationRecord};
use crate::error::Result;
use crate::query::PredicateSet;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// In-memory implementation of every storage port, for development and
/// testing. Predicates are evaluated row by row through the compiled
/// matcher.
pub struct InMemoryStore {
    deliveries: Arc<Mutex<HashMap<Uuid, Delivery>>>,
    groups: Arc<Mutex<HashMap<String, ComponentGroup>>>,
    types: Arc<Mutex<HashMap<String, ComponentType>>>,
    locations: Arc<Mutex<Vec<LocationRecord>>>,
    clients: Arc<Mutex<HashMap<Uuid, ClientRecord>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            deliveries: Arc::new(Mutex::new(HashMap::new())),
            groups: Arc::new(Mutex::new(HashMap::new())),
            types: Arc::new(Mutex::new(HashMap::new())),
            locations: Arc::new(Mutex::new(Vec::new())),
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn add_delivery(&self, delivery: &mut Delivery) {
        let id = Uuid::new_v4();
        delivery.id = Some(id);

        let mut deliveries = self.deliveries.lock().unwrap();
        deliveries.insert(id, delivery.clone());

        debug!("Seeded delivery {} with id {}", delivery.display_name(), id);
    }

    pub fn add_component_type(&self, citype: ComponentType) {
        let mut types = self.types.lock().unwrap();
        types.insert(citype.code.clone(), citype);
    }

    pub fn add_component_group(&self, group: ComponentGroup) {
        let mut groups = self.groups.lock().unwrap();
        groups.insert(group.code.clone(), group);
    }

    pub fn add_location(&self, record: LocationRecord) {
        let mut locations = self.locations.lock().unwrap();
        locations.push(record);
    }

    pub fn add_client(&self, client: &mut ClientRecord) {
        let id = Uuid::new_v4();
        client.id = Some(id);

        let mut clients = self.clients.lock().unwrap();
        clients.insert(id, client.clone());

        debug!("Seeded client {} with id {}", client.code, id);
    }
}

#[async_trait]
impl DeliveryStore for InMemoryStore {
    async fn query(&self, predicates: &PredicateSet) -> Result<Vec<Delivery>> {
        let matcher = predicates.matcher()?;

        let deliveries = self.deliveries.lock().unwrap();
        let total = deliveries.len();
        let mut rows: Vec<Delivery> = deliveries
            .values()
            .filter(|delivery| matcher.matches(delivery))
            .cloned()
            .collect();
        drop(deliveries);

        rows.sort_by_key(|delivery| delivery.creation_date);
        debug!("Query matched {} of {} delivery rows", rows.len(), total);
        Ok(rows)
    }
}

#[async_trait]
impl ComponentStore for InMemoryStore {
    async fn find_group(&self, code: &str) -> Result<Option<ComponentGroup>> {
        let groups = self.groups.lock().unwrap();
        Ok(groups.get(code).cloned())
    }

    async fn find_type(&self, code: &str) -> Result<Option<ComponentType>> {
        let types = self.types.lock().unwrap();
        Ok(types.get(code).cloned())
    }

    async fn find_types_in(&self, codes: &[String]) -> Result<Vec<ComponentType>> {
        let types = self.types.lock().unwrap();
        Ok(codes
            .iter()
            .filter_map(|code| types.get(code).cloned())
            .collect())
    }
}

#[async_trait]
impl LocationRegistry for InMemoryStore {
    async fn find_historical(
        &self,
        full_path: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Option<LocationRecord>> {
        let locations = self.locations.lock().unwrap();
        Ok(locations
            .iter()
            .filter(|record| {
                record.historical && record.path == full_path && record.effective_date <= as_of
            })
            .max_by_key(|record| record.effective_date)
            .cloned())
    }

    async fn find_current(&self, full_path: &str) -> Result<Option<LocationRecord>> {
        let locations = self.locations.lock().unwrap();
        Ok(locations
            .iter()
            .filter(|record| !record.historical && record.path == full_path)
            .max_by_key(|record| record.effective_date)
            .cloned())
    }
}

#[async_trait]
impl ClientStore for InMemoryStore {
    async fn list_active(&self) -> Result<Vec<ClientRecord>> {
        let clients = self.clients.lock().unwrap();
        let mut active: Vec<ClientRecord> = clients
            .values()
            .filter(|client| client.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(active)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ClientRecord>> {
        let clients = self.clients.lock().unwrap();
        Ok(clients.get(&id).cloned())
    }

    async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<ClientRecord>> {
        let clients = self.clients.lock().unwrap();
        let mut found: Vec<ClientRecord> = clients
            .values()
            .filter(|client| codes.contains(&client.code))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Predicate;
    use chrono::TimeZone;

    fn delivery(artifact: &str, day: u32) -> Delivery {
        Delivery {
            id: None,
            group_id: "com.example.CLIENT_A".to_string(),
            artifact_id: artifact.to_string(),
            version: "1.0".to_string(),
            creation_date: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            author: "jdoe".to_string(),
            comment: String::new(),
            file_list: String::new(),
            tag_root: String::new(),
            business_status: None,
            flag_uploaded: false,
            flag_approved: false,
            flag_failed: false,
        }
    }

    fn location(path: &str, citype: &str, day: u32, historical: bool) -> LocationRecord {
        LocationRecord {
            path: path.to_string(),
            citype_code: citype.to_string(),
            citype_name: format!("{citype} files"),
            location_kind: "SVN".to_string(),
            effective_date: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
            historical,
        }
    }

    #[tokio::test]
    async fn query_filters_and_sorts_by_creation_date() {
        let store = InMemoryStore::new();
        store.add_delivery(&mut delivery("late", 20));
        store.add_delivery(&mut delivery("early", 2));
        store.add_delivery(&mut delivery("middle", 11));

        let all: PredicateSet = [Predicate::GroupIdEndsWith("CLIENT_A".into())]
            .into_iter()
            .collect();
        let rows = store.query(&all).await.unwrap();
        let names: Vec<String> = rows.iter().map(|d| d.artifact_id.clone()).collect();
        assert_eq!(names, vec!["early", "middle", "late"]);

        let none: PredicateSet = [Predicate::GroupIdEndsWith("CLIENT_B".into())]
            .into_iter()
            .collect();
        assert!(store.query(&none).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn seeded_deliveries_receive_ids() {
        let store = InMemoryStore::new();
        let mut d = delivery("billing", 1);
        store.add_delivery(&mut d);
        assert!(d.id.is_some());
    }

    #[tokio::test]
    async fn historical_lookup_picks_the_newest_record_at_or_before() {
        let store = InMemoryStore::new();
        store.add_location(location("tags/a.zip", "OLD", 1, true));
        store.add_location(location("tags/a.zip", "NEWER", 5, true));
        store.add_location(location("tags/a.zip", "FUTURE", 20, true));

        let as_of = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let record = store.find_historical("tags/a.zip", as_of).await.unwrap();
        assert_eq!(record.unwrap().citype_code, "NEWER");

        let too_early = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert!(store
            .find_historical("tags/a.zip", too_early)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn current_lookup_ignores_historical_rows() {
        let store = InMemoryStore::new();
        store.add_location(location("a.zip", "HIST", 1, true));
        store.add_location(location("a.zip", "CURR_OLD", 2, false));
        store.add_location(location("a.zip", "CURR_NEW", 9, false));

        let record = store.find_current("a.zip").await.unwrap();
        assert_eq!(record.unwrap().citype_code, "CURR_NEW");
        assert!(store.find_current("missing.zip").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn client_lookups_cover_active_and_code_sets() {
        let store = InMemoryStore::new();
        let mut active = ClientRecord {
            id: None,
            code: "CLIENT_A".to_string(),
            country: "DE".to_string(),
            language: Some("de".to_string()),
            is_active: true,
        };
        let mut dormant = ClientRecord {
            id: None,
            code: "CLIENT_B".to_string(),
            country: "SE".to_string(),
            language: None,
            is_active: false,
        };
        store.add_client(&mut active);
        store.add_client(&mut dormant);

        let listed = store.list_active().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].code, "CLIENT_A");

        let by_id = store.find_by_id(dormant.id.unwrap()).await.unwrap();
        assert_eq!(by_id.unwrap().code, "CLIENT_B");

        let by_codes = store
            .find_by_codes(&["CLIENT_B".to_string(), "GHOST".to_string()])
            .await
            .unwrap();
        assert_eq!(by_codes.len(), 1);
        assert_eq!(by_codes[0].code, "CLIENT_B");
    }
}
