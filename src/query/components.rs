use crate::domain::ComponentType;
use crate::error::Result;
use crate::storage::ComponentStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Expands a type code or type-group code into the underlying component
/// types and their path templates.
pub struct ComponentResolver {
    store: Arc<dyn ComponentStore>,
}

impl ComponentResolver {
    pub fn new(store: Arc<dyn ComponentStore>) -> Self {
        Self { store }
    }

    /// Looks `code` up as a group first, then as a direct type code.
    ///
    /// `None` means no such component exists at all; `Some(vec![])` can only
    /// come from a group none of whose members has a type record. Callers
    /// apply no component filter in either case — an unresolvable code
    /// disables the filter rather than forcing an empty result.
    pub async fn resolve(&self, code: &str) -> Result<Option<Vec<ComponentType>>> {
        if let Some(group) = self.store.find_group(code).await? {
            debug!("Expanding component group [{code}] into {:?}", group.members);
            let fetched = self.store.find_types_in(&group.members).await?;
            let mut by_code: HashMap<String, ComponentType> = fetched
                .into_iter()
                .map(|citype| (citype.code.clone(), citype))
                .collect();
            // The store returns members in its own order; re-impose the
            // group's declared order and skip members without a type record.
            let types: Vec<ComponentType> = group
                .members
                .iter()
                .filter_map(|member| by_code.remove(member))
                .collect();
            if types.is_empty() {
                warn!("No component types found for group [{code}]");
            }
            return Ok(Some(types));
        }

        debug!("No component group found for code [{code}], trying a direct type");
        match self.store.find_type(code).await? {
            Some(citype) => Ok(Some(vec![citype])),
            None => {
                warn!("No component types found for code [{code}]");
                Ok(None)
            }
        }
    }
}
