//! Storage ports and the in-memory implementation.

pub mod in_memory;
pub mod traits;

pub use in_memory::InMemoryStore;
pub use traits::{ClientStore, ComponentStore, DeliveryStore, LocationRegistry};
