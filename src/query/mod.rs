//! Search parameter translation: normalize legacy keys, expand component
//! codes, and compile everything into one predicate set for the store.

pub mod builder;
pub mod components;
pub mod params;
pub mod predicate;

pub use builder::QueryBuilder;
pub use components::ComponentResolver;
pub use params::normalize_date_params;
pub use predicate::{Matcher, Predicate, PredicateSet};

pub(crate) use builder::parse_timezone;
