pub mod clients;
pub mod config;
pub mod counterparty;
pub mod error;
pub mod format;
pub mod logging;
pub mod provenance;
pub mod provider;
pub mod query;
pub mod server;
pub mod storage;

// Domain data shapes shared across layers
pub mod domain;
