//! Azure Table Storage REST client.
//!
//! This crate provides:
//! - The `RowStore` trait the pipeline stages depend on
//! - A REST client with SharedKeyLite signing, retries and metrics
//! - Connection-string parsing
//! - Typed repositories for the tracking and insights tables

pub mod auth;
pub mod client;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod repos;
pub mod retry;
pub mod store;
pub mod types;


pub use client::{AzureTableClient, TableConfig};
pub use connection::ConnectionString;
pub use error::{TableError, TableResult};
pub use repos::{
    insight_row_key, sanitize_key, InsightsRepository, TrackerRepository, UpsertSummary,
};
pub use store::RowStore;
pub use types::{EntityQuery, TableEntity};
