//! Blob storage for source videos, indexer artifacts and insights documents.
//!
//! This crate provides:
//! - The `BlobStore` trait the pipeline stages depend on
//! - An S3-compatible implementation on the AWS SDK
//! - JSON put/get helpers over any store

pub mod client;
pub mod error;
pub mod operations;
pub mod store;

pub use client::{S3BlobStore, S3Config};
pub use error::{StorageError, StorageResult};
pub use operations::{get_json, put_json, JSON_CONTENT_TYPE};
pub use store::{BlobStore, ObjectInfo};
