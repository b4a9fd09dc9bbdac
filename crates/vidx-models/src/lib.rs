//! Shared data models for the video insights pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Raw insights documents and flattened insight records
//! - Upload tracking rows and their state
//! - Hierarchical blob paths
//! - Video Indexer artifact kinds

pub mod artifact;
pub mod blob;
pub mod insights;
pub mod tracker;

// Re-export common types
pub use artifact::ArtifactType;
pub use blob::{BlobPath, BlobPathError};
pub use insights::{InsightsDocument, NormalizedRecord};
pub use tracker::{TrackedVideo, VideoState};
