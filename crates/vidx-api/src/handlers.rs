//! Request handlers.

pub mod health;
pub mod insights;
pub mod videos;

pub use health::*;
pub use insights::*;
pub use videos::*;
