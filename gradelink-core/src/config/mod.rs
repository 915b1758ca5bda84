//! Configuration types
//!
//! Board-agnostic settings stored as postcard binary data.

#[cfg(feature = "serde")]
pub mod persist;
pub mod settings;

pub use settings::*;
