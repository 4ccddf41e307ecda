//! HTTP request handlers organized by domain

pub mod imports;
pub mod lookups;

// Re-export all handlers for use in router
pub use imports::*;
pub use lookups::*;
