//! Tally Core Library
//!
//! Shared functionality for the Tally bank-statement import service:
//! - Database access and migrations
//! - Statement parsers (OFX/QFX and the CSV import template)
//! - Upload pipeline with best-effort auto-classification
//! - Review controller for interactive session review
//! - Classification resolver for lookup data

pub mod classify;
pub mod db;
pub mod error;
pub mod models;
pub mod resolver;
pub mod review;
pub mod statement;
pub mod upload;

pub use classify::AutoClassifier;
pub use db::Database;
pub use error::{Error, Result};
pub use resolver::{ClassificationResolver, ResolverCache};
pub use review::{ReviewController, SessionStore, PAGE_SIZE};
pub use statement::MAX_STATEMENT_SIZE;
pub use upload::upload_statement;
