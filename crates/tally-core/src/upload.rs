//! Statement upload pipeline
//!
//! One call takes raw file bytes all the way to a reviewable session:
//! validation, parsing, auto-classification, and atomic session creation.

use tracing::info;

use crate::classify;
use crate::db::Database;
use crate::error::Result;
use crate::models::ImportSessionWithItems;
use crate::statement;

/// Create a `pending_review` session from an uploaded statement file
///
/// Validation (extension, size) happens before any parsing; parse failures
/// leave no partial session behind because session and items are inserted
/// in one transaction.
pub fn upload_statement(
    db: &Database,
    file_name: &str,
    data: &[u8],
) -> Result<ImportSessionWithItems> {
    let kind = statement::validate_upload(file_name, data.len())?;
    let lines = statement::parse_statement(data, kind)?;
    let items = classify::build_items(db, &lines)?;

    info!(
        "Parsed {} as {}: {} lines, {} auto-classified",
        file_name,
        kind,
        items.len(),
        items.iter().filter(|i| i.counterparty_id.is_some()).count()
    );

    db.create_import_session(file_name, kind, &items)
}
