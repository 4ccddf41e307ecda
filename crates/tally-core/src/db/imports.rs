//! Import session and line item operations (the session store)
//!
//! Sessions are created atomically with their full item set and mutated
//! only while `pending_review`, exclusively through item classification
//! patches. Confirm and cancel are one-way transitions; re-invoking either
//! on a terminal session fails with `SessionNotEditable`.

use rusqlite::params;
use tracing::{debug, info};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    FileKind, ImportSession, ImportSessionWithItems, ImportStatus, ItemPatch, LineItem,
    NewLineItem,
};

/// Item columns with counterparty/category names resolved. The single
/// counterparty id points at a supplier for payable lines and a client for
/// receivable lines, so the join is keyed on the ledger type.
const ITEM_SELECT: &str = r#"
    SELECT i.id, i.session_id, i.date, i.description, i.amount, i.direction,
           i.ledger_type, i.counterparty_id,
           COALESCE(s.name, c.name) AS counterparty_name,
           i.category_id, cat.name AS category_name,
           i.possible_duplicate, i.fingerprint, i.original_data, i.created_at
    FROM import_items i
    LEFT JOIN suppliers s ON s.id = i.counterparty_id AND i.ledger_type = 'payable'
    LEFT JOIN clients c ON c.id = i.counterparty_id AND i.ledger_type = 'receivable'
    LEFT JOIN categories cat ON cat.id = i.category_id
"#;

impl Database {
    /// Create a session with its full item set in one transaction
    ///
    /// `total_records` is fixed here and never changes afterwards.
    pub fn create_import_session(
        &self,
        file_name: &str,
        file_kind: FileKind,
        items: &[NewLineItem],
    ) -> Result<ImportSessionWithItems> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO import_sessions (file_name, file_kind, status, total_records)
            VALUES (?, ?, ?, ?)
            "#,
            params![
                file_name,
                file_kind.as_str(),
                ImportStatus::PendingReview.as_str(),
                items.len() as i64,
            ],
        )?;
        let session_id = tx.last_insert_rowid();

        for (position, item) in items.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO import_items
                    (session_id, position, date, description, amount, direction,
                     ledger_type, counterparty_id, category_id, possible_duplicate,
                     fingerprint, original_data)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                params![
                    session_id,
                    position as i64,
                    item.date.to_string(),
                    item.description,
                    item.amount,
                    item.direction.as_str(),
                    item.ledger_type.as_str(),
                    item.counterparty_id,
                    item.category_id,
                    item.possible_duplicate,
                    item.fingerprint,
                    item.original_data,
                ],
            )?;
        }

        tx.commit()?;

        info!(
            "Created import session {} from '{}' with {} items",
            session_id,
            file_name,
            items.len()
        );

        self.get_import_session(session_id)?
            .ok_or_else(|| Error::NotFound(format!("Import session {}", session_id)))
    }

    /// Get a session row without its items
    pub fn get_import_session_row(&self, id: i64) -> Result<Option<ImportSession>> {
        let conn = self.conn()?;

        let result = conn.query_row(
            r#"
            SELECT id, file_name, file_kind, status, total_records, created_at
            FROM import_sessions
            WHERE id = ?
            "#,
            params![id],
            |row| Self::map_session_row(row),
        );

        match result {
            Ok(session) => Ok(Some(session)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a session with its full item set, in stable display order
    pub fn get_import_session(&self, id: i64) -> Result<Option<ImportSessionWithItems>> {
        let session = match self.get_import_session_row(id)? {
            Some(s) => s,
            None => return Ok(None),
        };

        let conn = self.conn()?;
        let sql = format!("{} WHERE i.session_id = ? ORDER BY i.position ASC", ITEM_SELECT);
        let mut stmt = conn.prepare(&sql)?;

        let items = stmt
            .query_map(params![id], |row| Self::map_item_row(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Some(ImportSessionWithItems { session, items }))
    }

    /// List session summaries, newest first
    pub fn list_import_sessions(&self) -> Result<Vec<ImportSession>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, file_name, file_kind, status, total_records, created_at
            FROM import_sessions
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let sessions = stmt
            .query_map([], |row| Self::map_session_row(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    /// Get a single line item with resolved names
    pub fn get_import_item(&self, session_id: i64, item_id: i64) -> Result<Option<LineItem>> {
        let conn = self.conn()?;
        let sql = format!("{} WHERE i.id = ? AND i.session_id = ?", ITEM_SELECT);

        let result = conn.query_row(&sql, params![item_id, session_id], |row| {
            Self::map_item_row(row)
        });

        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply a classification patch to a single item
    ///
    /// Fails with `SessionNotEditable` when the session is terminal and
    /// `NotFound` for unknown session or item ids. `None` patch fields are
    /// left unchanged.
    pub fn update_import_item(
        &self,
        session_id: i64,
        item_id: i64,
        patch: &ItemPatch,
    ) -> Result<LineItem> {
        self.assert_editable(session_id)?;

        let item = self
            .get_import_item(session_id, item_id)?
            .ok_or_else(|| Error::NotFound(format!("Import item {}", item_id)))?;

        self.apply_item_patch(&item, patch)?;

        self.get_import_item(session_id, item_id)?
            .ok_or_else(|| Error::NotFound(format!("Import item {}", item_id)))
    }

    /// Apply one patch uniformly to every listed item
    ///
    /// The editability check is up front, so a terminal session fails the
    /// whole batch. Unknown item ids are silently skipped: the response
    /// carries one entry per id that was actually found and updated.
    pub fn update_import_items_batch(
        &self,
        session_id: i64,
        item_ids: &[i64],
        patch: &ItemPatch,
    ) -> Result<Vec<LineItem>> {
        self.assert_editable(session_id)?;

        let mut updated = Vec::new();
        for &item_id in item_ids {
            let item = match self.get_import_item(session_id, item_id)? {
                Some(item) => item,
                None => {
                    debug!(
                        "Batch update skipping unknown item {} in session {}",
                        item_id, session_id
                    );
                    continue;
                }
            };

            self.apply_item_patch(&item, patch)?;
            if let Some(fresh) = self.get_import_item(session_id, item_id)? {
                updated.push(fresh);
            }
        }

        Ok(updated)
    }

    /// Confirm a session: materialize every item into a ledger entry
    ///
    /// Every item must have both a counterparty and a category; otherwise
    /// the whole operation fails with `IncompleteClassification` and the
    /// session stays reviewable. On success the session is `completed` and
    /// a match rule is learned from each item's description.
    pub fn confirm_import(&self, session_id: i64) -> Result<()> {
        self.assert_editable(session_id)?;

        let session = self
            .get_import_session(session_id)?
            .ok_or_else(|| Error::NotFound(format!("Import session {}", session_id)))?;

        let incomplete = session
            .items
            .iter()
            .filter(|i| !i.is_classified())
            .count() as i64;
        if incomplete > 0 {
            return Err(Error::IncompleteClassification(incomplete));
        }

        for item in &session.items {
            self.insert_ledger_entry_from_item(item)?;

            // Learn a rule from this classification for future uploads
            let pattern = normalize_pattern(&item.description);
            if !pattern.is_empty() {
                if let (Some(counterparty_id), category_id) =
                    (item.counterparty_id, item.category_id)
                {
                    self.upsert_match_rule(&pattern, counterparty_id, category_id)?;
                }
            }
        }

        self.set_session_status(session_id, ImportStatus::Completed)?;

        info!(
            "Confirmed import session {}: {} ledger entries created",
            session_id, session.session.total_records
        );
        Ok(())
    }

    /// Cancel a session without creating ledger entries
    ///
    /// Items are kept so the record count invariant holds for terminal
    /// sessions too; only the status changes.
    pub fn cancel_import(&self, session_id: i64) -> Result<()> {
        self.assert_editable(session_id)?;
        self.set_session_status(session_id, ImportStatus::Cancelled)?;

        info!("Cancelled import session {}", session_id);
        Ok(())
    }

    /// Fail unless the session exists and is still `pending_review`
    fn assert_editable(&self, session_id: i64) -> Result<()> {
        let session = self
            .get_import_session_row(session_id)?
            .ok_or_else(|| Error::NotFound(format!("Import session {}", session_id)))?;

        if !session.status.is_editable() {
            return Err(Error::SessionNotEditable);
        }
        Ok(())
    }

    fn set_session_status(&self, session_id: i64, status: ImportStatus) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE import_sessions SET status = ? WHERE id = ?",
            params![status.as_str(), session_id],
        )?;
        Ok(())
    }

    /// Write the merged patch values back to one item
    fn apply_item_patch(&self, item: &LineItem, patch: &ItemPatch) -> Result<()> {
        let counterparty = patch.counterparty_id.or(item.counterparty_id);
        let category = patch.category_id.or(item.category_id);
        let ledger_type = patch.ledger_type.unwrap_or(item.ledger_type);

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE import_items
            SET counterparty_id = ?, category_id = ?, ledger_type = ?
            WHERE id = ?
            "#,
            params![counterparty, category, ledger_type.as_str(), item.id],
        )?;
        Ok(())
    }

    fn map_session_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ImportSession> {
        let kind_str: String = row.get(2)?;
        let status_str: String = row.get(3)?;
        let created_at_str: String = row.get(5)?;

        Ok(ImportSession {
            id: row.get(0)?,
            file_name: row.get(1)?,
            file_kind: kind_str.parse().unwrap_or(FileKind::Csv),
            status: status_str.parse().unwrap_or_default(),
            total_records: row.get(4)?,
            created_at: parse_datetime(&created_at_str),
        })
    }

    fn map_item_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LineItem> {
        let date_str: String = row.get(2)?;
        let direction_str: String = row.get(5)?;
        let ledger_str: String = row.get(6)?;
        let created_at_str: String = row.get(14)?;

        Ok(LineItem {
            id: row.get(0)?,
            session_id: row.get(1)?,
            date: chrono::NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .unwrap_or_else(|_| chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
            description: row.get(3)?,
            amount: row.get(4)?,
            direction: direction_str
                .parse()
                .unwrap_or(crate::models::LineDirection::Debit),
            ledger_type: ledger_str
                .parse()
                .unwrap_or(crate::models::LedgerType::Payable),
            counterparty_id: row.get(7)?,
            counterparty_name: row.get(8)?,
            category_id: row.get(9)?,
            category_name: row.get(10)?,
            possible_duplicate: row.get(11)?,
            fingerprint: row.get(12)?,
            original_data: row.get(13)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}

/// Normalize a description into a learnable rule pattern: the first three
/// words, lowercased
pub(crate) fn normalize_pattern(description: &str) -> String {
    description
        .split_whitespace()
        .take(3)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pattern() {
        assert_eq!(
            normalize_pattern("PAG BOLETO ACME LTDA FILIAL 3"),
            "pag boleto acme"
        );
        assert_eq!(normalize_pattern("PIX"), "pix");
        assert_eq!(normalize_pattern("   "), "");
    }
}
