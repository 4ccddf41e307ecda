//! Ledger entry operations
//!
//! Entries exist only as the output of a confirmed import session. The
//! fingerprint column backs the possible-duplicate heuristic applied to
//! freshly parsed statement lines.

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{LedgerEntry, LedgerType, LineItem};

impl Database {
    /// Materialize one line item into a permanent ledger entry
    ///
    /// The single counterparty id is routed by the item's ledger type:
    /// suppliers back payables, clients back receivables.
    pub(crate) fn insert_ledger_entry_from_item(&self, item: &LineItem) -> Result<()> {
        let (supplier_id, client_id) = match item.ledger_type {
            LedgerType::Payable => (item.counterparty_id, None),
            LedgerType::Receivable => (None, item.counterparty_id),
        };

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO ledger_entries
                (entry_type, description, amount, due_date, category_id,
                 supplier_id, client_id, fingerprint, session_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                item.ledger_type.as_str(),
                item.description,
                item.amount,
                item.date.to_string(),
                item.category_id,
                supplier_id,
                client_id,
                item.fingerprint,
                item.session_id,
            ],
        )?;
        Ok(())
    }

    /// Whether a ledger entry with this content fingerprint already exists
    pub fn ledger_entry_exists(&self, fingerprint: &str) -> Result<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM ledger_entries WHERE fingerprint = ?",
            params![fingerprint],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List ledger entries for an import session, insertion order
    pub fn list_ledger_entries_for_session(&self, session_id: i64) -> Result<Vec<LedgerEntry>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, entry_type, description, amount, due_date, category_id,
                   supplier_id, client_id, fingerprint, session_id, created_at
            FROM ledger_entries
            WHERE session_id = ?
            ORDER BY id ASC
            "#,
        )?;

        let entries = stmt
            .query_map(params![session_id], |row| {
                let entry_type_str: String = row.get(1)?;
                let due_date_str: String = row.get(4)?;
                let created_at_str: String = row.get(10)?;

                Ok(LedgerEntry {
                    id: row.get(0)?,
                    entry_type: entry_type_str.parse().unwrap_or(LedgerType::Payable),
                    description: row.get(2)?,
                    amount: row.get(3)?,
                    due_date: chrono::NaiveDate::parse_from_str(&due_date_str, "%Y-%m-%d")
                        .unwrap_or_else(|_| chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
                    category_id: row.get(5)?,
                    supplier_id: row.get(6)?,
                    client_id: row.get(7)?,
                    fingerprint: row.get(8)?,
                    session_id: row.get(9)?,
                    created_at: parse_datetime(&created_at_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}
