//! Lookup collaborators: categories, suppliers, clients, and match rules
//!
//! These are deliberately thin - list and create only, enough to supply
//! classification data to the review workflow.

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Category, Client, MatchRule, PatternType, Supplier};

impl Database {
    // ========== Categories ==========

    pub fn create_category(&self, name: &str) -> Result<Category> {
        let conn = self.conn()?;
        conn.execute("INSERT INTO categories (name) VALUES (?)", params![name])?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_category(id)?
            .ok_or_else(|| Error::NotFound(format!("Category {}", id)))
    }

    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let result = conn.query_row(
            "SELECT id, name, created_at FROM categories WHERE id = ?",
            params![id],
            |row| {
                let created_at_str: String = row.get(2)?;
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: parse_datetime(&created_at_str),
                })
            },
        );

        match result {
            Ok(category) => Ok(Some(category)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, created_at FROM categories ORDER BY name ASC")?;

        let categories = stmt
            .query_map([], |row| {
                let created_at_str: String = row.get(2)?;
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: parse_datetime(&created_at_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    // ========== Suppliers ==========

    pub fn create_supplier(&self, name: &str) -> Result<Supplier> {
        let conn = self.conn()?;
        conn.execute("INSERT INTO suppliers (name) VALUES (?)", params![name])?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_supplier(id)?
            .ok_or_else(|| Error::NotFound(format!("Supplier {}", id)))
    }

    pub fn get_supplier(&self, id: i64) -> Result<Option<Supplier>> {
        let conn = self.conn()?;
        let result = conn.query_row(
            "SELECT id, name, active, created_at FROM suppliers WHERE id = ?",
            params![id],
            |row| Self::map_supplier_row(row),
        );

        match result {
            Ok(supplier) => Ok(Some(supplier)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List active suppliers, name order
    pub fn list_suppliers(&self) -> Result<Vec<Supplier>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, active, created_at FROM suppliers WHERE active = 1 ORDER BY name ASC",
        )?;

        let suppliers = stmt
            .query_map([], |row| Self::map_supplier_row(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(suppliers)
    }

    fn map_supplier_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Supplier> {
        let created_at_str: String = row.get(3)?;
        Ok(Supplier {
            id: row.get(0)?,
            name: row.get(1)?,
            active: row.get(2)?,
            created_at: parse_datetime(&created_at_str),
        })
    }

    // ========== Clients ==========

    pub fn create_client(&self, name: &str) -> Result<Client> {
        let conn = self.conn()?;
        conn.execute("INSERT INTO clients (name) VALUES (?)", params![name])?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_client(id)?
            .ok_or_else(|| Error::NotFound(format!("Client {}", id)))
    }

    pub fn get_client(&self, id: i64) -> Result<Option<Client>> {
        let conn = self.conn()?;
        let result = conn.query_row(
            "SELECT id, name, active, created_at FROM clients WHERE id = ?",
            params![id],
            |row| Self::map_client_row(row),
        );

        match result {
            Ok(client) => Ok(Some(client)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List active clients, name order
    pub fn list_clients(&self) -> Result<Vec<Client>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, active, created_at FROM clients WHERE active = 1 ORDER BY name ASC",
        )?;

        let clients = stmt
            .query_map([], |row| Self::map_client_row(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(clients)
    }

    fn map_client_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Client> {
        let created_at_str: String = row.get(3)?;
        Ok(Client {
            id: row.get(0)?,
            name: row.get(1)?,
            active: row.get(2)?,
            created_at: parse_datetime(&created_at_str),
        })
    }

    // ========== Match Rules ==========

    /// List match rules, highest priority first
    pub fn list_match_rules(&self) -> Result<Vec<MatchRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, pattern, pattern_type, counterparty_id, category_id, priority, created_at
            FROM match_rules
            ORDER BY priority DESC, id ASC
            "#,
        )?;

        let rules = stmt
            .query_map([], |row| {
                let pattern_type_str: String = row.get(2)?;
                let created_at_str: String = row.get(6)?;
                Ok(MatchRule {
                    id: row.get(0)?,
                    pattern: row.get(1)?,
                    pattern_type: pattern_type_str.parse().unwrap_or(PatternType::Contains),
                    counterparty_id: row.get(3)?,
                    category_id: row.get(4)?,
                    priority: row.get(5)?,
                    created_at: parse_datetime(&created_at_str),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rules)
    }

    /// Insert or update the `contains` rule for a pattern
    ///
    /// Called by confirm to learn from the reviewer's classifications: the
    /// latest confirmed mapping for a pattern wins.
    pub fn upsert_match_rule(
        &self,
        pattern: &str,
        counterparty_id: i64,
        category_id: Option<i64>,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO match_rules (pattern, pattern_type, counterparty_id, category_id)
            VALUES (?, 'contains', ?, ?)
            ON CONFLICT(pattern) DO UPDATE SET
                counterparty_id = excluded.counterparty_id,
                category_id = excluded.category_id
            "#,
            params![pattern, counterparty_id, category_id],
        )?;
        Ok(())
    }
}
