//! Classification resolver: read-only lookup data for review
//!
//! The review workflow never creates or mutates categories, suppliers, or
//! clients; it only needs their id-to-name mappings. The cache is loaded
//! once per review session load and tolerated as stale afterwards.

use std::collections::HashMap;

use crate::db::Database;
use crate::error::Result;
use crate::models::{Category, Client, LedgerType, Supplier};

/// Read-only source of classification lookup data
pub trait ClassificationResolver {
    fn list_categories(&self) -> Result<Vec<Category>>;
    fn list_suppliers(&self) -> Result<Vec<Supplier>>;
    fn list_clients(&self) -> Result<Vec<Client>>;
}

impl ClassificationResolver for Database {
    fn list_categories(&self) -> Result<Vec<Category>> {
        Database::list_categories(self)
    }

    fn list_suppliers(&self) -> Result<Vec<Supplier>> {
        Database::list_suppliers(self)
    }

    fn list_clients(&self) -> Result<Vec<Client>> {
        Database::list_clients(self)
    }
}

/// Id-to-name maps snapshotted from a resolver
#[derive(Debug, Default, Clone)]
pub struct ResolverCache {
    categories: HashMap<i64, String>,
    suppliers: HashMap<i64, String>,
    clients: HashMap<i64, String>,
}

impl ResolverCache {
    /// Snapshot the resolver's current lookup data
    pub fn load<R: ClassificationResolver + ?Sized>(resolver: &R) -> Result<Self> {
        Ok(Self {
            categories: resolver
                .list_categories()?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect(),
            suppliers: resolver
                .list_suppliers()?
                .into_iter()
                .map(|s| (s.id, s.name))
                .collect(),
            clients: resolver
                .list_clients()?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect(),
        })
    }

    pub fn category_name(&self, id: i64) -> Option<&str> {
        self.categories.get(&id).map(String::as_str)
    }

    pub fn supplier_name(&self, id: i64) -> Option<&str> {
        self.suppliers.get(&id).map(String::as_str)
    }

    pub fn client_name(&self, id: i64) -> Option<&str> {
        self.clients.get(&id).map(String::as_str)
    }

    /// Resolve a counterparty id per the item's ledger type
    pub fn counterparty_name(&self, ledger_type: LedgerType, id: i64) -> Option<&str> {
        match ledger_type {
            LedgerType::Payable => self.supplier_name(id),
            LedgerType::Receivable => self.client_name(id),
        }
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn counterparty_count(&self) -> usize {
        self.suppliers.len() + self.clients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct FixedResolver;

    impl ClassificationResolver for FixedResolver {
        fn list_categories(&self) -> Result<Vec<Category>> {
            Ok(vec![Category {
                id: 1,
                name: "Servicos".to_string(),
                created_at: Utc::now(),
            }])
        }

        fn list_suppliers(&self) -> Result<Vec<Supplier>> {
            Ok(vec![Supplier {
                id: 10,
                name: "Acme Ltda".to_string(),
                active: true,
                created_at: Utc::now(),
            }])
        }

        fn list_clients(&self) -> Result<Vec<Client>> {
            Ok(vec![Client {
                id: 20,
                name: "Beta SA".to_string(),
                active: true,
                created_at: Utc::now(),
            }])
        }
    }

    #[test]
    fn test_cache_resolves_names() {
        let cache = ResolverCache::load(&FixedResolver).unwrap();

        assert_eq!(cache.category_name(1), Some("Servicos"));
        assert_eq!(
            cache.counterparty_name(LedgerType::Payable, 10),
            Some("Acme Ltda")
        );
        assert_eq!(
            cache.counterparty_name(LedgerType::Receivable, 20),
            Some("Beta SA")
        );
        assert_eq!(cache.counterparty_name(LedgerType::Payable, 20), None);
        assert_eq!(cache.category_count(), 1);
        assert_eq!(cache.counterparty_count(), 2);
    }
}
