//! Best-effort auto-classification of freshly parsed statement lines
//!
//! Runs once at upload time. Match rules are tried first (highest priority
//! wins); when none fires, the description is scanned for an active
//! supplier or client name. Either way the result is only a suggestion:
//! every field stays editable during review.

use regex::RegexBuilder;
use tracing::{debug, warn};

use crate::db::Database;
use crate::error::Result;
use crate::models::{
    Client, LedgerType, MatchRule, NewLineItem, ParsedLine, PatternType, Supplier,
};
use crate::statement::fingerprint;

/// Upload-time classifier with rules and lookup names loaded once
pub struct AutoClassifier {
    rules: Vec<MatchRule>,
    suppliers: Vec<Supplier>,
    clients: Vec<Client>,
}

impl AutoClassifier {
    /// Load rules and active counterparty names from the database
    pub fn load(db: &Database) -> Result<Self> {
        Ok(Self {
            rules: db.list_match_rules()?,
            suppliers: db.list_suppliers()?,
            clients: db.list_clients()?,
        })
    }

    /// Suggest a counterparty and category for a description
    ///
    /// Returns `(counterparty_id, category_id)`; both may be `None`.
    pub fn classify(
        &self,
        description: &str,
        ledger_type: LedgerType,
    ) -> (Option<i64>, Option<i64>) {
        let desc_lower = description.to_lowercase();

        for rule in &self.rules {
            if rule_matches(rule, &desc_lower) {
                debug!("Rule '{}' matched '{}'", rule.pattern, description);
                return (Some(rule.counterparty_id), rule.category_id);
            }
        }

        // Fallback: the statement description often carries the counterparty
        // name verbatim
        let by_name = match ledger_type {
            LedgerType::Payable => self
                .suppliers
                .iter()
                .find(|s| desc_lower.contains(&s.name.to_lowercase()))
                .map(|s| s.id),
            LedgerType::Receivable => self
                .clients
                .iter()
                .find(|c| desc_lower.contains(&c.name.to_lowercase()))
                .map(|c| c.id),
        };

        (by_name, None)
    }
}

/// Check one rule against a lowercased description
fn rule_matches(rule: &MatchRule, desc_lower: &str) -> bool {
    match rule.pattern_type {
        PatternType::Contains => desc_lower.contains(&rule.pattern.to_lowercase()),
        PatternType::Exact => desc_lower == rule.pattern.to_lowercase(),
        PatternType::Regex => match RegexBuilder::new(&rule.pattern)
            .case_insensitive(true)
            .build()
        {
            Ok(re) => re.is_match(desc_lower),
            Err(e) => {
                warn!("Skipping invalid regex rule '{}': {}", rule.pattern, e);
                false
            }
        },
    }
}

/// Turn parsed lines into insertable items: default the ledger type from
/// the direction, fingerprint each line, flag possible duplicates against
/// existing ledger entries, and apply auto-classification.
pub fn build_items(db: &Database, lines: &[ParsedLine]) -> Result<Vec<NewLineItem>> {
    let classifier = AutoClassifier::load(db)?;
    let mut items = Vec::with_capacity(lines.len());

    for line in lines {
        let ledger_type = LedgerType::from_direction(line.direction);
        let fingerprint = fingerprint(&line.date, &line.description, line.amount);
        let possible_duplicate = db.ledger_entry_exists(&fingerprint)?;
        let (counterparty_id, category_id) = classifier.classify(&line.description, ledger_type);

        items.push(NewLineItem {
            date: line.date,
            description: line.description.clone(),
            amount: line.amount,
            direction: line.direction,
            ledger_type,
            counterparty_id,
            category_id,
            possible_duplicate,
            fingerprint,
            original_data: line.raw.clone(),
        });
    }

    Ok(items)
}
