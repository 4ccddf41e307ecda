//! Domain models for Tally

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Statement file format discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileKind {
    Ofx,
    Csv,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ofx => "ofx",
            Self::Csv => "csv",
        }
    }

    /// Detect the file kind from a filename extension.
    ///
    /// Returns None for unrecognized extensions; QFX files are treated as OFX.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".ofx") || lower.ends_with(".qfx") {
            Some(Self::Ofx)
        } else if lower.ends_with(".csv") {
            Some(Self::Csv)
        } else {
            None
        }
    }
}

impl std::str::FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ofx" | "qfx" => Ok(Self::Ofx),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("Unknown file kind: {}", s)),
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Import session lifecycle status
///
/// `PendingReview` is the only editable state. `Completed` and `Cancelled`
/// are terminal: once either is reached, every further mutation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    #[default]
    PendingReview,
    Completed,
    Cancelled,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingReview => "pending_review",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether item edits and terminal transitions are still allowed
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::PendingReview)
    }
}

impl std::str::FromStr for ImportStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending_review" => Ok(Self::PendingReview),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown import status: {}", s)),
        }
    }
}

impl std::fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of a statement line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LineDirection {
    Credit,
    Debit,
}

impl LineDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }

    /// Direction implied by a signed amount (negative = debit)
    pub fn from_amount(amount: f64) -> Self {
        if amount < 0.0 {
            Self::Debit
        } else {
            Self::Credit
        }
    }
}

impl std::str::FromStr for LineDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            _ => Err(format!("Unknown line direction: {}", s)),
        }
    }
}

impl std::fmt::Display for LineDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which ledger a line item will become an entry in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LedgerType {
    Payable,
    Receivable,
}

impl LedgerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payable => "payable",
            Self::Receivable => "receivable",
        }
    }

    /// Default ledger for a line direction: debits become payables,
    /// credits become receivables.
    pub fn from_direction(direction: LineDirection) -> Self {
        match direction {
            LineDirection::Debit => Self::Payable,
            LineDirection::Credit => Self::Receivable,
        }
    }
}

impl std::str::FromStr for LedgerType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "payable" => Ok(Self::Payable),
            "receivable" => Ok(Self::Receivable),
            _ => Err(format!("Unknown ledger type: {}", s)),
        }
    }
}

impl std::fmt::Display for LedgerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An import session tracking one uploaded statement under review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSession {
    pub id: i64,
    pub file_name: String,
    pub file_kind: FileKind,
    pub status: ImportStatus,
    /// Fixed at creation; always equals the number of items
    pub total_records: i64,
    pub created_at: DateTime<Utc>,
}

/// An import session with its full item set, for review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSessionWithItems {
    #[serde(flatten)]
    pub session: ImportSession,
    pub items: Vec<LineItem>,
}

/// One parsed statement transaction awaiting classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i64,
    pub session_id: i64,
    pub date: NaiveDate,
    pub description: String,
    /// Negative = debit, positive = credit
    pub amount: f64,
    pub direction: LineDirection,
    pub ledger_type: LedgerType,
    /// Supplier id for payable lines, client id for receivable lines
    pub counterparty_id: Option<i64>,
    /// Resolved counterparty name, per the ledger type
    pub counterparty_name: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    /// Advisory flag from the duplicate heuristic; never blocks confirm
    pub possible_duplicate: bool,
    /// SHA-256 over date/description/amount
    pub fingerprint: String,
    /// Original statement record as JSON
    pub original_data: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LineItem {
    /// Whether this item has both references required by confirm
    pub fn is_classified(&self) -> bool {
        self.counterparty_id.is_some() && self.category_id.is_some()
    }
}

/// A line item as parsed from a statement file, before auto-classification
/// and DB insertion
#[derive(Debug, Clone)]
pub struct ParsedLine {
    pub date: NaiveDate,
    pub description: String,
    /// Negative = debit, positive = credit
    pub amount: f64,
    pub direction: LineDirection,
    /// Original statement record as JSON
    pub raw: Option<String>,
}

/// A line item ready for DB insertion, after auto-classification
#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub direction: LineDirection,
    pub ledger_type: LedgerType,
    pub counterparty_id: Option<i64>,
    pub category_id: Option<i64>,
    pub possible_duplicate: bool,
    pub fingerprint: String,
    pub original_data: Option<String>,
}

/// A partial classification update for one or more line items
///
/// `None` fields are left unchanged; this is a patch, not a replace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    pub counterparty_id: Option<i64>,
    pub category_id: Option<i64>,
    pub ledger_type: Option<LedgerType>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.counterparty_id.is_none() && self.category_id.is_none() && self.ledger_type.is_none()
    }
}

/// A spending/revenue category available for classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A supplier (counterparty for payable lines)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A client (counterparty for receivable lines)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Pattern matching type for auto-classification rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    /// Case-insensitive substring match
    Contains,
    /// Exact string match (case-insensitive)
    Exact,
    /// Regular expression match
    Regex,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Exact => "exact",
            Self::Regex => "regex",
        }
    }
}

impl std::str::FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contains" => Ok(Self::Contains),
            "exact" => Ok(Self::Exact),
            "regex" => Ok(Self::Regex),
            _ => Err(format!("Unknown pattern type: {}", s)),
        }
    }
}

/// A learned rule mapping statement descriptions to a counterparty and
/// category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRule {
    pub id: i64,
    pub pattern: String,
    pub pattern_type: PatternType,
    pub counterparty_id: i64,
    pub category_id: Option<i64>,
    /// Higher priority rules are checked first
    pub priority: i32,
    pub created_at: DateTime<Utc>,
}

/// A permanent ledger entry materialized from a confirmed line item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub entry_type: LedgerType,
    pub description: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub category_id: i64,
    pub supplier_id: Option<i64>,
    pub client_id: Option<i64>,
    /// Fingerprint of the source statement line, for duplicate detection
    pub fingerprint: String,
    /// Import session this entry came from
    pub session_id: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_filename() {
        assert_eq!(FileKind::from_filename("extrato.ofx"), Some(FileKind::Ofx));
        assert_eq!(FileKind::from_filename("EXTRATO.QFX"), Some(FileKind::Ofx));
        assert_eq!(FileKind::from_filename("lines.csv"), Some(FileKind::Csv));
        assert_eq!(FileKind::from_filename("report.pdf"), None);
        assert_eq!(FileKind::from_filename("noextension"), None);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ImportStatus::PendingReview,
            ImportStatus::Completed,
            ImportStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<ImportStatus>().unwrap(), status);
        }
        assert!(ImportStatus::PendingReview.is_editable());
        assert!(!ImportStatus::Completed.is_editable());
        assert!(!ImportStatus::Cancelled.is_editable());
    }

    #[test]
    fn test_ledger_type_from_direction() {
        assert_eq!(
            LedgerType::from_direction(LineDirection::Debit),
            LedgerType::Payable
        );
        assert_eq!(
            LedgerType::from_direction(LineDirection::Credit),
            LedgerType::Receivable
        );
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&ImportStatus::PendingReview).unwrap();
        assert_eq!(json, "\"PENDING_REVIEW\"");
        let back: ImportStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(back, ImportStatus::Cancelled);
    }
}
