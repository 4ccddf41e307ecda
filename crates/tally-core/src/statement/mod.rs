//! Bank statement parsers
//!
//! Uploads are validated (extension, size) before any parsing. Two formats
//! are supported: OFX/QFX statements and CSV files following the standard
//! template (`data,descricao,valor,tipo`).

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::models::{FileKind, ParsedLine};

pub mod csv;
pub mod ofx;

/// Maximum accepted statement file size (5 MB)
pub const MAX_STATEMENT_SIZE: usize = 5 * 1024 * 1024;

/// Validate an upload before any parsing work.
///
/// Rejects unrecognized extensions and oversized files; returns the
/// detected file kind otherwise.
pub fn validate_upload(file_name: &str, size: usize) -> Result<FileKind> {
    let kind = FileKind::from_filename(file_name)
        .ok_or_else(|| Error::UnsupportedFormat(file_name.to_string()))?;

    if size > MAX_STATEMENT_SIZE {
        return Err(Error::FileTooLarge {
            size,
            limit: MAX_STATEMENT_SIZE,
        });
    }

    Ok(kind)
}

/// Parse statement data into lines
///
/// An upload that parses to zero transactions is an error: there is
/// nothing to review.
pub fn parse_statement(data: &[u8], kind: FileKind) -> Result<Vec<ParsedLine>> {
    let lines = match kind {
        FileKind::Ofx => ofx::parse(data)?,
        FileKind::Csv => csv::parse(data)?,
    };

    if lines.is_empty() {
        return Err(Error::Parse("no transactions found in file".to_string()));
    }

    Ok(lines)
}

/// Decode statement bytes as UTF-8, falling back to Latin-1
///
/// Bank exports are frequently ISO-8859-1; Latin-1 decoding cannot fail
/// since every byte maps to a scalar value.
pub(crate) fn decode_text(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(s) => s.to_string(),
        Err(_) => data.iter().map(|&b| b as char).collect(),
    }
}

/// Content fingerprint for duplicate detection
pub fn fingerprint(date: &NaiveDate, description: &str, amount: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(date.to_string().as_bytes());
    hasher.update(description.as_bytes());
    hasher.update(amount.to_be_bytes());
    hex::encode(hasher.finalize())
}
