//! CSV statement parser for the standard import template
//!
//! Template contract: header row `data,descricao,valor,tipo` (case
//! insensitive, `tipo` optional), `;` or `,` separator, dates as
//! `YYYY-MM-DD`, decimal comma accepted in `valor`.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde_json::{json, Value};
use tracing::debug;

use super::decode_text;
use crate::error::{Error, Result};
use crate::models::{LineDirection, ParsedLine};

/// Convert a CSV record to a JSON object using headers as keys
fn record_to_json(headers: &StringRecord, record: &StringRecord) -> String {
    let mut map = serde_json::Map::new();
    for (i, header) in headers.iter().enumerate() {
        if let Some(value) = record.get(i) {
            map.insert(header.to_string(), Value::String(value.to_string()));
        }
    }
    json!(map).to_string()
}

/// Parse CSV statement data into lines
pub fn parse(data: &[u8]) -> Result<Vec<ParsedLine>> {
    let text = decode_text(data);

    let first_line = text
        .lines()
        .next()
        .ok_or_else(|| Error::Parse("empty file".to_string()))?;

    // Separator auto-detection from the header line: `;` wins over `,`
    let delimiter = if first_line.contains(';') { b';' } else { b',' };

    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    let lower: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();

    let col = |name: &str| lower.iter().position(|h| h == name);
    let (date_col, desc_col, amount_col) = match (col("data"), col("descricao"), col("valor")) {
        (Some(d), Some(de), Some(v)) => (d, de, v),
        _ => {
            return Err(Error::Parse(
                "required columns not found; expected the standard template \
                 (data,descricao,valor,tipo)"
                    .to_string(),
            ))
        }
    };
    let tipo_col = col("tipo");

    let mut lines = Vec::new();

    for result in rdr.records() {
        let record = result?;

        let raw = Some(record_to_json(&headers, &record));

        let date_str = record
            .get(date_col)
            .ok_or_else(|| Error::Parse("missing date".to_string()))?;
        let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
            .map_err(|_| Error::Parse(format!("unable to parse date: {}", date_str)))?;

        let description = record
            .get(desc_col)
            .ok_or_else(|| Error::Parse("missing description".to_string()))?
            .trim()
            .to_string();

        let amount_str = record
            .get(amount_col)
            .ok_or_else(|| Error::Parse("missing amount".to_string()))?;
        let magnitude = amount_str
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| Error::Parse(format!("unable to parse amount: {}", amount_str)))?
            .abs();

        // Missing `tipo` column defaults every line to DEBIT
        let direction = match tipo_col.and_then(|c| record.get(c)) {
            Some(t) if t.trim().eq_ignore_ascii_case("CREDIT") => LineDirection::Credit,
            _ => LineDirection::Debit,
        };

        let amount = match direction {
            LineDirection::Debit => -magnitude,
            LineDirection::Credit => magnitude,
        };

        lines.push(ParsedLine {
            date,
            description,
            amount,
            direction,
            raw,
        });
    }

    debug!("Parsed {} CSV statement lines", lines.len());
    Ok(lines)
}
