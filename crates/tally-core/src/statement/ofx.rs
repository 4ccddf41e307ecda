//! OFX/QFX statement parser
//!
//! Handles both the SGML flavor (OFX 1.x, no closing tags) and the XML
//! flavor (OFX 2.x). Only `<STMTTRN>` aggregates are read; everything else
//! in the envelope is ignored.

use chrono::NaiveDate;
use serde_json::json;
use tracing::debug;

use super::decode_text;
use crate::error::{Error, Result};
use crate::models::{LineDirection, ParsedLine};

/// Parse OFX statement data into lines
pub fn parse(data: &[u8]) -> Result<Vec<ParsedLine>> {
    let text = decode_text(data);

    let blocks = transaction_blocks(&text);
    if blocks.is_empty() {
        return Err(Error::Parse(
            "OFX file contains no bank transactions".to_string(),
        ));
    }

    let mut lines = Vec::new();

    for block in blocks {
        // Amount-less aggregates are skipped rather than failing the file
        let amount_str = match tag_value(block, "TRNAMT") {
            Some(v) => v,
            None => continue,
        };
        let amount = amount_str
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| Error::Parse(format!("unable to parse TRNAMT: {}", amount_str)))?;

        let date_str = tag_value(block, "DTPOSTED")
            .ok_or_else(|| Error::Parse("transaction missing DTPOSTED".to_string()))?;
        let date = parse_ofx_date(&date_str)?;

        // MEMO preferred; NAME as fallback
        let description = match tag_value(block, "MEMO").or_else(|| tag_value(block, "NAME")) {
            Some(d) if !d.is_empty() => d,
            _ => continue,
        };

        let fitid = tag_value(block, "FITID").unwrap_or_default();
        let raw = Some(json!({ "fitid": fitid, "memo": description }).to_string());

        let direction = LineDirection::from_amount(amount);

        lines.push(ParsedLine {
            date,
            description,
            amount,
            direction,
            raw,
        });
    }

    debug!("Parsed {} OFX statement lines", lines.len());
    Ok(lines)
}

/// Slice the raw text into one segment per `<STMTTRN>` aggregate
///
/// SGML files have no `</STMTTRN>`; a block then runs until the next
/// `<STMTTRN>`, the end of the transaction list, or end of input.
fn transaction_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("<STMTTRN>") {
        let body = &rest[start + "<STMTTRN>".len()..];
        let end = body
            .find("</STMTTRN>")
            .or_else(|| body.find("<STMTTRN>"))
            .or_else(|| body.find("</BANKTRANLIST>"))
            .unwrap_or(body.len());
        blocks.push(&body[..end]);
        rest = &body[end..];
    }

    blocks
}

/// Extract the value of an OFX element from a block
///
/// Values run from the opening tag to the next `<` or end of line,
/// covering both SGML and XML styles.
fn tag_value(block: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let start = block.find(&open)? + open.len();
    let rest = &block[start..];
    let end = rest
        .find(&['<', '\r', '\n'][..])
        .unwrap_or(rest.len());
    let value = rest[..end].trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse an OFX datetime (`YYYYMMDD` with optional time and zone suffix)
fn parse_ofx_date(s: &str) -> Result<NaiveDate> {
    if s.len() < 8 {
        return Err(Error::Parse(format!("unable to parse DTPOSTED: {}", s)));
    }
    NaiveDate::parse_from_str(&s[..8], "%Y%m%d")
        .map_err(|_| Error::Parse(format!("unable to parse DTPOSTED: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SGML_SAMPLE: &str = "OFXHEADER:100\r\nDATA:OFXSGML\r\n\r\n<OFX>\r\n<BANKMSGSRSV1>\r\n<STMTTRNRS>\r\n<STMTRS>\r\n<BANKTRANLIST>\r\n<STMTTRN>\r\n<TRNTYPE>DEBIT\r\n<DTPOSTED>20260115120000[-3:BRT]\r\n<TRNAMT>-150.25\r\n<FITID>2026011501\r\n<MEMO>PAG BOLETO ACME LTDA\r\n<STMTTRN>\r\n<TRNTYPE>CREDIT\r\n<DTPOSTED>20260116\r\n<TRNAMT>980.00\r\n<FITID>2026011602\r\n<NAME>TED RECEBIDA BETA SA\r\n</BANKTRANLIST>\r\n</STMTRS>\r\n</STMTTRNRS>\r\n</BANKMSGSRSV1>\r\n</OFX>\r\n";

    #[test]
    fn test_parse_sgml_statement() {
        let lines = parse(SGML_SAMPLE.as_bytes()).unwrap();
        assert_eq!(lines.len(), 2);

        assert_eq!(lines[0].date, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        assert_eq!(lines[0].description, "PAG BOLETO ACME LTDA");
        assert_eq!(lines[0].amount, -150.25);
        assert_eq!(lines[0].direction, LineDirection::Debit);

        // NAME is used when MEMO is absent
        assert_eq!(lines[1].description, "TED RECEBIDA BETA SA");
        assert_eq!(lines[1].amount, 980.00);
        assert_eq!(lines[1].direction, LineDirection::Credit);
    }

    #[test]
    fn test_parse_xml_statement() {
        let xml = "<?xml version=\"1.0\"?><OFX><BANKTRANLIST>\
                   <STMTTRN><TRNTYPE>DEBIT</TRNTYPE><DTPOSTED>20260201</DTPOSTED>\
                   <TRNAMT>-42.00</TRNAMT><FITID>abc</FITID>\
                   <MEMO>TARIFA MENSALIDADE</MEMO></STMTTRN>\
                   </BANKTRANLIST></OFX>";

        let lines = parse(xml.as_bytes()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].description, "TARIFA MENSALIDADE");
        assert_eq!(lines[0].amount, -42.00);
    }

    #[test]
    fn test_parse_no_transactions_is_error() {
        let err = parse(b"<OFX><SIGNONMSGSRSV1></SIGNONMSGSRSV1></OFX>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_amountless_blocks_are_skipped() {
        let ofx = "<OFX><BANKTRANLIST>\
                   <STMTTRN><TRNTYPE>OTHER</TRNTYPE><DTPOSTED>20260201</DTPOSTED></STMTTRN>\
                   <STMTTRN><DTPOSTED>20260202</DTPOSTED><TRNAMT>10.00</TRNAMT>\
                   <MEMO>DEPOSITO</MEMO></STMTTRN>\
                   </BANKTRANLIST></OFX>";

        let lines = parse(ofx.as_bytes()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].description, "DEPOSITO");
    }

    #[test]
    fn test_fitid_captured_in_raw_data() {
        let lines = parse(SGML_SAMPLE.as_bytes()).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(lines[0].raw.as_deref().unwrap()).unwrap();
        assert_eq!(raw["fitid"], "2026011501");
    }

    #[test]
    fn test_decimal_comma_amount() {
        let ofx = "<OFX><BANKTRANLIST><STMTTRN><DTPOSTED>20260201</DTPOSTED>\
                   <TRNAMT>-1234,56</TRNAMT><MEMO>PGTO</MEMO></STMTTRN></BANKTRANLIST></OFX>";
        let lines = parse(ofx.as_bytes()).unwrap();
        assert_eq!(lines[0].amount, -1234.56);
    }
}
