//! Resource parsing
//!
//! Quote resources are UTF-8 text, one record per line:
//!
//! ```text
//! 09:15|=|9:15 AM|=|It is 9:15 AM and the work continues.|=|Daily Notes|=|J. Smith
//! ```
//!
//! Fields: time key, time display, quote text, source, author. There is no
//! escaping for the delimiter. Lines that do not split into exactly five fields
//! are dropped without error.
//!
//! Message resources are a flat JSON object of string keys to string values.

use std::collections::HashMap;

use crate::fragment::fragment;
use crate::interface::QuoteRecord;
use crate::models::{MessageTable, QuoteDataset};

/// Field separator within a quote line
pub const FIELD_DELIMITER: &str = "|=|";

/// Parse a quote resource into a dataset keyed by time key.
/// Never fails: malformed lines are simply absent from the result.
pub fn parse_quotes(raw: &str) -> QuoteDataset {
    let mut dataset = QuoteDataset::new();
    let mut dropped = 0usize;

    for line in raw.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some((key, record)) => dataset.insert(key, record),
            None => dropped += 1,
        }
    }

    tracing::debug!(
        keys = dataset.len(),
        records = dataset.record_count(),
        dropped,
        "parsed quote resource"
    );
    dataset
}

fn parse_line(line: &str) -> Option<(&str, QuoteRecord)> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    let [key, time_display, quote, source, author] = fields.as_slice() else {
        return None;
    };

    Some((
        *key,
        QuoteRecord {
            time_display: time_display.to_string(),
            fragments: fragment(quote, time_display),
            source: source.to_string(),
            author: author.to_string(),
        },
    ))
}

/// Parse a messages resource. Anything other than a flat object of strings
/// yields an empty table.
pub fn parse_messages(raw: &str) -> MessageTable {
    match serde_json::from_str::<HashMap<String, String>>(raw) {
        Ok(entries) => {
            tracing::debug!(entries = entries.len(), "parsed messages resource");
            MessageTable::from(entries)
        }
        Err(e) => {
            tracing::debug!(error = %e, "messages resource is not a flat string map, using empty table");
            MessageTable::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::TextFragment::{Bold, Normal};

    #[test]
    fn test_empty_input() {
        assert!(parse_quotes("").is_empty());
        assert!(parse_quotes("\n\n\r\n").is_empty());
    }

    #[test]
    fn test_malformed_line_is_dropped() {
        assert!(parse_quotes("this is a malformed line").is_empty());
    }

    #[test]
    fn test_wrong_field_counts_are_dropped() {
        let raw = "00:01|=|a|=|b|=|c\n00:02|=|a|=|b|=|c|=|d|=|e";
        assert!(parse_quotes(raw).is_empty());
    }

    #[test]
    fn test_well_formed_line() {
        let dataset =
            parse_quotes("00:02|=|00:02 AM|=|The time is 00:02 AM.|=|The Clock|=|The Author");
        let records = dataset.get("00:02").expect("key should be present");
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.time_display, "00:02 AM");
        assert_eq!(
            record.fragments,
            vec![
                Normal("The time is ".to_string()),
                Bold("00:02 AM".to_string()),
                Normal(".".to_string()),
            ]
        );
        assert_eq!(record.source, "The Clock");
        assert_eq!(record.author, "The Author");
    }

    #[test]
    fn test_shared_key_keeps_both_records() {
        let raw = "\
09:15|=|9:15 AM|=|It is 9:15 AM and the work continues.|=|Daily Notes|=|J. Smith
09:15|=|quarter past nine|=|At quarter past nine the bells rang.|=|Bells|=|A. Writer";
        let dataset = parse_quotes(raw);
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.get("09:15").map(|r| r.len()), Some(2));
    }

    #[test]
    fn test_mixed_valid_and_invalid_lines() {
        let raw = "\
garbage
10:00|=|ten o'clock|=|Ten o'clock struck.|=|Tower|=|B. Author

10:01|=|only|=|three
";
        let dataset = parse_quotes(raw);
        assert_eq!(dataset.record_count(), 1);
        assert!(dataset.contains_key("10:00"));
        assert!(!dataset.contains_key("10:01"));
    }

    #[test]
    fn test_crlf_line_endings() {
        let raw = "10:00|=|10:00|=|At 10:00 we met.|=|S|=|A\r\n10:01|=|10:01|=|At 10:01 we left.|=|S|=|A\r\n";
        let dataset = parse_quotes(raw);
        assert_eq!(dataset.record_count(), 2);
        assert_eq!(dataset.get("10:01").unwrap()[0].author, "A");
    }

    #[test]
    fn test_empty_fields_are_kept() {
        let dataset = parse_quotes("11:11|=||=|A wish.|=||=|");
        let record = &dataset.get("11:11").unwrap()[0];
        assert_eq!(record.fragments, vec![Normal("A wish.".to_string())]);
        assert!(record.source.is_empty());
        assert!(record.author.is_empty());
    }

    #[test]
    fn test_time_display_missing_from_quote() {
        let dataset = parse_quotes("12:00|=|noon|=|The sun was high.|=|S|=|A");
        assert_eq!(
            dataset.get("12:00").unwrap()[0].fragments,
            vec![Normal("The sun was high.".to_string())]
        );
    }

    #[test]
    fn test_parse_messages() {
        let table = parse_messages(r#"{"QUOTE_LOADING": "Carregando...", "NO_QUOTE_FOUND": "Nada"}"#);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("QUOTE_LOADING"), Some("Carregando..."));
    }

    #[test]
    fn test_parse_messages_invalid_json() {
        assert!(parse_messages("{not json").is_empty());
        assert!(parse_messages("").is_empty());
    }

    #[test]
    fn test_parse_messages_wrong_shape() {
        assert!(parse_messages(r#"["QUOTE_LOADING"]"#).is_empty());
        assert!(parse_messages(r#""just a string""#).is_empty());
        assert!(parse_messages(r#"{"QUOTE_LOADING": 3}"#).is_empty());
        assert!(parse_messages(r#"{"nested": {"a": "b"}}"#).is_empty());
    }
}
