// src/codec.rs
//! One-line text layout of a stored record: `[<timestamp>] [<label>] <secret>\n`.

use crate::models::{MatchPolicy, Record};

pub fn encode(record: &Record) -> String {
    format!("[{}] [{}] {}\n", record.timestamp, record.label, record.secret)
}

/// Splits a stored line back into its fields.
///
/// The label is everything between the second `[` and the last `] `, so a label
/// may itself contain brackets while the secret is a single word. Returns `None`
/// for lines not in record layout.
pub fn decode(line: &str) -> Option<Record> {
    let line = line.trim_end_matches(['\n', '\r']);
    let rest = line.strip_prefix('[')?;
    let (timestamp, rest) = rest.split_once("] [")?;
    let (label, secret) = rest.rsplit_once("] ")?;
    if label.is_empty() || secret.is_empty() || secret.contains(char::is_whitespace) {
        return None;
    }
    Some(Record {
        timestamp: timestamp.to_string(),
        label: label.to_string(),
        secret: secret.to_string(),
    })
}

/// Whether a stored line answers a label query under `policy`.
pub fn matches(line: &str, query: &str, policy: MatchPolicy) -> bool {
    match policy {
        MatchPolicy::Line => line.contains(query),
        MatchPolicy::Label => decode(line).map_or(false, |record| record.label.contains(query)),
    }
}
