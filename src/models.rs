// src/models.rs
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Timestamp layout written in front of every stored record.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One saved credential. Occupies exactly one line of the store file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub timestamp: String,
    pub label: String,
    pub secret: String,
}

impl Record {
    /// Builds a record, rejecting values that would break the one-line layout.
    pub fn new(timestamp: impl Into<String>, label: impl Into<String>, secret: impl Into<String>) -> StoreResult<Self> {
        let record = Record {
            timestamp: timestamp.into(),
            label: label.into(),
            secret: secret.into(),
        };
        record.validate()?;
        Ok(record)
    }

    fn validate(&self) -> StoreResult<()> {
        if self.label.is_empty() {
            return Err(StoreError::InvalidRecord("label cannot be empty".to_string()));
        }
        if self.secret.is_empty() {
            return Err(StoreError::InvalidRecord("secret cannot be empty".to_string()));
        }
        for (name, value) in [("timestamp", &self.timestamp), ("label", &self.label), ("secret", &self.secret)] {
            if value.contains('\n') || value.contains('\r') {
                return Err(StoreError::InvalidRecord(format!("{} cannot contain a line break", name)));
            }
        }
        // the label ends at the last "] ", so a secret must be one word
        if self.secret.chars().any(char::is_whitespace) {
            return Err(StoreError::InvalidRecord("secret cannot contain whitespace".to_string()));
        }
        Ok(())
    }
}

/// Current local time in the store's timestamp layout.
pub fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Which of the four character classes appear in a password.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassFlags {
    pub lower: bool,
    pub upper: bool,
    pub digit: bool,
    pub special: bool,
}

impl ClassFlags {
    pub fn count(&self) -> u8 {
        [self.lower, self.upper, self.digit, self.special]
            .iter()
            .filter(|present| **present)
            .count() as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Weak,
    Moderate,
    Strong,
}

impl Rating {
    pub fn from_score(score: u8) -> Self {
        if score >= 8 {
            Rating::Strong
        } else if score >= 5 {
            Rating::Moderate
        } else {
            Rating::Weak
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rating::Weak => write!(f, "WEAK"),
            Rating::Moderate => write!(f, "MODERATE"),
            Rating::Strong => write!(f, "STRONG"),
        }
    }
}

/// Result of scoring a password. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub value: u8,
    pub flags: ClassFlags,
}

impl Score {
    pub fn rating(&self) -> Rating {
        Rating::from_score(self.value)
    }
}

/// How a label query is compared against stored lines.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Substring anywhere in the raw line, timestamp and secret included.
    #[default]
    Line,
    /// Substring of the parsed label field only.
    Label,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_rejects_empty_label() {
        let result = Record::new("2024-01-01 00:00:00", "", "abc123");
        assert!(matches!(result, Err(StoreError::InvalidRecord(_))));
    }

    #[test]
    fn test_record_rejects_newline_in_secret() {
        let result = Record::new("2024-01-01 00:00:00", "Gmail", "abc\n123");
        assert!(matches!(result, Err(StoreError::InvalidRecord(msg)) if msg.contains("secret")));
    }

    #[test]
    fn test_record_rejects_whitespace_in_secret() {
        let result = Record::new("2024-01-01 00:00:00", "Bank", "Gmail] z");
        assert!(matches!(result, Err(StoreError::InvalidRecord(msg)) if msg.contains("whitespace")));
        assert!(Record::new("2024-01-01 00:00:00", "Bank", "tab\tsecret").is_err());
        assert!(Record::new("2024-01-01 00:00:00", "Bank account", "Gmail]z").is_ok());
    }

    #[test]
    fn test_rating_thresholds() {
        assert_eq!(Rating::from_score(0), Rating::Weak);
        assert_eq!(Rating::from_score(4), Rating::Weak);
        assert_eq!(Rating::from_score(5), Rating::Moderate);
        assert_eq!(Rating::from_score(7), Rating::Moderate);
        assert_eq!(Rating::from_score(8), Rating::Strong);
        assert_eq!(Rating::from_score(10), Rating::Strong);
    }

    #[test]
    fn test_now_timestamp_layout() {
        let ts = now_timestamp();
        assert_eq!(ts.len(), 19);
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, TIMESTAMP_FORMAT).is_ok());
    }
}
