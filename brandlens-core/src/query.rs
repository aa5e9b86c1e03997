//! Query and response records
//!
//! The row types read from `queries.csv` and written to the per-provider
//! `responses_*.csv` files. Serde field names double as the CSV headers.

use serde::{Deserialize, Serialize};

/// Marker prefix for queries that permanently failed collection
pub const ERROR_PREFIX: &str = "ERROR: ";

/// One row of the input query battery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    /// Unique identifier, stable across runs
    pub query_id: String,
    /// Prompt sent verbatim to the completion endpoint
    pub query_text: String,
    /// Categorical topic label carried through to the dataset
    pub topic: String,
}

/// One collected (or permanently failed) response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub query_id: String,
    pub query_text: String,
    pub topic: String,
    /// Single-line response text, or an `ERROR: <message>` marker
    pub response_text: String,
}

impl ResponseRecord {
    /// Build a record from a successful completion, collapsing embedded line
    /// breaks to single spaces and trimming surrounding whitespace so the row
    /// stays single-line.
    pub fn completed(query: &QueryRecord, raw_text: &str) -> Self {
        Self {
            query_id: query.query_id.clone(),
            query_text: query.query_text.clone(),
            topic: query.topic.clone(),
            response_text: normalize_response_text(raw_text),
        }
    }

    /// Build an error-marker record for a query that exhausted its retries
    pub fn failed(query: &QueryRecord, message: &str) -> Self {
        Self {
            query_id: query.query_id.clone(),
            query_text: query.query_text.clone(),
            topic: query.topic.clone(),
            response_text: format!("{}{}", ERROR_PREFIX, message),
        }
    }

    /// True if this record carries an error marker instead of a response
    pub fn is_error(&self) -> bool {
        self.response_text.starts_with(ERROR_PREFIX)
    }
}

/// Collapse line breaks to single spaces and trim
fn normalize_response_text(raw: &str) -> String {
    raw.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> QueryRecord {
        QueryRecord {
            query_id: "Q1".to_string(),
            query_text: "best password manager".to_string(),
            topic: "pricing".to_string(),
        }
    }

    #[test]
    fn test_completed_normalizes_line_breaks() {
        let record = ResponseRecord::completed(&query(), "  1Password\nis\r\ngreat\r ");
        assert_eq!(record.response_text, "1Password is great");
        assert!(!record.is_error());
    }

    #[test]
    fn test_completed_keeps_single_line_text() {
        let record = ResponseRecord::completed(&query(), "Bitwarden is free");
        assert_eq!(record.response_text, "Bitwarden is free");
    }

    #[test]
    fn test_failed_carries_error_marker() {
        let record = ResponseRecord::failed(&query(), "connection reset by peer");
        assert_eq!(record.response_text, "ERROR: connection reset by peer");
        assert!(record.is_error());
    }
}
