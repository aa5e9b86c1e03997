//! Brand-mention extraction
//!
//! Applies a fixed brand-to-pattern table to every collected response and
//! writes a long-format table with one row per (query, brand) pair.

use std::path::Path;

use brandlens_core::{BrandLensError, ResponseRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::io::{read_rows, write_rows};

/// Default brand table. Each pattern is case-insensitive, word-bounded, and
/// tolerates one optional internal space ("1 Password" counts as 1Password).
pub const DEFAULT_BRAND_PATTERNS: &[(&str, &str)] = &[
    ("1Password", r"(?i)\b1 ?password\b"),
    ("Bitwarden", r"(?i)\bbit ?warden\b"),
    ("LastPass", r"(?i)\blast ?pass\b"),
    ("Dashlane", r"(?i)\bdash ?lane\b"),
    ("Keeper", r"(?i)\bkeeper\b"),
    ("NordPass", r"(?i)\bnord ?pass\b"),
    ("RoboForm", r"(?i)\brobo ?form\b"),
];

/// One row of the long-format mentions table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionRow {
    pub query_id: String,
    pub brand: String,
    /// 1 if the brand pattern matched the response text, else 0
    pub mention: u8,
}

/// Compiled brand patterns, applied in table order
#[derive(Debug)]
pub struct BrandPatterns {
    patterns: Vec<(String, Regex)>,
}

impl BrandPatterns {
    /// The fixed password-manager brand table
    pub fn default_brands() -> Self {
        Self::from_pairs(DEFAULT_BRAND_PATTERNS.iter().copied())
            .expect("default brand patterns compile")
    }

    /// Build a table from (brand, pattern) pairs
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, BrandLensError> {
        let mut patterns = Vec::new();
        for (brand, pattern) in pairs {
            let regex = Regex::new(pattern).map_err(|e| {
                BrandLensError::input(format!("Bad pattern for brand {}: {}", brand, e))
            })?;
            patterns.push((brand.to_string(), regex));
        }
        Ok(Self { patterns })
    }

    pub fn brands(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(brand, _)| brand.as_str())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Flag every brand against every response, error-marker rows included
    /// (a marker never matches a brand, and downstream joins expect a row
    /// for each attempted query).
    pub fn extract(&self, responses: &[ResponseRecord]) -> Vec<MentionRow> {
        let mut rows = Vec::with_capacity(responses.len() * self.patterns.len());

        for response in responses {
            for (brand, regex) in &self.patterns {
                rows.push(MentionRow {
                    query_id: response.query_id.clone(),
                    brand: brand.clone(),
                    mention: u8::from(regex.is_match(&response.response_text)),
                });
            }
        }

        rows
    }
}

/// Read a responses file, extract mentions, write the long-format table.
/// Returns the number of mention rows written.
pub fn extract_mentions_file(
    responses_path: &Path,
    output_path: &Path,
    patterns: &BrandPatterns,
) -> Result<usize, BrandLensError> {
    let responses: Vec<ResponseRecord> = read_rows(responses_path)?;
    info!(
        "Loaded {} responses from {}",
        responses.len(),
        responses_path.display()
    );

    let rows = patterns.extract(&responses);
    write_rows(output_path, &rows)?;

    info!(
        "Wrote {} mention rows ({} brands) to {}",
        rows.len(),
        patterns.len(),
        output_path.display()
    );

    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brandlens_core::QueryRecord;

    fn response(id: &str, text: &str) -> ResponseRecord {
        let query = QueryRecord {
            query_id: id.to_string(),
            query_text: "best password manager".to_string(),
            topic: "pricing".to_string(),
        };
        ResponseRecord::completed(&query, text)
    }

    #[test]
    fn test_one_row_per_query_brand_pair() {
        let patterns = BrandPatterns::default_brands();
        let rows = patterns.extract(&[response("Q1", "1Password is great")]);

        assert_eq!(rows.len(), patterns.len());
        let hit = rows.iter().find(|r| r.brand == "1Password").unwrap();
        assert_eq!(hit.mention, 1);
        assert!(rows
            .iter()
            .filter(|r| r.brand != "1Password")
            .all(|r| r.mention == 0));
    }

    #[test]
    fn test_case_insensitive_and_internal_space() {
        let patterns = BrandPatterns::default_brands();

        let rows = patterns.extract(&[response("Q1", "try BITWARDEN or Nord Pass")]);
        let flags: Vec<(&str, u8)> = rows.iter().map(|r| (r.brand.as_str(), r.mention)).collect();

        assert!(flags.contains(&("Bitwarden", 1)));
        assert!(flags.contains(&("NordPass", 1)));
        assert!(flags.contains(&("1Password", 0)));
    }

    #[test]
    fn test_word_boundaries_prevent_substring_hits() {
        let patterns = BrandPatterns::default_brands();

        // "keeperless" must not count as Keeper
        let rows = patterns.extract(&[response("Q1", "a keeperless setup")]);
        let keeper = rows.iter().find(|r| r.brand == "Keeper").unwrap();
        assert_eq!(keeper.mention, 0);
    }

    #[test]
    fn test_error_rows_get_zero_flags() {
        let query = QueryRecord {
            query_id: "Q7".to_string(),
            query_text: "q".to_string(),
            topic: "t".to_string(),
        };
        let patterns = BrandPatterns::default_brands();
        let rows = patterns.extract(&[ResponseRecord::failed(&query, "timed out")]);

        assert_eq!(rows.len(), patterns.len());
        assert!(rows.iter().all(|r| r.mention == 0));
    }

    #[test]
    fn test_extract_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let responses_path = dir.path().join("responses.csv");
        let output_path = dir.path().join("mentions.csv");

        std::fs::write(
            &responses_path,
            "query_id,query_text,topic,response_text\n\
             Q1,best password manager,pricing,1Password is great\n",
        )
        .unwrap();

        let patterns = BrandPatterns::default_brands();
        let written =
            extract_mentions_file(&responses_path, &output_path, &patterns).unwrap();
        assert_eq!(written, patterns.len());

        let rows: Vec<MentionRow> = crate::io::read_rows(&output_path).unwrap();
        assert_eq!(rows.len(), patterns.len());
        assert_eq!(
            rows.iter().find(|r| r.brand == "1Password").unwrap().mention,
            1
        );
    }

    #[test]
    fn test_bad_custom_pattern_is_rejected() {
        let err = BrandPatterns::from_pairs([("Broken", "(unclosed")]).unwrap_err();
        assert!(matches!(err, BrandLensError::Input(_)));
    }
}
