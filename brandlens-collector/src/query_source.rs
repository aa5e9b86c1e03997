//! Query battery loader

use std::collections::HashSet;
use std::path::Path;

use brandlens_core::{BrandLensError, QueryRecord};
use tracing::info;

/// Load the ordered query battery from a headered CSV file
/// (`query_id, query_text, topic`). Duplicate ids are a configuration
/// error, not something to silently dedupe.
pub fn load_queries(path: &Path) -> Result<Vec<QueryRecord>, BrandLensError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        BrandLensError::io(format!("Failed to read queries from {}: {}", path.display(), e))
    })?;

    let mut queries = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for row in reader.deserialize() {
        let record: QueryRecord = row.map_err(|e| {
            BrandLensError::csv(format!("Bad row in {}: {}", path.display(), e))
        })?;

        if !seen.insert(record.query_id.clone()) {
            return Err(BrandLensError::input(format!(
                "Duplicate query_id {} in {}",
                record.query_id,
                path.display()
            )));
        }

        queries.push(record);
    }

    info!("Loaded {} queries from {}", queries.len(), path.display());

    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("queries.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_preserves_source_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "query_id,query_text,topic\nQ2,second question,setup\nQ1,first question,pricing\n",
        );

        let queries = load_queries(&path).unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].query_id, "Q2");
        assert_eq!(queries[1].query_id, "Q1");
        assert_eq!(queries[1].topic, "pricing");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "query_id,query_text,topic\nQ1,a,t\nQ1,b,t\n",
        );

        let err = load_queries(&path).unwrap_err();
        assert!(matches!(err, BrandLensError::Input(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_queries(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, BrandLensError::Io(_)));
    }

    #[test]
    fn test_quoted_fields_with_commas() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "query_id,query_text,topic\nQ1,\"best, cheapest password manager\",pricing\n",
        );

        let queries = load_queries(&path).unwrap();
        assert_eq!(queries[0].query_text, "best, cheapest password manager");
    }
}
