//! Loading the company's reference list of payment terms.
//!
//! The file is a JSON array of rows shaped `{ "name": "Net30", "id": 100 }`.

use crate::error::{AppError, Result};
use serde::Deserialize;
use std::path::Path;
use termsync_engine::{ExternalKey, Record};

/// One row of the reference file.
#[derive(Debug, Deserialize)]
struct ReferenceRow {
    name: String,
    id: ExternalKey,
}

/// Read and parse the reference file at `path`.
pub fn load(path: &Path) -> Result<Vec<Record>> {
    let raw = std::fs::read_to_string(path).map_err(|source| AppError::ReadReference {
        path: path.to_path_buf(),
        source,
    })?;

    parse(&raw).map_err(|source| AppError::ParseReference {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse reference rows. Names are trimmed; rows left without a name are skipped.
pub fn parse(raw: &str) -> serde_json::Result<Vec<Record>> {
    let rows: Vec<ReferenceRow> = serde_json::from_str(raw)?;

    let records = rows
        .into_iter()
        .filter_map(|row| {
            let name = row.name.trim();
            if name.is_empty() {
                tracing::warn!(id = row.id, "skipping reference row without a name");
                return None;
            }
            Some(Record::reference(name, row.id))
        })
        .collect();

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use termsync_engine::RecordStatus;

    #[test]
    fn parse_trims_and_keeps_order() {
        let records =
            parse(r#"[{"name": " Net30 ", "id": 100}, {"name": "Net60", "id": 101}]"#).unwrap();

        assert_eq!(
            records,
            vec![Record::reference("Net30", 100), Record::reference("Net60", 101)]
        );
        assert!(records.iter().all(|r| r.status == RecordStatus::Unknown));
    }

    #[test]
    fn parse_skips_blank_names() {
        let records = parse(r#"[{"name": "   ", "id": 1}, {"name": "Net30", "id": 2}]"#).unwrap();

        assert_eq!(records, vec![Record::reference("Net30", 2)]);
    }

    #[test]
    fn parse_keeps_duplicate_keys() {
        let records = parse(r#"[{"name": "A", "id": 1}, {"name": "B", "id": 1}]"#).unwrap();

        assert_eq!(records.len(), 2);
    }

    #[test]
    fn parse_rejects_non_integer_id() {
        assert!(parse(r#"[{"name": "Net30", "id": "one hundred"}]"#).is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "Net30", "id": 100}}]"#).unwrap();

        let records = load(file.path()).unwrap();

        assert_eq!(records, vec![Record::reference("Net30", 100)]);
    }

    #[test]
    fn load_missing_file() {
        let err = load(Path::new("/nonexistent/terms.json")).unwrap_err();

        assert!(matches!(err, AppError::ReadReference { .. }));
        assert!(err.to_string().contains("/nonexistent/terms.json"));
    }
}
