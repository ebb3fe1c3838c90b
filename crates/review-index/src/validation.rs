//! Input validation for review records and documents files.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::error::{IndexError, Result};
use crate::models::ReviewRecord;

/// Validation error types.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Empty value where one is required.
    Empty(String),
    /// Score outside 0 to 10.
    ScoreOutOfRange(f64),
    /// Same id appears twice in one batch.
    DuplicateId,
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::ScoreOutOfRange(score) => {
                write!(f, "score {} is outside 0-10", score)
            }
            ValidationError::DuplicateId => write!(f, "duplicate id"),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for a record id.
pub const MAX_ID_LENGTH: usize = 128;

/// Validate a single record.
pub fn validate_record(record: &ReviewRecord) -> std::result::Result<(), ValidationError> {
    for (field, value) in [
        ("id", &record.id),
        ("artist", &record.artist),
        ("title", &record.title),
        ("review", &record.review),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::Empty(field.to_string()));
        }
    }

    if record.id.len() > MAX_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: "id".to_string(),
            max: MAX_ID_LENGTH,
            actual: record.id.len(),
        });
    }

    if !record.score.is_finite() || !(0.0..=10.0).contains(&record.score) {
        return Err(ValidationError::ScoreOutOfRange(record.score));
    }

    Ok(())
}

/// Validate a batch: every record on its own, plus id uniqueness.
pub fn validate_records(records: &[ReviewRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        validate_record(record).map_err(|source| IndexError::InvalidRecord {
            id: record.id.clone(),
            source,
        })?;
        if !seen.insert(record.id.as_str()) {
            return Err(IndexError::InvalidRecord {
                id: record.id.clone(),
                source: ValidationError::DuplicateId,
            });
        }
    }
    Ok(())
}

/// Load and validate a JSON array of review records.
pub fn load_documents(path: impl AsRef<Path>) -> Result<Vec<ReviewRecord>> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let records: Vec<ReviewRecord> = serde_json::from_str(&raw)?;
    validate_records(&records)?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, score: f64) -> ReviewRecord {
        ReviewRecord {
            id: id.to_string(),
            artist: "Artist".to_string(),
            title: "Title".to_string(),
            year: 2001,
            score,
            review: "A review.".to_string(),
        }
    }

    #[test]
    fn test_valid_record() {
        assert!(validate_record(&record("r1", 8.4)).is_ok());
        assert!(validate_record(&record("r1", 0.0)).is_ok());
        assert!(validate_record(&record("r1", 10.0)).is_ok());
    }

    #[test]
    fn test_score_out_of_range() {
        assert_eq!(
            validate_record(&record("r1", 10.5)),
            Err(ValidationError::ScoreOutOfRange(10.5))
        );
        assert!(validate_record(&record("r1", -1.0)).is_err());
        assert!(validate_record(&record("r1", f64::NAN)).is_err());
    }

    #[test]
    fn test_empty_field() {
        let mut r = record("r1", 5.0);
        r.review = "   ".to_string();
        assert_eq!(
            validate_record(&r),
            Err(ValidationError::Empty("review".to_string()))
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = validate_records(&[record("a", 1.0), record("a", 2.0)]).unwrap_err();
        assert!(matches!(
            err,
            IndexError::InvalidRecord {
                source: ValidationError::DuplicateId,
                ..
            }
        ));
    }

    #[test]
    fn test_load_documents_missing_file() {
        let err = load_documents("/nonexistent/music_docs.json").unwrap_err();
        assert!(matches!(err, IndexError::Io(_)));
    }

    #[test]
    fn test_bundled_documents_are_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/music_docs.json");
        let records = load_documents(path).unwrap();
        assert!(records.len() >= 2);
    }
}
