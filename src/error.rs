//! Error taxonomy for the pipeline stages.
//!
//! Only fatal conditions are errors. Per-row problems are counted as
//! [`DropReason`](crate::normalize::DropReason)s and never abort a stage.

use std::path::PathBuf;
use thiserror::Error;

/// A required column could not be resolved unambiguously.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("no column for `{role}` (looked for {fragments:?} in {headers:?})")]
    MissingColumn {
        role: String,
        fragments: Vec<String>,
        headers: Vec<String>,
    },

    #[error("column for `{role}` is ambiguous: {candidates:?}")]
    AmbiguousColumn {
        role: String,
        candidates: Vec<String>,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input not found: {}", .path.display())]
    MissingInput { path: PathBuf },

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Fails with [`PipelineError::MissingInput`] unless `path` exists.
pub fn require_input(path: &std::path::Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(PipelineError::MissingInput {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_input_missing() {
        let path = std::env::temp_dir().join("rent_stress_definitely_missing.csv");
        let err = require_input(&path).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput { .. }));
        assert!(err.to_string().contains("rent_stress_definitely_missing.csv"));
    }

    #[test]
    fn test_schema_error_names_role() {
        let err = SchemaError::AmbiguousColumn {
            role: "rent".into(),
            candidates: vec!["weekly_rent".into(), "rent_type".into()],
        };
        assert!(err.to_string().contains("`rent`"));
        assert!(err.to_string().contains("rent_type"));
    }
}
