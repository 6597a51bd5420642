//! Input validation utilities
//!
//! Common validation functions for command-line parameters and file paths
//! with consistent error messages, built on the structured error types from
//! [`crate::errors`].

use crate::errors::{AmpdedupError, Result};
use std::path::Path;

/// Validate that a file exists
///
/// # Arguments
/// * `path` - Path to validate
/// * `description` - Human-readable description of the file (e.g., "Input R1 FASTQ")
///
/// # Errors
/// Returns an error if the file does not exist
///
/// # Example
/// ```
/// use ampdedup_lib::validation::validate_file_exists;
///
/// let result = validate_file_exists("/nonexistent/reads_R1.fastq", "Input R1 FASTQ");
/// assert!(result.is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Err(AmpdedupError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validate that multiple files exist
///
/// # Arguments
/// * `files` - Slice of (path, description) tuples
///
/// # Errors
/// Returns an error for the first file that doesn't exist
pub fn validate_files_exist<P: AsRef<Path>>(files: &[(P, &str)]) -> Result<()> {
    for (path, desc) in files {
        validate_file_exists(path, desc)?;
    }
    Ok(())
}

/// Validate that a parameter is at least one.
///
/// # Errors
/// Returns an error if `value` is zero
pub fn validate_nonzero(value: usize, parameter: &str) -> Result<()> {
    if value == 0 {
        return Err(AmpdedupError::InvalidParameter {
            parameter: parameter.to_string(),
            reason: "must be >= 1".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_validate_file_exists_success() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "content").unwrap();
        assert!(validate_file_exists(file.path(), "Test file").is_ok());
    }

    #[test]
    fn test_validate_file_exists_failure() {
        let result = validate_file_exists("/definitely/not/a/file.fastq", "Test file");
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("does not exist"));
        assert!(msg.contains("Test file"));
    }

    #[test]
    fn test_validate_files_exist() {
        let file = NamedTempFile::new().unwrap();
        let ok = vec![(file.path(), "A")];
        assert!(validate_files_exist(&ok).is_ok());

        let missing = vec![(Path::new("/no/such/file"), "B")];
        assert!(validate_files_exist(&missing).is_err());
    }

    #[test]
    fn test_validate_nonzero() {
        assert!(validate_nonzero(5, "rti-length").is_ok());
        let err = validate_nonzero(0, "rti-length").unwrap_err();
        assert!(err.to_string().contains("rti-length"));
    }
}
