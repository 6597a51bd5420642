//! Custom error types for ampdedup operations.

use thiserror::Error;

/// Result type alias for ampdedup operations
pub type Result<T> = std::result::Result<T, AmpdedupError>;

/// Error type for ampdedup operations
#[derive(Error, Debug)]
pub enum AmpdedupError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "FASTQ", "Amplicon list")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// Amplicon list row with the wrong number of fields
    #[error("Amplicon list line {line}: expected 4 tab-separated fields, found {found}")]
    InvalidPanelRow {
        /// 1-based line number in the amplicon list
        line: usize,
        /// Number of fields found on the line
        found: usize,
    },

    /// Primer sequence containing bases outside {A,T,G,C}
    #[error("Amplicon list line {line}: {which} primer contains non-standard bases (only A, T, G or C allowed)")]
    NonStandardBase {
        /// 1-based line number in the amplicon list
        line: usize,
        /// Which primer failed validation ("forward" or "reverse")
        which: String,
    },

    /// Strand field that is neither 0 nor 1
    #[error("Amplicon list line {line}: strand field must contain 0 or 1, found '{value}'")]
    InvalidStrand {
        /// 1-based line number in the amplicon list
        line: usize,
        /// The offending field value
        value: String,
    },

    /// R1/R2 headers that do not differ by exactly one character
    #[error(
        "Read header hamming distance does not equal one; check FASTQ input (R1 '{header_r1}', R2 '{header_r2}')"
    )]
    MismatchedHeaders {
        /// The R1 header
        header_r1: String,
        /// The R2 header
        header_r2: String,
    },
}
