//! Error types for cqarank

use thiserror::Error;

/// cqarank error type
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML configuration could not be read
    #[error("Configuration error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Parse error in a line-oriented input file
    #[error("Parse error at line {line}: {message}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A scored candidate has no relevance judgment
    #[error("No relevance judgment for candidate {candidate} of {original}")]
    MissingJudgment {
        /// Original question id
        original: String,
        /// Candidate id absent from the judgments
        candidate: String,
    },

    /// The same candidate id was seen twice while building a document tree
    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    /// A candidate record refers to an original question that was never seen
    #[error("Candidate {candidate} has no original question {original}")]
    MissingOriginal {
        /// Original question id derived from the candidate id
        original: String,
        /// Candidate id
        candidate: String,
    },

    /// Unknown filter name
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    /// Unknown indicator name
    #[error("Unknown indicator: {0}")]
    UnknownIndicator(String),

    /// Unknown similarity name
    #[error("Unknown similarity: {0}")]
    UnknownSimilarity(String),

    /// Unknown weighter name
    #[error("Unknown weighter: {0}")]
    UnknownWeighter(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for cqarank operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingJudgment {
            original: "Q1".to_string(),
            candidate: "Q1_R3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No relevance judgment for candidate Q1_R3 of Q1"
        );
    }

    #[test]
    fn test_parse_error_display() {
        let err = Error::ParseError {
            line: 4,
            message: "expected 5 columns".to_string(),
        };
        assert_eq!(err.to_string(), "Parse error at line 4: expected 5 columns");
    }
}
