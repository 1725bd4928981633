//! Error taxonomy: fatal errors stop the run, warnings are collected.

use std::fmt;
use thiserror::Error;

/// Fatal conditions. Anything here aborts before output is written.
#[derive(Error, Debug)]
pub enum DocError {
    /// Two distinct nodes were laid out onto the same output location.
    #[error("output path collision at '{path}': {first} and {second}")]
    PathCollision {
        path: String,
        first: String,
        second: String,
    },

    /// Facts supplied by the metadata provider are internally inconsistent.
    #[error("invalid facts in assembly '{assembly}': {reason}")]
    InvalidFacts { assembly: String, reason: String },

    /// A renderer could not serialize a unit.
    #[error("failed to serialize {path}: {reason}")]
    Serialize { path: String, reason: String },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("rendering cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, DocError>;

/// Recoverable conditions, reported next to the primary result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Same type key defined by two assemblies; the later definition won.
    MergeConflict {
        key: String,
        previous: String,
        incoming: String,
    },
    /// A documentation comment could not be parsed and was replaced by
    /// empty sections.
    MalformedDocumentation { target: String, reason: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MergeConflict {
                key,
                previous,
                incoming,
            } => write!(
                f,
                "type {} defined in both '{}' and '{}'; keeping the definition from '{}'",
                key, previous, incoming, incoming
            ),
            Warning::MalformedDocumentation { target, reason } => {
                write!(f, "malformed documentation on {}: {}", target, reason)
            }
        }
    }
}

/// One output unit that could not be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    pub path: String,
    pub message: String,
}

impl fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to write {}: {}", self.path, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_conflict_names_both_assemblies() {
        let w = Warning::MergeConflict {
            key: "Acme.Gadget".to_string(),
            previous: "Acme.Core".to_string(),
            incoming: "Acme.Extras".to_string(),
        };
        let text = w.to_string();
        assert!(text.contains("Acme.Core"));
        assert!(text.contains("Acme.Extras"));
    }

    #[test]
    fn collision_message() {
        let e = DocError::PathCollision {
            path: "Acme/Cache.md".to_string(),
            first: "Acme.Cache".to_string(),
            second: "Acme.cache".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "output path collision at 'Acme/Cache.md': Acme.Cache and Acme.cache"
        );
    }
}
