//! Error types for apidoc.
//!
//! Library crates use [`ApiDocError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all apidoc operations.
///
/// Every variant except `Config` and `Io` is fatal to a conversion: the
/// inputs are static, so nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum ApiDocError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A metadata or doc source could not be read or is malformed.
    #[error("failed to load {origin}: {message}")]
    Load { origin: String, message: String },

    /// Two sources (or two members) claim the same documentation identity.
    #[error("duplicate entry {identity} in assembly {assembly} (first at {first}, again at {second})")]
    DuplicateEntry {
        assembly: String,
        identity: String,
        first: String,
        second: String,
    },

    /// An identity was requested for a member category the resolver does not know.
    #[error("unsupported member kind '{kind}' for {member}")]
    UnsupportedMemberKind { member: String, kind: String },

    /// A persistent-scope key was defined twice with different values.
    #[error("link target '{name}' already defined as '{existing}', cannot redefine as '{attempted}'")]
    DuplicateLinkTarget {
        name: String,
        existing: String,
        attempted: String,
    },

    /// A writer, filter, or target failed while emitting output.
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (schema mismatch, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ApiDocError>;

impl ApiDocError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a load failure for the named source.
    pub fn load(origin: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Load {
            origin: origin.into(),
            message: msg.into(),
        }
    }

    /// Create a render error from any displayable message.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ApiDocError::config("heading_level must be 1..=6");
        assert_eq!(err.to_string(), "config error: heading_level must be 1..=6");

        let err = ApiDocError::load("Foo.xml", "unexpected end of input");
        assert_eq!(err.to_string(), "failed to load Foo.xml: unexpected end of input");
    }

    #[test]
    fn duplicate_link_target_names_both_values() {
        let err = ApiDocError::DuplicateLinkTarget {
            name: "T:NS.Foo".into(),
            existing: "NS.Foo.md".into(),
            attempted: "Other.Foo.md".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("NS.Foo.md"));
        assert!(msg.contains("Other.Foo.md"));
    }

    #[test]
    fn duplicate_entry_reports_locations() {
        let err = ApiDocError::DuplicateEntry {
            assembly: "Acme".into(),
            identity: "T:Acme.Widget".into(),
            first: "a.xml:4".into(),
            second: "b.xml:9".into(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate entry T:Acme.Widget in assembly Acme (first at a.xml:4, again at b.xml:9)"
        );
    }
}
