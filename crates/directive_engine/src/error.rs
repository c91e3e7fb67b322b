use std::path::PathBuf;

use thiserror::Error;

/// Turn-fatal engine failures.
///
/// Everything else the engine encounters is absorbed into per-item
/// outcomes; only an unusable working directory aborts a turn before any
/// side effect happens.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("working directory {path} cannot be ensured: {reason}")]
    Precondition { path: PathBuf, reason: String },
}

impl EngineError {
    pub fn precondition(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Precondition {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Why the parser dropped a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DiagnosticReason {
    #[error("directive has an empty target")]
    EmptyTarget,
    #[error("file directive has an empty content block")]
    EmptyContent,
    #[error("file directive is not followed by a fenced block")]
    MissingBlock,
    #[error("file directive block is never closed")]
    UnterminatedBlock,
}

/// Non-fatal record of a malformed directive.
///
/// The directive is dropped and the turn continues; diagnostics surface in
/// the final turn report, never as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    pub reason: DiagnosticReason,
    /// Short excerpt of the offending marker line for the status line.
    pub snippet: String,
}

impl ParseDiagnostic {
    pub fn new(reason: DiagnosticReason, snippet: impl Into<String>) -> Self {
        Self {
            reason,
            snippet: snippet.into(),
        }
    }
}

impl std::fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (near `{}`)", self.reason, self.snippet)
    }
}
