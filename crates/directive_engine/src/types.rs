use std::path::PathBuf;

use crate::error::ParseDiagnostic;

/// One parsed action instruction embedded in assistant output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Write a file; create vs. update is decided at plan time.
    CreateOrUpdateFile,
    /// Run a literal shell command line in the working directory.
    RunCommand,
}

/// A parsed directive.
///
/// Invariant: `target` is non-empty and trimmed. For file directives,
/// `content` is non-empty; the parser drops anything that violates this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// File path (relative or absolute) for file directives, the literal
    /// command line for command directives.
    pub target: String,
    /// Fence language tag for file directives; empty when absent.
    pub language: String,
    /// Raw body of the fenced block for file directives; empty for commands.
    pub content: String,
}

impl Directive {
    pub fn file(target: impl Into<String>, language: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: DirectiveKind::CreateOrUpdateFile,
            target: target.into(),
            language: language.into(),
            content: content.into(),
        }
    }

    pub fn command(target: impl Into<String>) -> Self {
        Self {
            kind: DirectiveKind::RunCommand,
            target: target.into(),
            language: String::new(),
            content: String::new(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == DirectiveKind::CreateOrUpdateFile
    }
}

/// A file directive resolved against filesystem state at plan time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanItem {
    pub directive: Directive,
    /// Absolute path the write will target.
    pub resolved_path: PathBuf,
    /// Whether the path existed when the plan was built. Not re-checked
    /// mid-execution; a concurrent external writer can make this stale.
    pub existed_before: bool,
    /// Directory that must exist before the write.
    pub parent_directory: PathBuf,
}

/// Ordered, filesystem-resolved form of one turn's directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub working_dir: PathBuf,
    /// Directories to ensure, deduplicated, working directory first.
    pub directories: Vec<PathBuf>,
    /// File items in directive order; duplicate targets all kept.
    pub files: Vec<PlanItem>,
    /// Command lines in directive order, run after all file writes.
    pub commands: Vec<String>,
}

impl ExecutionPlan {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.commands.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
}

/// Terminal record for one executed plan item or command.
///
/// Created once the attempt finishes and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Human-readable step label: a workspace-relative path or a command line.
    pub detail: String,
    pub status: OutcomeStatus,
    /// Present iff `status` is `Failed`.
    pub error_detail: Option<String>,
}

impl ExecutionOutcome {
    pub fn succeeded(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            status: OutcomeStatus::Succeeded,
            error_detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            status: OutcomeStatus::Failed,
            error_detail: Some(error.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }
}

/// Everything the caller needs for a final per-turn summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// One outcome per file item and per command, in execution order.
    pub outcomes: Vec<ExecutionOutcome>,
    /// Non-fatal diagnostics for directives the parser dropped.
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl TurnReport {
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }
}
