//! Action directive protocol and execution engine.
//!
//! Assistant responses are ordinary prose with embedded machine-readable
//! directives: file markers followed by a fenced content block, and inline
//! command markers. This crate owns the full pipeline for one turn:
//!
//! 1. [`filter::StreamFilter`] strips directive syntax from the fragment
//!    stream shown to the user, tolerating markers split across fragment
//!    boundaries.
//! 2. [`parse::parse_directives`] scans the complete accumulated response
//!    and produces an ordered [`types::Directive`] list.
//! 3. [`plan::build_plan`] resolves directives against the working
//!    directory into an [`types::ExecutionPlan`].
//! 4. [`execute::ExecutionEngine`] applies the plan (directories, then
//!    files, then commands) and reports one outcome per item.
//!
//! Parsing and planning are read-only; the execution engine is the sole
//! owner of side effects. A failed item never stops the remaining items;
//! only an unusable working directory aborts a turn.

pub mod error;
pub mod execute;
pub mod filter;
pub mod parse;
pub mod plan;
pub mod progress;
pub mod types;

pub use error::{DiagnosticReason, EngineError, ParseDiagnostic};
pub use execute::ExecutionEngine;
pub use filter::StreamFilter;
pub use parse::{parse_directives, render_directives, ParseOutcome};
pub use plan::build_plan;
pub use progress::{NullObserver, ProgressObserver, StepKind};
pub use types::{
    Directive, DirectiveKind, ExecutionOutcome, ExecutionPlan, OutcomeStatus, PlanItem, TurnReport,
};

/// Literal token that opens every directive marker.
pub const MARKER_TOKEN: &str = "**QUILL_";
