//! Quill: an interactive CLI assistant with workspace execution.
//!
//! The binary wires four concerns together: a model backend resolved from
//! the static catalog and stored settings, the chat loop that fans each
//! response stream out to display filtering and raw accumulation, the
//! directive engine that turns a completed response into filesystem and
//! process actions, and a console reporter for per-step status lines.

pub mod banner;
pub mod catalog;
pub mod chat;
pub mod commands;
pub mod providers;
pub mod report;
