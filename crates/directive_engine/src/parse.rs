//! Whole-buffer directive extraction.
//!
//! Runs once per turn over the complete accumulated response. Scanning is
//! an explicit tokenizer rather than pattern matching: a marker must be
//! complete on one line, and a file directive's content is everything up to
//! the nearest following close-fence line, treated as opaque.

use crate::error::{DiagnosticReason, ParseDiagnostic};
use crate::types::{Directive, DirectiveKind};
use crate::MARKER_TOKEN;

const MARKER_CLOSE: &str = "**";
const FENCE: &str = "```";
const SNIPPET_MAX_CHARS: usize = 48;

/// Marker verbs carried after the opening token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MarkerVerb {
    CreateFile,
    EditFile,
    RunCommand,
}

impl MarkerVerb {
    pub(crate) fn is_file(self) -> bool {
        matches!(self, Self::CreateFile | Self::EditFile)
    }
}

const VERBS: [(&str, MarkerVerb); 3] = [
    ("CREATE_FILE:", MarkerVerb::CreateFile),
    ("EDIT_FILE:", MarkerVerb::EditFile),
    ("RUN_COMMAND:", MarkerVerb::RunCommand),
];

/// A complete marker matched within one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MarkerSpan {
    pub verb: MarkerVerb,
    pub label: String,
    /// Byte offset just past the closing `**`, relative to the scanned text.
    pub end: usize,
}

/// Result of parsing one full response text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Directives in the order they appear in the text.
    pub directives: Vec<Directive>,
    /// Dropped-directive diagnostics, also in source order.
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Scans `text` for directives in source order.
///
/// Malformed directives (empty target, empty or missing content block) are
/// dropped with a diagnostic. Nothing outside marker syntax ever becomes a
/// directive.
pub fn parse_directives(text: &str) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let mut idx = 0;

    while let Some(offset) = text[idx..].find(MARKER_TOKEN) {
        let marker_start = idx + offset;
        let Some(span) = match_marker(text, marker_start) else {
            // The token alone is not a marker; step past it and keep scanning.
            idx = marker_start + MARKER_TOKEN.len();
            continue;
        };

        let snippet = snippet_at(text, marker_start);
        let label = span.label.trim().to_string();
        if label.is_empty() {
            outcome
                .diagnostics
                .push(ParseDiagnostic::new(DiagnosticReason::EmptyTarget, snippet));
            idx = span.end;
            continue;
        }

        if !span.verb.is_file() {
            outcome.directives.push(Directive::command(label));
            idx = span.end;
            continue;
        }

        match parse_block(text, span.end) {
            BlockParse::Found {
                language,
                content,
                resume,
            } => {
                let content = content.trim();
                if content.is_empty() {
                    outcome
                        .diagnostics
                        .push(ParseDiagnostic::new(DiagnosticReason::EmptyContent, snippet));
                } else {
                    outcome
                        .directives
                        .push(Directive::file(label, language, content));
                }
                idx = resume;
            }
            BlockParse::Missing => {
                outcome
                    .diagnostics
                    .push(ParseDiagnostic::new(DiagnosticReason::MissingBlock, snippet));
                idx = span.end;
            }
            BlockParse::Unterminated => {
                outcome.diagnostics.push(ParseDiagnostic::new(
                    DiagnosticReason::UnterminatedBlock,
                    snippet,
                ));
                idx = text.len();
            }
        }
    }

    outcome
}

/// Serializes directives back into marker syntax.
///
/// `parse_directives(render_directives(d)) == d` for any directive list that
/// upholds the type invariants (non-empty trimmed targets and content).
pub fn render_directives(directives: &[Directive]) -> String {
    let mut out = String::new();
    for directive in directives {
        match directive.kind {
            DirectiveKind::RunCommand => {
                out.push_str(&format!(
                    "**QUILL_RUN_COMMAND: {}**\n\n",
                    directive.target
                ));
            }
            DirectiveKind::CreateOrUpdateFile => {
                out.push_str(&format!(
                    "**QUILL_CREATE_FILE: {}**\n```{}\n{}\n```\n\n",
                    directive.target, directive.language, directive.content
                ));
            }
        }
    }
    out
}

/// Tries to match a complete marker whose token starts at `marker_start`.
///
/// The verb and the closing `**` must both sit on the token's line; a token
/// without them is prose, not a directive.
pub(crate) fn match_marker(text: &str, marker_start: usize) -> Option<MarkerSpan> {
    let after_token = marker_start + MARKER_TOKEN.len();
    let rest = &text[after_token..];

    let (verb_text, verb) = VERBS
        .iter()
        .find(|(verb_text, _)| rest.starts_with(verb_text))
        .copied()?;

    let label_start = after_token + verb_text.len();
    let line_end = text[label_start..]
        .find('\n')
        .map_or(text.len(), |pos| label_start + pos);
    let close_offset = text[label_start..line_end].find(MARKER_CLOSE)?;

    let label_end = label_start + close_offset;
    Some(MarkerSpan {
        verb,
        label: text[label_start..label_end].to_string(),
        end: label_end + MARKER_CLOSE.len(),
    })
}

enum BlockParse {
    Found {
        language: String,
        content: String,
        /// Byte offset just past the close-fence line.
        resume: usize,
    },
    Missing,
    Unterminated,
}

/// Parses the fenced block expected right after a file marker.
fn parse_block(text: &str, from: usize) -> BlockParse {
    let block_start = from + leading_whitespace_len(&text[from..]);
    if !text[block_start..].starts_with(FENCE) {
        return BlockParse::Missing;
    }

    let fence_line_start = block_start + FENCE.len();
    let Some(newline) = text[fence_line_start..].find('\n') else {
        return BlockParse::Unterminated;
    };
    let language = text[fence_line_start..fence_line_start + newline]
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_string();

    let content_start = fence_line_start + newline + 1;
    let close_line_start = if text[content_start..].starts_with(FENCE) {
        content_start
    } else {
        match text[content_start..].find("\n```") {
            Some(pos) => content_start + pos + 1,
            None => return BlockParse::Unterminated,
        }
    };

    let resume = text[close_line_start..]
        .find('\n')
        .map_or(text.len(), |pos| close_line_start + pos + 1);

    BlockParse::Found {
        language,
        content: text[content_start..close_line_start].to_string(),
        resume,
    }
}

fn leading_whitespace_len(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

fn snippet_at(text: &str, marker_start: usize) -> String {
    let line_end = text[marker_start..]
        .find('\n')
        .map_or(text.len(), |pos| marker_start + pos);
    text[marker_start..line_end]
        .chars()
        .take(SNIPPET_MAX_CHARS)
        .collect()
}
