//! Incremental display filter for the fragment stream.
//!
//! The same fragment sequence feeds two consumers: the raw accumulator the
//! parser reads after the turn, and this filter, which produces what the
//! user actually sees. The filter removes marker lines and the fenced
//! blocks attached to file markers while passing ordinary prose (including
//! ordinary code fences) through untouched.
//!
//! Fragments arrive at arbitrary boundaries, so a marker or fence can be
//! split across pushes. The filter carries the current incomplete line and
//! holds back only the suffix that could still become a marker; held text
//! is either suppressed once the marker completes or replayed verbatim once
//! the ambiguity disproves itself. It never emits half a marker.

use crate::parse::match_marker;
use crate::MARKER_TOKEN;

const FENCE: &str = "```";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterState {
    /// Ordinary narrative text.
    Prose,
    /// A file marker was just removed; swallow blank lines until the
    /// attached fence opens (or a non-blank prose line cancels the wait).
    AwaitFence,
    /// Inside a directive block; suppress up to and including the close fence.
    InFence,
}

/// Stateful filter over one turn's fragment stream.
#[derive(Debug)]
pub struct StreamFilter {
    state: FilterState,
    /// Unprocessed tail of the current line.
    carry: String,
    /// Whether a prefix of the current line was already emitted.
    line_has_emitted: bool,
}

impl Default for StreamFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamFilter {
    pub fn new() -> Self {
        Self {
            state: FilterState::Prose,
            carry: String::new(),
            line_has_emitted: false,
        }
    }

    /// Feeds one raw fragment and returns the display text it unlocked.
    ///
    /// May return an empty string while a potential marker is still
    /// ambiguous; the held text is emitted or suppressed by later pushes or
    /// by [`StreamFilter::finish`].
    pub fn push(&mut self, fragment: &str) -> String {
        self.carry.push_str(fragment);
        let mut out = String::new();

        while let Some(pos) = self.carry.find('\n') {
            let line: String = self.carry.drain(..=pos).collect();
            let had_prefix = std::mem::replace(&mut self.line_has_emitted, false);
            self.process_line(&line, had_prefix, &mut out);
        }

        if self.state == FilterState::Prose && !self.carry.is_empty() {
            let hold = hold_position(&self.carry);
            if hold > 0 {
                out.push_str(&self.carry[..hold]);
                self.carry.drain(..hold);
                self.line_has_emitted = true;
            }
        }

        out
    }

    /// Flushes the final (newline-less) line once the stream is complete.
    pub fn finish(&mut self) -> String {
        let line = std::mem::take(&mut self.carry);
        let had_prefix = std::mem::replace(&mut self.line_has_emitted, false);
        let state = std::mem::replace(&mut self.state, FilterState::Prose);

        let mut out = String::new();
        if !line.is_empty() && state == FilterState::Prose {
            self.process_prose_line(&line, had_prefix, &mut out);
            self.state = FilterState::Prose;
        }
        out
    }

    fn process_line(&mut self, line: &str, had_prefix: bool, out: &mut String) {
        match self.state {
            FilterState::Prose => self.process_prose_line(line, had_prefix, out),
            FilterState::AwaitFence => {
                if line.trim().is_empty() {
                    // Whitespace between marker and fence is part of the syntax.
                } else if line.trim_start().starts_with(FENCE) {
                    self.state = FilterState::InFence;
                } else {
                    self.state = FilterState::Prose;
                    self.process_prose_line(line, had_prefix, out);
                }
            }
            FilterState::InFence => {
                if line.starts_with(FENCE) {
                    self.state = FilterState::Prose;
                }
            }
        }
    }

    fn process_prose_line(&mut self, line: &str, had_prefix: bool, out: &mut String) {
        let mut rendered = String::new();
        let mut removed_any = false;
        let mut rest = line;

        while let Some(pos) = rest.find(MARKER_TOKEN) {
            match match_marker(rest, pos) {
                Some(span) => {
                    rendered.push_str(&rest[..pos]);
                    removed_any = true;
                    if span.verb.is_file() {
                        self.state = FilterState::AwaitFence;
                    }
                    rest = &rest[span.end..];
                }
                None => {
                    // The token without a complete marker is ordinary text.
                    let literal_end = pos + MARKER_TOKEN.len();
                    rendered.push_str(&rest[..literal_end]);
                    rest = &rest[literal_end..];
                }
            }
        }
        rendered.push_str(rest);

        if removed_any && rendered.trim().is_empty() && !had_prefix {
            // Nothing but directive syntax on this line; drop it entirely.
            return;
        }
        out.push_str(&rendered);
    }
}

/// Byte offset up to which the current partial line is safe to emit.
///
/// Everything from the first point that could still be (or already is) a
/// marker token must be held until the line resolves.
fn hold_position(carry: &str) -> usize {
    if let Some(pos) = carry.find(MARKER_TOKEN) {
        return pos;
    }
    for len in (1..MARKER_TOKEN.len()).rev() {
        if carry.ends_with(&MARKER_TOKEN[..len]) {
            return carry.len() - len;
        }
    }
    carry.len()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::StreamFilter;
    use crate::MARKER_TOKEN;

    fn filter_all(fragments: &[&str]) -> String {
        let mut filter = StreamFilter::new();
        let mut display = String::new();
        for fragment in fragments {
            display.push_str(&filter.push(fragment));
        }
        display.push_str(&filter.finish());
        display
    }

    const RESPONSE: &str = "Here is the script.\n\n\
        **QUILL_CREATE_FILE: app.py**\n\
        ```python\nprint(\"hi\")\n```\n\
        Run it with:\n\
        **QUILL_RUN_COMMAND: python app.py**\n\
        Done.\n";

    #[test]
    fn removes_directive_syntax_from_whole_response() {
        let display = filter_all(&[RESPONSE]);

        assert_eq!(display, "Here is the script.\n\nRun it with:\nDone.\n");
    }

    #[test]
    fn display_is_invariant_under_arbitrary_fragment_boundaries() {
        let whole = filter_all(&[RESPONSE]);

        for split in 1..RESPONSE.len() {
            if !RESPONSE.is_char_boundary(split) {
                continue;
            }
            let parts = [&RESPONSE[..split], &RESPONSE[split..]];
            let display = filter_all(&parts);
            assert_eq!(display, whole, "split at byte {split}");
            assert!(
                !display.contains(MARKER_TOKEN),
                "marker leaked at split {split}"
            );
        }
    }

    #[test]
    fn display_is_invariant_under_single_byte_fragments() {
        let fragments: Vec<String> = RESPONSE.chars().map(String::from).collect();
        let parts: Vec<&str> = fragments.iter().map(String::as_str).collect();

        assert_eq!(filter_all(&parts), filter_all(&[RESPONSE]));
    }

    #[test]
    fn marker_split_exactly_at_fragment_boundary_never_leaks() {
        let display = filter_all(&["before **QU", "ILL_RUN_COMMAND: ls** after\n"]);

        assert_eq!(display, "before  after\n");
    }

    #[test]
    fn fence_split_at_fragment_boundary_is_still_suppressed() {
        let display = filter_all(&[
            "**QUILL_CREATE_FILE: a.py**\n``",
            "`python\nx = 1\n``",
            "`\nprose again\n",
        ]);

        assert_eq!(display, "prose again\n");
    }

    #[test]
    fn prose_code_fences_pass_through() {
        let text = "Example:\n```rust\nfn main() {}\n```\nThat was it.\n";
        assert_eq!(filter_all(&[text]), text);
    }

    #[test]
    fn bold_text_is_not_mistaken_for_a_marker() {
        let text = "This is **bold** and **QUILL_ alone stays literal.\n";
        assert_eq!(filter_all(&[text]), text);
    }

    #[test]
    fn partial_marker_prefix_is_held_until_resolved() {
        let mut filter = StreamFilter::new();
        let first = filter.push("checking **");
        // The trailing `**` could still become a marker; it must be held.
        assert_eq!(first, "checking ");

        let second = filter.push("bold** text\n");
        assert_eq!(second, "**bold** text\n");
    }

    #[test]
    fn command_marker_at_end_of_stream_without_newline_is_removed() {
        let display = filter_all(&["All set.\n**QUILL_RUN_COMMAND: make test**"]);

        assert_eq!(display, "All set.\n");
    }

    #[test]
    fn marker_midline_keeps_surrounding_prose() {
        let display = filter_all(&["run **QUILL_RUN_COMMAND: ls** now\n"]);

        assert_eq!(display, "run  now\n");
    }
}
