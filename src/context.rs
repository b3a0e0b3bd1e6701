//! Context windows: the neighbouring lines shown to the model with each line.
//!
//! Every line is translated on its own, but a lone line is often ambiguous
//! ("Table 3", "Results", a sentence fragment split by OCR). Each prompt
//! therefore carries up to [`CONTEXT_WINDOW_LINES`] non-blank lines from
//! each side:
//!
//! ```text
//!            ┌── Before: already translated (output so far)
//!   line i-3 │
//!   line i-2 │
//!   line i-1 ┘
//!   line i   ◀── the line being translated
//!   line i+1 ┐
//!   line i+2 │
//!   line i+3 └── After: still in the source language (input)
//! ```
//!
//! Blank lines are skipped and do not count toward the limit, so a heading
//! separated from its paragraph by an empty line still sees that paragraph.

use serde::{Deserialize, Serialize};

/// Maximum number of lines in one context window.
pub const CONTEXT_WINDOW_LINES: usize = 3;

/// Preamble for the window of already-translated lines.
pub const BEFORE_PREAMBLE: &str = "Here are the immediately preceding lines, already translated:";

/// Preamble for the window of lines not translated yet.
pub const AFTER_PREAMBLE: &str = "Here are the immediately following lines, not yet translated:";

/// Which side of the current line to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Lines strictly before the index.
    Before,
    /// Lines strictly after the index.
    After,
}

impl Direction {
    fn preamble(self) -> &'static str {
        match self {
            Direction::Before => BEFORE_PREAMBLE,
            Direction::After => AFTER_PREAMBLE,
        }
    }
}

/// Collect up to [`CONTEXT_WINDOW_LINES`] non-blank lines next to `index`.
///
/// The result is always in document order. `index` itself is never included.
/// An `index` past the end of `lines` is allowed: `Before` then scans back
/// from the last line and `After` finds nothing.
pub fn collect_window<S: AsRef<str>>(lines: &[S], index: usize, direction: Direction) -> Vec<&str> {
    let is_content = |line: &&S| !line.as_ref().trim().is_empty();

    match direction {
        Direction::Before => {
            let end = index.min(lines.len());
            let mut window: Vec<&str> = lines[..end]
                .iter()
                .rev()
                .filter(is_content)
                .take(CONTEXT_WINDOW_LINES)
                .map(|l| l.as_ref())
                .collect();
            window.reverse();
            window
        }
        Direction::After => lines
            .iter()
            .skip(index.saturating_add(1))
            .filter(is_content)
            .take(CONTEXT_WINDOW_LINES)
            .map(|l| l.as_ref())
            .collect(),
    }
}

/// Render the context block for one side of `index`.
///
/// Returns an empty string when there are no qualifying lines; the prompt
/// then omits the block entirely.
pub fn select_context<S: AsRef<str>>(lines: &[S], index: usize, direction: Direction) -> String {
    let window = collect_window(lines, index, direction);
    if window.is_empty() {
        return String::new();
    }
    format!("{}\n{}", direction.preamble(), window.join("\n"))
}
