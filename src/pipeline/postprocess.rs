//! Post-processing: deterministic cleanup around translation.
//!
//! Two passes, at two points in the pipeline:
//!
//! - [`clean_source`] runs on OCR output **before** translation. It only
//!   touches whitespace and invisible characters, so the translator sees one
//!   logical line per `\n` and no stray `\r` ends up in a prompt.
//! - [`normalise_source`] is the subset applied to caller-supplied markdown.
//!   It never adds or removes a line, so trailing-space hard breaks and runs
//!   of blank lines reach the translator as written.
//! - [`finish_markdown`] runs on every markdown file written out; it only
//!   guarantees a single final newline.
//!
//! Footnote markers are rewritten by [`normalise_footnotes`] just before
//! HTML rendering. The markdown files keep the markers the OCR produced.
//!
//! ## Rule Order
//!
//! Line endings are normalised first: every later rule splits on `\n`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Clean OCR markdown before it is split into lines.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF and lone CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 2
pub fn clean_source(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    collapse_blank_lines(&s)
}

/// Normalise caller-supplied markdown without changing its line structure.
///
/// Applies rules 1 and 2 of [`clean_source`] only.
pub fn normalise_source(input: &str) -> String {
    remove_invisible_chars(&normalise_line_endings(input))
}

/// Prepare a markdown document for writing to disk.
pub fn finish_markdown(input: &str) -> String {
    ensure_final_newline(input)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .split('\n')
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Final newline ────────────────────────────────────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Footnotes ────────────────────────────────────────────────────────────────
//
// OCR emits footnote references either as markdown footnotes (`[^3]`) or as
// an empty LaTeX base with a superscript (`${ }^{3}$`). Neither survives
// rendering well when the definition is missing, so both become `<sup>3</sup>`.

static RE_FOOTNOTE_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\^(\d+)\]").unwrap());
static RE_LATEX_SUPERSCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{\s*\}\^\{(\d+)\}\$").unwrap());

/// Rewrite numeric footnote markers as HTML superscripts.
pub fn normalise_footnotes(input: &str) -> String {
    let s = RE_FOOTNOTE_REF.replace_all(input, "<sup>$1</sup>");
    RE_LATEX_SUPERSCRIPT
        .replace_all(&s, "<sup>$1</sup>")
        .into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_trim_trailing_whitespace_keeps_blank_lines() {
        assert_eq!(
            trim_trailing_whitespace("  hello   \n \nworld  \n"),
            "  hello\n\nworld\n"
        );
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\n\nb"), "a\n\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_remove_invisible() {
        assert_eq!(remove_invisible_chars("\u{FEFF}he\u{200B}llo"), "hello");
    }

    #[test]
    fn test_ensure_final_newline() {
        assert_eq!(finish_markdown("hello"), "hello\n");
        assert_eq!(finish_markdown("hello\n\n\n"), "hello\n");
        assert_eq!(finish_markdown(""), "\n");
    }

    #[test]
    fn test_clean_source_full_pipeline() {
        let raw = "\u{FEFF}# Title  \r\n\r\n\r\n\r\n\r\nBody\u{00AD}text\r\n";
        assert_eq!(clean_source(raw), "# Title\n\n\nBodytext\n");
    }

    #[test]
    fn test_normalise_source_keeps_line_structure() {
        let raw = "\u{FEFF}Para\r\n\r\n\r\n\r\n\r\nNext line  \r\nhard\u{200B} break";
        let out = normalise_source(raw);
        assert_eq!(out, "Para\n\n\n\n\nNext line  \nhard break");
        assert_eq!(out.split('\n').count(), raw.split("\r\n").count());
    }

    #[test]
    fn test_footnote_markdown_ref() {
        assert_eq!(
            normalise_footnotes("as shown[^12] and[^3]."),
            "as shown<sup>12</sup> and<sup>3</sup>."
        );
    }

    #[test]
    fn test_footnote_latex_superscript() {
        assert_eq!(normalise_footnotes("word${ }^{7}$ next"), "word<sup>7</sup> next");
        assert_eq!(normalise_footnotes("word${}^{7}$"), "word<sup>7</sup>");
    }

    #[test]
    fn test_footnote_leaves_other_markup() {
        let s = "[^note] and $x^{2}$ and [link](x)";
        assert_eq!(normalise_footnotes(s), s);
    }
}
