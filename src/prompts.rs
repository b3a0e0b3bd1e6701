//! System prompts for line-by-line translation.
//!
//! The prompt is rebuilt for every line because the two context windows
//! change as the cursor moves. Everything else is fixed template text kept
//! here, so tests can inspect exactly what the model receives.

use crate::language::display_name;

/// Last line of every prompt. The line to translate follows as the user
/// message.
pub const LINE_SENTINEL: &str = "The line you must translate will be sent as the next message.";

/// Compose the system prompt for one line.
///
/// `before_context` and `after_context` are rendered blocks from
/// [`crate::context::select_context`]; an empty block is left out completely.
pub fn compose_prompt(
    source_name: &str,
    target_name: &str,
    before_context: &str,
    after_context: &str,
) -> String {
    let mut prompt = format!(
        "You are an expert translator from {source_name} to {target_name}.\n\
I will give you one line of a document written in {source_name}; translate it into {target_name}.\n\
The line can be any part of the document: a paragraph, a title, a subtitle, a list item or the caption of a table.\n\
\n\
Rules:\n\
- Respond with the translation of the line only. No commentary, no explanations, no quotes around it.\n\
- Preserve the formatting exactly, including Markdown syntax (#, *, -, |, links, footnote markers).\n\
- Keep technical terms, code, formulas, names and anything that should not be translated verbatim.\n\
- Surrounding lines are given only as context to resolve ambiguity. Translate only the indicated line.\n"
    );

    for block in [before_context, after_context] {
        if !block.is_empty() {
            prompt.push('\n');
            prompt.push_str(block);
            prompt.push('\n');
        }
    }

    prompt.push('\n');
    prompt.push_str(LINE_SENTINEL);
    prompt
}

/// Resolve both language codes and compose the prompt.
pub fn build_prompt(
    source_code: &str,
    target_code: &str,
    before_context: &str,
    after_context: &str,
) -> String {
    compose_prompt(
        display_name(source_code),
        display_name(target_code),
        before_context,
        after_context,
    )
}
