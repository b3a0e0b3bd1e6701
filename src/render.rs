//! Formatted output: markdown to a standalone, printable HTML document.
//!
//! The stylesheet targets A4 paper so "Print to PDF" from any browser gives a
//! document close to the source layout.

use crate::pipeline::postprocess::normalise_footnotes;
use pulldown_cmark::{html, Options, Parser};
use pulldown_cmark_escape::escape_html;

const STYLESHEET: &str = r#"
@page { size: A4; margin: 2cm; }
body {
  font-family: "Times New Roman", Times, serif;
  font-size: 12pt;
  line-height: 1.5;
  text-align: justify;
  max-width: 17cm;
  margin: 0 auto;
  color: #111;
}
h1 { font-size: 24pt; margin: 0.8em 0 0.4em; text-align: left; }
h2 { font-size: 18pt; margin: 0.8em 0 0.4em; text-align: left; }
h3 { font-size: 14pt; margin: 0.8em 0 0.3em; text-align: left; }
h4, h5, h6 { font-size: 12pt; margin: 0.6em 0 0.3em; text-align: left; }
p { margin: 0 0 0.6em; }
sup { font-size: 0.7em; line-height: 0; }
code, pre { font-family: "Courier New", Courier, monospace; font-size: 10pt; }
pre { background: #f5f5f5; padding: 0.6em; white-space: pre-wrap; }
blockquote { margin: 0.6em 1.5em; color: #444; }
table { border-collapse: collapse; width: 100%; margin: 0.8em 0; font-size: 10pt; }
th, td { border: 1px solid #888; padding: 0.3em 0.5em; text-align: left; }
th { background: #eee; }
img { max-width: 100%; }
hr { border: none; border-top: 1px solid #ccc; margin: 1.2em 0; }
"#;

/// Render `markdown` as a complete HTML page titled `title` in language
/// `lang` (a code such as `"pt"`).
///
/// Footnote markers are rewritten with
/// [`normalise_footnotes`](crate::pipeline::postprocess::normalise_footnotes)
/// first.
pub fn markdown_to_html(markdown: &str, title: &str, lang: &str) -> String {
    let source = normalise_footnotes(markdown);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(&source, options);
    let mut body = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut body, parser);

    format!(
        "<!DOCTYPE html>\n\
<html lang=\"{lang}\">\n\
<head>\n\
<meta charset=\"utf-8\">\n\
<title>{title}</title>\n\
<style>{STYLESHEET}</style>\n\
</head>\n\
<body>\n\
{body}</body>\n\
</html>\n",
        lang = escape(lang),
        title = escape(title),
    )
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    // Writing into a String cannot fail.
    let _ = escape_html(&mut out, s);
    out
}
