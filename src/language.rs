//! Language codes and their display names.
//!
//! The prompt names languages in English ("Portuguese", not "pt"). The table
//! is closed: codes it doesn't know are passed through unchanged, so an
//! unusual code like `"pt-BR"` or `"xx"` still produces a usable prompt.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages with a known display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Pt,
    Es,
    Fr,
    De,
    It,
}

impl Language {
    /// Every supported language, in menu order.
    pub const ALL: [Language; 6] = [
        Language::En,
        Language::Pt,
        Language::Es,
        Language::Fr,
        Language::De,
        Language::It,
    ];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Pt => "pt",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::It => "it",
        }
    }

    /// English name used in prompts.
    pub fn name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Pt => "Portuguese",
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::De => "German",
            Language::It => "Italian",
        }
    }

    /// Look up a code, ignoring case and surrounding whitespace.
    pub fn from_code(code: &str) -> Option<Language> {
        let code = code.trim();
        Language::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Display name for a language code, or the code itself when unknown.
pub fn display_name(code: &str) -> &str {
    match Language::from_code(code) {
        Some(lang) => lang.name(),
        None => code,
    }
}
