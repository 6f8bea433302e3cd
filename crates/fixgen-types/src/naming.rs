//! Fixture naming conventions.
//!
//! Generated names are part of the public contract: hand-written fixtures refer to
//! `author`, `author__name` or `author__register_user__password` directly.

use once_cell::sync::Lazy;
use regex::Regex;

pub const SEPARATOR: &str = "__";

static ACRONYM_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("acronym boundary pattern"));
static WORD_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z\d])([A-Z])").expect("word boundary pattern"));

/// Joins a model fixture name and an attribute into `model__attr`.
pub fn fixture_name(model: &str, attr: &str) -> String {
    [model, attr].join(SEPARATOR)
}

/// Converts a type name into its lowercase-underscored form (`HTTPServer` -> `http_server`).
pub fn underscore(word: &str) -> String {
    let word = ACRONYM_BOUNDARY.replace_all(word, "${1}_${2}");
    let word = WORD_BOUNDARY.replace_all(&word, "${1}_${2}");
    word.replace('-', "_").to_lowercase()
}
