//! Filesystem-safe names derived from page titles.

use std::sync::LazyLock;

use regex::Regex;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]+").expect("static pattern"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static pattern"));
static UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_{2,}").expect("static pattern"));

/// Turn a title into a filename stem.
///
/// Runs of punctuation become `_`, runs of whitespace become `-`, doubled
/// underscores collapse, and the result is cut to `limit` characters.
/// Applying it twice gives the same result as applying it once.
///
/// `-` is left out of the punctuation class on purpose. Whitespace turns
/// into `-`, so replacing `-` as well would rewrite an already sanitized
/// name on a second pass and break idempotence.
pub fn sanitize_filename(title: &str, limit: usize) -> String {
    let name = NON_WORD.replace_all(title, "_");
    let name = WHITESPACE.replace_all(&name, "-");
    let name = UNDERSCORES.replace_all(&name, "_");
    name.chars().take(limit).collect()
}
