//! Small helpers shared by the rest of the crate: opening files with a useful
//! error message, slugifying, HTML escaping and CJK detection.

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::path::Path;

pub fn open(path: &Path, kind: &str) -> Result<File> {
    match File::open(path) {
        Err(e) => Err(anyhow!("Opening {} file `{}`: {}", kind, path.display(), e)),
        Ok(file) => Ok(file),
    }
}

/// Converts `s` into an identifier suitable for URLs and HTML ids: the input
/// is lower-cased, every run of characters outside `[a-z0-9]` and the CJK
/// unified ideographs is collapsed into a single `-`, and leading/trailing
/// `-` are trimmed.
///
/// ```
/// assert_eq!(paper::util::slugify("Hello, World!"), "hello-world");
/// assert_eq!(paper::util::slugify("Rust 与 中文"), "rust-与-中文");
/// ```
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_dash = false;
    for c in s.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || is_cjk_ideograph(c) {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Escapes `&`, `<`, `>` and `"` the same way the Markdown renderer does.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    // writing into a `String` can't fail
    let _ = pulldown_cmark::escape::escape_html(&mut out, s);
    out
}

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Removes everything that looks like an HTML tag.
pub fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, "").into_owned()
}

/// True for the CJK unified ideographs block (U+4E00..U+9FFF).
pub fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// True for the broader set of CJK scripts that take part in auto-spacing:
/// radicals, kana, bopomofo, enclosed letters, ideographs (including
/// extension A and compatibility forms) and vertical forms.
pub fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{2e80}'..='\u{2eff}'
        | '\u{2f00}'..='\u{2fdf}'
        | '\u{3040}'..='\u{309f}'
        | '\u{30a0}'..='\u{30ff}'
        | '\u{3100}'..='\u{312f}'
        | '\u{3200}'..='\u{32ff}'
        | '\u{3400}'..='\u{4dbf}'
        | '\u{4e00}'..='\u{9fff}'
        | '\u{f900}'..='\u{faff}'
        | '\u{fe30}'..='\u{fe4f}')
}
