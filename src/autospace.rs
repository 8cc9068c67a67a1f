//! Inserts a space between CJK characters and adjacent Latin letters or
//! digits in rendered HTML, e.g. `使用Rust编写` becomes `使用 Rust 编写`.
//! Only text nodes are touched; tags, and everything inside `<pre>` and
//! `<code>` elements, are copied through unchanged.

use crate::util::is_cjk;
use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[^>]+>").unwrap());
static PRE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^<pre[\s>]").unwrap());
static PRE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^</pre>").unwrap());
static CODE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^<code[\s>]").unwrap());
static CODE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^</code>").unwrap());

fn is_ans(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// Spaces a single text node.
pub fn space_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if let Some(p) = prev {
            if (is_cjk(p) && is_ans(c)) || (is_ans(p) && is_cjk(c)) {
                out.push(' ');
            }
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Spaces every text node of `html` that is not inside `<pre>` or `<code>`.
/// Nesting of both elements is tracked with counters, and a stray closing tag
/// never drives a counter below zero.
pub fn autospace(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + html.len() / 16);
    let mut in_pre = 0usize;
    let mut in_code = 0usize;
    let mut last = 0;

    fn text(out: &mut String, s: &str, skip: bool) {
        if skip {
            out.push_str(s);
        } else {
            out.push_str(&space_text(s));
        }
    }

    for m in TAG.find_iter(html) {
        text(&mut out, &html[last..m.start()], in_pre > 0 || in_code > 0);
        let tag = m.as_str();
        if PRE_OPEN.is_match(tag) {
            in_pre += 1;
        } else if PRE_CLOSE.is_match(tag) {
            in_pre = in_pre.saturating_sub(1);
        }
        if CODE_OPEN.is_match(tag) {
            in_code += 1;
        } else if CODE_CLOSE.is_match(tag) {
            in_code = in_code.saturating_sub(1);
        }
        out.push_str(tag);
        last = m.end();
    }
    text(&mut out, &html[last..], in_pre > 0 || in_code > 0);
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_space_text() {
        assert_eq!(space_text("测试ABC测试"), "测试 ABC 测试");
        assert_eq!(space_text("第3章"), "第 3 章");
        assert_eq!(space_text("已经 spaced 了"), "已经 spaced 了");
        assert_eq!(space_text("カタカナabc"), "カタカナ abc");
        assert_eq!(space_text("plain text"), "plain text");
    }

    #[test]
    fn test_skips_code_and_pre() {
        let html = "<p>用Rust写</p><pre><code>let x = \"中文abc\";</code></pre><p><code>a中</code>b中</p>";
        assert_eq!(
            autospace(html),
            "<p>用 Rust 写</p><pre><code>let x = \"中文abc\";</code></pre><p><code>a中</code>b 中</p>"
        );
    }

    #[test]
    fn test_tags_are_untouched() {
        let html = r#"<a href="/中文abc">链接link</a>"#;
        assert_eq!(autospace(html), r#"<a href="/中文abc">链接 link</a>"#);
    }

    #[test]
    fn test_stray_close_does_not_underflow() {
        assert_eq!(autospace("</code>中a"), "</code>中 a");
    }
}
