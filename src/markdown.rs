//! The Markdown-to-HTML boundary. [`Converter`] is the pluggable capability
//! the extension pipeline ([`crate::processor`]) drives; [`CmarkConverter`]
//! implements it with [`pulldown_cmark`].

use once_cell::sync::Lazy;
use pulldown_cmark::{html, Event, Options, Parser, Tag};
use regex::Regex;
use std::ops::Range;

static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})").unwrap());

/// A heading as seen by a heading hook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heading {
    /// The heading's content rendered as inline HTML.
    pub text: String,

    /// The heading level, 1 through 6.
    pub depth: u32,

    /// The heading's plain text with all markup removed. Heading ids are
    /// derived from this.
    pub raw_text: String,
}

/// Converts Markdown into HTML, asking `on_heading` for the HTML of every
/// heading (in document order).
pub trait Converter {
    fn convert(&self, markdown: &str, on_heading: &mut dyn FnMut(&Heading) -> String) -> String;
}

/// A heading hook that emits the heading unchanged.
pub fn plain_heading(heading: &Heading) -> String {
    format!("<h{0}>{1}</h{0}>\n", heading.depth, heading.text)
}

/// [`Converter`] backed by [`pulldown_cmark`] with the GitHub-flavoured
/// extensions (tables, footnotes, strikethrough and task lists) enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct CmarkConverter;

impl CmarkConverter {
    pub fn options() -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);
        options
    }
}

impl Converter for CmarkConverter {
    fn convert(&self, markdown: &str, on_heading: &mut dyn FnMut(&Heading) -> String) -> String {
        let mut events: Vec<Event> = Vec::new();

        // Heading events are buffered until the heading closes so the hook
        // can see the whole heading; everything else streams through.
        let mut heading: Option<(u32, Vec<Event>)> = None;
        for ev in Parser::new_ext(markdown, Self::options()) {
            match ev {
                Event::Start(Tag::Heading(depth)) if heading.is_none() => {
                    heading = Some((depth, Vec::new()));
                }
                Event::End(Tag::Heading(_)) if heading.is_some() => {
                    if let Some((depth, inner)) = heading.take() {
                        let raw_text = raw_text(&inner);
                        let mut text = String::new();
                        html::push_html(&mut text, inner.into_iter());
                        let tag = on_heading(&Heading {
                            text,
                            depth,
                            raw_text,
                        });
                        events.push(Event::Html(tag.into()));
                    }
                }
                ev => match heading.as_mut() {
                    Some((_, inner)) => inner.push(ev),
                    None => events.push(ev),
                },
            }
        }

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }
}

fn raw_text(events: &[Event]) -> String {
    let mut s = String::new();
    for ev in events {
        match ev {
            Event::Text(t) | Event::Code(t) => s.push_str(t),
            Event::SoftBreak | Event::HardBreak => s.push(' '),
            _ => {}
        }
    }
    s
}

/// The byte ranges of the fenced code blocks in `src`, fence lines
/// included. An unclosed fence runs to the end of the text.
pub fn code_fences(src: &str) -> Vec<Range<usize>> {
    let mut fences = Vec::new();
    let mut open: Option<(usize, &str)> = None;
    let mut offset = 0;
    for line in src.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        match open {
            None => {
                if let Some(marker) = FENCE.captures(line).and_then(|c| c.get(1)) {
                    open = Some((start, marker.as_str()));
                }
            }
            Some((fence_start, marker)) => {
                let trimmed = line.trim();
                let closes = trimmed.len() >= marker.len()
                    && trimmed.chars().all(|ch| Some(ch) == marker.chars().next());
                if closes {
                    fences.push(fence_start..offset);
                    open = None;
                }
            }
        }
    }
    if let Some((start, _)) = open {
        fences.push(start..src.len());
    }
    fences
}

/// Calls `f` on every stretch of `src` outside fenced code blocks and copies
/// the fenced code blocks through unchanged.
pub fn outside_code_fences(src: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(src.len());
    let mut last = 0;
    for fence in code_fences(src) {
        out.push_str(&f(&src[last..fence.start]));
        out.push_str(&src[fence.clone()]);
        last = fence.end;
    }
    out.push_str(&f(&src[last..]));
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_hook_matches_pulldown() {
        let md = "# Title\n\nSome *text*.\n\n## `code` heading\n\n- a\n- b\n";
        let mut wanted = String::new();
        html::push_html(&mut wanted, Parser::new_ext(md, CmarkConverter::options()));
        assert_eq!(CmarkConverter.convert(md, &mut plain_heading), wanted);
    }

    #[test]
    fn test_heading_hook_sees_headings_in_order() {
        let md = "# One\n\ntext\n\n### Two *em* `c`\n";
        let mut seen = Vec::new();
        let html = CmarkConverter.convert(md, &mut |h: &Heading| {
            seen.push(h.clone());
            format!("<h{0} id=\"x\">{1}</h{0}>\n", h.depth, h.text)
        });
        assert_eq!(
            seen,
            vec![
                Heading {
                    text: "One".to_owned(),
                    depth: 1,
                    raw_text: "One".to_owned(),
                },
                Heading {
                    text: "Two <em>em</em> <code>c</code>".to_owned(),
                    depth: 3,
                    raw_text: "Two em c".to_owned(),
                },
            ]
        );
        assert!(html.contains("<h3 id=\"x\">Two <em>em</em> <code>c</code></h3>"));
    }

    #[test]
    fn test_code_fences() {
        let src = "a\n```rust\nx\n```\nb\n  ~~~~\n```\n~~~~\n````\nopen";
        let fences = code_fences(src);
        assert_eq!(fences.len(), 3);
        assert_eq!(&src[fences[0].clone()], "```rust\nx\n```\n");
        assert_eq!(&src[fences[1].clone()], "  ~~~~\n```\n~~~~\n");
        assert_eq!(&src[fences[2].clone()], "````\nopen");
    }

    #[test]
    fn test_outside_code_fences() {
        let out = outside_code_fences("a\n```\na\n```\na", |s| s.replace('a', "b"));
        assert_eq!(out, "b\n```\na\n```\nb");
    }
}
