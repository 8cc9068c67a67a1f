//! The Markdown extension pipeline. [`Processor::render`] turns a document
//! body into HTML plus its table of contents in these steps:
//!
//! 1. callouts are swapped for placeholders ([`crate::callout`])
//! 2. directive tags are swapped for placeholders ([`crate::directive`])
//! 3. the [`Converter`] renders the Markdown; every heading gets an id and
//!    a table-of-contents entry ([`crate::toc`])
//! 4. placeholders are restored: callout bodies are rendered recursively and
//!    wrapped, directives are expanded into their HTML fragments
//! 5. CJK/Latin auto-spacing runs over the text nodes
//!    ([`crate::autospace`])
//!
//! None of the steps fail. Syntax that doesn't match one of the recognized
//! forms ends up in the output as ordinary text.

use crate::autospace::autospace;
use crate::callout::{self, Callout};
use crate::directive::{self, Directives};
use crate::markdown::{CmarkConverter, Converter, Heading};
use crate::toc::{Toc, TocEntry};
use crate::util::escape_html;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// The last alternative is a directive placeholder the converter escaped
// because it sat in a code span or indented code block.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"<p>\s*<!--PAPER_(CALLOUT|COMPONENT|BLOCK)_(\d+)-->\s*</p>|<!--PAPER_(CALLOUT|COMPONENT|BLOCK)_(\d+)-->|&lt;!--PAPER_(COMPONENT|BLOCK)_(\d+)--&gt;",
    )
    .unwrap()
});

/// The output of rendering one document body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// Renders Markdown with the extensions described in the module docs. The
/// processor holds no per-document state, so one instance can render any
/// number of documents, from any number of threads if `C` allows it.
#[derive(Clone, Debug, Default)]
pub struct Processor<C = CmarkConverter> {
    converter: C,
}

impl<C: Converter> Processor<C> {
    pub fn new(converter: C) -> Processor<C> {
        Processor { converter }
    }

    pub fn render(&self, body: &str) -> Rendered {
        let body = body.replace("\r\n", "\n");
        let mut toc = Toc::new();
        let html = self.render_fragment(&body, &mut toc, true);
        Rendered {
            html: autospace(&html),
            toc: toc.into_entries(),
        }
    }

    /// Steps 1 through 4 for `src`. Callout bodies come back through here,
    /// sharing `toc` so their heading ids stay unique, with `record` unset so
    /// their headings stay out of the table of contents.
    fn render_fragment(&self, src: &str, toc: &mut Toc, record: bool) -> String {
        let (src, callouts) = callout::extract(src);
        let (src, directives) = directive::extract(&src);
        let html = self
            .converter
            .convert(&src, &mut |heading: &Heading| toc.heading(heading, record));
        self.restore(&html, &callouts, &directives, toc)
    }

    fn restore(
        &self,
        html: &str,
        callouts: &[Callout],
        directives: &Directives,
        toc: &mut Toc,
    ) -> String {
        PLACEHOLDER
            .replace_all(html, |c: &Captures| {
                let escaped = c.get(5).is_some();
                let kind = c.get(1).or_else(|| c.get(3)).or_else(|| c.get(5));
                let index = c.get(2).or_else(|| c.get(4)).or_else(|| c.get(6));
                let (kind, index) = match (kind, index) {
                    (Some(kind), Some(index)) => (kind.as_str(), index.as_str()),
                    _ => return c[0].to_owned(),
                };
                let index: usize = match index.parse() {
                    Ok(i) => i,
                    Err(_) => return c[0].to_owned(),
                };
                let restored = match (kind, escaped) {
                    ("CALLOUT", _) => callouts.get(index).map(|callout| {
                        callout.to_html(&self.render_fragment(&callout.body, toc, false))
                    }),
                    ("COMPONENT", false) => {
                        directives.single(index).map(|d| directive::expand(&d))
                    }
                    ("COMPONENT", true) => {
                        directives.single(index).map(|d| escape_html(&d.source()))
                    }
                    (_, false) => directives.block(index).map(directive::expand),
                    (_, true) => directives.block(index).map(|d| escape_html(&d.source())),
                };
                restored.unwrap_or_else(|| c[0].to_owned())
            })
            .into_owned()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use pulldown_cmark::{html, Parser};

    fn render(md: &str) -> Rendered {
        Processor::new(CmarkConverter).render(md)
    }

    #[test]
    fn test_plain_markdown_passes_through() {
        let md = "Some *emphasis*, a [link](https://example.com) and `code`.\n\n\
                  > a quote\n\n\
                  | a | b |\n|---|---|\n| 1 | 2 |\n\n\
                  ```rust\nfn main() {}\n```\n";
        let mut wanted = String::new();
        html::push_html(&mut wanted, Parser::new_ext(md, CmarkConverter::options()));
        assert_eq!(render(md).html, wanted);
    }

    #[test]
    fn test_headings_match_converter_with_id_hook() {
        let md = "# Hello World\n\ntext\n\n## Second part\n";
        let mut toc = Toc::new();
        let wanted =
            CmarkConverter.convert(md, &mut |h: &Heading| toc.heading(h, true));
        let rendered = render(md);
        assert_eq!(rendered.html, wanted);
        assert_eq!(
            rendered.toc,
            vec![
                TocEntry {
                    id: "hello-world".to_owned(),
                    text: "Hello World".to_owned(),
                    depth: 1,
                },
                TocEntry {
                    id: "second-part".to_owned(),
                    text: "Second part".to_owned(),
                    depth: 2,
                },
            ]
        );
    }

    #[test]
    fn test_toc_is_per_call() {
        let p = Processor::<CmarkConverter>::default();
        let first = p.render("## A\n\n## B\n");
        let second = p.render("## C\n");
        assert_eq!(first.toc.len(), 2);
        assert_eq!(second.toc.len(), 1);
        assert_eq!(second.toc[0].id, "c");
    }

    #[test]
    fn test_button_survives_emphasis() {
        let md = r#"**Click {% btn label="Go" href="/x" %} _now_**"#;
        let html = render(md).html;
        assert!(
            html.contains(r#"<a class="paper-btn" href="/x">Go</a>"#),
            "{}",
            html
        );
        assert!(!html.contains("{%"));
    }

    #[test]
    fn test_standalone_directive_replaces_paragraph() {
        let html = render("{% btn label=\"Go\" %}\n").html;
        assert_eq!(html, "<button class=\"paper-btn\">Go</button>\n");
    }

    #[test]
    fn test_paired_card() {
        let md = "{% card title=\"Hi\" %}\n<b>foot</b>\n{% endcard %}\n\nafter\n";
        let html = render(md).html;
        assert_eq!(
            html,
            "<div class=\"paper-card\"><p class=\"card-title\">Hi</p><hr class=\"card-divider\" /><div class=\"card-footer\"><b>foot</b></div></div>\n<p>after</p>\n"
        );
    }

    #[test]
    fn test_unpaired_end_tag_passes_through() {
        let html = render("{% card title=\"A\" %}\n\n{% btn %}\n\n{% endcard %}\n").html;
        assert!(html.contains("<div class=\"paper-card\"><p class=\"card-title\">A</p></div>"));
        assert!(html.contains("<button class=\"paper-btn\">Button</button>"));
        assert!(html.contains("{% endcard %}"));
    }

    #[test]
    fn test_directive_in_code_block_is_literal() {
        let html = render("```\n{% btn label=\"x\" %}\n```\n").html;
        assert_eq!(html, "<pre><code>{% btn label=&quot;x&quot; %}\n</code></pre>\n");
    }

    #[test]
    fn test_directive_in_code_span_is_literal() {
        let html = render("Write `{% btn label=\"Go\" %}` to get a button.\n").html;
        assert_eq!(
            html,
            "<p>Write <code>{% btn label=&quot;Go&quot; %}</code> to get a button.</p>\n"
        );

        let html = render("Use `{% card %}x{% endcard %}` for cards.\n").html;
        assert_eq!(
            html,
            "<p>Use <code>{% card %}x{% endcard %}</code> for cards.</p>\n"
        );
    }

    #[test]
    fn test_directive_in_indented_code_is_literal() {
        let html = render("    {% btn label=\"Go\" %}\n").html;
        assert_eq!(html, "<pre><code>{% btn label=&quot;Go&quot; %}\n</code></pre>\n");
    }

    #[test]
    fn test_callout_in_code_block_is_literal() {
        let html = render("```md\n:::note\nhello\n:::\n```\n").html;
        assert_eq!(
            html,
            "<pre><code class=\"language-md\">:::note\nhello\n:::\n</code></pre>\n"
        );

        let html = render("```md\n> [!TIP]\n> hi\n```\n").html;
        assert_eq!(
            html,
            "<pre><code class=\"language-md\">&gt; [!TIP]\n&gt; hi\n</code></pre>\n"
        );
    }

    #[test]
    fn test_callouts() {
        let md = ":::warning\nBe **careful**.\n:::\n\n> [!TIP]\n> Use `cargo`.\n";
        let html = render(md).html;
        assert!(html.contains(
            "<span>Warning</span></div><div class=\"callout-body\"><p>Be <strong>careful</strong>.</p>\n</div></div>"
        ), "{}", html);
        assert!(html.contains(
            "<span>Tip</span></div><div class=\"callout-body\"><p>Use <code>cargo</code>.</p>\n</div></div>"
        ), "{}", html);
        assert!(!html.contains("PAPER_CALLOUT"));
    }

    #[test]
    fn test_callout_with_custom_title_and_directive() {
        let md = ":::note[读我]\n{% btn label=\"Go\" href=\"/go\" %}\n\n## Inside\n:::\n\n## Outside\n";
        let rendered = render(md);
        assert!(rendered.html.contains("<span>读我</span>"));
        assert!(rendered.html.contains(r#"<a class="paper-btn" href="/go">Go</a>"#));
        assert!(rendered.html.contains("<h2 id=\"inside\">Inside</h2>"));
        assert_eq!(rendered.toc.len(), 1);
        assert_eq!(rendered.toc[0].id, "outside");
    }

    #[test]
    fn test_autospace_applies_outside_code() {
        let html = render("测试ABC测试\n\n`测试ABC测试`\n").html;
        assert_eq!(
            html,
            "<p>测试 ABC 测试</p>\n<p><code>测试ABC测试</code></p>\n"
        );
    }

    #[test]
    fn test_malformed_syntax_is_literal() {
        let html = render("{% btn label=\"x\"\n\n:::note\nunclosed\n").html;
        assert!(html.contains("{% btn label=&quot;x&quot;"), "{}", html);
        assert!(html.contains(":::note"));
    }

    #[test]
    fn test_crlf_input() {
        let html = render(":::tip\r\nwindows\r\n:::\r\n").html;
        assert!(html.contains("<div class=\"callout-body\"><p>windows</p>\n</div>"));
    }
}
