//! Shortcode-style directives:
//!
//! ```md
//! {% btn label="Go" href="/x" style="primary" %}
//!
//! {% card icon="📦" title="Release" %}
//! Download it <a href="/dl">here</a>.
//! {% endcard %}
//! ```
//!
//! [`extract`] replaces every directive tag with a placeholder comment
//! before the Markdown conversion so attribute values never pass through the
//! converter's escaping, then merges each opening tag directly followed by
//! its `end` tag into one paired placeholder. [`expand`] turns the stored
//! text back into HTML once the converter is done.

use crate::markdown::outside_code_fences;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{%.*?%\}").unwrap());

static HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A\{%\s*([A-Za-z_][\w-]*)(.*?)%\}").unwrap());

static ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"([A-Za-z_][\w-]*)="([^"]*)""#).unwrap());

/// A directive tag broken into its name and attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub attrs: HashMap<String, String>,
}

impl Directive {
    /// Parses a single `{% name key="value" … %}` tag. Returns `None` when
    /// `tag` has no recognizable name.
    pub fn parse(tag: &str) -> Option<Directive> {
        let head = HEAD.captures(tag)?;
        let attrs = ATTR
            .captures_iter(head.get(2)?.as_str())
            .map(|c| (c[1].to_owned(), c[2].to_owned()))
            .collect();
        Some(Directive {
            name: head[1].to_owned(),
            attrs,
        })
    }

    /// The attribute value for `key`, or `""`.
    pub fn get(&self, key: &str) -> &str {
        self.attrs.get(key).map(String::as_str).unwrap_or("")
    }

    fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.get(key) {
            "" => default,
            v => v,
        }
    }
}

/// One extracted piece of directive source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extracted {
    /// A lone tag, kept verbatim.
    Single(String),

    /// An opening tag, the literal text up to its closing tag, and the
    /// closing tag.
    Paired {
        open: String,
        body: String,
        close: String,
    },
}

impl Extracted {
    /// The tag text as written, with any paired body.
    pub fn source(&self) -> String {
        match self {
            Extracted::Single(tag) => tag.clone(),
            Extracted::Paired { open, body, close } => format!("{}{}{}", open, body, close),
        }
    }
}

pub fn placeholder(index: usize) -> String {
    format!("<!--PAPER_COMPONENT_{}-->", index)
}

pub fn block_placeholder(index: usize) -> String {
    format!("<!--PAPER_BLOCK_{}-->", index)
}

/// The directives pulled out of a document, keyed by placeholder index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Directives {
    /// Lone tags, at the index used in their `PAPER_COMPONENT_` placeholder.
    /// Entries consumed by a pair are `None`.
    pub singles: Vec<Option<String>>,

    /// Merged pairs, keyed by the index of their opening tag, which is also
    /// the index in their `PAPER_BLOCK_` placeholder.
    pub blocks: HashMap<usize, Extracted>,
}

impl Directives {
    pub fn single(&self, index: usize) -> Option<Extracted> {
        self.singles
            .get(index)
            .and_then(Option::as_ref)
            .map(|tag| Extracted::Single(tag.clone()))
    }

    pub fn block(&self, index: usize) -> Option<&Extracted> {
        self.blocks.get(&index)
    }
}

/// Replaces every directive tag in `src` with a placeholder. Tags inside
/// fenced code blocks are left as written. Tags inside code spans and
/// indented code are still replaced; the converter escapes those
/// placeholders and [`crate::processor`] puts the escaped tag text back.
///
/// An opening tag whose very next tag is its `end` counterpart (`card` and
/// `endcard`) is merged with it, together with the text between the two,
/// into a single `PAPER_BLOCK_` placeholder. Any other tag, including an
/// `end` tag without a directly preceding opener, stays a lone
/// `PAPER_COMPONENT_` placeholder.
pub fn extract(src: &str) -> (String, Directives) {
    let mut singles: Vec<Option<String>> = Vec::new();
    let tokenized = outside_code_fences(src, |segment| {
        TAG.replace_all(segment, |c: &regex::Captures| {
            singles.push(Some(c[0].to_owned()));
            placeholder(singles.len() - 1)
        })
        .into_owned()
    });

    let mut directives = Directives {
        singles,
        blocks: HashMap::new(),
    };
    if directives.singles.len() < 2 {
        return (tokenized, directives);
    }

    let mut out = String::with_capacity(tokenized.len());
    let mut rest = tokenized.as_str();
    let mut i = 0;
    while i < directives.singles.len() {
        let open_key = placeholder(i);
        let open_at = match rest.find(&open_key) {
            Some(at) => at,
            None => break,
        };
        let after_open = &rest[open_at + open_key.len()..];
        let close_key = placeholder(i + 1);
        let paired = match (
            directives.singles.get(i).and_then(Option::as_ref),
            directives.singles.get(i + 1).and_then(Option::as_ref),
            after_open.find(&close_key),
        ) {
            (Some(open), Some(close), Some(close_at)) if closes(open, close) => {
                Some((open.clone(), close.clone(), close_at))
            }
            _ => None,
        };
        match paired {
            Some((open, close, close_at)) => {
                tracing::trace!(index = i, "merging paired directive");
                out.push_str(&rest[..open_at]);
                out.push_str(&block_placeholder(i));
                let body = after_open[..close_at].to_owned();
                directives.blocks.insert(i, Extracted::Paired { open, body, close });
                directives.singles[i] = None;
                directives.singles[i + 1] = None;
                rest = &after_open[close_at + close_key.len()..];
                i += 2;
            }
            None => {
                out.push_str(&rest[..open_at + open_key.len()]);
                rest = after_open;
                i += 1;
            }
        }
    }
    out.push_str(rest);
    (out, directives)
}

/// Whether `close` is the `end` tag for the directive opened by `open`.
fn closes(open: &str, close: &str) -> bool {
    match (Directive::parse(open), Directive::parse(close)) {
        (Some(open), Some(close)) => {
            !open.name.starts_with("end") && close.name == format!("end{}", open.name)
        }
        _ => false,
    }
}

/// Expands extracted directive source into HTML. Unknown names and
/// malformed tags are returned as written.
pub fn expand(extracted: &Extracted) -> String {
    let (tag, body) = match extracted {
        Extracted::Single(tag) => (tag.as_str(), None),
        Extracted::Paired { open, body, .. } => (open.as_str(), Some(body.as_str())),
    };
    let directive = match Directive::parse(tag) {
        Some(d) => d,
        None => return extracted.source(),
    };
    match (directive.name.as_str(), body) {
        ("player", None) => player(&directive),
        ("card", body) => card(&directive, body),
        ("counter", None) => counter(&directive),
        ("btn", None) => button(&directive),
        (name, _) => {
            tracing::debug!(name, "leaving unknown directive unexpanded");
            extracted.source()
        }
    }
}

fn player(d: &Directive) -> String {
    const KEYS: &[&str] = &[
        "src", "title", "artist", "cover", "loop", "autoplay", "volume", "loopBtn",
    ];
    let data: Vec<String> = KEYS
        .iter()
        .filter_map(|k| match d.get(k) {
            "" => None,
            v => Some(format!(r#"data-{}="{}""#, k.to_lowercase(), v)),
        })
        .collect();
    format!(r#"<div class="paper-player" {}></div>"#, data.join(" "))
}

fn card(d: &Directive, body: Option<&str>) -> String {
    let class = match d.get("align") {
        "left" => " card-left",
        "right" => " card-right",
        _ => "",
    };
    let mut out = format!(r#"<div class="paper-card{}""#, class);
    match d.get("style") {
        "" => {}
        style => out.push_str(&format!(r#" style="{}""#, style)),
    }
    out.push('>');
    for (key, open, close) in [
        ("icon", r#"<div class="card-icon">"#, "</div>"),
        ("title", r#"<p class="card-title">"#, "</p>"),
        ("subtitle", r#"<p class="card-subtitle">"#, "</p>"),
        ("text", r#"<p class="card-text">"#, "</p>"),
    ] {
        match d.get(key) {
            "" => {}
            v => {
                out.push_str(open);
                out.push_str(v);
                out.push_str(close);
            }
        }
    }
    if let Some(body) = body.map(str::trim).filter(|b| !b.is_empty()) {
        out.push_str(r#"<hr class="card-divider" /><div class="card-footer">"#);
        out.push_str(body);
        out.push_str("</div>");
    }
    out.push_str("</div>");
    out
}

fn counter(d: &Directive) -> String {
    format!(
        r#"<div class="paper-counter-btn" data-key="{}" data-label="{}" data-icon="{}"></div>"#,
        d.get_or("key", "paper_counter"),
        d.get_or("label", "Click"),
        d.get("icon"),
    )
}

fn button(d: &Directive) -> String {
    let mut class = String::from("paper-btn");
    for (prefix, key) in [("btn-", "style"), ("btn-", "size")] {
        match d.get(key) {
            "" => {}
            v => {
                class.push(' ');
                class.push_str(prefix);
                class.push_str(v);
            }
        }
    }
    let label = d.get_or("label", "Button");
    match d.get("href") {
        "" => format!(r#"<button class="{}">{}</button>"#, class, label),
        href => format!(r#"<a class="{}" href="{}">{}</a>"#, class, href, label),
    }
}
