//! Callout (admonition) blocks. Two syntaxes are recognized in Markdown
//! source:
//!
//! ```md
//! :::warning[Mind the gap]
//! Body text with **Markdown**.
//! :::
//!
//! > [!TIP]
//! > Body text, one quoted line after another.
//! ```
//!
//! [`extract`] swaps every callout for a placeholder comment before the
//! Markdown conversion runs; [`Callout::to_html`] produces the final markup
//! once the body has been rendered.

use crate::markdown::code_fences;
use crate::util::escape_html;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static FENCED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^:::([A-Za-z]+)(?:\[([^\]\n]*)\])?[ \t]*\n((?s:.*?))^:::[ \t]*$").unwrap()
});

static QUOTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^>[ \t]*\[!(NOTE|TIP|WARNING|CAUTION|IMPORTANT)\][ \t]*(?:\n|\z)((?:>[^\n]*(?:\n|\z))*)")
        .unwrap()
});

static QUOTE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^>[ \t]?").unwrap());

/// A callout captured from the source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Callout {
    /// The lower-cased kind, e.g. `note` or `warning`.
    pub kind: String,

    /// The custom title given in brackets, if any.
    pub title: Option<String>,

    /// The Markdown body, trimmed.
    pub body: String,
}

impl Callout {
    /// The title shown in the header: the custom title if one was given,
    /// otherwise the capitalized kind.
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) if !title.is_empty() => title.clone(),
            _ => capitalize(&self.kind),
        }
    }

    /// Wraps `body_html` (the rendered body) in the callout container.
    pub fn to_html(&self, body_html: &str) -> String {
        format!(
            r#"<div class="callout callout-{kind}"><div class="callout-header">{icon}<span>{title}</span></div><div class="callout-body">{body}</div></div>"#,
            kind = escape_html(&self.kind),
            icon = icon(&self.kind),
            title = escape_html(&self.display_title()),
            body = body_html,
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

const SVG_OPEN: &str = r#"<svg width="18" height="18" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round">"#;

/// The inline SVG icon for a callout kind; unknown kinds have none.
pub fn icon(kind: &str) -> String {
    let paths = match kind {
        "note" => r#"<circle cx="12" cy="12" r="10"/><path d="M12 16v-4"/><path d="M12 8h.01"/>"#,
        "tip" => r#"<path d="M15 14c.2-1 .7-1.7 1.5-2.5 1-.9 1.5-2.2 1.5-3.5A6 6 0 0 0 6 8c0 1 .2 2.2 1.5 3.5.7.7 1.3 1.5 1.5 2.5"/><path d="M9 18h6"/><path d="M10 22h4"/>"#,
        "important" | "warning" => r#"<path d="m21.73 18-8-14a2 2 0 0 0-3.48 0l-8 14A2 2 0 0 0 4 21h16a2 2 0 0 0 1.73-3"/><path d="M12 9v4"/><path d="M12 17h.01"/>"#,
        "caution" => r#"<circle cx="12" cy="12" r="10"/><path d="m15 9-6 6"/><path d="m9 9 6 6"/>"#,
        _ => return String::new(),
    };
    format!("{}{}</svg>", SVG_OPEN, paths)
}

/// The placeholder left in the source for callout number `index`.
pub fn placeholder(index: usize) -> String {
    format!("<!--PAPER_CALLOUT_{}-->", index)
}

/// Like `Regex::replace_all`, but matches starting inside a fenced code
/// block are skipped. The search resumes after the end of that block.
fn replace_outside_code(re: &Regex, src: &str, mut f: impl FnMut(&Captures) -> String) -> String {
    let fences = code_fences(src);
    let mut out = String::with_capacity(src.len());
    let mut last = 0;
    let mut at = 0;
    while let Some(c) = re.captures_at(src, at) {
        let m = match c.get(0) {
            Some(m) => m,
            None => break,
        };
        if let Some(fence) = fences.iter().find(|fence| fence.contains(&m.start())) {
            at = fence.end;
            continue;
        }
        out.push_str(&src[last..m.start()]);
        out.push_str(&f(&c));
        last = m.end();
        at = m.end();
    }
    out.push_str(&src[last..]);
    out
}

/// Replaces every callout in `src` with a placeholder, returning the
/// rewritten text and the callouts in placeholder order. Fenced callouts are
/// extracted first, then quoted ones. Callout syntax inside fenced code
/// blocks is left alone.
pub fn extract(src: &str) -> (String, Vec<Callout>) {
    let mut callouts = Vec::new();

    let src = replace_outside_code(&FENCED, src, |c: &Captures| {
        callouts.push(Callout {
            kind: c[1].to_lowercase(),
            title: c.get(2).map(|m| m.as_str().to_owned()),
            body: c[3].trim().to_owned(),
        });
        placeholder(callouts.len() - 1)
    });

    let src = replace_outside_code(&QUOTED, &src, |c: &Captures| {
        callouts.push(Callout {
            kind: c[1].to_lowercase(),
            title: None,
            body: QUOTE_PREFIX.replace_all(&c[2], "").trim().to_owned(),
        });
        // keep the line break the match consumed so following text stays a
        // separate block
        format!("{}\n", placeholder(callouts.len() - 1))
    });

    (src, callouts)
}
