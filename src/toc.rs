//! Table-of-contents capture. A [`Toc`] lives for exactly one
//! [`crate::processor::Processor::render`] call: it hands out heading ids
//! and records the entries in document order.

use crate::markdown::Heading;
use crate::util::{escape_html, slugify};
use std::collections::HashSet;

/// One heading in a document's table of contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    pub id: String,

    /// The heading content as inline HTML.
    pub text: String,

    pub depth: u32,
}

#[derive(Debug, Default)]
pub struct Toc {
    entries: Vec<TocEntry>,
    used: HashSet<String>,
}

impl Toc {
    pub fn new() -> Toc {
        Toc::default()
    }

    /// Allocates an id for `heading`, records it when `record` is set and
    /// returns the heading's HTML. Ids repeat only if the document repeats a
    /// heading; later duplicates get `-1`, `-2`, … appended.
    pub fn heading(&mut self, heading: &Heading, record: bool) -> String {
        let id = self.allocate(&heading.raw_text);
        let html = format!(
            "<h{depth} id=\"{id}\">{text}</h{depth}>\n",
            depth = heading.depth,
            id = id,
            text = heading.text,
        );
        if record {
            self.entries.push(TocEntry {
                id,
                text: heading.text.clone(),
                depth: heading.depth,
            });
        }
        html
    }

    fn allocate(&mut self, raw_text: &str) -> String {
        let mut base = slugify(raw_text);
        if base.is_empty() {
            base = String::from("section");
        }
        let mut id = base.clone();
        let mut n = 1;
        while self.used.contains(&id) {
            id = format!("{}-{}", base, n);
            n += 1;
        }
        self.used.insert(id.clone());
        id
    }

    pub fn into_entries(self) -> Vec<TocEntry> {
        self.entries
    }
}

/// Renders the collapsible TOC navigation block. Documents with fewer than
/// two headings get no TOC and this returns an empty string. `label` is the
/// localized summary text.
pub fn toc_html(entries: &[TocEntry], label: &str) -> String {
    if entries.len() < 2 {
        return String::new();
    }
    let mut html = format!(
        r#"<nav class="toc"><details open><summary>{}</summary><ul>"#,
        escape_html(label)
    );
    for entry in entries {
        let indent = entry.depth.saturating_sub(2) * 16;
        html.push_str(&format!(
            r##"<li style="margin-left:{}px"><a href="#{}">{}</a></li>"##,
            indent, entry.id, entry.text
        ));
    }
    html.push_str("</ul></details></nav>");
    html
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn heading(text: &str, depth: u32) -> Heading {
        Heading {
            text: text.to_owned(),
            depth,
            raw_text: text.to_owned(),
        }
    }

    #[test]
    fn test_ids_are_disambiguated() {
        let mut toc = Toc::new();
        assert_eq!(toc.heading(&heading("Intro", 2), true), "<h2 id=\"intro\">Intro</h2>\n");
        toc.heading(&heading("Intro", 2), true);
        toc.heading(&heading("intro-1", 3), true);
        toc.heading(&heading("???", 2), false);
        let ids: Vec<String> = toc.into_entries().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["intro", "intro-1", "intro-1-1"]);
    }

    #[test]
    fn test_toc_html() {
        let entries = vec![
            TocEntry {
                id: "a".to_owned(),
                text: "A".to_owned(),
                depth: 2,
            },
            TocEntry {
                id: "b".to_owned(),
                text: "<code>B</code>".to_owned(),
                depth: 3,
            },
        ];
        assert_eq!(
            toc_html(&entries, "Contents"),
            concat!(
                r#"<nav class="toc"><details open><summary>Contents</summary><ul>"#,
                r##"<li style="margin-left:0px"><a href="#a">A</a></li>"##,
                r##"<li style="margin-left:16px"><a href="#b"><code>B</code></a></li>"##,
                "</ul></details></nav>"
            )
        );
        assert_eq!(toc_html(&entries[..1], "Contents"), "");
    }
}
