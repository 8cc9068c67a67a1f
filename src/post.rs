//! Defines the [`Document`] type (a post or a custom page) and the pieces of
//! parsing that don't touch the file system: splitting front matter from the
//! body ([`Source::parse`]), dates ([`PostDate`]) and reading time.

use crate::tag::Tag;
use crate::toc::TocEntry;
use crate::util::{is_cjk_ideograph, strip_tags};
use crate::value::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fmt;

/// Whether a document is a dated post or an undated custom page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Post,
    Page,
}

impl Kind {
    /// The document's URL, e.g. `{base_path}/posts/{slug}.html` for posts and
    /// `{base_path}/{slug}.html` for pages.
    pub fn url(self, base_path: &str, slug: &str) -> String {
        match self {
            Kind::Post => format!("{}/posts/{}.html", base_path, slug),
            Kind::Page => format!("{}/{}.html", base_path, slug),
        }
    }
}

/// A post's publication date. Ordering compares the full timestamp; the
/// displayed form is the `YYYY-MM-DD` date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PostDate(pub NaiveDateTime);

impl PostDate {
    /// The date used for posts whose front matter has none.
    pub fn epoch() -> PostDate {
        PostDate(NaiveDateTime::default())
    }

    /// Parses `YYYY-MM-DD`, optionally followed by `HH:MM` or `HH:MM:SS`
    /// (separated by a space or `T`), or a full RFC 3339 timestamp, which is
    /// converted to UTC.
    pub fn parse(s: &str) -> Option<PostDate> {
        const FORMATS: &[&str] = &[
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M",
            "%Y-%m-%dT%H:%M",
        ];
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0).map(PostDate);
        }
        for format in FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Some(PostDate(dt));
            }
        }
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| PostDate(dt.naive_utc()))
    }

    /// The four-digit year, used to group the archive.
    pub fn year(&self) -> String {
        self.0.format("%Y").to_string()
    }
}

impl fmt::Display for PostDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// A parsed and rendered post or page.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub kind: Kind,

    /// The file name without its `.md` extension.
    pub slug: String,

    pub title: String,

    /// Always set for posts; never for pages.
    pub date: Option<PostDate>,

    pub tags: Vec<Tag>,
    pub lang: String,
    pub description: String,
    pub cover: String,

    /// The raw Markdown body.
    pub body: String,

    pub html: String,
    pub toc: Vec<TocEntry>,
    pub toc_html: String,

    /// Estimated reading time in minutes.
    pub reading_time: usize,

    /// `reading_time` followed by the localized `readingTime` string.
    pub reading_time_text: String,

    pub url: String,
}

impl Document {
    pub fn date_string(&self) -> String {
        self.date.map(|d| d.to_string()).unwrap_or_default()
    }

    pub fn has_toc(&self) -> bool {
        self.toc.len() >= 2
    }

    pub fn shares_tags_with(&self, other: &Document) -> usize {
        self.tags.iter().filter(|t| other.tags.contains(t)).count()
    }

    /// The document's own template fields. Posts carry their date, tags and
    /// reading time; pages don't.
    pub fn to_context(&self) -> Context {
        let mut ctx = Context::new()
            .with("slug", &self.slug)
            .with("title", &self.title)
            .with("lang", &self.lang)
            .with("cover", &self.cover)
            .with("description", &self.description)
            .with("html", &self.html)
            .with("tocHtml", &self.toc_html)
            .with("url", &self.url);
        if self.kind == Kind::Post {
            ctx.insert("date", self.date_string())
                .insert(
                    "tags",
                    self.tags.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
                )
                .insert("readingTime", self.reading_time)
                .insert("readingTimeText", &self.reading_time_text);
        }
        ctx
    }
}

/// Estimates the reading time of a Markdown body in minutes: the character
/// count with tags removed, at 400 characters a minute for text containing
/// CJK ideographs and 200 otherwise. Never less than one minute.
pub fn reading_time(body: &str) -> usize {
    let per_minute = match body.chars().any(is_cjk_ideograph) {
        true => 400,
        false => 200,
    };
    let chars = strip_tags(body).chars().count();
    std::cmp::max(1, (chars + per_minute - 1) / per_minute)
}

/// The front matter keys a document may set.
#[derive(Debug, Default, Deserialize)]
pub struct Frontmatter {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub date: Option<serde_yaml::Value>,

    #[serde(default)]
    pub tags: Option<serde_yaml::Value>,

    #[serde(default)]
    pub lang: Option<String>,

    #[serde(default)]
    pub cover: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub draft: bool,
}

fn scalar(value: &serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl Frontmatter {
    /// The raw `date` value as text, if one was given.
    pub fn date_text(&self) -> Option<String> {
        self.date.as_ref().and_then(scalar)
    }

    /// The tag names in order of first appearance. A single scalar is
    /// accepted as a one-tag list; duplicates are dropped.
    pub fn tag_names(&self) -> Vec<String> {
        use serde_yaml::Value;
        let raw: Vec<String> = match &self.tags {
            Some(Value::Sequence(items)) => items.iter().filter_map(scalar).collect(),
            Some(value) => scalar(value).into_iter().collect(),
            None => Vec::new(),
        };
        let mut names: Vec<String> = Vec::with_capacity(raw.len());
        for name in raw {
            let name = name.trim().to_owned();
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// A source file split into its front matter and Markdown body.
#[derive(Debug)]
pub struct Source<'a> {
    pub frontmatter: Frontmatter,
    pub body: &'a str,
}

/// The ways splitting a source file can fail.
#[derive(Debug)]
pub enum SourceError {
    /// The file opens a front matter fence (`---`) but never closes it.
    FrontmatterMissingEndFence,

    /// The front matter isn't valid YAML for [`Frontmatter`].
    DeserializeYaml(serde_yaml::Error),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SourceError::FrontmatterMissingEndFence => write!(f, "Missing closing `---`"),
            SourceError::DeserializeYaml(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::FrontmatterMissingEndFence => None,
            SourceError::DeserializeYaml(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for SourceError {
    fn from(err: serde_yaml::Error) -> SourceError {
        SourceError::DeserializeYaml(err)
    }
}

impl<'a> Source<'a> {
    /// Splits `input` into front matter and body. Input that doesn't start
    /// with a `---` fence is all body.
    pub fn parse(input: &'a str) -> Result<Source<'a>, SourceError> {
        fn frontmatter_indices(
            input: &str,
        ) -> Result<Option<(usize, usize, usize)>, SourceError> {
            const FENCE: &str = "---";
            if !input.starts_with(FENCE) {
                return Ok(None);
            }
            match input[FENCE.len()..].find("\n---") {
                None => Err(SourceError::FrontmatterMissingEndFence),
                Some(offset) => {
                    let yaml_stop = FENCE.len() + offset + 1;
                    let fence_end = yaml_stop + FENCE.len();
                    let body_start = match input[fence_end..].find('\n') {
                        Some(i) => fence_end + i + 1,
                        None => input.len(),
                    };
                    Ok(Some((FENCE.len(), yaml_stop, body_start)))
                }
            }
        }

        match frontmatter_indices(input)? {
            None => Ok(Source {
                frontmatter: Frontmatter::default(),
                body: input,
            }),
            Some((yaml_start, yaml_stop, body_start)) => {
                let yaml = &input[yaml_start..yaml_stop];
                let frontmatter = match yaml.trim().is_empty() {
                    true => Frontmatter::default(),
                    false => serde_yaml::from_str(yaml)?,
                };
                Ok(Source {
                    frontmatter,
                    body: &input[body_start..],
                })
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_source_parse() -> Result<(), SourceError> {
        let input = "---\ntitle: Hello\ndate: 2024-05-05\ntags: [rust, 2024, rust]\ndraft: true\n---\n# Body\n";
        let source = Source::parse(input)?;
        assert_eq!(source.body, "# Body\n");
        assert_eq!(source.frontmatter.title.as_deref(), Some("Hello"));
        assert_eq!(source.frontmatter.date_text().as_deref(), Some("2024-05-05"));
        assert_eq!(source.frontmatter.tag_names(), vec!["rust", "2024"]);
        assert!(source.frontmatter.draft);
        Ok(())
    }

    #[test]
    fn test_source_without_frontmatter() -> Result<(), SourceError> {
        let source = Source::parse("just text\n")?;
        assert_eq!(source.body, "just text\n");
        assert!(source.frontmatter.title.is_none());
        assert!(Source::parse("---\n---\nbody")?.frontmatter.tag_names().is_empty());
        Ok(())
    }

    #[test]
    fn test_source_missing_end_fence() {
        match Source::parse("---\ntitle: x\n") {
            Err(SourceError::FrontmatterMissingEndFence) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_single_tag_scalar() -> Result<(), SourceError> {
        let source = Source::parse("---\ntags: notes\n---\n")?;
        assert_eq!(source.frontmatter.tag_names(), vec!["notes"]);
        Ok(())
    }

    #[test]
    fn test_post_date() {
        let date = PostDate::parse("2023-12-31").unwrap();
        assert_eq!(date.to_string(), "2023-12-31");
        assert_eq!(date.year(), "2023");
        let later = PostDate::parse("2023-12-31 08:30").unwrap();
        assert!(later > date);
        assert_eq!(later.to_string(), "2023-12-31");
        assert!(PostDate::parse("2023-12-31T23:00:00+02:00").is_some());
        assert!(PostDate::parse("yesterday").is_none());
        assert_eq!(PostDate::epoch().to_string(), "1970-01-01");
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time(""), 1);
        assert_eq!(reading_time(&"a".repeat(201)), 2);
        assert_eq!(reading_time(&"字".repeat(400)), 1);
        assert_eq!(reading_time(&"字".repeat(401)), 2);
        assert_eq!(reading_time("<b>ab</b>"), 1);
    }

    #[test]
    fn test_kind_url() {
        assert_eq!(Kind::Post.url("", "hello"), "/posts/hello.html");
        assert_eq!(Kind::Page.url("/blog", "about"), "/blog/about.html");
    }
}
