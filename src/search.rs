//! The client-side search index: a JSON array with one compact record per
//! post, serialized with `serde_json`.

use crate::post::Document;
use crate::util::strip_tags;
use serde::Serialize;

/// How many characters of body text stand in for a missing description.
const SNIPPET_LENGTH: usize = 200;

/// One post in `search-index.json`. Field names are kept short because the
/// whole file is downloaded by the search box.
#[derive(Debug, PartialEq, Serialize)]
pub struct Entry<'a> {
    /// Title.
    pub t: &'a str,

    /// URL.
    pub u: &'a str,

    /// Date, `YYYY-MM-DD`.
    pub d: String,

    /// The description, or the start of the post text.
    pub s: String,

    pub tags: Vec<&'a str>,
}

impl<'a> From<&'a Document> for Entry<'a> {
    fn from(post: &'a Document) -> Entry<'a> {
        let s = match post.description.is_empty() {
            false => post.description.clone(),
            true => strip_tags(&post.html).chars().take(SNIPPET_LENGTH).collect(),
        };
        Entry {
            t: &post.title,
            u: &post.url,
            d: post.date_string(),
            s,
            tags: post.tags.iter().map(|t| t.name.as_str()).collect(),
        }
    }
}

/// Serializes the search index for `posts`.
pub fn search_index(posts: &[Document]) -> serde_json::Result<String> {
    let entries: Vec<Entry> = posts.iter().map(Entry::from).collect();
    serde_json::to_string(&entries)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::collections::test::post;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_search_index() -> serde_json::Result<()> {
        let mut described = post("a", "2024-01-02", &["x", "y"]);
        described.description = "Short \"summary\"".to_owned();
        let mut long = post("b", "2024-01-01", &[]);
        long.html = format!("<p>{}</p>", "字".repeat(300));

        let json = search_index(&[described, long])?;
        let parsed: serde_json::Value = serde_json::from_str(&json)?;
        assert_eq!(parsed[0]["t"], "A");
        assert_eq!(parsed[0]["u"], "/posts/a.html");
        assert_eq!(parsed[0]["d"], "2024-01-02");
        assert_eq!(parsed[0]["s"], "Short \"summary\"");
        assert_eq!(parsed[0]["tags"], serde_json::json!(["x", "y"]));
        assert_eq!(parsed[1]["s"].as_str().map(|s| s.chars().count()), Some(200));
        Ok(())
    }

    #[test]
    fn test_empty() -> serde_json::Result<()> {
        assert_eq!(search_index(&[])?, "[]");
        Ok(())
    }
}
