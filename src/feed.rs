//! The feeds of the most recent posts: Atom (`atom.xml`) and RSS 2.0
//! (`feed.xml`).

use crate::config::Config;
use crate::post::{Document, PostDate};
use atom_syndication::{
    Content, Entry, Error as AtomError, Feed, FixedDateTime, Link, Person, Text,
};
use chrono::{DateTime, TimeZone, Utc};
use rss::{Channel, ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use std::fmt;
use std::io::Write;

/// How many of the most recent posts the feed carries.
pub const FEED_SIZE: usize = 20;

/// The site-level fields of the feed, taken from the project [`Config`].
pub struct FeedConfig {
    pub title: String,
    pub subtitle: String,

    /// The site URL including the base path; used as the feed id and link.
    pub id: String,

    pub author: String,

    /// The site URL without the base path; post URLs are appended to it.
    pub site_url: String,

    pub language: String,
}

impl From<&Config> for FeedConfig {
    fn from(config: &Config) -> FeedConfig {
        FeedConfig {
            title: config.title.clone(),
            subtitle: config.description.clone(),
            id: config.absolute_url(""),
            author: config.author.clone(),
            site_url: config.site_url.clone(),
            language: config.language.clone(),
        }
    }
}

/// Serializes the feed for `posts` (most recent first; only the first
/// [`FEED_SIZE`] are included) to `w`.
pub fn write_feed<W: Write>(config: &FeedConfig, posts: &[Document], w: W) -> Result<()> {
    feed(config, posts).write_to(w)?;
    Ok(())
}

/// Serializes the RSS 2.0 channel for the same posts as [`write_feed`].
pub fn write_rss<W: Write>(config: &FeedConfig, posts: &[Document], w: W) -> Result<()> {
    channel(config, posts).write_to(w)?;
    Ok(())
}

fn utc(date: PostDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.0)
}

fn timestamp(date: PostDate) -> FixedDateTime {
    utc(date).into()
}

fn alternate(href: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel("alternate");
    link
}

fn feed(config: &FeedConfig, posts: &[Document]) -> Feed {
    let posts = &posts[..posts.len().min(FEED_SIZE)];
    let mut feed = Feed::default();
    feed.set_title(config.title.as_str());
    if !config.subtitle.is_empty() {
        feed.set_subtitle(Text::from(config.subtitle.as_str()));
    }
    feed.set_id(config.id.as_str());
    feed.set_links(vec![alternate(&config.id)]);
    feed.set_authors(authors(config));
    feed.set_updated(match posts.first().and_then(|p| p.date) {
        Some(date) => timestamp(date),
        None => Utc::now().into(),
    });
    feed.set_entries(posts.iter().map(|p| entry(config, p)).collect::<Vec<_>>());
    feed
}

fn entry(config: &FeedConfig, post: &Document) -> Entry {
    let url = format!("{}{}", config.site_url, post.url);
    let date = timestamp(post.date.unwrap_or_else(PostDate::epoch));

    let mut content = Content::default();
    content.set_content_type("html".to_owned());
    content.set_value(post.html.clone());

    let mut entry = Entry::default();
    entry.set_id(url.as_str());
    entry.set_title(post.title.as_str());
    entry.set_updated(date);
    entry.set_published(date);
    entry.set_authors(authors(config));
    entry.set_links(vec![alternate(&url)]);
    if !post.description.is_empty() {
        entry.set_summary(Text::from(post.description.as_str()));
    }
    entry.set_content(content);
    entry
}

fn channel(config: &FeedConfig, posts: &[Document]) -> Channel {
    let items: Vec<Item> = posts
        .iter()
        .take(FEED_SIZE)
        .map(|p| item(config, p))
        .collect();
    ChannelBuilder::default()
        .title(config.title.as_str())
        .link(config.id.as_str())
        .description(config.subtitle.as_str())
        .language(Some(config.language.clone()))
        .generator(Some(String::from("paper")))
        .items(items)
        .build()
}

fn item(config: &FeedConfig, post: &Document) -> Item {
    let url = format!("{}{}", config.site_url, post.url);
    let description = match post.description.is_empty() {
        true => None,
        false => Some(post.description.clone()),
    };
    ItemBuilder::default()
        .title(Some(post.title.clone()))
        .link(Some(url.clone()))
        .guid(Some(GuidBuilder::default().permalink(true).value(url).build()))
        .description(description)
        .content(Some(post.html.clone()))
        .pub_date(post.date.map(|date| utc(date).to_rfc2822()))
        .build()
}

fn authors(config: &FeedConfig) -> Vec<Person> {
    match config.author.is_empty() {
        true => Vec::new(),
        false => {
            let mut person = Person::default();
            person.set_name(config.author.as_str());
            vec![person]
        }
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug)]
pub enum Error {
    /// Writing the serialized feed failed.
    Io(std::io::Error),

    /// `atom_syndication` rejected the feed.
    Atom(AtomError),

    /// The RSS channel couldn't be written.
    Rss(rss::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Atom(err) => err.fmt(f),
            Error::Rss(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Atom(err) => Some(err),
            Error::Rss(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<AtomError> for Error {
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}

impl From<rss::Error> for Error {
    fn from(err: rss::Error) -> Error {
        Error::Rss(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::collections::test::post;

    fn config() -> FeedConfig {
        FeedConfig {
            title: "Site".to_owned(),
            subtitle: "About things".to_owned(),
            id: "https://example.com/blog".to_owned(),
            author: "Me".to_owned(),
            site_url: "https://example.com".to_owned(),
            language: "en".to_owned(),
        }
    }

    #[test]
    fn test_feed() {
        let posts: Vec<Document> = (0..25)
            .map(|i| post(&format!("p{}", i), "2024-01-01", &[]))
            .collect();
        let feed = feed(&config(), &posts);
        assert_eq!(feed.entries().len(), FEED_SIZE);
        let first = &feed.entries()[0];
        assert_eq!(first.id(), "https://example.com/posts/p0.html");
        assert_eq!(first.links()[0].href(), "https://example.com/posts/p0.html");
        assert_eq!(first.content().and_then(|c| c.value()), Some("<p>p0</p>"));
        assert_eq!(feed.authors()[0].name(), "Me");
    }

    #[test]
    fn test_write_feed() -> Result<()> {
        let posts = vec![post("hello", "2024-05-05", &[])];
        let mut out = Vec::new();
        write_feed(&config(), &posts, &mut out)?;
        let xml = String::from_utf8_lossy(&out);
        assert!(xml.contains("<id>https://example.com/blog</id>"));
        assert!(xml.contains("2024-05-05T00:00:00+00:00"));
        Ok(())
    }

    #[test]
    fn test_channel() {
        let posts: Vec<Document> = (0..25)
            .map(|i| post(&format!("p{}", i), "2024-01-01", &[]))
            .collect();
        let channel = channel(&config(), &posts);
        assert_eq!(channel.title(), "Site");
        assert_eq!(channel.link(), "https://example.com/blog");
        assert_eq!(channel.description(), "About things");
        assert_eq!(channel.language(), Some("en"));
        assert_eq!(channel.items().len(), FEED_SIZE);
        let first = &channel.items()[0];
        assert_eq!(first.link(), Some("https://example.com/posts/p0.html"));
        assert_eq!(first.guid().map(|g| g.value()), Some("https://example.com/posts/p0.html"));
        assert_eq!(first.content(), Some("<p>p0</p>"));
        let pub_date = first.pub_date().unwrap_or_default();
        assert!(pub_date.starts_with("Mon, "), "{}", pub_date);
        assert!(pub_date.ends_with("Jan 2024 00:00:00 +0000"), "{}", pub_date);
    }

    #[test]
    fn test_write_rss() -> Result<()> {
        let posts = vec![post("hello", "2024-05-05", &[])];
        let mut out = Vec::new();
        write_rss(&config(), &posts, &mut out)?;
        let xml = String::from_utf8_lossy(&out);
        assert!(xml.contains("<rss version=\"2.0\""), "{}", xml);
        assert!(xml.contains("<link>https://example.com/posts/hello.html</link>"));
        assert!(xml.contains("<title>HELLO</title>"));
        Ok(())
    }
}
