//! Defines the [`Parser`] and [`Error`] types: reading posts and pages from
//! the file system, rendering their bodies with the
//! [`Processor`](crate::processor::Processor) and collecting them into
//! [`Document`]s.

use std::{
    fmt,
    fs::{read_dir, File},
    io::Read,
    path::{Path, PathBuf},
};

use crate::{
    i18n::StringTable,
    post::{reading_time, Document, Kind, PostDate, Source, SourceError},
    processor::Processor,
    tag::Tag,
    toc::toc_html,
};

const MARKDOWN_EXTENSION: &str = "md";

/// Parses [`Document`] objects from source files.
pub struct Parser<'a> {
    processor: Processor,

    /// Localizes the reading-time and table-of-contents labels.
    strings: &'a StringTable,

    /// The language of documents whose front matter doesn't set `lang`.
    default_language: &'a str,

    /// The URL prefix for document and tag URLs, without a trailing slash.
    base_path: &'a str,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(strings: &'a StringTable, default_language: &'a str, base_path: &'a str) -> Parser<'a> {
        Parser {
            processor: Processor::default(),
            strings,
            default_language,
            base_path,
        }
    }

    /// Parses the document at `path`, annotating any error with the path.
    /// Returns `None` for drafts.
    pub fn parse_document(&self, kind: Kind, path: &Path) -> Result<Option<Document>> {
        match self._parse_document(kind, path) {
            Ok(d) => Ok(d),
            Err(e) => Err(Error::Annotated(
                format!("parsing `{}`", path.display()),
                Box::new(e),
            )),
        }
    }

    fn _parse_document(&self, kind: Kind, path: &Path) -> Result<Option<Document>> {
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        let slug = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| Error::InvalidFileName(path.to_owned()))?
            .to_owned();
        self.parse_str(kind, &slug, &contents)
    }

    /// Parses and renders one document from its source text.
    pub fn parse_str(&self, kind: Kind, slug: &str, input: &str) -> Result<Option<Document>> {
        let Source { frontmatter, body } = Source::parse(input)?;
        if kind == Kind::Post && frontmatter.draft {
            tracing::debug!(slug, "skipping draft");
            return Ok(None);
        }

        let date = match kind {
            Kind::Page => None,
            Kind::Post => match frontmatter.date_text() {
                None => Some(PostDate::epoch()),
                Some(text) => Some(PostDate::parse(&text).ok_or(Error::InvalidDate(text))?),
            },
        };
        let tags = match kind {
            Kind::Page => Vec::new(),
            Kind::Post => frontmatter
                .tag_names()
                .iter()
                .map(|name| Tag::new(name, self.base_path))
                .collect(),
        };
        let lang = frontmatter
            .lang
            .clone()
            .unwrap_or_else(|| self.default_language.to_owned());

        let rendered = self.processor.render(body);
        let minutes = reading_time(body);
        Ok(Some(Document {
            kind,
            slug: slug.to_owned(),
            title: frontmatter.title.clone().unwrap_or_else(|| slug.to_owned()),
            date,
            tags,
            description: frontmatter.description.clone().unwrap_or_default(),
            cover: frontmatter.cover.clone().unwrap_or_default(),
            body: body.to_owned(),
            html: rendered.html,
            toc_html: toc_html(&rendered.toc, self.strings.get(&lang, "toc")),
            toc: rendered.toc,
            reading_time: minutes,
            reading_time_text: format!("{} {}", minutes, self.strings.get(&lang, "readingTime")),
            url: kind.url(self.base_path, slug),
            lang,
        }))
    }

    /// Parses every `.md` file in `source_directory`, in file-name order. A
    /// document that fails to parse is logged and skipped; failing to read
    /// the directory itself is an error. A missing directory yields no
    /// documents.
    pub fn parse_directory(&self, kind: Kind, source_directory: &Path) -> Result<Vec<Document>> {
        if !source_directory.exists() {
            tracing::debug!(dir = %source_directory.display(), "no such directory");
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = Vec::new();
        for result in read_dir(source_directory).map_err(|err| Error::ReadDirectory {
            path: source_directory.to_owned(),
            err,
        })? {
            let entry = result?;
            let path = entry.path();
            if entry.file_type()?.is_file()
                && path.extension().map_or(false, |ext| ext == MARKDOWN_EXTENSION)
            {
                paths.push(path);
            }
        }
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            match self.parse_document(kind, &path) {
                Ok(Some(document)) => documents.push(document),
                Ok(None) => {}
                Err(e) => tracing::warn!("skipping document: {}", e),
            }
        }
        Ok(documents)
    }

    /// Parses the posts in `source_directory` and sorts them by date, most
    /// recent first. Posts with the same date keep their file-name order.
    pub fn parse_posts(&self, source_directory: &Path) -> Result<Vec<Document>> {
        let mut posts = self.parse_directory(Kind::Post, source_directory)?;
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    /// Parses the custom pages in `source_directory`, in file-name order.
    pub fn parse_pages(&self, source_directory: &Path) -> Result<Vec<Document>> {
        self.parse_directory(Kind::Page, source_directory)
    }
}

/// Represents the result of a [`Document`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Document`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when the front matter can't be split off or deserialized.
    Source(SourceError),

    /// Returned when a post's `date` isn't in a recognized format.
    InvalidDate(String),

    /// Returned when a source file name isn't valid UTF-8.
    InvalidFileName(PathBuf),

    /// Returned when a content directory exists but can't be listed.
    ReadDirectory { path: PathBuf, err: std::io::Error },

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Source(err) => err.fmt(f),
            Error::InvalidDate(date) => write!(f, "invalid date: `{}`", date),
            Error::InvalidFileName(path) => write!(f, "invalid file name: {:?}", path),
            Error::ReadDirectory { path, err } => {
                write!(f, "Reading directory '{}': {}", path.display(), err)
            }
            Error::Io(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Source(err) => Some(err),
            Error::InvalidDate(_) => None,
            Error::InvalidFileName(_) => None,
            Error::ReadDirectory { path: _, err } => Some(err),
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<SourceError> for Error {
    fn from(err: SourceError) -> Error {
        Error::Source(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::fs;

    fn strings() -> StringTable {
        let mut en = HashMap::new();
        en.insert("readingTime".to_owned(), "min read".to_owned());
        en.insert("toc".to_owned(), "Contents".to_owned());
        let mut languages = HashMap::new();
        languages.insert("en".to_owned(), en);
        StringTable::new(languages)
    }

    #[test]
    fn test_parse_str() -> Result<()> {
        let strings = strings();
        let parser = Parser::new(&strings, "en", "/blog");
        let input = "---\ntitle: Hello\ndate: 2024-05-05\ntags: [Rust, Web Dev]\n---\n## One\n\n## Two\n";
        let post = parser.parse_str(Kind::Post, "hello", input)?.unwrap();
        assert_eq!(post.title, "Hello");
        assert_eq!(post.date_string(), "2024-05-05");
        assert_eq!(post.url, "/blog/posts/hello.html");
        assert_eq!(post.lang, "en");
        assert_eq!(post.tags[1].url, "/blog/tags.html#web-dev");
        assert_eq!(post.toc.len(), 2);
        assert!(post.toc_html.contains("<summary>Contents</summary>"));
        assert_eq!(post.reading_time_text, "1 min read");
        Ok(())
    }

    #[test]
    fn test_defaults_and_drafts() -> Result<()> {
        let strings = strings();
        let parser = Parser::new(&strings, "zh-CN", "");
        let post = parser.parse_str(Kind::Post, "untitled", "body only")?.unwrap();
        assert_eq!(post.title, "untitled");
        assert_eq!(post.date_string(), "1970-01-01");
        assert_eq!(post.lang, "zh-CN");
        assert_eq!(post.reading_time_text, "1 readingTime");
        assert_eq!(post.toc_html, "");

        let draft = parser.parse_str(Kind::Post, "wip", "---\ndraft: true\n---\n")?;
        assert!(draft.is_none());

        let page = parser.parse_str(Kind::Page, "about", "---\ndate: 2020-01-01\ntags: [x]\n---\n")?.unwrap();
        assert_eq!(page.date, None);
        assert!(page.tags.is_empty());
        assert_eq!(page.url, "/about.html");
        Ok(())
    }

    #[test]
    fn test_invalid_date() {
        let strings = strings();
        let parser = Parser::new(&strings, "en", "");
        match parser.parse_str(Kind::Post, "x", "---\ndate: someday\n---\n") {
            Err(Error::InvalidDate(date)) => assert_eq!(date, "someday"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_posts_skips_bad_documents() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("b.md"), "---\ntitle: B\ndate: 2023-01-01\n---\nb")?;
        fs::write(dir.path().join("a.md"), "---\ntitle: A\ndate: 2023-01-01\n---\na")?;
        fs::write(dir.path().join("c.md"), "---\ntitle: C\ndate: 2024-01-01\n---\nc")?;
        fs::write(dir.path().join("broken.md"), "---\ntitle: [unclosed\n---\n")?;
        fs::write(dir.path().join("notes.txt"), "ignored")?;

        let strings = strings();
        let parser = Parser::new(&strings, "en", "");
        let posts = parser.parse_posts(dir.path())?;
        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "A", "B"]);
        Ok(())
    }

    #[test]
    fn test_missing_directory_is_empty() -> Result<()> {
        let strings = strings();
        let parser = Parser::new(&strings, "en", "");
        let pages = parser.parse_pages(Path::new("/definitely/not/here"))?;
        assert!(pages.is_empty());
        Ok(())
    }
}
