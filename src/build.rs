//! [`build_site`] runs one complete build of a project: parsing posts and pages
//! ([`crate::parser`]), rendering every HTML page ([`crate::write`]), writing
//! the auxiliary files (search index, feeds, sitemap) and copying the
//! theme assets into the output directory.

use crate::config::Config;
use crate::feed::{write_feed, write_rss, Error as FeedError, FeedConfig};
use crate::parser::{Error as ParseError, Parser};
use crate::search::search_index;
use crate::sitemap::{robots, sitemap};
use crate::write::{Error as WriteError, Templates, Writer};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// What one build produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub posts: usize,
    pub pages: usize,

    /// The number of HTML pages written.
    pub files: usize,

    pub elapsed: Duration,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Done in {}ms: {} posts, {} pages",
            self.elapsed.as_millis(),
            self.posts,
            self.pages
        )
    }
}

/// Builds the site described by `config` into its output directory. The
/// output directory is removed first, so nothing from a previous build
/// survives; templates are loaded before that happens so a broken theme
/// leaves the previous output in place.
pub fn build_site(config: &Config) -> Result<Summary> {
    let start = Instant::now();
    let templates = Templates::load(&config.templates_directory, &Templates::required(config))?;

    let parser = Parser::new(&config.strings, &config.language, &config.base_path);
    let posts = parser.parse_posts(&config.posts_source_directory)?;
    let pages = parser.parse_pages(&config.pages_source_directory)?;
    tracing::debug!(posts = posts.len(), pages = pages.len(), "parsed documents");

    rmdir(&config.output_directory)?;
    std::fs::create_dir_all(&config.output_directory)?;

    let files = Writer::new(config, &templates).write_site(&posts, &pages)?;

    std::fs::write(
        config.output_directory.join("search-index.json"),
        search_index(&posts)?,
    )?;

    if config.rss {
        let feed_config = FeedConfig::from(config);
        write_feed(
            &feed_config,
            &posts,
            File::create(config.output_directory.join("atom.xml"))?,
        )?;
        write_rss(
            &feed_config,
            &posts,
            File::create(config.output_directory.join("feed.xml"))?,
        )?;
    }

    if config.sitemap {
        std::fs::write(
            config.output_directory.join("sitemap.xml"),
            sitemap(config, &posts, &pages),
        )?;
        std::fs::write(config.output_directory.join("robots.txt"), robots(config))?;
    }

    copy_dir(
        &config.assets_directory,
        &config.output_directory.join("assets"),
    )?;
    if config.favicon.is_file() {
        std::fs::copy(&config.favicon, config.output_directory.join("favicon.svg"))?;
    }

    let summary = Summary {
        posts: posts.len(),
        pages: pages.len(),
        files,
        elapsed: start.elapsed(),
    };
    tracing::info!("{}", summary);
    Ok(summary)
}

/// Removes the output directory of `config`.
pub fn clean(config: &Config) -> Result<()> {
    rmdir(&config.output_directory)
}

// Copies the tree under `src` into `dst`. A missing `src` copies nothing.
fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    if !src.is_dir() {
        tracing::debug!(dir = %src.display(), "no assets to copy");
        return Ok(());
    }
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop a build. A document that fails to parse is not
/// among them; the parser logs and skips it.
#[derive(Debug)]
pub enum Error {
    /// A content directory couldn't be read.
    Parse(ParseError),

    /// Returned for errors loading templates or writing HTML pages.
    Write(WriteError),

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for errors walking the assets directory.
    CopyAssets(walkdir::Error),

    /// Returned for errors serializing the search index.
    SearchIndex(serde_json::Error),

    /// A feed couldn't be serialized or written.
    Feed(FeedError),

    /// Creating the output directory or writing an auxiliary file failed.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::CopyAssets(err) => write!(f, "Copying assets: {}", err),
            Error::SearchIndex(err) => write!(f, "Writing search index: {}", err),
            Error::Feed(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::CopyAssets(err) => Some(err),
            Error::SearchIndex(err) => Some(err),
            Error::Feed(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<WriteError> for Error {
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Error {
        Error::CopyAssets(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::SearchIndex(err)
    }
}

impl From<FeedError> for Error {
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_copy_dir() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("assets");
        fs::create_dir_all(src.join("css"))?;
        fs::write(src.join("css").join("main.css"), "body {}")?;
        fs::write(src.join("app.js"), "")?;

        let dst = dir.path().join("dist").join("assets");
        copy_dir(&src, &dst)?;
        assert_eq!(fs::read_to_string(dst.join("css").join("main.css"))?, "body {}");
        assert!(dst.join("app.js").is_file());

        copy_dir(&dir.path().join("missing"), &dir.path().join("out"))?;
        assert!(!dir.path().join("out").exists());
        Ok(())
    }

    #[test]
    fn test_rmdir_missing_is_ok() -> Result<()> {
        let dir = tempfile::tempdir()?;
        rmdir(&dir.path().join("nope"))?;
        Ok(())
    }
}
