//! Loads the project configuration from `paper.yaml`. The project root is the
//! directory holding the file; every other path (content, theme, output) is
//! derived from it.

use crate::i18n::StringTable;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "paper.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

fn default_true() -> bool {
    true
}

fn default_theme() -> String {
    String::from("default")
}

#[derive(Deserialize)]
struct Project {
    title: String,

    #[serde(default)]
    description: String,

    #[serde(default)]
    url: Option<Url>,

    #[serde(default)]
    author: String,

    #[serde(default)]
    language: Option<String>,

    #[serde(default)]
    languages: Vec<String>,

    #[serde(default)]
    i18n: HashMap<String, HashMap<String, String>>,

    #[serde(default)]
    posts_per_page: PageSize,

    #[serde(default = "default_theme")]
    theme: String,

    #[serde(default)]
    base_path: String,

    #[serde(default)]
    comments: Comments,

    #[serde(default)]
    nav: Vec<NavItem>,

    #[serde(default)]
    links: Vec<Link>,

    #[serde(default = "default_true")]
    rss: bool,

    #[serde(default = "default_true")]
    sitemap: bool,
}

/// Settings for the comment widget embedded in post pages.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Comments {
    pub enabled: bool,
    pub repo: String,
    pub issue_term: String,
    pub label: String,
}

/// A navigation entry. `key` is looked up in the string table for the label.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NavItem {
    pub key: String,
    pub url: String,
}

/// An entry on the links page.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Link {
    pub name: String,
    pub url: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub avatar: String,
}

/// The resolved configuration for one build.
#[derive(Clone, Debug)]
pub struct Config {
    pub title: String,
    pub description: String,

    /// The absolute site URL without a trailing slash, e.g.
    /// `https://example.com`. Empty when the project doesn't set one.
    pub site_url: String,

    pub author: String,

    /// The default language.
    pub language: String,

    /// Every configured language, the default first.
    pub languages: Vec<String>,

    pub strings: StringTable,
    pub posts_per_page: usize,

    /// The URL prefix the site is served under, without a trailing slash
    /// (e.g. `/blog`), or empty when it's served from the root.
    pub base_path: String,

    pub comments: Comments,
    pub nav: Vec<NavItem>,
    pub links: Vec<Link>,
    pub rss: bool,
    pub sitemap: bool,

    pub project_file: PathBuf,
    pub posts_source_directory: PathBuf,
    pub pages_source_directory: PathBuf,
    pub theme_directory: PathBuf,
    pub templates_directory: PathBuf,
    pub assets_directory: PathBuf,
    pub favicon: PathBuf,
    pub output_directory: PathBuf,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for `paper.yaml` and
    /// loads the first one found. The output directory defaults to `dist`
    /// under the project root.
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            match Config::from_project_file(&path, output_directory) {
                Ok(config) => Ok(config),
                Err(e) => Err(anyhow!("Loading configuration: {}", e)),
            }
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        use crate::util::open;
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{}'",
                path.display()
            )),
            Some(project_root) => {
                let output_directory = match output_directory {
                    Some(dir) => dir.to_owned(),
                    None => project_root.join("dist"),
                };
                Ok(Config::resolve(project, path, project_root, output_directory))
            }
        }
    }

    fn resolve(project: Project, path: &Path, root: &Path, output_directory: PathBuf) -> Config {
        let language = project
            .language
            .or_else(|| project.languages.first().cloned())
            .unwrap_or_else(|| String::from("en"));
        let languages = match project.languages.is_empty() {
            true => vec![language.clone()],
            false => project.languages,
        };
        let theme_directory = root.join("themes").join(&project.theme);
        Config {
            title: project.title,
            description: project.description,
            site_url: project
                .url
                .map(|url| url.as_str().trim_end_matches('/').to_owned())
                .unwrap_or_default(),
            author: project.author,
            language,
            languages,
            strings: StringTable::new(project.i18n),
            posts_per_page: project.posts_per_page.0.max(1),
            base_path: project.base_path.trim_end_matches('/').to_owned(),
            comments: project.comments,
            nav: project.nav,
            links: project.links,
            rss: project.rss,
            sitemap: project.sitemap,
            project_file: path.to_owned(),
            posts_source_directory: root.join("posts"),
            pages_source_directory: root.join("pages"),
            templates_directory: theme_directory.join("templates"),
            assets_directory: theme_directory.join("assets"),
            theme_directory,
            favicon: root.join("favicon.svg"),
            output_directory,
        }
    }

    /// Prefixes a site-relative path with the base path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_path, path)
    }

    /// Prefixes a site-relative path with the site URL and the base path.
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}{}", self.site_url, self.base_path, path)
    }

    /// Looks `key` up in the default language.
    pub fn t(&self, key: &str) -> String {
        self.strings.lookup(&self.language, key)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// A fully populated configuration for tests elsewhere in the crate.
    pub(crate) fn sample(output_directory: &Path) -> Config {
        let mut en = HashMap::new();
        for (k, v) in [("page", "Page"), ("archive", "Archive"), ("home", "Home"), ("name", "English")] {
            en.insert(k.to_owned(), v.to_owned());
        }
        let mut strings = HashMap::new();
        strings.insert("en".to_owned(), en);
        Config {
            title: "Site".to_owned(),
            description: String::new(),
            site_url: "https://example.com".to_owned(),
            author: "Me".to_owned(),
            language: "en".to_owned(),
            languages: vec!["en".to_owned(), "fr".to_owned()],
            strings: StringTable::new(strings),
            posts_per_page: 2,
            base_path: "/b".to_owned(),
            comments: Comments::default(),
            nav: vec![NavItem {
                key: "home".to_owned(),
                url: "/".to_owned(),
            }],
            links: Vec::new(),
            rss: true,
            sitemap: true,
            project_file: PathBuf::from("paper.yaml"),
            posts_source_directory: PathBuf::from("posts"),
            pages_source_directory: PathBuf::from("pages"),
            theme_directory: PathBuf::from("themes/default"),
            templates_directory: PathBuf::from("themes/default/templates"),
            assets_directory: PathBuf::from("themes/default/assets"),
            favicon: PathBuf::from("favicon.svg"),
            output_directory: output_directory.to_owned(),
        }
    }

    fn parse(yaml: &str) -> Result<Config> {
        let project: Project = serde_yaml::from_str(yaml)?;
        Ok(Config::resolve(
            project,
            Path::new("/site/paper.yaml"),
            Path::new("/site"),
            PathBuf::from("/site/dist"),
        ))
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let config = parse("title: My Blog\n")?;
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.language, "en");
        assert_eq!(config.languages, vec!["en".to_owned()]);
        assert_eq!(config.posts_per_page, 10);
        assert_eq!(config.site_url, "");
        assert_eq!(config.base_path, "");
        assert!(config.rss);
        assert!(config.sitemap);
        assert!(!config.comments.enabled);
        assert_eq!(
            config.templates_directory,
            PathBuf::from("/site/themes/default/templates")
        );
        assert_eq!(config.posts_source_directory, PathBuf::from("/site/posts"));
        Ok(())
    }

    #[test]
    fn test_full_project() -> Result<()> {
        let config = parse(
            r#"
title: 博客
url: https://example.com/
base_path: /blog/
languages: [zh-CN, en]
posts_per_page: 0
theme: plain
rss: false
comments:
  enabled: true
  repo: me/blog
  issue_term: pathname
nav:
  - key: archive
    url: /archive.html
links:
  - name: Friend
    url: https://friend.example
i18n:
  zh-CN:
    archive: 归档
"#,
        )?;
        assert_eq!(config.site_url, "https://example.com");
        assert_eq!(config.base_path, "/blog");
        assert_eq!(config.language, "zh-CN");
        assert_eq!(config.languages.len(), 2);
        assert_eq!(config.posts_per_page, 1);
        assert!(!config.rss);
        assert_eq!(config.comments.repo, "me/blog");
        assert_eq!(config.nav[0].key, "archive");
        assert_eq!(config.links[0].description, "");
        assert_eq!(config.t("archive"), "归档");
        assert_eq!(config.url("/tags.html"), "/blog/tags.html");
        assert_eq!(
            config.absolute_url("/posts/a.html"),
            "https://example.com/blog/posts/a.html"
        );
        assert_eq!(config.assets_directory, PathBuf::from("/site/themes/plain/assets"));
        Ok(())
    }

    #[test]
    fn test_from_directory_searches_ancestors() -> Result<()> {
        let root = tempfile::tempdir()?;
        std::fs::write(root.path().join(PROJECT_FILE), "title: Found\n")?;
        let nested = root.path().join("posts").join("drafts");
        std::fs::create_dir_all(&nested)?;
        let config = Config::from_directory(&nested, None)?;
        assert_eq!(config.title, "Found");
        assert_eq!(config.output_directory, root.path().join("dist"));
        Ok(())
    }
}
