//! Turns parsed documents into output HTML files. Every output file is a
//! [`Page`]: a typed context struct that knows its template, its output
//! path and how to convert itself into a template [`Context`]. The
//! [`Writer`] merges that context over the site-wide one ([`common`]),
//! renders the page's template and wraps the result in the `layout`
//! template.

use crate::collections::{self, Pagination, TagGroup, Year, MAX_RELATED};
use crate::config::{Config, Link};
use crate::post::Document;
use crate::template::Template;
use crate::value::{Context, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// The name of the template every page is wrapped in.
pub const LAYOUT: &str = "layout";

/// An output HTML file.
pub trait Page {
    /// The name of the page's template, without the `.html` extension.
    const TEMPLATE: &'static str;

    /// The output path relative to the output directory.
    fn file_name(&self) -> String;

    /// The page's own template data. Site-wide keys are added by the
    /// [`Writer`].
    fn to_context(&self, config: &Config) -> Context;
}

/// The site-wide keys every page can use.
pub fn common(config: &Config) -> Context {
    let lang = config.language.as_str();
    let t = |key: &str| config.strings.lookup(lang, key);
    let nav: Vec<Value> = config
        .nav
        .iter()
        .map(|item| {
            Context::new()
                .with("label", t(&item.key))
                .with("url", config.url(&item.url))
                .into()
        })
        .collect();
    let languages: Vec<Value> = config
        .languages
        .iter()
        .map(|code| {
            Context::new()
                .with("code", code)
                .with("label", config.strings.find(code, "name").unwrap_or(code.as_str()))
                .into()
        })
        .collect();
    Context::new()
        .with("siteTitle", &config.title)
        .with("siteDescription", &config.description)
        .with("siteUrl", &config.site_url)
        .with("basePath", &config.base_path)
        .with("author", &config.author)
        .with("language", lang)
        .with("navItems", nav)
        .with("commentsEnabled", config.comments.enabled)
        .with("commentsRepo", &config.comments.repo)
        .with("commentsIssueTerm", &config.comments.issue_term)
        .with("commentsLabel", &config.comments.label)
        .with("poweredBy", t("poweredBy"))
        .with("searchPlaceholder", t("search"))
        .with("rssEnabled", config.rss)
        .with("rssLabel", t("rss"))
        .with("langSwitcher", config.languages.len() > 1)
        .with("languages", languages)
}

/// A post as listed on index, archive and tag pages.
fn summary(post: &Document) -> Value {
    post.to_context()
        .with("hasTags", !post.tags.is_empty())
        .with("tagList", post.tags.iter().map(Value::from).collect::<Vec<_>>())
        .into()
}

fn page_title(title: &str, config: &Config) -> String {
    format!("{} - {}", title, config.title)
}

/// A post page, with its neighbours and related posts.
pub struct PostPage<'a> {
    pub post: &'a Document,
    pub prev: Option<&'a Document>,
    pub next: Option<&'a Document>,
    pub related: Vec<&'a Document>,
}

impl<'a> PostPage<'a> {
    /// Builds the page for `posts[i]`.
    pub fn new(posts: &'a [Document], i: usize) -> PostPage<'a> {
        let post = &posts[i];
        let (prev, next) = collections::neighbors(posts, i);
        PostPage {
            post,
            prev,
            next,
            related: collections::related(post, posts, MAX_RELATED),
        }
    }
}

impl Page for PostPage<'_> {
    const TEMPLATE: &'static str = "post";

    fn file_name(&self) -> String {
        format!("posts/{}.html", self.post.slug)
    }

    fn to_context(&self, config: &Config) -> Context {
        let post = self.post;
        let related: Vec<Value> = self
            .related
            .iter()
            .map(|r| {
                Context::new()
                    .with("relTitle", &r.title)
                    .with("relUrl", &r.url)
                    .with("relDate", r.date_string())
                    .into()
            })
            .collect();
        post.to_context()
            .with("pageTitle", page_title(&post.title, config))
            .with("hasCover", !post.cover.is_empty())
            .with("hasToc", post.has_toc())
            .with("hasTags", !post.tags.is_empty())
            .with("tagList", post.tags.iter().map(Value::from).collect::<Vec<_>>())
            .with("hasPrev", self.prev.is_some())
            .with("hasNext", self.next.is_some())
            .with("prevTitle", self.prev.map(|p| p.title.as_str()).unwrap_or(""))
            .with("prevUrl", self.prev.map(|p| p.url.as_str()).unwrap_or(""))
            .with("nextTitle", self.next.map(|p| p.title.as_str()).unwrap_or(""))
            .with("nextUrl", self.next.map(|p| p.url.as_str()).unwrap_or(""))
            .with("hasRelated", !related.is_empty())
            .with("relatedPosts", related)
    }
}

/// One page of the post index.
pub struct IndexPage<'a>(pub Pagination<'a>);

impl Page for IndexPage<'_> {
    const TEMPLATE: &'static str = "index";

    fn file_name(&self) -> String {
        self.0.file_name()
    }

    fn to_context(&self, config: &Config) -> Context {
        let page = &self.0;
        let title = match page.number {
            1 => config.title.clone(),
            n => page_title(&format!("{} {}", config.t("page"), n), config),
        };
        Context::new()
            .with("pageTitle", title)
            .with("posts", page.posts.iter().map(summary).collect::<Vec<_>>())
            .with("hasPagination", page.total > 1)
            .with("currentPage", page.number)
            .with("totalPages", page.total)
            .with("hasPrevPage", page.has_prev())
            .with("hasNextPage", page.has_next())
            .with("prevPageUrl", page.prev_url(&config.base_path))
            .with("nextPageUrl", page.next_url(&config.base_path))
    }
}

/// The archive, grouped by year.
pub struct ArchivePage<'a>(pub Vec<Year<'a>>);

impl Page for ArchivePage<'_> {
    const TEMPLATE: &'static str = "archive";

    fn file_name(&self) -> String {
        String::from("archive.html")
    }

    fn to_context(&self, config: &Config) -> Context {
        let years: Vec<Value> = self
            .0
            .iter()
            .map(|y| {
                Context::new()
                    .with("year", &y.year)
                    .with("posts", y.posts.iter().map(|p| summary(p)).collect::<Vec<_>>())
                    .into()
            })
            .collect();
        Context::new()
            .with("pageTitle", page_title(&config.t("archive"), config))
            .with("archiveTitle", config.t("archive"))
            .with("years", years)
    }
}

/// Every tag with its posts.
pub struct TagsPage<'a>(pub Vec<TagGroup<'a>>);

impl Page for TagsPage<'_> {
    const TEMPLATE: &'static str = "tags";

    fn file_name(&self) -> String {
        String::from("tags.html")
    }

    fn to_context(&self, config: &Config) -> Context {
        let tags: Vec<Value> = self
            .0
            .iter()
            .map(|g| {
                Context::new()
                    .with("tag", &g.tag.name)
                    .with("tagId", &g.tag.id)
                    .with("count", g.posts.len())
                    .with("posts", g.posts.iter().map(|p| summary(p)).collect::<Vec<_>>())
                    .into()
            })
            .collect();
        Context::new()
            .with("pageTitle", page_title(&config.t("tags"), config))
            .with("tagsTitle", config.t("tags"))
            .with("tags", tags)
    }
}

/// A custom page from `pages/`.
pub struct CustomPage<'a>(pub &'a Document);

impl Page for CustomPage<'_> {
    const TEMPLATE: &'static str = "page";

    fn file_name(&self) -> String {
        format!("{}.html", self.0.slug)
    }

    fn to_context(&self, config: &Config) -> Context {
        self.0
            .to_context()
            .with("pageTitle", page_title(&self.0.title, config))
            .with("hasToc", self.0.has_toc())
    }
}

/// The links page; only written when links are configured.
pub struct LinksPage<'a>(pub &'a [Link]);

impl Page for LinksPage<'_> {
    const TEMPLATE: &'static str = "links";

    fn file_name(&self) -> String {
        String::from("links.html")
    }

    fn to_context(&self, config: &Config) -> Context {
        let links: Vec<Value> = self
            .0
            .iter()
            .map(|l| {
                Context::new()
                    .with("name", &l.name)
                    .with("url", &l.url)
                    .with("description", &l.description)
                    .with("avatar", &l.avatar)
                    .into()
            })
            .collect();
        Context::new()
            .with("pageTitle", page_title(&config.t("links"), config))
            .with("linksTitle", config.t("links"))
            .with("links", links)
    }
}

pub struct NotFoundPage;

impl Page for NotFoundPage {
    const TEMPLATE: &'static str = "404";

    fn file_name(&self) -> String {
        String::from("404.html")
    }

    fn to_context(&self, config: &Config) -> Context {
        Context::new().with("pageTitle", page_title("404", config))
    }
}

/// The parsed theme templates, loaded once per build.
pub struct Templates(HashMap<String, Template>);

impl Templates {
    /// Loads `{directory}/{name}.html` for `layout` and every name in
    /// `names`.
    pub fn load(directory: &Path, names: &[&str]) -> Result<Templates> {
        let mut templates = HashMap::new();
        for name in std::iter::once(&LAYOUT).chain(names) {
            let path = directory.join(format!("{}.html", name));
            let mut contents = String::new();
            File::open(&path)
                .and_then(|mut file| file.read_to_string(&mut contents))
                .map_err(|err| Error::OpenTemplateFile {
                    path: path.clone(),
                    err,
                })?;
            templates.insert(name.to_string(), Template::parse(&contents));
        }
        Ok(Templates(templates))
    }

    /// The page templates a site with `config` needs, besides the layout.
    pub fn required(config: &Config) -> Vec<&'static str> {
        let mut names = vec![
            PostPage::TEMPLATE,
            IndexPage::TEMPLATE,
            ArchivePage::TEMPLATE,
            TagsPage::TEMPLATE,
            CustomPage::TEMPLATE,
            NotFoundPage::TEMPLATE,
        ];
        if !config.links.is_empty() {
            names.push(LinksPage::TEMPLATE);
        }
        names
    }

    fn get(&self, name: &str) -> Result<&Template> {
        self.0
            .get(name)
            .ok_or_else(|| Error::MissingTemplate(name.to_owned()))
    }
}

/// Responsible for templating and writing HTML pages to disk.
pub struct Writer<'a> {
    config: &'a Config,
    templates: &'a Templates,
    common: Context,
    seen_dirs: HashSet<PathBuf>,
}

impl<'a> Writer<'a> {
    pub fn new(config: &'a Config, templates: &'a Templates) -> Writer<'a> {
        Writer {
            config,
            templates,
            common: common(config),
            seen_dirs: HashSet::new(),
        }
    }

    /// Renders `page` into its template, then into the layout with the inner
    /// output available as `content`.
    pub fn render<P: Page>(&self, page: &P) -> Result<String> {
        let mut ctx = self.common.clone();
        ctx.extend(page.to_context(self.config));
        let inner = self.templates.get(P::TEMPLATE)?.render(&ctx);
        ctx.insert("content", inner);
        Ok(self.templates.get(LAYOUT)?.render(&ctx))
    }

    /// Takes a single [`Page`], templates it, and writes it to disk.
    pub fn write_page<P: Page>(&mut self, page: &P) -> Result<()> {
        let html = self.render(page)?;
        let path = self.config.output_directory.join(page.file_name());
        if let Some(dir) = path.parent() {
            if self.seen_dirs.insert(dir.to_owned()) {
                std::fs::create_dir_all(dir)?;
            }
        }
        std::fs::write(&path, html).map_err(|err| Error::WriteFile { path, err })
    }

    /// Writes every page of the site: posts, index pages, the archive, the
    /// tags page, custom pages, the links page and the 404 page. Returns the
    /// number of files written.
    pub fn write_site(&mut self, posts: &[Document], pages: &[Document]) -> Result<usize> {
        let mut written = 0;
        for i in 0..posts.len() {
            self.write_page(&PostPage::new(posts, i))?;
            written += 1;
        }
        for pagination in collections::paginate(posts, self.config.posts_per_page) {
            self.write_page(&IndexPage(pagination))?;
            written += 1;
        }
        self.write_page(&ArchivePage(collections::archive(posts)))?;
        self.write_page(&TagsPage(collections::tag_index(posts)))?;
        written += 2;
        for page in pages {
            self.write_page(&CustomPage(page))?;
            written += 1;
        }
        let config = self.config;
        if !config.links.is_empty() {
            self.write_page(&LinksPage(&config.links))?;
            written += 1;
        }
        self.write_page(&NotFoundPage)?;
        Ok(written + 1)
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// Returned when a template file can't be read.
    OpenTemplateFile { path: PathBuf, err: io::Error },

    /// Returned when a page asks for a template that wasn't loaded.
    MissingTemplate(String),

    /// Returned when an output file can't be written.
    WriteFile { path: PathBuf, err: io::Error },

    /// An error creating output directories.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::MissingTemplate(name) => write!(f, "template `{}` was not loaded", name),
            Error::WriteFile { path, err } => {
                write!(f, "Writing '{}': {}", path.display(), err)
            }
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::MissingTemplate(_) => None,
            Error::WriteFile { path: _, err } => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}
