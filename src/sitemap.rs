//! `sitemap.xml` and the `robots.txt` that points at it.

use crate::config::Config;
use crate::post::Document;
use crate::util::escape_html;
use chrono::Utc;

/// Renders the sitemap: the root (last modified when the newest post was),
/// the archive and tags pages, every post and every custom page.
pub fn sitemap(config: &Config, posts: &[Document], pages: &[Document]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

    let mut url = |loc: &str, lastmod: Option<String>, priority: &str| {
        xml.push_str(&format!(
            "  <url><loc>{}</loc>",
            escape_html(&config.absolute_url(loc))
        ));
        if let Some(date) = lastmod {
            xml.push_str(&format!("<lastmod>{}</lastmod>", date));
        }
        xml.push_str(&format!("<priority>{}</priority></url>\n", priority));
    };

    let newest = match posts.first() {
        Some(post) => post.date_string(),
        None => Utc::now().format("%Y-%m-%d").to_string(),
    };
    url("/", Some(newest), "1.0");
    url("/archive.html", None, "0.5");
    url("/tags.html", None, "0.5");
    for post in posts {
        url(&format!("/posts/{}.html", post.slug), Some(post.date_string()), "0.8");
    }
    for page in pages {
        url(&format!("/{}.html", page.slug), None, "0.6");
    }

    xml.push_str("</urlset>");
    xml
}

pub fn robots(config: &Config) -> String {
    format!(
        "User-agent: *\nAllow: /\nSitemap: {}\n",
        config.absolute_url("/sitemap.xml")
    )
}
