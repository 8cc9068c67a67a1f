//! Derived post collections: index pagination, the year archive, the tag
//! index, related posts and previous/next navigation. Every function takes
//! posts already sorted by date, most recent first, and keeps that order
//! wherever it groups or filters.

use crate::post::Document;
use crate::tag::Tag;
use std::collections::BTreeMap;

/// How many related posts a post page lists.
pub const MAX_RELATED: usize = 3;

/// One page of the paginated post index. Pages are numbered from 1.
#[derive(Debug, PartialEq)]
pub struct Pagination<'a> {
    pub number: usize,
    pub total: usize,
    pub posts: &'a [Document],
}

impl Pagination<'_> {
    pub fn has_prev(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total
    }

    /// The previous page's URL. Page 2 links back to the site root.
    pub fn prev_url(&self, base_path: &str) -> Option<String> {
        match self.number {
            0 | 1 => None,
            2 => Some(format!("{}/index.html", base_path)),
            n => Some(format!("{}/page/{}.html", base_path, n - 1)),
        }
    }

    pub fn next_url(&self, base_path: &str) -> Option<String> {
        match self.has_next() {
            true => Some(format!("{}/page/{}.html", base_path, self.number + 1)),
            false => None,
        }
    }

    /// The output path of this page relative to the output directory.
    pub fn file_name(&self) -> String {
        match self.number {
            1 => String::from("index.html"),
            n => format!("page/{}.html", n),
        }
    }
}

/// Slices `posts` into pages of `per_page` posts (values below 1 count as 1).
/// There is always at least one page, even when there are no posts.
pub fn paginate(posts: &[Document], per_page: usize) -> Vec<Pagination<'_>> {
    let per_page = per_page.max(1);
    let total = std::cmp::max(1, (posts.len() + per_page - 1) / per_page);
    if posts.is_empty() {
        return vec![Pagination {
            number: 1,
            total,
            posts,
        }];
    }
    posts
        .chunks(per_page)
        .enumerate()
        .map(|(i, chunk)| Pagination {
            number: i + 1,
            total,
            posts: chunk,
        })
        .collect()
}

/// The posts of one archive year.
#[derive(Debug, PartialEq)]
pub struct Year<'a> {
    pub year: String,
    pub posts: Vec<&'a Document>,
}

/// Groups posts by the year of their date, most recent year first.
pub fn archive(posts: &[Document]) -> Vec<Year<'_>> {
    let mut years: BTreeMap<String, Vec<&Document>> = BTreeMap::new();
    for post in posts {
        let year = post.date.map(|d| d.year()).unwrap_or_default();
        years.entry(year).or_default().push(post);
    }
    years
        .into_iter()
        .rev()
        .map(|(year, posts)| Year { year, posts })
        .collect()
}

/// A tag and every post carrying it.
#[derive(Debug, PartialEq)]
pub struct TagGroup<'a> {
    pub tag: &'a Tag,
    pub posts: Vec<&'a Document>,
}

/// Collects every tag used by `posts`, in ascending order of name.
pub fn tag_index(posts: &[Document]) -> Vec<TagGroup<'_>> {
    let mut groups: BTreeMap<&str, TagGroup> = BTreeMap::new();
    for post in posts {
        for tag in &post.tags {
            groups
                .entry(tag.name.as_str())
                .or_insert_with(|| TagGroup {
                    tag,
                    posts: Vec::new(),
                })
                .posts
                .push(post);
        }
    }
    groups.into_values().collect()
}

/// Ranks the other posts by the number of tags they share with `post` and
/// returns up to `max` of them. Posts sharing nothing are left out, and posts
/// with equal scores keep their order in `posts`.
pub fn related<'a>(post: &Document, posts: &'a [Document], max: usize) -> Vec<&'a Document> {
    if post.tags.is_empty() {
        return Vec::new();
    }
    let mut scored: Vec<(usize, &Document)> = posts
        .iter()
        .filter(|p| p.slug != post.slug)
        .map(|p| (post.shares_tags_with(p), p))
        .filter(|(score, _)| *score > 0)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(max).map(|(_, p)| p).collect()
}

/// The neighbours of `posts[i]`: the previous post is the next older one and
/// the next post is the next newer one.
pub fn neighbors(posts: &[Document], i: usize) -> (Option<&Document>, Option<&Document>) {
    let prev = posts.get(i + 1);
    let next = match i {
        0 => None,
        _ => posts.get(i - 1),
    };
    (prev, next)
}
