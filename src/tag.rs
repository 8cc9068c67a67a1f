//! Defines the [`Tag`] type, which represents a [`crate::post::Document`]
//! tag.

use crate::util::slugify;
use crate::value::{Context, Value};
use std::hash::{Hash, Hasher};

/// Represents a post tag. Tags keep the name the author wrote; the `id` is
/// its slug, used as the anchor on the tags page.
#[derive(Clone, Debug)]
pub struct Tag {
    /// The tag as written in the front matter.
    pub name: String,

    /// `slugify(name)`.
    pub id: String,

    /// The tag's anchor on the tags page, i.e. `{base_path}/tags.html#{id}`.
    pub url: String,
}

impl Tag {
    pub fn new(name: &str, base_path: &str) -> Tag {
        let id = slugify(name);
        Tag {
            name: name.to_owned(),
            url: format!("{}/tags.html#{}", base_path, id),
            id,
        }
    }
}

impl Hash for Tag {
    /// Tags hash by name only, consistent with [`PartialEq`].
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state)
    }
}

impl PartialEq for Tag {
    /// Two tags are the same tag when their names match exactly; `Rust` and
    /// `rust` are different tags that share an id.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Tag {}

impl From<&Tag> for Value {
    /// Converts [`Tag`]s into [`Value`]s for templating: `{tag, tagUrl}`.
    fn from(t: &Tag) -> Value {
        Context::new()
            .with("tag", &t.name)
            .with("tagUrl", &t.url)
            .into()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new() {
        let tag = Tag::new("Rust 编程", "/blog");
        assert_eq!(tag.id, "rust-编程");
        assert_eq!(tag.url, "/blog/tags.html#rust-编程");
    }

    #[test]
    fn test_to_value() {
        let value = Value::from(&Tag::new("Go", ""));
        let wanted: Value = Context::new()
            .with("tag", "Go")
            .with("tagUrl", "/tags.html#go")
            .into();
        assert_eq!(value, wanted);
    }
}
