//! A small logic-less template language. Six forms are recognized:
//!
//! * `{{#each key}}…{{/each}}` renders the body once per element of a list
//! * `{{#if key}}…{{/if}}` renders the body when `key` is truthy
//! * `{{#unless key}}…{{/unless}}` renders the body when `key` is falsy
//! * `{{{key}}}` substitutes a value verbatim
//! * `{{key}}` substitutes a value with `&`, `<`, `>` and `"` escaped
//!
//! Keys are `[A-Za-z0-9_]+`. Anything else that looks like `{{…}}` is left
//! untouched. Templates are parsed once into a block tree with an explicit
//! stack, so blocks of the same kind nest correctly, and the tree is then
//! evaluated against a [`Context`]. Substituted values are never parsed again,
//! so data can't smuggle template syntax into the output.
//!
//! Inside an `each` body the element's own fields shadow the enclosing
//! context when the element is an object; other elements are exposed as
//! `_item`. The zero-based position is always available as `_index`.

use crate::util::escape_html;
use crate::value::{Context, Value};
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BlockKind {
    Each,
    If,
    Unless,
}

impl BlockKind {
    fn from_name(name: &str) -> Option<BlockKind> {
        match name {
            "each" => Some(BlockKind::Each),
            "if" => Some(BlockKind::If),
            "unless" => Some(BlockKind::Unless),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Node {
    Text(String),
    Raw(String),
    Escaped(String),
    Block {
        kind: BlockKind,
        key: String,
        body: Vec<Node>,
    },
}

enum Token<'a> {
    Raw(&'a str),
    Escaped(&'a str),
    Open(BlockKind, &'a str),
    Close(BlockKind),
}

static RAW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{\{\{([A-Za-z0-9_]+)\}\}\}").unwrap());
static OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{\{#(each|if|unless) ([A-Za-z0-9_]+)\}\}").unwrap());
static CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{\{/(each|if|unless)\}\}").unwrap());
static ESCAPED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{\{([A-Za-z0-9_]+)\}\}").unwrap());

/// Recognizes a tag at the start of `s`, returning it with its length.
fn token(s: &str) -> Option<(Token, usize)> {
    if let Some(c) = RAW.captures(s) {
        return Some((Token::Raw(c.get(1)?.as_str()), c.get(0)?.end()));
    }
    if let Some(c) = OPEN.captures(s) {
        let kind = BlockKind::from_name(c.get(1)?.as_str())?;
        return Some((Token::Open(kind, c.get(2)?.as_str()), c.get(0)?.end()));
    }
    if let Some(c) = CLOSE.captures(s) {
        let kind = BlockKind::from_name(c.get(1)?.as_str())?;
        return Some((Token::Close(kind), c.get(0)?.end()));
    }
    if let Some(c) = ESCAPED.captures(s) {
        return Some((Token::Escaped(c.get(1)?.as_str()), c.get(0)?.end()));
    }
    None
}

/// An open block awaiting its closing tag.
struct Frame {
    kind: BlockKind,
    key: String,
    open_tag: String,
    body: Vec<Node>,
}

/// Builds the block tree. Mismatched tags degrade to literal text: a closing
/// tag with no open block of its kind stays as written, and an open block
/// that is never closed keeps its opening tag as text with its body inlined.
fn parse(src: &str) -> Vec<Node> {
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut text = String::new();
    let mut rest = src;

    fn flush(text: &mut String, stack: &mut Vec<Frame>, root: &mut Vec<Node>) {
        if !text.is_empty() {
            let node = Node::Text(std::mem::take(text));
            match stack.last_mut() {
                Some(frame) => frame.body.push(node),
                None => root.push(node),
            }
        }
    }

    fn push(node: Node, stack: &mut Vec<Frame>, root: &mut Vec<Node>) {
        match stack.last_mut() {
            Some(frame) => frame.body.push(node),
            None => root.push(node),
        }
    }

    // Turns the innermost open frame back into literal text in its parent.
    fn abandon(stack: &mut Vec<Frame>, root: &mut Vec<Node>) {
        if let Some(frame) = stack.pop() {
            push(Node::Text(frame.open_tag), stack, root);
            for node in frame.body {
                push(node, stack, root);
            }
        }
    }

    while let Some(offset) = rest.find("{{") {
        text.push_str(&rest[..offset]);
        rest = &rest[offset..];
        let (tok, len) = match token(rest) {
            Some(t) => t,
            None => {
                text.push('{');
                rest = &rest[1..];
                continue;
            }
        };
        flush(&mut text, &mut stack, &mut root);
        match tok {
            Token::Raw(key) => push(Node::Raw(key.to_owned()), &mut stack, &mut root),
            Token::Escaped(key) => push(Node::Escaped(key.to_owned()), &mut stack, &mut root),
            Token::Open(kind, key) => stack.push(Frame {
                kind,
                key: key.to_owned(),
                open_tag: rest[..len].to_owned(),
                body: Vec::new(),
            }),
            Token::Close(kind) => {
                if stack.iter().any(|f| f.kind == kind) {
                    while stack.last().map(|f| f.kind) != Some(kind) {
                        abandon(&mut stack, &mut root);
                    }
                    if let Some(frame) = stack.pop() {
                        let node = Node::Block {
                            kind: frame.kind,
                            key: frame.key,
                            body: frame.body,
                        };
                        push(node, &mut stack, &mut root);
                    }
                } else {
                    push(Node::Text(rest[..len].to_owned()), &mut stack, &mut root);
                }
            }
        }
        rest = &rest[len..];
    }
    text.push_str(rest);
    flush(&mut text, &mut stack, &mut root);
    while !stack.is_empty() {
        abandon(&mut stack, &mut root);
    }
    root
}

/// One level of variable lookup. Loop bodies push a scope holding the
/// current element in front of the enclosing one.
struct Scope<'a> {
    fields: Option<&'a Context>,
    item: Option<&'a Value>,
    index: Option<Value>,
    parent: Option<&'a Scope<'a>>,
}

impl<'a> Scope<'a> {
    fn root(ctx: &'a Context) -> Scope<'a> {
        Scope {
            fields: Some(ctx),
            item: None,
            index: None,
            parent: None,
        }
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        let own = match key {
            "_index" => self.index.as_ref(),
            "_item" => self.item,
            _ => None,
        };
        own.or_else(|| self.fields.and_then(|f| f.get(key)))
            .or_else(|| self.parent.and_then(|p| p.lookup(key)))
    }
}

fn render_nodes(nodes: &[Node], scope: &Scope, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Raw(key) => {
                if let Some(value) = scope.lookup(key) {
                    out.push_str(&value.to_string());
                }
            }
            Node::Escaped(key) => {
                if let Some(value) = scope.lookup(key) {
                    out.push_str(&escape_html(&value.to_string()));
                }
            }
            Node::Block { kind, key, body } => match kind {
                BlockKind::If => {
                    if scope.lookup(key).map_or(false, Value::is_truthy) {
                        render_nodes(body, scope, out);
                    }
                }
                BlockKind::Unless => {
                    if !scope.lookup(key).map_or(false, Value::is_truthy) {
                        render_nodes(body, scope, out);
                    }
                }
                BlockKind::Each => {
                    if let Some(Value::Array(items)) = scope.lookup(key) {
                        for (i, item) in items.iter().enumerate() {
                            let (fields, item) = match item {
                                Value::Object(fields) => (Some(fields), None),
                                other => (None, Some(other)),
                            };
                            let child = Scope {
                                fields,
                                item,
                                index: Some(Value::from(i)),
                                parent: Some(scope),
                            };
                            render_nodes(body, &child, out);
                        }
                    }
                }
            },
        }
    }
}

/// A parsed template. Parsing never fails and rendering never mutates the
/// template, so one [`Template`] can be rendered against any number of
/// contexts.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(src: &str) -> Template {
        Template { nodes: parse(src) }
    }

    /// Renders the template against `ctx`. Missing keys render as empty
    /// strings.
    pub fn render(&self, ctx: &Context) -> String {
        let mut out = String::new();
        render_nodes(&self.nodes, &Scope::root(ctx), &mut out);
        out
    }
}

/// Parses and renders `template` in one step.
pub fn render(template: &str, ctx: &Context) -> String {
    Template::parse(template).render(ctx)
}
