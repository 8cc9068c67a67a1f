//! The library code for the `paper` static blog generator. A build runs in
//! three steps:
//!
//! 1. Loading the project configuration ([`crate::config`])
//! 2. Parsing posts and pages from Markdown sources ([`crate::parser`])
//! 3. Rendering every page through the theme templates and writing the
//!    results to disk ([`crate::write`], [`crate::build`])
//!
//! The second step is the more involved. Each document body goes through the
//! [`processor::Processor`]: callouts ([`crate::callout`]) and component
//! directives ([`crate::directive`]) are swapped for placeholders, the rest is
//! rendered as CommonMark ([`crate::markdown`]) while headings are collected
//! into a table of contents ([`crate::toc`]), the placeholders are restored as
//! HTML, and finally CJK and Latin text gets spaced apart
//! ([`crate::autospace`]).
//!
//! Templates ([`crate::template`]) are a small logic-less language rendered
//! against a [`value::Context`]; the theme decides the markup, the crate only
//! supplies the data.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod autospace;
pub mod build;
pub mod callout;
pub mod collections;
pub mod config;
pub mod directive;
pub mod feed;
pub mod i18n;
pub mod markdown;
pub mod parser;
pub mod post;
pub mod processor;
pub mod search;
pub mod sitemap;
pub mod tag;
pub mod template;
pub mod toc;
pub mod util;
pub mod value;
pub mod watch;
pub mod write;
