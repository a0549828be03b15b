//! Rendering: template engine, link-ification and Markdown

pub mod engine;
pub mod linkify;
pub mod markdown;

pub use self::engine::{TemplateRenderer, TeraRenderer};
pub use self::linkify::{find_links, linkify, Link, LinkKind};
pub use self::markdown::markdown_to_html;
