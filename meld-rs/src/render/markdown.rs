//! Markdown to HTML conversion for `.md` melds

use crate::error::{MeldError, Result};
use markdown::{CompileOptions, Options};

/// Convert Markdown to HTML, passing inline HTML (such as the anchors added by
/// link-ification) through untouched
pub fn markdown_to_html(text: &str) -> Result<String> {
    let options = Options {
        compile: CompileOptions {
            allow_dangerous_html: true,
            ..CompileOptions::default()
        },
        ..Options::default()
    };

    markdown::to_html_with_options(text, &options).map_err(|e| MeldError::Markdown(e.to_string()))
}
