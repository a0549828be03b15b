//! Tera-based rendering of meld subjects, bodies and layouts

use crate::error::Result;
use crate::loader::TemplateLoader;
use crate::payload::Payload;
use crate::render::linkify::linkify;
use serde_json::Value;
use std::collections::HashMap;
use tera::{Context, Tera};
use tracing::debug;

/// Renders template source text against a payload
pub trait TemplateRenderer: Send + Sync {
    /// Render `source`. `name` identifies the source in errors and decides
    /// auto-escaping (names ending in `.html` are escaped).
    fn render(&self, name: &str, source: &str, payload: &Payload) -> Result<String>;

    /// Render `source` with HTML escaping whatever its name
    fn render_escaped(&self, name: &str, source: &str, payload: &Payload) -> Result<String>;

    /// Render `content` as the `block` block of the registered `layout`
    fn render_in_layout(
        &self,
        layout: &str,
        block: &str,
        content: &str,
        payload: &Payload,
    ) -> Result<String>;
}

/// Payload key carrying an already rendered fragment into a layout
const CONTENT_KEY: &str = "meld_content";

/// Suffix that switches Tera auto-escaping on for an inline source
const ESCAPED_SUFFIX: &str = ".html";

/// Escape `& < > " '` only, leaving `/` intact so URLs can still be linked
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Template renderer wrapping Tera with registered layouts
#[derive(Debug, Clone)]
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    pub fn new() -> Self {
        let mut tera = Tera::default();
        tera.set_escape_fn(escape_html);
        tera.register_filter("linkify", linkify_filter);
        Self { tera }
    }

    /// Build a renderer with `layouts` loaded through `loader`
    pub async fn with_layouts(loader: &dyn TemplateLoader, layouts: &[&str]) -> Result<Self> {
        let mut renderer = Self::new();
        for name in layouts {
            let source = loader.load(name).await?;
            renderer.register_layout(name, &source)?;
        }
        Ok(renderer)
    }

    /// Make `name` available to `{% extends %}`
    pub fn register_layout(&mut self, name: &str, source: &str) -> Result<()> {
        self.tera.add_raw_template(name, source)?;
        debug!("Registered layout {}", name);
        Ok(())
    }

    fn render_inline(&self, name: &str, source: &str, context: &Context) -> Result<String> {
        // Cloned so inline sources never leak into the shared layout set
        let mut inline = self.tera.clone();
        inline.add_raw_template(name, source)?;
        Ok(inline.render(name, context)?)
    }
}

impl Default for TeraRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for TeraRenderer {
    fn render(&self, name: &str, source: &str, payload: &Payload) -> Result<String> {
        let context = Context::from_value(Value::Object(payload.clone()))?;
        self.render_inline(name, source, &context)
    }

    fn render_escaped(&self, name: &str, source: &str, payload: &Payload) -> Result<String> {
        let context = Context::from_value(Value::Object(payload.clone()))?;
        if name.ends_with(ESCAPED_SUFFIX) {
            self.render_inline(name, source, &context)
        } else {
            self.render_inline(&format!("{name}{ESCAPED_SUFFIX}"), source, &context)
        }
    }

    fn render_in_layout(
        &self,
        layout: &str,
        block: &str,
        content: &str,
        payload: &Payload,
    ) -> Result<String> {
        let wrapper = format!(
            "{{% extends \"{layout}\" %}}{{% block {block} %}}\n{{{{ {CONTENT_KEY} | safe }}}}\n{{% endblock {block} %}}"
        );

        let mut context = Context::from_value(Value::Object(payload.clone()))?;
        context.insert(CONTENT_KEY, content);
        self.render_inline("__layout__.html", &wrapper, &context)
    }
}

fn linkify_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = tera::try_get_value!("linkify", "value", String, value);
    Ok(Value::String(linkify(&text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeldError;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_render_variables() {
        let renderer = TeraRenderer::new();
        let out = renderer
            .render(
                "welcome.txt",
                "Hello {{ name }} from {{ site.name }}!",
                &payload(json!({ "name": "Jane", "site": { "name": "Acme" } })),
            )
            .unwrap();
        assert_eq!(out, "Hello Jane from Acme!");
    }

    #[test]
    fn test_html_names_are_escaped() {
        let renderer = TeraRenderer::new();
        let data = payload(json!({ "name": "<b>Jane</b>" }));

        let html = renderer.render("welcome.html", "{{ name }}", &data).unwrap();
        assert_eq!(html, "&lt;b&gt;Jane&lt;/b&gt;");

        let text = renderer.render("welcome.txt", "{{ name }}", &data).unwrap();
        assert_eq!(text, "<b>Jane</b>");
    }

    #[test]
    fn test_escaping_keeps_urls_intact() {
        let renderer = TeraRenderer::new();
        let data = payload(json!({ "url": "http://example.com/a?x=1&y='2'" }));

        let html = renderer.render("reset.html", "{{ url }}", &data).unwrap();
        assert_eq!(html, "http://example.com/a?x=1&amp;y=&#x27;2&#x27;");
    }

    #[test]
    fn test_render_escaped_ignores_name() {
        let renderer = TeraRenderer::new();
        let data = payload(json!({ "name": "<i>Jane</i>" }));

        let out = renderer
            .render_escaped("welcome.md", "Hi {{ name }}", &data)
            .unwrap();
        assert_eq!(out, "Hi &lt;i&gt;Jane&lt;/i&gt;");

        let out = renderer
            .render_escaped("welcome.html", "Hi {{ name }}", &data)
            .unwrap();
        assert_eq!(out, "Hi &lt;i&gt;Jane&lt;/i&gt;");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="/x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;/x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
        assert_eq!(escape_html("https://example.com/path"), "https://example.com/path");
    }

    #[test]
    fn test_render_in_layout() {
        let mut renderer = TeraRenderer::new();
        renderer
            .register_layout(
                "base.html",
                "<html><title>{{ title }}</title><body>{% block content %}{% endblock content %}</body></html>",
            )
            .unwrap();

        let out = renderer
            .render_in_layout(
                "base.html",
                "content",
                "<p>Hi {{ not_rendered }}</p>",
                &payload(json!({ "title": "Welcome" })),
            )
            .unwrap();

        assert_eq!(
            out,
            "<html><title>Welcome</title><body>\n<p>Hi {{ not_rendered }}</p>\n</body></html>"
        );
    }

    #[test]
    fn test_missing_layout_propagates() {
        let renderer = TeraRenderer::new();
        let err = renderer
            .render_in_layout("missing.html", "content", "<p>x</p>", &Payload::new())
            .unwrap_err();
        assert!(matches!(err, MeldError::Render(_)));
    }

    #[test]
    fn test_syntax_error_propagates() {
        let renderer = TeraRenderer::new();
        let err = renderer
            .render("broken.txt", "{% if %}", &Payload::new())
            .unwrap_err();
        assert!(matches!(err, MeldError::Render(_)));
    }

    #[test]
    fn test_linkify_filter() {
        let renderer = TeraRenderer::new();
        let out = renderer
            .render(
                "note.txt",
                "{{ note | linkify }}",
                &payload(json!({ "note": "see http://example.com now" })),
            )
            .unwrap();
        assert_eq!(
            out,
            r#"see <a href="http://example.com">http://example.com</a> now"#
        );
    }
}
