//! Email composition from melds
//!
//! An [`EmailComposer`] names one template and carries the shared
//! [`MeldEnvironment`]. Binding it to a payload resolves the meld and yields a
//! [`MeldEmail`] that renders the subject, text and HTML parts and sends the
//! resulting message.

use crate::config::{Config, MeldConfig, SiteConfig};
use crate::error::{MeldError, Result};
use crate::loader::{FileSystemLoader, TemplateLoader};
use crate::meld::{Meld, MeldKind, MeldResolver, MeldStore, SqliteMeldStore};
use crate::message::ComposedMessage;
use crate::payload::{Payload, RequestSource};
use crate::render::{linkify, markdown_to_html, TemplateRenderer, TeraRenderer};
use crate::transport::{MailTransport, SmtpTransport};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Layout block that rendered HTML is placed into
pub const CONTENT_BLOCK: &str = "content";

/// Collaborators and settings shared by every composer
#[derive(Clone)]
pub struct MeldEnvironment {
    pub resolver: MeldResolver,
    pub renderer: Arc<dyn TemplateRenderer>,
    pub transport: Arc<dyn MailTransport>,
    pub settings: MeldConfig,
    pub site: Option<SiteConfig>,
}

impl MeldEnvironment {
    /// Wire up filesystem templates, the SQLite store and SMTP delivery
    pub async fn from_config(config: &Config) -> Result<Self> {
        let loader = FileSystemLoader::new(config.templates.dirs.clone());
        let store = SqliteMeldStore::connect(&config.storage.database_url).await?;
        let transport = SmtpTransport::new(
            config.smtp.server_addr.clone(),
            config.smtp.hello_name.clone(),
        );

        let layouts = [config.meld.base_template.as_str()];
        let renderer = match TeraRenderer::with_layouts(&loader, &layouts).await {
            Ok(renderer) => renderer,
            Err(MeldError::TemplateNotFound(name)) => {
                warn!("Base template {} not found, layouts disabled", name);
                TeraRenderer::new()
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            resolver: MeldResolver::new(Arc::new(loader), Arc::new(store)),
            renderer: Arc::new(renderer),
            transport: Arc::new(transport),
            settings: config.meld.clone(),
            site: config.site.clone(),
        })
    }

    /// Assemble an environment from explicit collaborators
    pub fn new(
        loader: Arc<dyn TemplateLoader>,
        store: Arc<dyn MeldStore>,
        renderer: Arc<dyn TemplateRenderer>,
        transport: Arc<dyn MailTransport>,
        settings: MeldConfig,
    ) -> Self {
        Self {
            resolver: MeldResolver::new(loader, store),
            renderer,
            transport,
            settings,
            site: None,
        }
    }

    pub fn with_site(mut self, site: SiteConfig) -> Self {
        self.site = Some(site);
        self
    }
}

/// One kind of email, backed by a single template
#[derive(Clone)]
pub struct EmailComposer {
    template: String,
    use_base_template: bool,
    env: MeldEnvironment,
}

impl EmailComposer {
    /// Fails when `template` is empty
    pub fn new(template: impl Into<String>, env: MeldEnvironment) -> Result<Self> {
        let template = template.into();
        if template.trim().is_empty() {
            return Err(MeldError::Config(
                "an email composer requires a template path".to_string(),
            ));
        }

        Ok(Self {
            template,
            use_base_template: true,
            env,
        })
    }

    /// Wrap HTML in the configured base layout (on by default)
    pub fn use_base_template(mut self, enabled: bool) -> Self {
        self.use_base_template = enabled;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Enrich `payload` and resolve the meld, re-parsing the template when
    /// `force_update` or the global switch is set
    pub async fn bind(
        &self,
        mut payload: Payload,
        request: Option<&dyn RequestSource>,
        force_update: bool,
    ) -> Result<MeldEmail<'_>> {
        payload.insert("site".to_string(), self.site_value());
        payload.insert(
            "STATIC_URL".to_string(),
            Value::String(self.env.settings.static_url.clone()),
        );
        payload.insert(
            "has_request_attrs".to_string(),
            Value::Bool(request.is_some()),
        );
        if let Some(request) = request {
            payload.extend(request.extract()?);
        }

        let force = force_update || self.env.settings.force_update;
        let meld = self.env.resolver.resolve(&self.template, force).await?;

        Ok(MeldEmail {
            composer: self,
            meld,
            payload,
        })
    }

    fn site_value(&self) -> Value {
        match &self.env.site {
            Some(site) => json!({ "domain": site.domain, "name": site.name }),
            None => Value::String(String::new()),
        }
    }
}

/// A meld bound to a payload, ready to render and send
pub struct MeldEmail<'a> {
    composer: &'a EmailComposer,
    meld: Meld,
    payload: Payload,
}

impl MeldEmail<'_> {
    pub fn meld(&self) -> &Meld {
        &self.meld
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    fn renderer(&self) -> &dyn TemplateRenderer {
        self.composer.env.renderer.as_ref()
    }

    /// Subject prefix plus the meld subject, rendered
    pub fn render_subject(&self) -> Result<String> {
        let source = format!(
            "{}{}",
            self.composer.env.settings.subject_prefix, self.meld.subject
        );
        let name = format!("{}:subject", self.meld.identifier);
        self.renderer().render(&name, &source, &self.payload)
    }

    /// Plain-text body; `None` for HTML melds
    pub fn render_text(&self) -> Result<Option<String>> {
        if !self.meld.kind.has_text() {
            return Ok(None);
        }
        self.render_body().map(Some)
    }

    /// HTML body; `None` for text melds
    ///
    /// The rendered body is link-ified, converted from Markdown for `.md`
    /// melds and, unless disabled, wrapped in the base layout.
    pub fn render_html(&self) -> Result<Option<String>> {
        if !self.meld.kind.has_html() {
            return Ok(None);
        }

        let html = if self.meld.kind == MeldKind::Markdown {
            // Payload values reach the HTML part, so they are escaped here
            let body = self.renderer().render_escaped(
                &self.meld.identifier,
                &self.meld.body,
                &self.payload,
            )?;
            markdown_to_html(&linkify(&body))?
        } else {
            linkify(&self.render_body()?)
        };

        if !self.composer.use_base_template {
            return Ok(Some(html));
        }

        let layout = &self.composer.env.settings.base_template;
        debug!("Wrapping {} in layout {}", self.meld.identifier, layout);
        self.renderer()
            .render_in_layout(layout, CONTENT_BLOCK, &html, &self.payload)
            .map(Some)
    }

    fn render_body(&self) -> Result<String> {
        self.renderer()
            .render(&self.meld.identifier, &self.meld.body, &self.payload)
    }

    /// Render every part and assemble the message; `from` defaults to the
    /// configured sender
    pub fn prepare(&self, recipients: &[String], from: Option<&str>) -> Result<ComposedMessage> {
        let from = from.unwrap_or(&self.composer.env.settings.default_from_email);
        let subject = self.render_subject()?;
        let html = self.render_html()?;
        let text = self.render_text()?;

        ComposedMessage::new(from, recipients, subject, text, html)
    }

    /// Prepare and hand the message to the transport
    pub async fn send(&self, recipients: &[String], from: Option<&str>) -> Result<usize> {
        let message = self.prepare(recipients, from)?;
        let sent = self.composer.env.transport.send(&message).await?;
        info!(
            "Sent {} ({}) to {} recipient(s)",
            self.meld.identifier,
            self.meld.kind,
            message.to.len()
        );
        Ok(sent)
    }
}
