//! Composed email messages

use crate::error::{MeldError, Result};
use mail_builder::MessageBuilder;
use serde::{Deserialize, Serialize};

/// Content type of a message's primary body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    Plain,
    Html,
}

/// A message ready to hand to a transport
///
/// With a plain primary body the HTML rendering, if any, travels as a
/// `multipart/alternative` part. An HTML primary body has no alternative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub body_type: BodyType,
    pub html_alternative: Option<String>,
}

impl ComposedMessage {
    /// Build from the optional text and HTML renderings
    pub fn new(
        from: &str,
        to: &[String],
        subject: String,
        text: Option<String>,
        html: Option<String>,
    ) -> Result<Self> {
        validate_address(from)?;
        for recipient in to {
            validate_address(recipient)?;
        }

        let (body, body_type, html_alternative) = match (text, html) {
            (Some(text), html) => (text, BodyType::Plain, html),
            (None, Some(html)) => (html, BodyType::Html, None),
            (None, None) => {
                return Err(MeldError::Message(
                    "message needs a text or an HTML body".to_string(),
                ))
            }
        };

        Ok(Self {
            from: from.to_string(),
            to: to.to_vec(),
            subject,
            body,
            body_type,
            html_alternative,
        })
    }

    /// The HTML part, whether primary or alternative
    pub fn html(&self) -> Option<&str> {
        match self.body_type {
            BodyType::Html => Some(&self.body),
            BodyType::Plain => self.html_alternative.as_deref(),
        }
    }

    /// The plain text part, if any
    pub fn text(&self) -> Option<&str> {
        match self.body_type {
            BodyType::Plain => Some(&self.body),
            BodyType::Html => None,
        }
    }

    /// Serialize as an RFC 5322 message
    pub fn to_rfc5322(&self) -> Result<Vec<u8>> {
        let mut builder = MessageBuilder::new()
            .from(self.from.as_str())
            .to(self.to.iter().map(String::as_str).collect::<Vec<_>>())
            .subject(self.subject.as_str());

        builder = match self.body_type {
            BodyType::Plain => {
                let builder = builder.text_body(self.body.as_str());
                match &self.html_alternative {
                    Some(html) => builder.html_body(html.as_str()),
                    None => builder,
                }
            }
            BodyType::Html => builder.html_body(self.body.as_str()),
        };

        builder
            .write_to_vec()
            .map_err(|e| MeldError::Message(e.to_string()))
    }
}

/// Basic email address validation
pub fn validate_address(address: &str) -> Result<()> {
    let Some((local, domain)) = address.split_once('@') else {
        return Err(MeldError::InvalidEmail(format!(
            "'{}' must contain @",
            address
        )));
    };

    if local.is_empty() || domain.is_empty() {
        return Err(MeldError::InvalidEmail(format!(
            "'{}' has an empty local part or domain",
            address
        )));
    }

    if domain.contains('@') || address.chars().any(|c| c.is_whitespace() || c == '<' || c == '>')
    {
        return Err(MeldError::InvalidEmail(format!("'{}' is malformed", address)));
    }

    Ok(())
}
