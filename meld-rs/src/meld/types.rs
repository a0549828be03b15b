//! Meld types and data structures

use crate::error::{MeldError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed template cached by identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meld {
    /// Template path, unique key
    pub identifier: String,
    /// Rendering mode derived from the file extension
    pub kind: MeldKind,
    /// First line of the template source
    pub subject: String,
    /// Template source after the subject line
    pub body: String,
    /// Last time the source was parsed into this entry
    pub updated_at: DateTime<Utc>,
}

/// Rendering mode, one per supported template extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeldKind {
    /// `.txt`: plain text only
    Text,
    /// `.html`: HTML only
    Html,
    /// `.md`: plain text plus Markdown rendered to HTML
    Markdown,
}

impl MeldKind {
    /// Derive the kind from a template identifier's trailing extension
    pub fn from_identifier(identifier: &str) -> Result<Self> {
        let file_name = identifier.rsplit('/').next().unwrap_or(identifier);
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
            .ok_or_else(|| {
                MeldError::Config(format!(
                    "template '{}' must end with a supported file extension (.txt, .html, .md)",
                    identifier
                ))
            })?;

        Self::from_extension(extension).ok_or_else(|| {
            MeldError::Config(format!(
                "template '{}' has unsupported extension '.{}'",
                identifier, extension
            ))
        })
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "txt" => Some(MeldKind::Text),
            "html" => Some(MeldKind::Html),
            "md" => Some(MeldKind::Markdown),
            _ => None,
        }
    }

    /// Convert to database string
    pub fn to_db_string(&self) -> &'static str {
        match self {
            MeldKind::Text => "txt",
            MeldKind::Html => "html",
            MeldKind::Markdown => "md",
        }
    }

    /// Parse from database string
    pub fn from_db_string(s: &str) -> Option<Self> {
        Self::from_extension(s)
    }

    /// Whether a plain-text part is produced
    pub fn has_text(&self) -> bool {
        !matches!(self, MeldKind::Html)
    }

    /// Whether an HTML part is produced
    pub fn has_html(&self) -> bool {
        !matches!(self, MeldKind::Text)
    }
}

impl fmt::Display for MeldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}
