//! Template source loading

use crate::error::{MeldError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Resolves a template identifier to its raw source text
#[async_trait]
pub trait TemplateLoader: Send + Sync {
    /// Fails with [`MeldError::TemplateNotFound`] when nothing matches
    async fn load(&self, identifier: &str) -> Result<String>;
}

/// Loads templates from an ordered list of directories
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    dirs: Vec<PathBuf>,
}

impl FileSystemLoader {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

#[async_trait]
impl TemplateLoader for FileSystemLoader {
    async fn load(&self, identifier: &str) -> Result<String> {
        let relative = Path::new(identifier);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if identifier.is_empty() || escapes {
            return Err(MeldError::TemplateNotFound(identifier.to_string()));
        }

        for dir in &self.dirs {
            let candidate = dir.join(relative);
            match tokio::fs::read_to_string(&candidate).await {
                Ok(source) => {
                    debug!("Loaded template {} from {}", identifier, candidate.display());
                    return Ok(source);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(MeldError::TemplateNotFound(identifier.to_string()))
    }
}

/// Templates registered in memory, keyed by identifier
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    sources: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a template source
    pub async fn insert(&self, identifier: impl Into<String>, source: impl Into<String>) {
        self.sources
            .write()
            .await
            .insert(identifier.into(), source.into());
    }
}

#[async_trait]
impl TemplateLoader for MemoryLoader {
    async fn load(&self, identifier: &str) -> Result<String> {
        self.sources
            .read()
            .await
            .get(identifier)
            .cloned()
            .ok_or_else(|| MeldError::TemplateNotFound(identifier.to_string()))
    }
}
