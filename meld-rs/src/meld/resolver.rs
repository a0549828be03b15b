//! Resolves template identifiers to cached melds

use crate::error::Result;
use crate::loader::TemplateLoader;
use crate::meld::splitter::split_source;
use crate::meld::store::MeldStore;
use crate::meld::types::{Meld, MeldKind};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Looks melds up in the store and (re)parses template sources on a miss
#[derive(Clone)]
pub struct MeldResolver {
    loader: Arc<dyn TemplateLoader>,
    store: Arc<dyn MeldStore>,
}

impl MeldResolver {
    pub fn new(loader: Arc<dyn TemplateLoader>, store: Arc<dyn MeldStore>) -> Self {
        Self { loader, store }
    }

    pub fn store(&self) -> &Arc<dyn MeldStore> {
        &self.store
    }

    /// Return the cached meld for `identifier`, parsing the source when there
    /// is no entry yet or `force_refresh` is set
    pub async fn resolve(&self, identifier: &str, force_refresh: bool) -> Result<Meld> {
        let kind = MeldKind::from_identifier(identifier)?;

        if !force_refresh {
            if let Some(meld) = self.store.get(identifier).await? {
                debug!("Meld cache hit for {}", identifier);
                return Ok(meld);
            }
            debug!("Meld cache miss for {}", identifier);
        }

        self.refresh(identifier, kind).await
    }

    async fn refresh(&self, identifier: &str, kind: MeldKind) -> Result<Meld> {
        let source = self.loader.load(identifier).await?;
        let (subject, body) = split_source(&source);

        let meld = self
            .store
            .upsert(Meld {
                identifier: identifier.to_string(),
                kind,
                subject,
                body,
                updated_at: Utc::now(),
            })
            .await?;

        info!("Parsed template {} into {} meld", identifier, kind);
        Ok(meld)
    }
}
