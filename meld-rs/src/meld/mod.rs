//! Template melds
//!
//! A meld is a template source split into its subject line and body and cached
//! by template identifier, together with the rendering kind taken from the
//! file extension.

pub mod resolver;
pub mod splitter;
pub mod store;
pub mod types;

pub use resolver::MeldResolver;
pub use splitter::split_source;
pub use store::{MeldStore, MemoryMeldStore, SqliteMeldStore};
pub use types::{Meld, MeldKind};
