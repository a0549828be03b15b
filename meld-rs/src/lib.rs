//! meld-rs: email templating with cached template melds
//!
//! Templates are plain files whose first line is the email subject and whose
//! remainder is the body. The file extension picks the kind of email:
//!
//! - `.txt`: plain text only
//! - `.html`: HTML only
//! - `.md`: plain text plus the Markdown rendered to HTML
//!
//! Parsed templates ("melds") are cached in a [`meld::MeldStore`] keyed by
//! template path. Rendered HTML has URLs and email addresses turned into
//! links and is wrapped in a base layout before being sent.
//!
//! # Example
//!
//! ```no_run
//! use meld_rs::composer::{EmailComposer, MeldEnvironment};
//! use meld_rs::config::Config;
//! use meld_rs::payload::Payload;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let env = MeldEnvironment::from_config(&config).await?;
//!
//!     let composer = EmailComposer::new("emails/welcome.md", env)?;
//!     let mut payload = Payload::new();
//!     payload.insert("name".to_string(), json!("Jane"));
//!
//!     let email = composer.bind(payload, None, false).await?;
//!     email.send(&["jane@example.com".to_string()], None).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration management
//! - [`error`]: Error types and handling
//! - [`loader`]: Template source loading
//! - [`meld`]: Subject/body splitting and the meld cache
//! - [`render`]: Template engine, link-ification, Markdown
//! - [`composer`]: Payload enrichment and message composition
//! - [`transport`]: Mail delivery

pub mod composer;
pub mod config;
pub mod error;
pub mod loader;
pub mod meld;
pub mod message;
pub mod payload;
pub mod render;
pub mod transport;

// Re-export commonly used types
pub use composer::{EmailComposer, MeldEmail, MeldEnvironment};
pub use config::Config;
pub use error::{MeldError, Result};
pub use meld::{Meld, MeldKind};
pub use render::linkify;
