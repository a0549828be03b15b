use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeldError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Template render error: {0}")]
    Render(#[from] tera::Error),

    #[error("Markdown error: {0}")]
    Markdown(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Request attribute not found: {0}")]
    RequestAttribute(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Message build error: {0}")]
    Message(String),

    #[error("SMTP protocol error: {0}")]
    SmtpProtocol(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MeldError>;
