//! Mail transports
//!
//! A transport takes a [`ComposedMessage`] and reports how many messages it
//! delivered: 1 on success, 0 when the message had no recipients.

use crate::error::{MeldError, Result};
use crate::message::ComposedMessage;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &ComposedMessage) -> Result<usize>;
}

/// Delivers messages to a single SMTP relay
///
/// # Examples
/// ```no_run
/// use meld_rs::transport::{MailTransport, SmtpTransport};
/// # use meld_rs::message::ComposedMessage;
///
/// # async fn example(message: ComposedMessage) -> Result<(), Box<dyn std::error::Error>> {
/// let transport = SmtpTransport::new("localhost:2525".to_string(), None);
/// transport.send(&message).await?;
/// # Ok(())
/// # }
/// ```
pub struct SmtpTransport {
    server_addr: String,
    hello_name: Option<String>,
}

impl SmtpTransport {
    pub fn new(server_addr: String, hello_name: Option<String>) -> Self {
        Self {
            server_addr,
            hello_name,
        }
    }

    /// Read a line from the stream
    async fn read_line<R>(&self, reader: &mut BufReader<R>) -> Result<String>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(MeldError::SmtpProtocol(
                "connection closed by server".to_string(),
            ));
        }
        Ok(line)
    }

    /// Read a (possibly multi-line) response and verify its code
    async fn read_response<R>(&self, reader: &mut BufReader<R>, expected: &str) -> Result<String>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut full_response = String::new();

        loop {
            let line = self.read_line(reader).await?;
            debug!("< {}", line.trim());

            full_response.push_str(&line);

            // Last line has a space (or nothing) after the code
            if line.len() < 4 || line.as_bytes()[3] != b'-' {
                break;
            }
        }

        if !full_response.starts_with(expected) {
            error!("Unexpected response: {}", full_response.trim());
            return Err(MeldError::SmtpProtocol(format!(
                "Expected {}, got: {}",
                expected,
                full_response.trim()
            )));
        }

        Ok(full_response)
    }

    async fn write_line<W>(&self, writer: &mut W, line: &str) -> Result<()>
    where
        W: tokio::io::AsyncWrite + Unpin,
    {
        debug!("> {}", line);
        writer.write_all(format!("{}\r\n", line).as_bytes()).await?;
        Ok(())
    }

    fn hello_name(&self) -> String {
        self.hello_name
            .clone()
            .unwrap_or_else(|| gethostname::gethostname().to_string_lossy().to_string())
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, message: &ComposedMessage) -> Result<usize> {
        if message.to.is_empty() {
            return Ok(0);
        }
        let data = dot_stuff(&message.to_rfc5322()?);

        info!(
            "Sending '{}' from {} to {} recipient(s) via {}",
            message.subject,
            message.from,
            message.to.len(),
            self.server_addr
        );

        let stream = TcpStream::connect(&self.server_addr).await?;
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        self.read_response(&mut reader, "220").await?;

        self.write_line(&mut writer, &format!("EHLO {}", self.hello_name()))
            .await?;
        self.read_response(&mut reader, "250").await?;

        self.write_line(&mut writer, &format!("MAIL FROM:<{}>", message.from))
            .await?;
        self.read_response(&mut reader, "250").await?;

        for recipient in &message.to {
            self.write_line(&mut writer, &format!("RCPT TO:<{}>", recipient))
                .await?;
            self.read_response(&mut reader, "250").await?;
        }

        self.write_line(&mut writer, "DATA").await?;
        self.read_response(&mut reader, "354").await?;

        writer.write_all(&data).await?;
        if !data.ends_with(b"\r\n") {
            writer.write_all(b"\r\n").await?;
        }
        writer.write_all(b".\r\n").await?;
        self.read_response(&mut reader, "250").await?;

        self.write_line(&mut writer, "QUIT").await?;
        // The server may hang up without answering QUIT
        let _ = self.read_line(&mut reader).await;

        info!("Mail sent successfully to {}", message.to.join(", "));
        Ok(1)
    }
}

/// Escape lines starting with `.` for the DATA phase
fn dot_stuff(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 16);
    let mut line_start = true;
    for &byte in data {
        if line_start && byte == b'.' {
            out.push(b'.');
        }
        out.push(byte);
        line_start = byte == b'\n';
    }
    out
}

/// Keeps sent messages in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    outbox: Arc<RwLock<Vec<ComposedMessage>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first
    pub async fn outbox(&self) -> Vec<ComposedMessage> {
        self.outbox.read().await.clone()
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    async fn send(&self, message: &ComposedMessage) -> Result<usize> {
        if message.to.is_empty() {
            return Ok(0);
        }
        self.outbox.write().await.push(message.clone());
        Ok(1)
    }
}
