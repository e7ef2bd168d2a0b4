//! Clipboard abstraction layer for root-shell clipboard access
//!
//! Deeply customized Android builds differ in which clipboard interfaces
//! actually work, so reads and writes go through an ordered list of access
//! strategies and the first one that succeeds wins.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

pub mod android;

/// Maximum clipboard content size (1MB)
pub const MAX_CLIPBOARD_SIZE: usize = 1024 * 1024;

/// Clipboard errors
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// Content is empty
    #[error("clipboard content is empty")]
    EmptyContent,

    /// Content too large
    #[error("clipboard content too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },

    /// Every access method failed
    #[error("failed to access system clipboard: all methods failed")]
    AccessDenied,

    /// Content cannot be expressed by this access method
    #[error("unsupported content: {0}")]
    UnsupportedContent(String),

    /// A single access method failed
    #[error("access method failed: {0}")]
    Method(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validate clipboard content before an outbound write
///
/// Empty content is invalid; content above [`MAX_CLIPBOARD_SIZE`] bytes is
/// invalid (exactly `MAX_CLIPBOARD_SIZE` bytes is still valid).
pub fn validate_content(content: &str) -> Result<(), ClipboardError> {
    if content.is_empty() {
        return Err(ClipboardError::EmptyContent);
    }
    if content.len() > MAX_CLIPBOARD_SIZE {
        return Err(ClipboardError::TooLarge {
            size: content.len(),
            max: MAX_CLIPBOARD_SIZE,
        });
    }
    Ok(())
}

/// One way of reading the system clipboard
#[async_trait]
pub trait ReadStrategy: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &str;

    /// Attempt to read the clipboard
    async fn read(&self) -> Result<String, ClipboardError>;
}

/// One way of writing the system clipboard
#[async_trait]
pub trait WriteStrategy: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &str;

    /// Attempt to write `content` to the clipboard
    async fn write(&self, content: &str) -> Result<(), ClipboardError>;
}

/// Clipboard access through an ordered chain of strategies
pub struct ClipboardAccessor {
    readers: Vec<Box<dyn ReadStrategy>>,
    writers: Vec<Box<dyn WriteStrategy>>,
}

impl ClipboardAccessor {
    /// Create an accessor with explicit strategy chains
    pub fn new(readers: Vec<Box<dyn ReadStrategy>>, writers: Vec<Box<dyn WriteStrategy>>) -> Self {
        Self { readers, writers }
    }

    /// Create an accessor with the default Android root-shell chains
    pub fn android() -> Self {
        Self::new(android::default_readers(), android::default_writers())
    }

    /// Read the clipboard
    ///
    /// Strategies are tried in priority order; the first one that completes
    /// without error and yields non-empty content wins, and the rest are not
    /// attempted.
    pub async fn read(&self) -> Result<String, ClipboardError> {
        for reader in &self.readers {
            match reader.read().await {
                Ok(content) if !content.is_empty() => {
                    debug!(method = reader.name(), "clipboard read succeeded");
                    return Ok(content);
                }
                Ok(_) => {
                    debug!(method = reader.name(), "clipboard read returned empty content");
                }
                Err(e) => {
                    debug!(method = reader.name(), "clipboard read failed: {e}");
                }
            }
        }

        Err(ClipboardError::AccessDenied)
    }

    /// Write `content` to the clipboard
    ///
    /// Content is validated once up front; a validation failure is returned
    /// without attempting any strategy. Strategies are then tried in order,
    /// returning on the first success. Failures have no effect on later
    /// attempts.
    pub async fn write(&self, content: &str) -> Result<(), ClipboardError> {
        validate_content(content)?;

        let mut all_unsupported = !self.writers.is_empty();
        for writer in &self.writers {
            match writer.write(content).await {
                Ok(()) => {
                    debug!(method = writer.name(), "clipboard write succeeded");
                    return Ok(());
                }
                Err(e) => {
                    if !matches!(e, ClipboardError::UnsupportedContent(_)) {
                        all_unsupported = false;
                    }
                    debug!(method = writer.name(), "clipboard write failed: {e}");
                }
            }
        }

        // When every available method rejected the content itself, surface
        // that instead of a generic access failure.
        if all_unsupported {
            return Err(ClipboardError::UnsupportedContent(
                "no available method can express this content".to_string(),
            ));
        }

        Err(ClipboardError::AccessDenied)
    }
}
