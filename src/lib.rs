//! # Syncboard
//!
//! Clipboard to WebDAV synchronization server for rooted Android devices.
//!
//! Syncboard mirrors the device clipboard to a WebDAV content store on a
//! timer and exposes an HTTP control surface for manual sync, status, and
//! configuration changes, plus a small static WebUI.

pub mod cli;
pub mod clipboard;
pub mod config;
pub mod remote;
pub mod server;
pub mod sync;

pub use config::SyncConfig;

/// Result type alias for syncboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for syncboard operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Clipboard operation error
    #[error("Clipboard error: {0}")]
    Clipboard(#[from] clipboard::ClipboardError),

    /// Remote store error
    #[error("Remote store error: {0}")]
    Remote(#[from] remote::RemoteError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
