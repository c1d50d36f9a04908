//! Error types for the tweet client.
//!
//! Two classes of failure exist. [`TweetError`] covers local problems that end
//! the run immediately (bad config, over-long message, unreadable media, ...).
//! [`ApiError`] covers a single failed remote call; inside a batch it is
//! reported with the offending target and execution continues.

use std::path::PathBuf;

/// Failures returned by the remote API or its transport.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request could not be sent or its body could not be read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Twitter API error ({status}): {message}")]
    Status { status: u16, message: String },

    /// The API answered with errors instead of data
    #[error("Twitter API error: {0}")]
    Rejected(String),

    /// The API answered successfully but the body was not what we expected
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// A username could not be resolved to a user id
    #[error("No such user: {0}")]
    UserNotFound(String),

    /// The media file has an extension we cannot map to a MIME type
    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(PathBuf),

    /// Reading a local file for upload failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal errors. Each one prints a message to standard error and terminates
/// the run with failure status.
#[derive(Debug, thiserror::Error)]
pub enum TweetError {
    #[error("Unable to open config file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to write to config file '{path}': {source}")]
    ConfigWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No API credentials found.  Please do the 'register-this-app' dance.\nRun 'tweet-register' or see 'man tweet' for more information.")]
    MissingApiCredentials,

    #[error("Unable to authorize {user}: {reason}")]
    Authorization { user: String, reason: String },

    #[error("Message too long ({length}). Trim by {excess}.")]
    MessageTooLong { length: usize, excess: usize },

    #[error("Message cannot be truncated on a word boundary: its first word alone exceeds {limit} characters.")]
    Untruncatable { limit: usize },

    #[error("Refusing to post an empty message.")]
    EmptyMessage,

    #[error("Unable to read message from standard input: {0}")]
    Stdin(std::io::Error),

    #[error("No such file: {}", .0.display())]
    MediaNotFound(PathBuf),

    #[error("Unable to read: {}", .0.display())]
    MediaUnreadable(PathBuf),

    #[error("Unable to tweet: {0}")]
    Post(#[source] ApiError),
}

pub type Result<T> = std::result::Result<T, TweetError>;
