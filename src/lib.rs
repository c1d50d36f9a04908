//! # tweet
//!
//! A very simple command-line tweeter. It reads a message from standard input
//! and posts it as the given account, or performs a batch of block, unblock,
//! follow, unfollow, like, retweet, un-retweet and delete actions.
//!
//! ## Features
//!
//! - Flat-file credential store (`~/.tweetrc`)
//! - One-time interactive OAuth 1.0a PIN authorization per account
//! - t.co-aware message length accounting with optional truncation
//! - Replies and media attachments
//! - Per-item error reporting for batch actions
//! - Structured logging
//!
//! ## Configuration
//!
//! The config file holds `identifier_key = value` / `identifier_secret = value`
//! lines. The reserved identifier `<api>` holds the application's consumer
//! credentials; account tokens are added automatically after authorization.
//!
//! ## Exit Status
//!
//! - `0`: everything succeeded
//! - `1`: any failure

pub mod actions;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod message;
pub mod oauth;
pub mod twitter;

// Re-export commonly used types and functions
pub use actions::{post_message, run_batch, ActionKind, ActionQueue, BatchReport};
pub use app::{init_logging, run, EXIT_ERROR, EXIT_SUCCESS};
pub use cli::{parse_args, ParseOutcome, TweetConfig};
pub use config::{CredentialStore, Token};
pub use error::{ApiError, TweetError};
pub use message::{effective_length, fit_message};
pub use twitter::{SocialApi, StatusDraft, TwitterClient};
