//! Message sizing for outgoing tweets.
//!
//! Twitter wraps every link in a t.co short link, so a URL costs a fixed
//! number of characters no matter how long it is. This module computes the
//! length Twitter will charge for a message and, when asked, truncates an
//! over-long message on a word boundary.

use log::{debug, info};
use regex::Regex;
use std::io::Read;
use std::sync::OnceLock;

use crate::error::{Result, TweetError};

/// Maximum length of a single tweet.
pub const MAX_LENGTH: usize = 280;

/// Length charged for any link after t.co wrapping.
///
/// Technically this should be queried from the API; the value has been
/// stable for a long time.
pub const SHORT_LINK_LENGTH: usize = 21;

/// Appended to truncated messages.
pub const ELLIPSIS: &str = "...";

/// How a message should be sized before posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingPolicy {
    pub max_length: usize,
    /// Charge links at [`SHORT_LINK_LENGTH`] instead of their literal length
    pub shorten_links: bool,
    /// Truncate over-long messages instead of rejecting them
    pub truncate: bool,
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self {
            max_length: MAX_LENGTH,
            shorten_links: true,
            truncate: false,
        }
    }
}

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(ftp|https?)://.+$").expect("valid link pattern"))
}

fn is_link(word: &str) -> bool {
    link_pattern().is_match(word)
}

/// Cost of a single whitespace-delimited word, including its trailing
/// separator.
fn word_length(word: &str, shorten_links: bool) -> usize {
    let base = if shorten_links && is_link(word) {
        SHORT_LINK_LENGTH
    } else {
        word.chars().count()
    };
    base + 1
}

/// Returns the length Twitter will charge for `text`.
///
/// Every whitespace-delimited word contributes its length plus one separator
/// unit; with `shorten_links` set, words that look like `ftp://`, `http://` or
/// `https://` links contribute [`SHORT_LINK_LENGTH`] instead of their length.
///
/// # Example
///
/// ```rust
/// use tweet::message::effective_length;
///
/// assert_eq!(effective_length("hello world", true), 12);
/// assert_eq!(effective_length("see https://example.com/a/very/long/path", true), 4 + 22);
/// ```
pub fn effective_length(text: &str, shorten_links: bool) -> usize {
    text.split_whitespace()
        .map(|word| word_length(word, shorten_links))
        .sum()
}

/// Applies the sizing policy to `text`.
///
/// # Returns
///
/// - `Ok(text)` unchanged when it fits
/// - `Ok(truncated)` when it does not fit and truncation is enabled; the
///   result fits, ends in [`ELLIPSIS`] and never splits a word
///
/// # Errors
///
/// - [`TweetError::MessageTooLong`] when it does not fit and truncation is off
/// - [`TweetError::Untruncatable`] when not even the first word fits
pub fn fit_message(text: &str, policy: &SizingPolicy) -> Result<String> {
    let length = effective_length(text, policy.shorten_links);
    debug!("Message length {} (max {})", length, policy.max_length);

    if length <= policy.max_length {
        return Ok(text.to_string());
    }

    if !policy.truncate {
        return Err(TweetError::MessageTooLong {
            length,
            excess: length - policy.max_length,
        });
    }

    let truncated = truncate(text, policy)?;
    info!(
        "Truncated message from {} to {}",
        length,
        effective_length(&truncated, policy.shorten_links)
    );
    Ok(truncated)
}

/// Cuts `text` after the last whole word that keeps it within
/// `max_length - 4` units and appends the ellipsis. The kept prefix retains
/// its original spacing and line breaks.
fn truncate(text: &str, policy: &SizingPolicy) -> Result<String> {
    let budget = policy.max_length.saturating_sub(ELLIPSIS.len() + 1);

    let mut used = 0;
    let mut cut: Option<(usize, &str)> = None;
    for (start, word) in word_spans(text) {
        used += word_length(word, policy.shorten_links);
        if used > budget {
            break;
        }
        cut = Some((start + word.len(), word));
    }

    match cut {
        Some((end, last)) => {
            let mut truncated = text[..end].to_string();
            // Keep the ellipsis off links, and off a bare scheme that it
            // would turn into one (`http://...`)
            if is_link(&format!("{last}{ELLIPSIS}")) {
                truncated.push(' ');
            }
            truncated.push_str(ELLIPSIS);
            Ok(truncated)
        }
        None => Err(TweetError::Untruncatable {
            limit: budget.saturating_sub(1),
        }),
    }
}

/// Whitespace-delimited words with their byte offsets.
fn word_spans(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_whitespace().map(move |word| {
        let start = word.as_ptr() as usize - text.as_ptr() as usize;
        (start, word)
    })
}

/// Reads the message to post from `reader` (standard input in practice).
///
/// The message may span several lines; only the trailing newline of the final
/// line is removed.
///
/// # Errors
///
/// - [`TweetError::Stdin`] if reading fails or the input is not UTF-8
/// - [`TweetError::EmptyMessage`] if nothing but whitespace was read
pub fn read_message<R: Read>(mut reader: R) -> Result<String> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf).map_err(TweetError::Stdin)?;

    let message = buf
        .strip_suffix("\r\n")
        .or_else(|| buf.strip_suffix('\n'))
        .unwrap_or(&buf);

    if message.trim().is_empty() {
        return Err(TweetError::EmptyMessage);
    }
    Ok(message.to_string())
}
