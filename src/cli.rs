//! Command-line parsing.
//!
//! Flags are parsed with `clap` into [`Args`] and then frozen into an
//! immutable [`TweetConfig`] that the rest of the program receives by
//! reference. Parsing never exits the process itself; it returns a
//! [`ParseOutcome`] that the entry point acts on.

use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::actions::{ActionKind, ActionQueue};
use crate::config::{default_config_path, validate_account_name};
use crate::message::SizingPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "tweet",
    version,
    about = "A very simple command-line tweeter",
    long_about = "Reads a message from standard input and posts it as the given user. \
                  With any of -b, -B, -d, -f, -F, -l, -r or -R it performs those actions instead."
)]
struct Args {
    /// Tweet as this user
    #[arg(short = 'u', long = "user", value_name = "user", value_parser = account_name)]
    user: String,

    /// Read credentials from this file [default: ~/.tweetrc]
    #[arg(short = 'c', long = "config", value_name = "file")]
    config: Option<PathBuf>,

    /// Answer (reply to) the given message
    #[arg(short = 'a', long = "reply-to", value_name = "id")]
    reply_to: Option<String>,

    /// Attach this media file
    #[arg(short = 'm', long = "media", value_name = "file")]
    media: Option<PathBuf>,

    /// Count links at their literal length instead of the t.co length
    #[arg(short = 's', long = "no-shorten")]
    no_shorten: bool,

    /// Truncate messages that are too long
    #[arg(short = 't', long = "truncate")]
    truncate: bool,

    /// Print the tweet ID of any new tweets
    #[arg(short = 'i', long = "print-id")]
    print_id: bool,

    /// Block this user
    #[arg(short = 'b', long = "block", value_name = "user", action = ArgAction::Append)]
    block: Vec<String>,

    /// Unblock this user
    #[arg(short = 'B', long = "unblock", value_name = "user", action = ArgAction::Append)]
    unblock: Vec<String>,

    /// Delete the given message
    #[arg(short = 'd', long = "delete", value_name = "id", action = ArgAction::Append)]
    delete: Vec<String>,

    /// Follow this user
    #[arg(short = 'f', long = "follow", value_name = "user", action = ArgAction::Append)]
    follow: Vec<String>,

    /// Unfollow this user
    #[arg(short = 'F', long = "unfollow", value_name = "user", action = ArgAction::Append)]
    unfollow: Vec<String>,

    /// Like the given message
    #[arg(short = 'l', long = "like", value_name = "id", action = ArgAction::Append)]
    like: Vec<String>,

    /// Retweet the given message
    #[arg(short = 'r', long = "retweet", value_name = "id", action = ArgAction::Append)]
    retweet: Vec<String>,

    /// Undo a retweet of the given message
    #[arg(short = 'R', long = "unretweet", value_name = "id", action = ArgAction::Append)]
    unretweet: Vec<String>,

    /// Log more (-v info, -vv debug); RUST_LOG overrides
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

/// Options that only matter when posting a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostOptions {
    pub reply_to: Option<String>,
    pub media: Option<PathBuf>,
    pub print_id: bool,
    pub sizing: SizingPolicy,
}

/// What a single invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Read a message from standard input and post it
    Post(PostOptions),
    /// Run the queued block/follow/like/... actions
    Batch(ActionQueue),
}

/// Immutable run configuration, built once from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetConfig {
    pub user: String,
    pub config_file: PathBuf,
    pub verbosity: u8,
    pub mode: Mode,
}

/// Result of parsing the command line.
#[derive(Debug)]
pub enum ParseOutcome {
    /// Arguments were valid
    Config(TweetConfig),
    /// `-h` or `-V` was given; print the text to standard output and succeed
    HelpRequested(String),
    /// Arguments were invalid; print the text to standard error and fail
    Error(String),
}

/// Parses command-line arguments (including the program name).
///
/// # Example
///
/// ```rust
/// use tweet::cli::{parse_args, ParseOutcome};
///
/// match parse_args(["tweet", "-u", "jschauma", "-l", "https://twitter.com/jschauma/status/42"]) {
///     ParseOutcome::Config(config) => assert_eq!(config.user, "jschauma"),
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
pub fn parse_args<I, T>(args: I) -> ParseOutcome
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Args::try_parse_from(args) {
        Ok(args) => ParseOutcome::Config(args.into_config()),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                ParseOutcome::HelpRequested(err.render().to_string())
            }
            _ => ParseOutcome::Error(err.render().to_string()),
        },
    }
}

fn account_name(value: &str) -> Result<String, String> {
    validate_account_name(value)?;
    Ok(value.to_string())
}

impl Args {
    fn into_config(self) -> TweetConfig {
        let queue = ActionQueue::from_targets([
            (ActionKind::Block, self.block),
            (ActionKind::Unblock, self.unblock),
            (ActionKind::Delete, self.delete),
            (ActionKind::Follow, self.follow),
            (ActionKind::Unfollow, self.unfollow),
            (ActionKind::Like, self.like),
            (ActionKind::Retweet, self.retweet),
            (ActionKind::Unretweet, self.unretweet),
        ]);

        let mode = if queue.is_empty() {
            Mode::Post(PostOptions {
                reply_to: self.reply_to.as_deref().map(status_id),
                media: self.media,
                print_id: self.print_id,
                sizing: SizingPolicy {
                    shorten_links: !self.no_shorten,
                    truncate: self.truncate,
                    ..SizingPolicy::default()
                },
            })
        } else {
            Mode::Batch(queue)
        };

        TweetConfig {
            user: self.user,
            config_file: self.config.unwrap_or_else(default_config_path),
            verbosity: self.verbose,
            mode,
        }
    }
}

/// Extracts a message id from a bare id or a status URL.
///
/// For URLs the last non-empty path segment is used, so query strings and
/// fragments are ignored; anything else keeps what follows the last `/`.
///
/// ```rust
/// use tweet::cli::status_id;
///
/// assert_eq!(status_id("https://twitter.com/jschauma/status/123456"), "123456");
/// assert_eq!(status_id("123456"), "123456");
/// ```
pub fn status_id(target: &str) -> String {
    let target = target.trim();

    if let Ok(url) = url::Url::parse(target) {
        if let Some(segment) = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        {
            return segment.to_string();
        }
    }

    match target.rfind('/') {
        Some(pos) => target[pos + 1..].to_string(),
        None => target.to_string(),
    }
}

/// Normalizes a user target: surrounding whitespace and a leading `@` are
/// dropped.
pub fn user_name(target: &str) -> String {
    let target = target.trim();
    target.strip_prefix('@').unwrap_or(target).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(args: &[&str]) -> TweetConfig {
        let mut argv = vec!["tweet"];
        argv.extend_from_slice(args);
        match parse_args(argv) {
            ParseOutcome::Config(config) => config,
            other => panic!("expected a config, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_post_mode() {
        let config = config(&["-u", "jschauma", "-c", "/tmp/tweetrc"]);
        assert_eq!(config.user, "jschauma");
        assert_eq!(config.config_file, PathBuf::from("/tmp/tweetrc"));

        match config.mode {
            Mode::Post(options) => {
                assert_eq!(options.reply_to, None);
                assert!(!options.print_id);
                assert!(options.sizing.shorten_links);
                assert!(!options.sizing.truncate);
            }
            Mode::Batch(_) => panic!("expected post mode"),
        }
    }

    #[test]
    fn test_post_options() {
        let config = config(&[
            "-u",
            "jschauma",
            "-t",
            "-i",
            "-s",
            "-m",
            "cat.png",
            "-a",
            "https://x.com/someone/status/987654321?s=20",
        ]);
        match config.mode {
            Mode::Post(options) => {
                assert_eq!(options.reply_to.as_deref(), Some("987654321"));
                assert_eq!(options.media, Some(PathBuf::from("cat.png")));
                assert!(options.print_id);
                assert!(options.sizing.truncate);
                assert!(!options.sizing.shorten_links);
            }
            Mode::Batch(_) => panic!("expected post mode"),
        }
    }

    #[test]
    fn test_any_action_flag_selects_batch_mode() {
        let config = config(&["-u", "jschauma", "-b", "@spammer", "-b", "troll", "-l", "42"]);
        match config.mode {
            Mode::Batch(queue) => {
                let items: Vec<_> = queue.items().collect();
                assert_eq!(
                    items,
                    vec![
                        (ActionKind::Block, "spammer"),
                        (ActionKind::Block, "troll"),
                        (ActionKind::Like, "42"),
                    ]
                );
            }
            Mode::Post(_) => panic!("expected batch mode"),
        }
    }

    #[test]
    fn test_missing_user_is_an_error() {
        assert!(matches!(parse_args(["tweet", "-t"]), ParseOutcome::Error(_)));
    }

    #[test]
    fn test_positional_arguments_are_rejected() {
        assert!(matches!(
            parse_args(["tweet", "-u", "jschauma", "hello"]),
            ParseOutcome::Error(_)
        ));
    }

    #[test]
    fn test_unknown_flag_is_an_error() {
        assert!(matches!(
            parse_args(["tweet", "-u", "jschauma", "-x"]),
            ParseOutcome::Error(_)
        ));
    }

    #[test]
    fn test_help_is_requested_even_without_user() {
        match parse_args(["tweet", "-h"]) {
            ParseOutcome::HelpRequested(text) => assert!(text.contains("--user")),
            other => panic!("expected help, got {other:?}"),
        }
    }

    #[test]
    fn test_verbosity_counts() {
        assert_eq!(config(&["-u", "a", "-vv"]).verbosity, 2);
    }

    #[test]
    fn test_status_url_and_bare_id_agree() {
        assert_eq!(status_id("https://twitter.com/user/status/123456"), "123456");
        assert_eq!(status_id("123456"), "123456");
        assert_eq!(status_id("https://x.com/user/status/123456/"), "123456");
        assert_eq!(status_id("https://x.com/user/status/123456#reply"), "123456");
        assert_eq!(status_id("twitter.com/user/status/123456"), "123456");
    }

    #[test]
    fn test_user_name_strips_at_sign() {
        assert_eq!(user_name("@jschauma"), "jschauma");
        assert_eq!(user_name("jschauma"), "jschauma");
    }

    #[test]
    fn test_unstorable_user_names_are_rejected() {
        for user in ["<api>", "", "a#b", "two words"] {
            assert!(
                matches!(parse_args(["tweet", "-u", user]), ParseOutcome::Error(_)),
                "accepted {user:?}"
            );
        }
    }

    #[test]
    fn test_help_lists_every_action_flag() {
        let text = match parse_args(["tweet", "-h"]) {
            ParseOutcome::HelpRequested(text) => text,
            other => panic!("expected help, got {other:?}"),
        };
        for flag in ["-b", "-B", "-d", "-f", "-F", "-l", "-r", "-R", "-a", "-m", "-t", "-i"] {
            assert!(text.contains(flag), "help is missing {flag}");
        }
    }
}
