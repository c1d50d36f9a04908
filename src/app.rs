//! Top-level flow of one invocation.
//!
//! ```text
//! options-parsed → config-loaded → credentials-verified → [authorized]
//!               → API-session-ready → {post | batch} → exit
//! ```
//!
//! Everything before the API session exists is fatal and surfaces as a
//! [`TweetError`]; failures while posting or running a batch are reported per
//! item and reduced to an exit status.

use log::{info, warn};
use std::io::{self, BufRead};

use crate::actions::{post_message, run_batch};
use crate::cli::{Mode, TweetConfig};
use crate::config::{validate_account_name, CredentialStore, Lookup, Token};
use crate::error::{Result, TweetError};
use crate::message::read_message;
use crate::oauth::{authorize_account, console, OAuthFlow};
use crate::twitter::TwitterClient;

/// Exit status for success.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit status for any failure.
pub const EXIT_ERROR: u8 = 1;

/// Initializes `env_logger`.
///
/// The default filter is `warn`, raised to `info` with one `-v` and `debug`
/// with more; `RUST_LOG` overrides it.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

/// Returns the token for `config.user`, running the interactive
/// authorization against `flow` when the store has no complete record for it.
/// A new token is also inserted into `store`.
pub(crate) async fn account_token<R>(
    store: &mut CredentialStore,
    app: &Token,
    config: &TweetConfig,
    flow: &OAuthFlow,
    input: R,
) -> Result<Token>
where
    R: BufRead + Send + 'static,
{
    let user = config.user.as_str();
    validate_account_name(user).map_err(|reason| TweetError::Authorization {
        user: user.to_string(),
        reason,
    })?;

    match store.lookup(user) {
        Lookup::Complete(token) => return Ok(token.clone()),
        Lookup::Partial => warn!(
            "Credentials for {} in {} are incomplete, authorizing again",
            user,
            config.config_file.display()
        ),
        Lookup::Missing => info!("No credentials for {}, authorizing", user),
    }

    let token = authorize_account(flow, app, user, &config.config_file, input).await?;
    store.insert(user, token.clone());
    Ok(token)
}

/// Reads the message from standard input on a blocking thread.
async fn read_stdin_message() -> Result<String> {
    tokio::task::spawn_blocking(|| read_message(io::stdin()))
        .await
        .map_err(|e| TweetError::Stdin(io::Error::new(io::ErrorKind::Other, e)))?
}

/// Runs one invocation and returns its exit status.
///
/// # Errors
///
/// Any fatal error: unreadable config, missing application credentials,
/// failed authorization, bad message or media, or a failed post.
pub async fn run(config: &TweetConfig) -> Result<u8> {
    let mut store = CredentialStore::load(&config.config_file)?;

    let app = store
        .api_credentials()
        .cloned()
        .ok_or(TweetError::MissingApiCredentials)?;

    let account =
        account_token(&mut store, &app, config, &OAuthFlow::default(), console()).await?;
    let client = TwitterClient::new(app, account);

    match &config.mode {
        Mode::Post(options) => {
            let text = read_stdin_message().await?;
            post_message(&client, &text, options).await?;
            Ok(EXIT_SUCCESS)
        }
        Mode::Batch(queue) => {
            let report = run_batch(&client, queue).await;
            Ok(report.exit_code())
        }
    }
}
