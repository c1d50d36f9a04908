//! OAuth authentication module for Twitter/X API integration.
//!
//! This module implements the one-time, interactive OAuth 1.0a PIN
//! (out-of-band) authorization that turns the application credentials into an
//! access token for one account:
//!
//! 1. fetch a request token signed with the application credentials;
//! 2. send the operator to the authorization URL;
//! 3. read the PIN shown by Twitter from the console;
//! 4. exchange request token and PIN for the account's access token.
//!
//! The resulting token is appended to the config file so this only happens
//! once per account.

use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::config::{append_token, mask_secret, Token};
use crate::error::{ApiError, Result, TweetError};
use crate::twitter::sanitize_for_logging;

/// Base URL of the OAuth 1.0a endpoints.
pub const OAUTH_BASE_URL: &str = "https://api.twitter.com";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    oauth_token: String,
    oauth_token_secret: String,
    #[serde(default)]
    screen_name: Option<String>,
}

/// Parses a form-encoded token response
/// (`oauth_token=...&oauth_token_secret=...&...`).
///
/// # Errors
///
/// Returns [`ApiError::InvalidResponse`] if either field is missing.
pub fn parse_token_response(body: &str) -> std::result::Result<Token, ApiError> {
    let response: TokenResponse = serde_urlencoded::from_str(body.trim()).map_err(|e| {
        ApiError::InvalidResponse(format!("{}: {}", e, sanitize_for_logging(body, 100)))
    })?;

    if let Some(name) = &response.screen_name {
        debug!("Token issued for @{}", name);
    }
    Ok(Token::new(response.oauth_token, response.oauth_token_secret))
}

/// Client for the three OAuth 1.0a endpoints.
#[derive(Debug, Clone)]
pub struct OAuthFlow {
    http: Client,
    base_url: String,
}

impl Default for OAuthFlow {
    fn default() -> Self {
        Self::new(OAUTH_BASE_URL)
    }
}

impl OAuthFlow {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Builds the URL the operator must visit to authorize `request_token`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tweet::config::Token;
    /// use tweet::oauth::OAuthFlow;
    ///
    /// let url = OAuthFlow::default().authorize_url(&Token::new("Z6eEdO8M", "secret"));
    /// assert_eq!(url, "https://api.twitter.com/oauth/authorize?oauth_token=Z6eEdO8M");
    /// ```
    pub fn authorize_url(&self, request_token: &Token) -> String {
        let mut url = match url::Url::parse(&self.url("/oauth/authorize")) {
            Ok(url) => url,
            Err(_) => {
                return format!(
                    "{}?oauth_token={}",
                    self.url("/oauth/authorize"),
                    urlencoding::encode(&request_token.key)
                )
            }
        };
        url.query_pairs_mut()
            .append_pair("oauth_token", &request_token.key);
        url.to_string()
    }

    async fn send(
        &self,
        url: &str,
        authorization: String,
        operation_name: &str,
    ) -> std::result::Result<Token, ApiError> {
        info!("Requesting {} from {}", operation_name, url);

        let response = self
            .http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!("{} failed with status {}", operation_name, status);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: sanitize_for_logging(body.trim(), 200),
            });
        }

        let token = parse_token_response(&body)?;
        debug!("{} (masked): {}", operation_name, mask_secret(&token.key));
        Ok(token)
    }

    /// Obtains a temporary request token for the out-of-band (PIN) flow.
    pub async fn request_token(&self, app: &Token) -> std::result::Result<Token, ApiError> {
        let url = self.url("/oauth/request_token");
        let client = oauth::Credentials::new(app.key.as_str(), app.secret.as_str());

        let mut builder = oauth::Builder::<_, _>::new(client, oauth::HMAC_SHA1);
        builder.callback("oob");
        let authorization = builder.post(&url, &());

        self.send(&url, authorization, "request token").await
    }

    /// Exchanges an authorized request token and the PIN for an access token.
    pub async fn access_token(
        &self,
        app: &Token,
        request_token: &Token,
        verifier: &str,
    ) -> std::result::Result<Token, ApiError> {
        let url = self.url("/oauth/access_token");
        let client = oauth::Credentials::new(app.key.as_str(), app.secret.as_str());
        let temporary =
            oauth::Credentials::new(request_token.key.as_str(), request_token.secret.as_str());

        let mut builder = oauth::Builder::<_, _>::new(client, oauth::HMAC_SHA1);
        builder.token(temporary).verifier(verifier);
        let authorization = builder.post(&url, &());

        self.send(&url, authorization, "access token").await
    }
}

/// Prints `prompt` to `output` and reads one trimmed line from `input`.
pub fn prompt_line<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> io::Result<String> {
    write!(output, "{prompt}")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Opens the console for interactive input.
///
/// The controlling terminal is preferred so a message piped on standard input
/// is left alone; without one, standard input is used.
pub fn console() -> Box<dyn BufRead + Send> {
    #[cfg(unix)]
    {
        if let Ok(tty) = std::fs::File::open("/dev/tty") {
            return Box::new(io::BufReader::new(tty));
        }
    }
    Box::new(io::BufReader::new(io::stdin()))
}

/// Runs the interactive authorization for `user` and stores the resulting
/// token in `config_file`.
///
/// # Parameters
///
/// - `flow`: OAuth endpoint client
/// - `app`: Application (consumer) credentials
/// - `user`: Account being authorized
/// - `config_file`: Config file the new token is appended to
/// - `input`: Where the PIN is read from; read on a blocking thread so an
///   interrupt is still noticed while waiting
///
/// # Errors
///
/// - [`TweetError::Authorization`] if a token request fails or no PIN is given
/// - [`TweetError::ConfigWrite`] if the token cannot be stored; the token is
///   printed to standard error first so it is not lost
pub async fn authorize_account<R>(
    flow: &OAuthFlow,
    app: &Token,
    user: &str,
    config_file: &Path,
    mut input: R,
) -> Result<Token>
where
    R: BufRead + Send + 'static,
{
    let auth_error = |reason: String| TweetError::Authorization {
        user: user.to_string(),
        reason,
    };

    let request_token = flow
        .request_token(app)
        .await
        .map_err(|e| auth_error(e.to_string()))?;

    println!(
        "Access credentials for {} not found in {}.",
        user,
        config_file.display()
    );
    println!("Please log in on twitter.com as {} and then go to: ", user);
    println!("  {}", flow.authorize_url(&request_token));

    let pin = tokio::task::spawn_blocking(move || {
        prompt_line(&mut input, &mut io::stdout(), "Enter PIN: ")
    })
    .await
    .map_err(|e| auth_error(format!("unable to read PIN: {e}")))?
    .map_err(|e| auth_error(format!("unable to read PIN: {e}")))?;
    if pin.is_empty() {
        return Err(auth_error("no PIN entered".to_string()));
    }

    let token = flow
        .access_token(app, &request_token, &pin)
        .await
        .map_err(|e| auth_error(e.to_string()))?;
    info!("Obtained access token for {}", user);

    save_token(config_file, user, &token, &mut io::stderr())?;
    Ok(token)
}

/// Appends a freshly issued token to `config_file`.
///
/// When the file cannot be written the credential lines are written to
/// `notice` so the operator can add them by hand, and the error is returned.
pub fn save_token<W: Write>(
    config_file: &Path,
    user: &str,
    token: &Token,
    notice: &mut W,
) -> Result<()> {
    if let Err(e) = append_token(config_file, user, token) {
        let _ = writeln!(
            notice,
            "Authorization for {} succeeded but could not be saved. Add these lines to {} by hand:",
            user,
            config_file.display()
        );
        let _ = writeln!(notice, "{}_key = {}", user, token.key);
        let _ = writeln!(notice, "{}_secret = {}", user, token.secret);
        return Err(e);
    }
    Ok(())
}
