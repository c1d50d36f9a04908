//! Core Twitter API utilities.
//!
//! This module contains the authenticated client and the low-level helper that
//! signs a request, sends it and turns the answer into JSON or an [`ApiError`].

use log::{debug, error, info, warn};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::config::{mask_secret, Token};
use crate::error::ApiError;

/// Base URL of the API v2 endpoints.
pub const API_BASE_URL: &str = "https://api.x.com";

/// Media upload endpoint.
pub const UPLOAD_URL: &str = "https://api.x.com/2/media/upload";

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// This function:
/// - Truncates long text to prevent log flooding
/// - Replaces control characters that could manipulate log output
/// - Escapes newlines to prevent log injection
///
/// # Parameters
///
/// - `text`: The text to sanitize
/// - `max_len`: Maximum length (in characters) before truncation
///
/// # Returns
///
/// A sanitized string safe for logging
pub(crate) fn sanitize_for_logging(text: &str, max_len: usize) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if sanitized.chars().count() > max_len {
        let kept: String = sanitized.chars().take(max_len).collect();
        format!("{}... [truncated, {} total bytes]", kept, text.len())
    } else {
        sanitized
    }
}

/// An authenticated API session for one account.
///
/// Every request is signed with OAuth 1.0a (HMAC-SHA1) using the application
/// credentials and the account's access token. The numeric id of the account
/// is looked up on first use and cached for the rest of the session.
#[derive(Debug)]
pub struct TwitterClient {
    http: Client,
    base_url: String,
    upload_url: String,
    app: Token,
    account: Token,
    me: OnceCell<String>,
}

impl TwitterClient {
    /// Creates a client for the production API.
    pub fn new(app: Token, account: Token) -> Self {
        Self::with_base_url(app, account, API_BASE_URL, UPLOAD_URL)
    }

    /// Creates a client talking to an alternative API host.
    pub fn with_base_url(
        app: Token,
        account: Token,
        base_url: impl Into<String>,
        upload_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        info!("Creating API session against {}", base_url);
        debug!("Access token (masked): {}", mask_secret(&account.key));

        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            upload_url: upload_url.into(),
            app,
            account,
            me: OnceCell::new(),
        }
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn upload_url(&self) -> &str {
        &self.upload_url
    }

    /// Absolute URL for an API path such as `/2/tweets`.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Builds the OAuth 1.0a `Authorization` header for a request without
    /// signed parameters (JSON and multipart bodies are not part of the
    /// signature).
    pub(crate) fn authorization(&self, method: &Method, url: &str) -> String {
        let token = oauth::Token::from_parts(
            self.app.key.as_str(),
            self.app.secret.as_str(),
            self.account.key.as_str(),
            self.account.secret.as_str(),
        );

        match *method {
            Method::GET => oauth::get(url, &(), &token, oauth::HMAC_SHA1),
            Method::DELETE => oauth::delete(url, &(), &token, oauth::HMAC_SHA1),
            _ => oauth::post(url, &(), &token, oauth::HMAC_SHA1),
        }
    }

    /// Sends a signed request to `path` and returns the parsed JSON body.
    ///
    /// # Parameters
    ///
    /// - `method`: `GET`, `POST` or `DELETE`
    /// - `path`: API path, appended to the base URL
    /// - `body`: Optional JSON payload
    /// - `operation_name`: Human-readable name for the operation (for logging)
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] if the request cannot be sent
    /// - [`ApiError::Status`] for any non-success status
    /// - [`ApiError::Rejected`] if the body carries only errors and no data
    /// - [`ApiError::InvalidResponse`] if the body is not JSON
    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        operation_name: &str,
    ) -> Result<Value, ApiError> {
        let url = self.url(path);
        info!("Sending {} {} for operation: {}", method, url, operation_name);

        let auth_header = self.authorization(&method, &url);
        let mut request_builder = self
            .http
            .request(method, &url)
            .header(reqwest::header::AUTHORIZATION, auth_header);
        if let Some(payload) = body {
            debug!(
                "Request payload for '{}': {}",
                operation_name,
                sanitize_for_logging(&payload.to_string(), 200)
            );
            request_builder = request_builder.json(payload);
        }

        let response = request_builder.send().await?;
        read_json(response, operation_name).await
    }

    /// Numeric id of the authenticated account, looked up once per session.
    pub(crate) async fn me(&self) -> Result<&str, ApiError> {
        let id = self
            .me
            .get_or_try_init(|| async {
                let json = self
                    .request(Method::GET, "/2/users/me", None, "lookup_me")
                    .await?;
                let id = data_str(&json, "id")?;
                info!("Authenticated as user id {}", id);
                Ok::<_, ApiError>(id)
            })
            .await?;
        Ok(id.as_str())
    }
}

/// Turns a response into JSON, mapping failures to [`ApiError`].
pub(crate) async fn read_json(
    response: reqwest::Response,
    operation_name: &str,
) -> Result<Value, ApiError> {
    let status = response.status();
    info!(
        "Received response with status: {} for operation: {}",
        status, operation_name
    );

    let response_text = response.text().await?;
    debug!(
        "Response for '{}': {}",
        operation_name,
        sanitize_for_logging(&response_text, 200)
    );

    parse_body(status, &response_text, operation_name)
}

/// Interprets a response body received with `status`.
///
/// An empty success body is `Value::Null`. A success body carrying `errors`
/// and no `data` is an [`ApiError::Rejected`].
pub(crate) fn parse_body(
    status: StatusCode,
    response_text: &str,
    operation_name: &str,
) -> Result<Value, ApiError> {
    if !status.is_success() {
        error!("Operation '{}' failed - Status: {}", operation_name, status);
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(response_text),
        });
    }

    if response_text.trim().is_empty() {
        return Ok(Value::Null);
    }

    let json: Value = serde_json::from_str(response_text).map_err(|e| {
        ApiError::InvalidResponse(format!("{}: {}", e, sanitize_for_logging(response_text, 200)))
    })?;

    if json.get("data").is_none() {
        if let Some(errors) = json.get("errors") {
            warn!("Operation '{}' returned errors and no data", operation_name);
            return Err(ApiError::Rejected(errors_summary(errors)));
        }
    }

    info!("Operation '{}' completed successfully", operation_name);
    Ok(json)
}

/// Extracts a readable message from an error body.
///
/// API v2 problems carry `detail` and `title`; older endpoints carry an
/// `errors` array. Anything else is returned sanitized.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(detail) = json.get("detail").and_then(Value::as_str) {
            return detail.to_string();
        }
        if let Some(title) = json.get("title").and_then(Value::as_str) {
            return title.to_string();
        }
        if let Some(errors) = json.get("errors") {
            return errors_summary(errors);
        }
    }
    sanitize_for_logging(body.trim(), 200)
}

fn errors_summary(errors: &Value) -> String {
    let messages: Vec<&str> = errors
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|e| {
                    e.get("detail")
                        .or_else(|| e.get("message"))
                        .or_else(|| e.get("title"))
                        .and_then(Value::as_str)
                })
                .collect()
        })
        .unwrap_or_default();

    if messages.is_empty() {
        sanitize_for_logging(&errors.to_string(), 200)
    } else {
        messages.join("; ")
    }
}

/// Reads `data.<field>` as a string.
pub(crate) fn data_str(json: &Value, field: &str) -> Result<String, ApiError> {
    json.get("data")
        .and_then(|data| data.get(field))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ApiError::InvalidResponse(format!(
                "missing data.{} in {}",
                field,
                sanitize_for_logging(&json.to_string(), 200)
            ))
        })
}
