//! Credential store for the tweet client.
//!
//! Credentials live in a flat text file (`~/.tweetrc` by default) made of
//! `identifier_key = value` and `identifier_secret = value` lines. The reserved
//! identifier `<api>` holds the application's consumer key and secret; every
//! other identifier is an account name holding that account's access token.
//!
//! Loading happens in two phases. [`CredentialStoreBuilder`] records key and
//! secret lines independently, so a later line only overwrites the matching
//! field. [`CredentialStoreBuilder::build`] then splits the records into
//! complete tokens and partial records; the authorization bootstrap completes
//! the latter.

use log::{debug, info, warn};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{Result, TweetError};

/// Identifier under which the application credentials are stored.
pub const API_IDENTIFIER: &str = "<api>";

/// File name of the default config file in the user's home directory.
pub const DEFAULT_CONFIG_FILE: &str = ".tweetrc";

/// A key/secret pair: either the application's consumer credentials or one
/// account's access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub key: String,
    pub secret: String,
}

impl Token {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }
}

/// Result of looking up an account in the store.
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// Both key and secret are present
    Complete(&'a Token),
    /// Only one of key or secret was found in the file
    Partial,
    /// The account does not appear in the file at all
    Missing,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct PartialToken {
    key: Option<String>,
    secret: Option<String>,
}

/// First loading phase: collects key and secret fields per identifier.
#[derive(Debug, Default)]
pub struct CredentialStoreBuilder {
    records: BTreeMap<String, PartialToken>,
}

impl CredentialStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the key field for `identifier`, keeping any secret already seen.
    pub fn key(&mut self, identifier: &str, value: &str) -> &mut Self {
        self.records.entry(identifier.to_string()).or_default().key = Some(value.to_string());
        self
    }

    /// Records the secret field for `identifier`, keeping any key already seen.
    pub fn secret(&mut self, identifier: &str, value: &str) -> &mut Self {
        self.records.entry(identifier.to_string()).or_default().secret =
            Some(value.to_string());
        self
    }

    /// Feeds one config line to the builder. Lines that are neither a key nor
    /// a secret line are ignored.
    pub fn line(&mut self, line: &str) -> &mut Self {
        let line = line.trim();
        let (key_pattern, secret_pattern) = line_patterns();

        if let Some(caps) = key_pattern.captures(line) {
            self.key(&caps["id"], caps["value"].trim());
        }
        if let Some(caps) = secret_pattern.captures(line) {
            self.secret(&caps["id"], caps["value"].trim());
        }
        self
    }

    /// Second loading phase: splits the collected records into complete
    /// tokens and partial records.
    pub fn build(self) -> CredentialStore {
        let mut store = CredentialStore::default();

        for (identifier, record) in self.records {
            match (record.key, record.secret) {
                (Some(key), Some(secret)) => {
                    let token = Token { key, secret };
                    if identifier == API_IDENTIFIER {
                        store.api = Some(token);
                    } else {
                        store.accounts.insert(identifier, token);
                    }
                }
                _ => {
                    store.partial.insert(identifier);
                }
            }
        }

        store
    }
}

fn line_patterns() -> &'static (Regex, Regex) {
    static PATTERNS: OnceLock<(Regex, Regex)> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        (
            Regex::new(r"^(?P<id>[^#]+)_key\s*=\s*(?P<value>.+)").expect("valid key pattern"),
            Regex::new(r"^(?P<id>[^#]+)_secret\s*=\s*(?P<value>.+)")
                .expect("valid secret pattern"),
        )
    })
}

/// The in-memory credential mapping built once at startup.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CredentialStore {
    api: Option<Token>,
    accounts: BTreeMap<String, Token>,
    partial: BTreeSet<String>,
}

impl CredentialStore {
    /// Parses config file contents.
    ///
    /// Parsing is a pure function of the text: the same input always yields
    /// an equal store.
    pub fn parse(text: &str) -> Self {
        let mut builder = CredentialStoreBuilder::new();
        for line in text.lines() {
            builder.line(line);
        }
        builder.build()
    }

    /// Reads and parses the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TweetError::ConfigRead`] if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading credentials from {}", path.display());

        let text = fs::read_to_string(path).map_err(|source| TweetError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        check_permissions(path);

        let store = Self::parse(&text);
        debug!(
            "Config has application credentials: {}, {} account(s), {} partial record(s)",
            store.api.is_some(),
            store.accounts.len(),
            store.partial.len()
        );
        if let Some(api) = &store.api {
            debug!("Consumer key (masked): {}", mask_secret(&api.key));
        }
        Ok(store)
    }

    /// The application credentials, present only when both the `<api>` key
    /// and secret lines were found.
    pub fn api_credentials(&self) -> Option<&Token> {
        self.api.as_ref()
    }

    pub fn lookup(&self, account: &str) -> Lookup<'_> {
        if let Some(token) = self.accounts.get(account) {
            Lookup::Complete(token)
        } else if self.partial.contains(account) {
            Lookup::Partial
        } else {
            Lookup::Missing
        }
    }

    /// Stores a freshly authorized token in memory.
    pub fn insert(&mut self, account: &str, token: Token) {
        self.partial.remove(account);
        self.accounts.insert(account.to_string(), token);
    }
}

/// Appends the key and secret lines for `identifier` to the config file,
/// creating it if needed.
///
/// A missing newline at the end of the existing file is added first so the
/// new lines are not glued to the last one.
///
/// # Errors
///
/// Returns [`TweetError::ConfigWrite`] if the file cannot be opened or written.
pub fn append_token(path: &Path, identifier: &str, token: &Token) -> Result<()> {
    let write_error = |source| TweetError::ConfigWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(write_error)?;

    let mut lines = String::new();
    if needs_leading_newline(&mut file).map_err(write_error)? {
        lines.push('\n');
    }
    lines.push_str(&format!("{identifier}_key = {}\n", token.key));
    lines.push_str(&format!("{identifier}_secret = {}\n", token.secret));

    file.write_all(lines.as_bytes()).map_err(write_error)?;
    file.flush().map_err(write_error)?;

    info!(
        "Stored credentials for {} in {}",
        identifier,
        path.display()
    );
    Ok(())
}

fn needs_leading_newline(file: &mut fs::File) -> std::io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Checks that `name` can be stored as an account identifier and read back.
///
/// The name must be non-empty, contain no `#` or whitespace, and must not be
/// the reserved [`API_IDENTIFIER`].
///
/// # Errors
///
/// Returns a short description of the problem.
pub fn validate_account_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("account name must not be empty".to_string());
    }
    if name == API_IDENTIFIER {
        return Err(format!("'{API_IDENTIFIER}' is reserved for the application credentials"));
    }
    if name.contains('#') || name.chars().any(char::is_whitespace) {
        return Err(format!("'{name}' cannot be stored in the config file"));
    }
    Ok(())
}

/// Default location of the config file: `~/.tweetrc`.
///
/// Falls back to a relative `.tweetrc` when no home directory can be found.
pub fn default_config_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(DEFAULT_CONFIG_FILE),
        None => {
            warn!("Home directory not found, using ./{}", DEFAULT_CONFIG_FILE);
            PathBuf::from(DEFAULT_CONFIG_FILE)
        }
    }
}

/// Masks a secret for logging, keeping only a short prefix and suffix.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let len = chars.len();

    let prefix: String = chars.iter().take(len.min(8).min(len / 2)).collect();
    if len > 16 {
        let suffix: String = chars[len - 4..].iter().collect();
        format!("{prefix}...{suffix}")
    } else {
        format!("{prefix}...")
    }
}

#[cfg(unix)]
fn check_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            warn!(
                "Permissions for {} are {:o}, it holds secrets; run chmod 600 {}",
                path.display(),
                mode,
                path.display()
            );
        }
    }
}

#[cfg(not(unix))]
fn check_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
# tweet(1) credentials
<api>_key = consumerkey
<api>_secret = consumersecret

jschauma_key = 370773112-abcdef
jschauma_secret = tokensecret
halfdone_key = onlythekey
";

    #[test]
    fn test_validate_account_name() {
        assert!(validate_account_name("jschauma").is_ok());
        assert!(validate_account_name("").is_err());
        assert!(validate_account_name(API_IDENTIFIER).is_err());
        assert!(validate_account_name("a#b").is_err());
        assert!(validate_account_name("two words").is_err());
    }

    #[test]
    fn test_parse_splits_api_and_accounts() {
        let store = CredentialStore::parse(SAMPLE);

        assert_eq!(
            store.api_credentials(),
            Some(&Token::new("consumerkey", "consumersecret"))
        );
        assert_eq!(
            store.lookup("jschauma"),
            Lookup::Complete(&Token::new("370773112-abcdef", "tokensecret"))
        );
        assert_eq!(store.lookup("halfdone"), Lookup::Partial);
        assert_eq!(store.lookup("nobody"), Lookup::Missing);
    }

    #[test]
    fn test_parse_is_idempotent() {
        assert_eq!(CredentialStore::parse(SAMPLE), CredentialStore::parse(SAMPLE));
    }

    #[test]
    fn test_later_line_overwrites_only_matching_field() {
        let text = "\
bob_key = first
bob_secret = secret
bob_key = second
";
        let store = CredentialStore::parse(text);
        assert_eq!(
            store.lookup("bob"),
            Lookup::Complete(&Token::new("second", "secret"))
        );
    }

    #[test]
    fn test_secret_before_key_still_completes() {
        let store = CredentialStore::parse("alice_secret = s\nalice_key = k\n");
        assert_eq!(store.lookup("alice"), Lookup::Complete(&Token::new("k", "s")));
    }

    #[test]
    fn test_comments_and_junk_are_ignored() {
        let text = "\
# carol_key = commented
just some words
carol_token = nope
=
";
        let store = CredentialStore::parse(text);
        assert_eq!(store.lookup("carol"), Lookup::Missing);
        assert!(store.api_credentials().is_none());
    }

    #[test]
    fn test_api_credentials_need_both_fields() {
        let store = CredentialStore::parse("<api>_key = onlykey\n");
        assert!(store.api_credentials().is_none());
    }

    #[test]
    fn test_whitespace_around_equals_is_optional() {
        let store = CredentialStore::parse("  dave_key=k1  \ndave_secret   =   s1\n");
        assert_eq!(store.lookup("dave"), Lookup::Complete(&Token::new("k1", "s1")));
    }

    #[test]
    fn test_insert_completes_partial_record() {
        let mut store = CredentialStore::parse("erin_key = k\n");
        assert_eq!(store.lookup("erin"), Lookup::Partial);

        store.insert("erin", Token::new("k2", "s2"));
        assert_eq!(store.lookup("erin"), Lookup::Complete(&Token::new("k2", "s2")));
    }

    #[test]
    fn test_load_missing_file_is_config_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist");

        let result = CredentialStore::load(&path);
        assert!(matches!(result, Err(TweetError::ConfigRead { .. })));
    }

    #[test]
    fn test_append_token_round_trips_through_load() {
        let mut file = NamedTempFile::new().unwrap();
        // No trailing newline on purpose
        write!(file, "<api>_key = ck\n<api>_secret = cs").unwrap();

        append_token(file.path(), "frank", &Token::new("fk", "fs")).unwrap();

        let contents = fs::read_to_string(file.path()).unwrap();
        assert!(contents.ends_with("\nfrank_key = fk\nfrank_secret = fs\n"));
        assert!(contents.contains("<api>_secret = cs\n"));

        let store = CredentialStore::load(file.path()).unwrap();
        assert_eq!(store.api_credentials(), Some(&Token::new("ck", "cs")));
        assert_eq!(store.lookup("frank"), Lookup::Complete(&Token::new("fk", "fs")));
    }

    #[test]
    fn test_append_token_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tweetrc");

        append_token(&path, API_IDENTIFIER, &Token::new("ck", "cs")).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "<api>_key = ck\n<api>_secret = cs\n");
    }

    #[test]
    fn test_append_token_to_unwritable_location_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("tweetrc");

        let result = append_token(&path, "grace", &Token::new("k", "s"));
        assert!(matches!(result, Err(TweetError::ConfigWrite { .. })));
    }

    #[test]
    fn test_mask_secret_hides_the_middle() {
        let masked = mask_secret("370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb");
        assert_eq!(masked, "37077311...JAEb");

        assert_eq!(mask_secret("short"), "sh...");
        assert_eq!(mask_secret(""), "...");
    }
}
