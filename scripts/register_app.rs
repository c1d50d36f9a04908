//! Application Registration Script
//!
//! This script stores the consumer key and secret of your registered Twitter
//! app in the tweet config file. Run it once before using `tweet`; account
//! tokens are then added by `tweet` itself on first use of each account.
//!
//! Create the app at https://developer.x.com/ and copy its "API Key" and
//! "API Key Secret".

use clap::Parser;
use log::{debug, info};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tweet::config::{
    append_token, default_config_path, mask_secret, CredentialStore, Token, API_IDENTIFIER,
};
use tweet::oauth::prompt_line;
use tweet::TweetError;

#[derive(Parser, Debug)]
#[command(
    name = "tweet-register",
    version,
    about = "Store the application's consumer credentials in the tweet config file"
)]
struct Args {
    /// Config file to write [default: ~/.tweetrc]
    #[arg(short = 'c', long = "config", value_name = "file")]
    config: Option<PathBuf>,

    /// Add new credentials even if the file already has some
    #[arg(long = "force")]
    force: bool,
}

/// Checks whether `path` already holds complete application credentials.
///
/// A file that does not exist yet holds none.
fn has_api_credentials(path: &Path) -> Result<bool, TweetError> {
    if !path.exists() {
        return Ok(false);
    }
    let store = CredentialStore::load(path)?;
    Ok(store.api_credentials().is_some())
}

fn register(args: &Args) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let path = args.config.clone().unwrap_or_else(default_config_path);

    if has_api_credentials(&path)? && !args.force {
        return Err(format!(
            "{} already has application credentials; use --force to add new ones",
            path.display()
        )
        .into());
    }

    println!("Twitter App Registration Helper");
    println!("===============================");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let key = prompt_line(&mut input, &mut output, "Enter your app's API Key: ")?;
    let secret = prompt_line(&mut input, &mut output, "Enter your app's API Key Secret: ")?;
    if key.is_empty() || secret.is_empty() {
        return Err("both the API Key and the API Key Secret are required".into());
    }

    info!("Consumer key (masked): {}", mask_secret(&key));
    append_token(&path, API_IDENTIFIER, &Token::new(key, secret))?;

    println!();
    println!("Stored application credentials in {}", path.display());
    println!("Now run: echo 'Hello, world!' | tweet -u <your account>");
    output.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    match register(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("Registration failed: {:?}", e);
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
