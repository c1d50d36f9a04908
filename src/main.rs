//! # tweet
//!
//! A very simple command-line tweeter.
//!
//! ## Usage
//!
//! ```bash
//! # Post a message
//! echo "Hello, world!" | tweet -u jschauma
//!
//! # Reply with a picture and print the new tweet's id
//! echo "Look at this" | tweet -u jschauma -i -m cat.png -a 1346889436626259968
//!
//! # Follow two accounts and like a tweet
//! tweet -u jschauma -f netmeister -f @NetBSD -l https://twitter.com/NetBSD/status/1234
//!
//! # Run with debug logging
//! RUST_LOG=debug tweet -u jschauma -l 1234
//! ```

use log::info;
use std::io::Write;
use std::process::ExitCode;

use tweet::{init_logging, parse_args, run, ParseOutcome, EXIT_ERROR};

/// Main entry point.
///
/// Parses the command line, initializes logging and runs exactly one post or
/// batch. Help and version output go to standard output with status 0;
/// argument errors go to standard error with status 1. Ctrl-C ends the run
/// with status 1.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match parse_args(std::env::args_os()) {
        ParseOutcome::Config(config) => config,
        ParseOutcome::HelpRequested(text) => {
            print!("{text}");
            return ExitCode::SUCCESS;
        }
        ParseOutcome::Error(text) => {
            eprint!("{text}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    init_logging(config.verbosity);

    let status = tokio::select! {
        result = run(&config) => match result {
            Ok(status) => status,
            Err(e) => {
                eprintln!("{e}");
                EXIT_ERROR
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            let _ = std::io::stdout().flush();
            // A blocking read may still be pending; do not wait for it
            std::process::exit(i32::from(EXIT_ERROR));
        }
    };

    ExitCode::from(status)
}
