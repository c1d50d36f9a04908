//! Action dispatch: posting a message, or running a batch of queued actions.
//!
//! Both modes are generic over [`SocialApi`], so the dispatch logic can be
//! exercised with a fake client. Remote failures never abort a batch; every
//! item produces an [`ItemReport`] and the entry point reduces the
//! [`BatchReport`] to an exit status.

use log::{debug, info};
use std::fs::File;
use std::path::Path;

use crate::app::{EXIT_ERROR, EXIT_SUCCESS};
use crate::cli::{status_id, user_name, PostOptions};
use crate::error::{ApiError, Result, TweetError};
use crate::message::fit_message;
use crate::twitter::{SocialApi, StatusDraft};

/// One kind of batch action. [`ActionKind::ALL`] is the order in which the
/// queues are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Block,
    Unblock,
    Delete,
    Follow,
    Unfollow,
    Like,
    Retweet,
    Unretweet,
}

impl ActionKind {
    pub const ALL: [ActionKind; 8] = [
        ActionKind::Block,
        ActionKind::Unblock,
        ActionKind::Delete,
        ActionKind::Follow,
        ActionKind::Unfollow,
        ActionKind::Like,
        ActionKind::Retweet,
        ActionKind::Unretweet,
    ];

    /// Whether the targets of this action are users (as opposed to messages).
    pub fn targets_users(self) -> bool {
        matches!(
            self,
            ActionKind::Block | ActionKind::Unblock | ActionKind::Follow | ActionKind::Unfollow
        )
    }

    /// Progressive verb used in error reports ("Error blocking foo: ...").
    pub fn verb(self) -> &'static str {
        match self {
            ActionKind::Block => "blocking",
            ActionKind::Unblock => "un-blocking",
            ActionKind::Delete => "deleting",
            ActionKind::Follow => "following",
            ActionKind::Unfollow => "un-following",
            ActionKind::Like => "liking",
            ActionKind::Retweet => "retweeting",
            ActionKind::Unretweet => "un-retweeting",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Normalizes a raw command-line target for this action.
    fn normalize(self, target: &str) -> String {
        if self.targets_users() {
            user_name(target)
        } else {
            status_id(target)
        }
    }
}

/// Per-action lists of targets, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionQueue {
    queues: [Vec<String>; 8],
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a queue from raw command-line targets, normalizing status URLs
    /// to ids and stripping `@` from user names.
    pub fn from_targets<I>(targets: I) -> Self
    where
        I: IntoIterator<Item = (ActionKind, Vec<String>)>,
    {
        let mut queue = Self::new();
        for (kind, raw) in targets {
            for target in raw {
                queue.push(kind, &target);
            }
        }
        queue
    }

    pub fn push(&mut self, kind: ActionKind, target: &str) {
        self.queues[kind.index()].push(kind.normalize(target));
    }

    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(Vec::is_empty)
    }

    pub fn len(&self) -> usize {
        self.queues.iter().map(Vec::len).sum()
    }

    pub fn targets(&self, kind: ActionKind) -> &[String] {
        &self.queues[kind.index()]
    }

    /// All queued items: queues in [`ActionKind::ALL`] order, items in input
    /// order.
    pub fn items(&self) -> impl Iterator<Item = (ActionKind, &str)> + '_ {
        ActionKind::ALL.into_iter().flat_map(move |kind| {
            self.targets(kind)
                .iter()
                .map(move |target| (kind, target.as_str()))
        })
    }
}

/// Outcome of one batch item.
#[derive(Debug)]
pub struct ItemReport {
    pub kind: ActionKind,
    pub target: String,
    pub outcome: std::result::Result<(), ApiError>,
}

/// Outcomes of every item of a batch, in execution order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.items.iter().filter(|item| item.outcome.is_err()).count()
    }

    pub fn succeeded(&self) -> bool {
        self.failures() == 0
    }

    /// Process exit status for this batch: 0 when every item succeeded.
    pub fn exit_code(&self) -> u8 {
        if self.succeeded() {
            EXIT_SUCCESS
        } else {
            EXIT_ERROR
        }
    }
}

async fn dispatch<A: SocialApi>(
    api: &A,
    kind: ActionKind,
    target: &str,
) -> std::result::Result<(), ApiError> {
    match kind {
        ActionKind::Block => api.block(target).await,
        ActionKind::Unblock => api.unblock(target).await,
        ActionKind::Delete => api.delete_status(target).await,
        ActionKind::Follow => api.follow(target).await,
        ActionKind::Unfollow => api.unfollow(target).await,
        ActionKind::Like => api.like(target).await,
        ActionKind::Retweet => api.retweet(target).await,
        ActionKind::Unretweet => api.unretweet(target).await,
    }
}

/// Runs every queued action once, in order.
///
/// Each failure is reported to standard error as
/// `Error <verb> <target>: <error>` and recorded; it does not stop the
/// remaining items.
pub async fn run_batch<A: SocialApi>(api: &A, queue: &ActionQueue) -> BatchReport {
    info!("Running {} queued action(s)", queue.len());

    let mut report = BatchReport::default();
    for (kind, target) in queue.items() {
        debug!("{} {}", kind.verb(), target);

        let outcome = dispatch(api, kind, target).await;
        if let Err(e) = &outcome {
            eprintln!("Error {} {}: {}", kind.verb(), target, e);
        }

        report.items.push(ItemReport {
            kind,
            target: target.to_string(),
            outcome,
        });
    }

    info!(
        "Batch finished: {} action(s), {} failure(s)",
        report.items.len(),
        report.failures()
    );
    report
}

/// Checks that a media file exists and can be opened for reading.
///
/// # Errors
///
/// - [`TweetError::MediaNotFound`] if the path does not exist
/// - [`TweetError::MediaUnreadable`] if it exists but cannot be read
pub fn check_media(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(TweetError::MediaNotFound(path.to_path_buf()));
    }
    if !path.is_file() || File::open(path).is_err() {
        return Err(TweetError::MediaUnreadable(path.to_path_buf()));
    }
    Ok(())
}

/// Sizes and posts `text`, returning the id of the new message.
///
/// The media file, if any, is checked before anything is sent and uploaded
/// before the status is submitted. With `print_id` set the new id is written
/// to standard output.
///
/// # Errors
///
/// Sizing and media errors are returned as-is and happen before any remote
/// call; a remote failure is returned as [`TweetError::Post`].
pub async fn post_message<A: SocialApi>(
    api: &A,
    text: &str,
    options: &PostOptions,
) -> Result<String> {
    let text = fit_message(text, &options.sizing)?;

    if let Some(media) = &options.media {
        check_media(media)?;
    }

    let media_id = match &options.media {
        Some(media) => {
            info!("Uploading {}", media.display());
            Some(api.upload_media(media).await.map_err(TweetError::Post)?)
        }
        None => None,
    };

    let draft = StatusDraft {
        text,
        in_reply_to: options.reply_to.clone(),
        media_ids: media_id.into_iter().collect(),
    };

    let id = api.post_status(&draft).await.map_err(TweetError::Post)?;
    info!("Posted message {}", id);

    if options.print_id {
        println!("{id}");
    }
    Ok(id)
}
