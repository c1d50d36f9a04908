//! Twitter/X API integration module.
//!
//! [`SocialApi`] is the seam between the command-line logic and the remote
//! service: every operation the client can perform is one method on it.
//! [`TwitterClient`] implements it against the API v2 endpoints, signing every
//! request with OAuth 1.0a user context credentials.

mod api;
mod media;
mod tweets;
mod users;

use std::path::Path;

use crate::error::ApiError;

pub use api::{TwitterClient, API_BASE_URL, UPLOAD_URL};
pub use media::media_type;

pub(crate) use api::sanitize_for_logging;

/// A message about to be posted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusDraft {
    pub text: String,
    /// Id of the message this one answers
    pub in_reply_to: Option<String>,
    /// Ids returned by [`SocialApi::upload_media`]
    pub media_ids: Vec<String>,
}

/// Remote operations performed on behalf of one authenticated account.
///
/// User arguments are user names (without `@`); message arguments are
/// message ids.
#[allow(async_fn_in_trait)]
pub trait SocialApi {
    /// Posts a message and returns the id of the new message.
    async fn post_status(&self, draft: &StatusDraft) -> Result<String, ApiError>;

    /// Uploads a media file and returns its media id.
    async fn upload_media(&self, path: &Path) -> Result<String, ApiError>;

    async fn delete_status(&self, id: &str) -> Result<(), ApiError>;

    async fn like(&self, id: &str) -> Result<(), ApiError>;

    async fn retweet(&self, id: &str) -> Result<(), ApiError>;

    async fn unretweet(&self, id: &str) -> Result<(), ApiError>;

    async fn block(&self, user: &str) -> Result<(), ApiError>;

    async fn unblock(&self, user: &str) -> Result<(), ApiError>;

    async fn follow(&self, user: &str) -> Result<(), ApiError>;

    async fn unfollow(&self, user: &str) -> Result<(), ApiError>;
}

impl SocialApi for TwitterClient {
    async fn post_status(&self, draft: &StatusDraft) -> Result<String, ApiError> {
        tweets::post_status(self, draft).await
    }

    async fn upload_media(&self, path: &Path) -> Result<String, ApiError> {
        media::upload(self, path).await
    }

    async fn delete_status(&self, id: &str) -> Result<(), ApiError> {
        tweets::delete_status(self, id).await
    }

    async fn like(&self, id: &str) -> Result<(), ApiError> {
        tweets::like(self, id).await
    }

    async fn retweet(&self, id: &str) -> Result<(), ApiError> {
        tweets::retweet(self, id).await
    }

    async fn unretweet(&self, id: &str) -> Result<(), ApiError> {
        tweets::unretweet(self, id).await
    }

    async fn block(&self, user: &str) -> Result<(), ApiError> {
        users::block(self, user).await
    }

    async fn unblock(&self, user: &str) -> Result<(), ApiError> {
        users::unblock(self, user).await
    }

    async fn follow(&self, user: &str) -> Result<(), ApiError> {
        users::follow(self, user).await
    }

    async fn unfollow(&self, user: &str) -> Result<(), ApiError> {
        users::unfollow(self, user).await
    }
}
