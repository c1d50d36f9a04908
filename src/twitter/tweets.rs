//! Tweet operations for Twitter API.
//!
//! This module contains functions for posting, deleting, liking and
//! retweeting tweets using the Twitter API v2.

use log::{debug, info};
use reqwest::Method;
use serde::Serialize;
use serde_json::json;

use super::api::{data_str, TwitterClient};
use super::StatusDraft;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
struct TweetBody<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<Reply<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<Media<'a>>,
}

#[derive(Debug, Serialize)]
struct Reply<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Debug, Serialize)]
struct Media<'a> {
    media_ids: &'a [String],
}

fn tweet_payload(draft: &StatusDraft) -> Result<serde_json::Value, ApiError> {
    let body = TweetBody {
        text: &draft.text,
        reply: draft.in_reply_to.as_deref().map(|id| Reply {
            in_reply_to_tweet_id: id,
        }),
        media: (!draft.media_ids.is_empty()).then_some(Media {
            media_ids: &draft.media_ids,
        }),
    };
    serde_json::to_value(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

/// Posts a tweet, optionally as a reply and with attached media.
///
/// # Returns
///
/// - `Ok(String)`: The id of the new tweet
/// - `Err(ApiError)`: If the request fails or the response carries no id
pub(crate) async fn post_status(
    client: &TwitterClient,
    draft: &StatusDraft,
) -> Result<String, ApiError> {
    match &draft.in_reply_to {
        Some(parent) => info!("Posting reply to tweet {}", parent),
        None => info!("Posting new tweet"),
    }

    let payload = tweet_payload(draft)?;
    let json = client
        .request(Method::POST, "/2/tweets", Some(&payload), "post_tweet")
        .await?;

    let id = data_str(&json, "id")?;
    debug!("New tweet id: {}", id);
    Ok(id)
}

/// Deletes one of the account's own tweets.
pub(crate) async fn delete_status(client: &TwitterClient, id: &str) -> Result<(), ApiError> {
    let path = format!("/2/tweets/{}", urlencoding::encode(id));
    client
        .request(Method::DELETE, &path, None, "delete_tweet")
        .await?;
    Ok(())
}

pub(crate) async fn like(client: &TwitterClient, id: &str) -> Result<(), ApiError> {
    let me = client.me().await?;
    let path = format!("/2/users/{}/likes", me);
    let payload = json!({ "tweet_id": id });
    client
        .request(Method::POST, &path, Some(&payload), "like_tweet")
        .await?;
    Ok(())
}

pub(crate) async fn retweet(client: &TwitterClient, id: &str) -> Result<(), ApiError> {
    let me = client.me().await?;
    let path = format!("/2/users/{}/retweets", me);
    let payload = json!({ "tweet_id": id });
    client
        .request(Method::POST, &path, Some(&payload), "retweet")
        .await?;
    Ok(())
}

pub(crate) async fn unretweet(client: &TwitterClient, id: &str) -> Result<(), ApiError> {
    let me = client.me().await?;
    let path = format!("/2/users/{}/retweets/{}", me, urlencoding::encode(id));
    client
        .request(Method::DELETE, &path, None, "unretweet")
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_tweet_payload() {
        let draft = StatusDraft {
            text: "Hello from the shell".to_string(),
            ..StatusDraft::default()
        };
        assert_eq!(
            tweet_payload(&draft).unwrap(),
            json!({"text": "Hello from the shell"})
        );
    }

    #[test]
    fn test_reply_with_media_payload() {
        let draft = StatusDraft {
            text: "look".to_string(),
            in_reply_to: Some("1346889436626259968".to_string()),
            media_ids: vec!["1455952740635586573".to_string()],
        };
        assert_eq!(
            tweet_payload(&draft).unwrap(),
            json!({
                "text": "look",
                "reply": {"in_reply_to_tweet_id": "1346889436626259968"},
                "media": {"media_ids": ["1455952740635586573"]}
            })
        );
    }
}
