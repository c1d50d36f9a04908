//! Social graph operations: blocking and following users.
//!
//! The v2 endpoints address users by numeric id, so every user name given on
//! the command line is resolved first.

use log::{info, warn};
use reqwest::Method;
use serde_json::{json, Value};

use super::api::{data_str, TwitterClient};
use crate::error::ApiError;

/// Looks up a user id by username.
///
/// # Returns
///
/// - `Ok(String)`: The numeric user id
/// - `Err(ApiError::UserNotFound)`: If the API knows no such user
pub(crate) async fn lookup_user_id(
    client: &TwitterClient,
    username: &str,
) -> Result<String, ApiError> {
    info!("Looking up user by username: {}", username);

    let path = format!("/2/users/by/username/{}", urlencoding::encode(username));
    let result = client
        .request(Method::GET, &path, None, "lookup_user")
        .await;
    let json = user_lookup_result(result, username)?;

    let id = data_str(&json, "id")?;
    info!("Found user {} (@{})", id, username);
    Ok(id)
}

/// Maps "no such user" answers (a 404, or errors and no data) to
/// [`ApiError::UserNotFound`]; every other failure is kept.
fn user_lookup_result(
    result: Result<Value, ApiError>,
    username: &str,
) -> Result<Value, ApiError> {
    match result {
        Err(ApiError::Rejected(_)) | Err(ApiError::Status { status: 404, .. }) => {
            warn!("User {} not found", username);
            Err(ApiError::UserNotFound(username.to_string()))
        }
        other => other,
    }
}

async fn graph_create(
    client: &TwitterClient,
    edge: &str,
    username: &str,
    operation_name: &str,
) -> Result<(), ApiError> {
    let target = lookup_user_id(client, username).await?;
    let me = client.me().await?;

    let path = format!("/2/users/{}/{}", me, edge);
    let payload = json!({ "target_user_id": target });
    client
        .request(Method::POST, &path, Some(&payload), operation_name)
        .await?;
    Ok(())
}

async fn graph_delete(
    client: &TwitterClient,
    edge: &str,
    username: &str,
    operation_name: &str,
) -> Result<(), ApiError> {
    let target = lookup_user_id(client, username).await?;
    let me = client.me().await?;

    let path = format!("/2/users/{}/{}/{}", me, edge, target);
    client
        .request(Method::DELETE, &path, None, operation_name)
        .await?;
    Ok(())
}

pub(crate) async fn block(client: &TwitterClient, username: &str) -> Result<(), ApiError> {
    graph_create(client, "blocking", username, "block_user").await
}

pub(crate) async fn unblock(client: &TwitterClient, username: &str) -> Result<(), ApiError> {
    graph_delete(client, "blocking", username, "unblock_user").await
}

pub(crate) async fn follow(client: &TwitterClient, username: &str) -> Result<(), ApiError> {
    graph_create(client, "following", username, "follow_user").await
}

pub(crate) async fn unfollow(client: &TwitterClient, username: &str) -> Result<(), ApiError> {
    graph_delete(client, "following", username, "unfollow_user").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_user_is_reported_as_not_found() {
        let rejected = Err(ApiError::Rejected("Could not find user".to_string()));
        assert!(matches!(
            user_lookup_result(rejected, "nobody"),
            Err(ApiError::UserNotFound(name)) if name == "nobody"
        ));

        let missing = Err(ApiError::Status {
            status: 404,
            message: "Not Found".to_string(),
        });
        assert!(matches!(
            user_lookup_result(missing, "nobody"),
            Err(ApiError::UserNotFound(_))
        ));
    }

    #[test]
    fn test_malformed_lookup_response_is_kept() {
        let garbage = Err(ApiError::InvalidResponse("expected value".to_string()));
        assert!(matches!(
            user_lookup_result(garbage, "jschauma"),
            Err(ApiError::InvalidResponse(_))
        ));

        let ok = Ok(json!({"data": {"id": "6253282"}}));
        assert_eq!(user_lookup_result(ok, "jschauma").unwrap()["data"]["id"], "6253282");
    }
}
