//! Media upload for Twitter API.
//!
//! Images and GIFs are sent in a single multipart request to the v2 upload
//! endpoint; the returned media id is then attached to the new tweet.

use std::path::Path;

use log::{debug, info};
use reqwest::{multipart, Method};

use super::api::{data_str, read_json, TwitterClient};
use crate::error::ApiError;

/// MIME type and media category for a file, inferred from its extension.
pub fn media_type(path: &Path) -> Option<(&'static str, &'static str)> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some(("image/png", "tweet_image")),
        "jpg" | "jpeg" => Some(("image/jpeg", "tweet_image")),
        "webp" => Some(("image/webp", "tweet_image")),
        "gif" => Some(("image/gif", "tweet_gif")),
        _ => None,
    }
}

/// Uploads an image in a single multipart request and returns its media id.
pub(crate) async fn upload(client: &TwitterClient, path: &Path) -> Result<String, ApiError> {
    let (mime, category) =
        media_type(path).ok_or_else(|| ApiError::UnsupportedMedia(path.to_path_buf()))?;

    let bytes = std::fs::read(path)?;
    info!("Uploading {} ({} bytes, {})", path.display(), bytes.len(), mime);

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "media".to_string());
    let part = multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime)?;
    let form = multipart::Form::new()
        .text("media_category", category)
        .text("media_type", mime)
        .part("media", part);

    let url = client.upload_url();
    let auth_header = client.authorization(&Method::POST, url);
    let response = client
        .http()
        .post(url)
        .header(reqwest::header::AUTHORIZATION, auth_header)
        .multipart(form)
        .send()
        .await?;

    let json = read_json(response, "upload_media").await?;
    let id = data_str(&json, "id")?;
    debug!("Media id: {}", id);
    Ok(id)
}
