// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Blueprint image download.

use crate::error::ApiError;
use bytes::{Bytes, BytesMut};
use std::time::Duration;

/// Fetch the raw bytes behind `url`.
///
/// Non-2xx statuses, timeouts and bodies over `max_bytes` are download errors.
/// Decoding happens later on the blocking pool.
pub async fn download_image(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
    max_bytes: usize,
) -> Result<Bytes, ApiError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| ApiError::Download(format!("invalid URL '{}': {}", url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::Download(format!(
            "unsupported URL scheme '{}'",
            parsed.scheme()
        )));
    }

    let mut response = client
        .get(parsed)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?;

    if let Some(length) = response.content_length() {
        if length as usize > max_bytes {
            return Err(too_large(max_bytes));
        }
    }

    let mut body = BytesMut::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > max_bytes {
            return Err(too_large(max_bytes));
        }
        body.extend_from_slice(&chunk);
    }

    if body.is_empty() {
        return Err(ApiError::Download("empty response body".into()));
    }

    tracing::debug!(url, bytes = body.len(), "Downloaded blueprint");
    Ok(body.freeze())
}

fn too_large(max_bytes: usize) -> ApiError {
    ApiError::Download(format!(
        "image exceeds the {} MB limit",
        max_bytes / (1024 * 1024)
    ))
}
