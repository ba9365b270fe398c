// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room detection on the blocking thread pool.

use crate::error::ApiError;
use blueprint_vision::{detect_rooms_in_image, DetectionOutput, PipelineConfig, TextRecognizer};
use bytes::Bytes;
use std::sync::Arc;

/// Decode `image_bytes` and run the detection pipeline.
///
/// Decoding and detection are CPU bound and run via `spawn_blocking`.
pub async fn run_detection(
    image_bytes: Bytes,
    config: PipelineConfig,
    recognizer: Option<Arc<dyn TextRecognizer>>,
) -> Result<DetectionOutput, ApiError> {
    tokio::task::spawn_blocking(move || {
        let image = image::load_from_memory(&image_bytes)
            .map_err(|e| ApiError::Download(format!("cannot decode image: {}", e)))?;
        let grayscale = image.to_luma8();
        detect_rooms_in_image(&grayscale, &config, recognizer.as_deref()).map_err(ApiError::from)
    })
    .await?
}
