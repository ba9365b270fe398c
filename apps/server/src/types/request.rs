// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use blueprint_vision::{AssociationStrategy, DoorGapClosing, OverlapStrategy, PipelineConfig};
use serde::Deserialize;

/// Body of `POST /detect-rooms`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectRoomsRequest {
    /// Where to fetch the blueprint image from.
    #[serde(rename = "blueprintUrl", default)]
    pub blueprint_url: Option<String>,

    /// Per-request pipeline overrides.
    #[serde(default)]
    pub options: DetectionOptions,
}

impl DetectRoomsRequest {
    /// The blueprint URL, if present and not blank.
    pub fn url(&self) -> Option<&str> {
        self.blueprint_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Options a request may override. Unset fields keep the server defaults and
/// unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectionOptions {
    #[serde(default)]
    pub min_area: Option<f64>,
    #[serde(default)]
    pub max_area: Option<f64>,
    #[serde(default)]
    pub max_rooms: Option<usize>,
    #[serde(default)]
    pub min_confidence: Option<f64>,
    #[serde(default)]
    pub merge_threshold: Option<f64>,
    #[serde(default)]
    pub door_gap_closing: Option<DoorGapClosing>,
    #[serde(default)]
    pub ocr_enabled: Option<bool>,
    #[serde(default)]
    pub overlap_strategy: Option<OverlapStrategy>,
    #[serde(default)]
    pub association_strategy: Option<AssociationStrategy>,
}

impl DetectionOptions {
    /// Overlay these options onto `base`.
    pub fn apply(&self, base: PipelineConfig) -> PipelineConfig {
        PipelineConfig {
            min_area: self.min_area.unwrap_or(base.min_area),
            max_area: self.max_area.or(base.max_area),
            max_rooms: self.max_rooms.unwrap_or(base.max_rooms),
            min_confidence: self.min_confidence.unwrap_or(base.min_confidence),
            merge_threshold: self.merge_threshold.unwrap_or(base.merge_threshold),
            door_gap_closing: self.door_gap_closing.unwrap_or(base.door_gap_closing),
            ocr_enabled: self.ocr_enabled.unwrap_or(base.ocr_enabled),
            overlap_strategy: self.overlap_strategy.unwrap_or(base.overlap_strategy),
            association_strategy: self
                .association_strategy
                .unwrap_or(base.association_strategy),
            ..base
        }
    }
}
