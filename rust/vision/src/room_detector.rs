// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room detection via contour segmentation
//!
//! Every traced border of the wall mask is a potential room. Borders are
//! filtered by area, container borders (the building outline and other
//! regions that merely enclose rooms) are rejected through the contour
//! hierarchy, and the survivors are classified as room or hallway.

use crate::contours::ContourTree;
use crate::types::{BoundingBox, RoomCandidate};
use image::GrayImage;

/// Aspect ratio above which a large region is a hallway
pub const HALLWAY_ASPECT_RATIO: f64 = 3.0;

/// Aspect ratio above which a non-hallway region is a wall fragment
pub const MAX_ROOM_ASPECT_RATIO: f64 = 15.0;

/// Share of the image above which a region is implausibly large
pub const LARGE_REGION_FRACTION: f64 = 0.25;

/// Confidence assigned to implausibly large regions
pub const LARGE_REGION_CONFIDENCE: f64 = 0.4;

/// Area thresholds for segmentation, in square pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentationParams {
    pub min_area: f64,
    pub max_area: f64,
    pub image_area: f64,
}

impl SegmentationParams {
    /// `max_area` defaults to half the image
    pub fn for_image(width: u32, height: u32, min_area: f64, max_area: Option<f64>) -> Self {
        let image_area = width as f64 * height as f64;
        Self {
            min_area,
            max_area: max_area.unwrap_or(image_area / 2.0),
            image_area,
        }
    }
}

/// Decide whether a contour with children is a container rather than a room
///
/// A container either holds at least three children that together cover more
/// than 40% of it while being well above the minimum room size, or is simply
/// larger than a quarter of the image.
pub fn is_container(
    area: f64,
    child_count: usize,
    child_area: f64,
    params: &SegmentationParams,
) -> bool {
    if child_count == 0 {
        return false;
    }
    let dense_children =
        child_count >= 3 && area > 5.0 * params.min_area && child_area / area > 0.4;
    dense_children || area > LARGE_REGION_FRACTION * params.image_area
}

/// Confidence from the share of the image a region covers
///
/// Monotonic in area for plausible rooms; regions over a quarter of the image
/// are penalized instead of trusted.
pub fn area_confidence(area: f64, image_area: f64) -> f64 {
    if image_area <= 0.0 {
        return 0.0;
    }
    let normalized = area / image_area;
    if normalized > LARGE_REGION_FRACTION {
        LARGE_REGION_CONFIDENCE
    } else {
        (normalized * 50.0).clamp(0.5, 0.95)
    }
}

/// Room/hallway decision for a region that passed the area and container checks.
/// Returns `None` for wall fragments.
pub fn classify_region(aspect_ratio: f64, area: f64, min_area: f64) -> Option<bool> {
    if aspect_ratio > HALLWAY_ASPECT_RATIO && area > 2.0 * min_area {
        Some(true)
    } else if aspect_ratio > MAX_ROOM_ASPECT_RATIO {
        None
    } else {
        Some(false)
    }
}

/// Turn every acceptable contour in `tree` into a room candidate
pub fn segment_contours(
    tree: &ContourTree,
    image_width: u32,
    image_height: u32,
    params: &SegmentationParams,
) -> Vec<RoomCandidate> {
    let mut candidates = Vec::new();

    for (index, node) in tree.nodes.iter().enumerate() {
        let area = node.area();
        if area < params.min_area || area > params.max_area {
            continue;
        }

        let (child_count, child_area) = tree
            .children(index)
            .fold((0usize, 0.0), |(count, total), child| {
                (count + 1, total + tree.nodes[child].area())
            });
        if is_container(area, child_count, child_area, params) {
            tracing::debug!(index, area, child_count, child_area, "Rejected container contour");
            continue;
        }

        let Some((x, y, w, h)) = node.bounding_rect() else {
            continue;
        };
        let aspect_ratio = w.max(h) as f64 / w.min(h) as f64;

        let Some(is_hallway) = classify_region(aspect_ratio, area, params.min_area) else {
            continue;
        };

        let bounding_box = BoundingBox::from_pixel_rect(x, y, w, h, image_width, image_height);
        if bounding_box.is_empty() {
            continue;
        }

        candidates.push(RoomCandidate {
            bounding_box,
            area,
            confidence: area_confidence(area, params.image_area),
            is_hallway,
            aspect_ratio,
        });
    }

    candidates
}

/// Detect room candidates in a wall-foreground mask
pub fn detect_rooms(mask: &GrayImage, min_area: f64, max_area: Option<f64>) -> Vec<RoomCandidate> {
    let (width, height) = mask.dimensions();
    let params = SegmentationParams::for_image(width, height, min_area, max_area);
    let tree = ContourTree::from_mask(mask);
    let candidates = segment_contours(&tree, width, height, &params);

    tracing::info!(
        contours = tree.len(),
        candidates = candidates.len(),
        hallways = candidates.iter().filter(|c| c.is_hallway).count(),
        "Found room candidates from contours"
    );

    candidates
}
