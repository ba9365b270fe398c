// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for blueprint room segmentation

use crate::error::{Result, VisionError};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Side length of the normalized coordinate frame (per axis)
pub const NORMALIZED_SCALE: f64 = 1000.0;

/// A 2D point
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_nalgebra(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        nalgebra::distance(&self.to_nalgebra(), &other.to_nalgebra())
    }
}

/// Raw line segment as returned by the line detector, before classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LineSegment {
    pub start: Point2D,
    pub end: Point2D,
}

impl LineSegment {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            start: Point2D::new(x1, y1),
            end: Point2D::new(x2, y2),
        }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    /// Absolute angle against the x-axis, in degrees (0..=180)
    pub fn angle_degrees(&self) -> f64 {
        (self.end.y - self.start.y)
            .atan2(self.end.x - self.start.x)
            .to_degrees()
            .abs()
    }
}

/// Wall direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Axis-aligned wall segment in source-pixel coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WallLine {
    pub segment: LineSegment,
    pub orientation: Orientation,
}

impl WallLine {
    /// Classify a raw segment by its angle.
    ///
    /// Under 10° or over 170° is horizontal, strictly between 80° and 100° is
    /// vertical; anything else is not a wall line.
    pub fn classify(segment: LineSegment) -> Option<Self> {
        let angle = segment.angle_degrees();
        let orientation = if angle < 10.0 || angle > 170.0 {
            Orientation::Horizontal
        } else if angle > 80.0 && angle < 100.0 {
            Orientation::Vertical
        } else {
            return None;
        };
        Some(Self {
            segment,
            orientation,
        })
    }

    /// Mean off-axis coordinate (y for horizontal lines, x for vertical ones)
    pub fn midline(&self) -> f64 {
        let LineSegment { start, end } = self.segment;
        match self.orientation {
            Orientation::Horizontal => (start.y + end.y) / 2.0,
            Orientation::Vertical => (start.x + end.x) / 2.0,
        }
    }

    /// Extent along the line's own axis as `(leading, trailing)`
    pub fn span(&self) -> (f64, f64) {
        let LineSegment { start, end } = self.segment;
        let (a, b) = match self.orientation {
            Orientation::Horizontal => (start.x, end.x),
            Orientation::Vertical => (start.y, end.y),
        };
        (a.min(b), a.max(b))
    }
}

/// Axis-aligned box in the normalized 0-1000 frame.
///
/// Serialized as `[x_min, y_min, x_max, y_max]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl From<[i32; 4]> for BoundingBox {
    fn from(v: [i32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x_min, b.y_min, b.x_max, b.y_max]
    }
}

impl BoundingBox {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Rescale a pixel rectangle to the normalized frame, each axis on its own.
    ///
    /// Coordinates are truncated toward zero and clamped to `0..=1000`.
    pub fn from_pixel_rect(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        let scale = |v: u32, extent: u32| -> i32 {
            if extent == 0 {
                return 0;
            }
            ((v as f64 / extent as f64) * NORMALIZED_SCALE).clamp(0.0, NORMALIZED_SCALE) as i32
        };
        Self {
            x_min: scale(x, image_width),
            y_min: scale(y, image_height),
            x_max: scale(x.saturating_add(width), image_width),
            y_max: scale(y.saturating_add(height), image_height),
        }
    }

    pub fn width(&self) -> i32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> i32 {
        self.y_max - self.y_min
    }

    /// Zero for degenerate or inverted boxes
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            return 0;
        }
        self.width() as i64 * self.height() as i64
    }

    pub fn is_empty(&self) -> bool {
        self.x_min >= self.x_max || self.y_min >= self.y_max
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.x_min + self.x_max) as f64 / 2.0,
            (self.y_min + self.y_max) as f64 / 2.0,
        )
    }

    pub fn intersection_area(&self, other: &BoundingBox) -> i64 {
        let x1 = self.x_min.max(other.x_min);
        let y1 = self.y_min.max(other.y_min);
        let x2 = self.x_max.min(other.x_max);
        let y2 = self.y_max.min(other.y_max);
        if x1 < x2 && y1 < y2 {
            (x2 - x1) as i64 * (y2 - y1) as i64
        } else {
            0
        }
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.x_min.min(other.x_min),
            self.y_min.min(other.y_min),
            self.x_max.max(other.x_max),
            self.y_max.max(other.y_max),
        )
    }

    /// Grow the box by `margin` on every side (not clamped)
    pub fn expanded(&self, margin: i32) -> BoundingBox {
        BoundingBox::new(
            self.x_min - margin,
            self.y_min - margin,
            self.x_max + margin,
            self.y_max + margin,
        )
    }

    /// Inclusive containment test
    pub fn contains(&self, point: &Point2D) -> bool {
        point.x >= self.x_min as f64
            && point.x <= self.x_max as f64
            && point.y >= self.y_min as f64
            && point.y <= self.y_max as f64
    }

    /// Long side over short side; `None` for degenerate boxes
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let (w, h) = (self.width() as f64, self.height() as f64);
        Some(w.max(h) / w.min(h))
    }
}

/// Region produced by the contour segmenter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomCandidate {
    pub bounding_box: BoundingBox,
    /// Pixel area of the source contour (not derived from the box)
    pub area: f64,
    /// Detection confidence (0.0 - 1.0)
    pub confidence: f64,
    pub is_hallway: bool,
    /// Long side over short side of the pixel bounding rectangle (>= 1)
    pub aspect_ratio: f64,
}

/// Text box as reported by an OCR engine, in source-pixel coordinates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawTextBox {
    pub text: String,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    /// Engine confidence (0 - 100)
    pub confidence: f32,
}

/// OCR text normalized into the 0-1000 frame
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextRegion {
    pub text: String,
    pub bounding_box: BoundingBox,
    /// OCR confidence on the engine's 0-100 scale
    pub confidence: i32,
    pub center: Point2D,
}

impl TextRegion {
    pub fn new(text: String, bounding_box: BoundingBox, confidence: i32) -> Self {
        Self {
            text,
            center: bounding_box.center(),
            bounding_box,
            confidence,
        }
    }
}

/// Final labeled room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: String,
    pub bounding_box: BoundingBox,
    pub name_hint: String,
    pub confidence: f64,
    pub area: f64,
    pub is_hallway: bool,
    pub aspect_ratio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_confidence: Option<i32>,
}

/// How aggressively the mask builder bridges door openings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DoorGapClosing {
    /// Directional closing with long line kernels
    #[default]
    Aggressive,
    /// Light isotropic closing only
    Off,
}

/// Policy for overlapping candidates in the ranker
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverlapStrategy {
    /// Drop any candidate overlapping an accepted one by more than 5%
    #[default]
    Reject,
    /// Fold candidates in the merge band into the accepted room
    Merge,
}

/// Policy for attaching text regions to rooms
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssociationStrategy {
    /// Nearest available region per room, in room order
    #[default]
    Greedy,
    /// Minimum total distance assignment
    Optimal,
}

/// Longest door-closing kernel an imageproc structuring element can hold
pub const MAX_DOOR_KERNEL_LENGTH: u32 = 511;

/// Configuration for the room detection pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub door_gap_closing: DoorGapClosing,
    pub ocr_enabled: bool,
    /// Minimum contour area (square pixels)
    pub min_area: f64,
    /// Maximum contour area (square pixels); half the image when unset
    pub max_area: Option<f64>,
    pub max_rooms: usize,
    pub min_confidence: f64,
    /// Lower edge of the merge band (fraction of the smaller box)
    pub merge_threshold: f64,
    pub overlap_strategy: OverlapStrategy,
    pub association_strategy: AssociationStrategy,
    /// Gaussian blur sigma applied before thresholding
    pub blur_sigma: f32,
    /// Adaptive threshold block radius
    pub threshold_block_radius: u32,
    /// How much darker than its neighborhood a pixel must be to count as ink
    pub threshold_offset: u8,
    /// Kernel length for directional door closing (pixels)
    pub door_kernel_length: u32,
    /// Hough line detection vote threshold
    pub hough_threshold: u32,
    /// Minimum detected line length (pixels)
    pub min_line_length: f64,
    /// Maximum gap bridged inside one detected line (pixels)
    pub max_line_gap: f64,
    /// Largest wall gap the line extension closes (pixels)
    pub max_gap: f64,
    /// Longest bridge segment the line extension draws (pixels)
    pub max_extension: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            door_gap_closing: DoorGapClosing::Aggressive,
            ocr_enabled: true,
            min_area: 1000.0,
            max_area: None,
            max_rooms: 20,
            min_confidence: 0.8,
            merge_threshold: 0.4,
            overlap_strategy: OverlapStrategy::Reject,
            association_strategy: AssociationStrategy::Greedy,
            blur_sigma: 1.0,
            threshold_block_radius: 5,
            threshold_offset: 2,
            door_kernel_length: 15,
            hough_threshold: 100,
            min_line_length: 50.0,
            max_line_gap: 10.0,
            max_gap: 50.0,
            max_extension: 80.0,
        }
    }
}

impl PipelineConfig {
    /// Reject settings no pipeline run can honor
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(VisionError::InvalidConfig(msg));

        if !self.min_area.is_finite() || self.min_area < 0.0 {
            return invalid(format!("min_area must be non-negative, got {}", self.min_area));
        }
        if let Some(max_area) = self.max_area {
            if !(max_area >= self.min_area) {
                return invalid(format!(
                    "max_area ({}) must not be below min_area ({})",
                    max_area, self.min_area
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return invalid(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            ));
        }
        if !(0.0..=1.0).contains(&self.merge_threshold) {
            return invalid(format!(
                "merge_threshold must be within [0, 1], got {}",
                self.merge_threshold
            ));
        }
        if self.max_gap < 0.0 || self.max_extension < 0.0 {
            return invalid("max_gap and max_extension must be non-negative".to_string());
        }
        if self.door_kernel_length > MAX_DOOR_KERNEL_LENGTH {
            return invalid(format!(
                "door_kernel_length must be at most {}, got {}",
                MAX_DOOR_KERNEL_LENGTH, self.door_kernel_length
            ));
        }
        Ok(())
    }
}

/// Per-request processing statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DetectionStats {
    pub image_width: u32,
    pub image_height: u32,
    pub horizontal_lines: usize,
    pub vertical_lines: usize,
    pub bridges_drawn: usize,
    pub candidates: usize,
    pub text_regions: usize,
    pub total_time_ms: u64,
}

/// Output of the full pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionOutput {
    pub rooms: Vec<Room>,
    pub stats: DetectionStats,
}
