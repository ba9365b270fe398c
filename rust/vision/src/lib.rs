// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room detection for rasterized architectural blueprints
//!
//! This crate turns a blueprint image into labeled, axis-aligned room boxes:
//! 1. Build a wall-foreground mask (threshold, door-gap closing, despeckle)
//! 2. Extract horizontal and vertical wall lines (Hough transform)
//! 3. Bridge small gaps between collinear wall lines
//! 4. Segment closed regions into room and hallway candidates
//! 5. Deduplicate and rank candidates
//! 6. Attach OCR text to rooms and assign ids and display names
//!
//! All boxes live in a 0-1000 frame per axis, independent of image size.
//!
//! # Usage
//!
//! ```rust,ignore
//! use blueprint_vision::{default_recognizer, detect_rooms_in_image, PipelineConfig, DEFAULT_OCR_TIMEOUT};
//!
//! let grayscale = image::open("plan.png")?.to_luma8();
//! let ocr = default_recognizer("tesseract", "eng", DEFAULT_OCR_TIMEOUT);
//! let output = detect_rooms_in_image(&grayscale, &PipelineConfig::default(), Some(ocr.as_ref()))?;
//! for room in &output.rooms {
//!     println!("{} {:?}", room.name_hint, room.bounding_box);
//! }
//! ```

pub mod association;
pub mod contours;
pub mod error;
pub mod formatter;
pub mod image_ops;
pub mod line_extension;
pub mod line_ops;
pub mod ocr;
pub mod ranking;
pub mod room_detector;
pub mod types;

// Re-export commonly used types and functions
pub use association::associate_text;
pub use error::{Result, VisionError};
pub use formatter::format_rooms;
pub use image_ops::build_wall_mask;
pub use line_extension::extend_wall_lines;
pub use line_ops::{extract_wall_lines, WallLines};
pub use ocr::{
    default_recognizer, extract_text_regions, TesseractCli, TextRecognizer, DEFAULT_OCR_TIMEOUT,
};
pub use ranking::{rank_rooms, RankingParams};
pub use room_detector::detect_rooms;
pub use types::{
    AssociationStrategy, BoundingBox, DetectionOutput, DetectionStats, DoorGapClosing,
    OverlapStrategy, PipelineConfig, Room, RoomCandidate, TextRegion, WallLine,
};

#[cfg(feature = "tesseract")]
pub use ocr::LeptessRecognizer;

use image::GrayImage;
use std::time::Instant;

/// Geometric part of the pipeline: mask to ranked room candidates
///
/// Returns the ranked candidates and fills in the line, bridge and candidate
/// counts of `stats`.
pub fn rank_room_candidates(
    mask: &GrayImage,
    config: &PipelineConfig,
    stats: &mut DetectionStats,
) -> Vec<RoomCandidate> {
    let lines = extract_wall_lines(mask, config);
    let extended = extend_wall_lines(
        mask,
        &lines.horizontal,
        &lines.vertical,
        config.max_gap,
        config.max_extension,
    );
    let candidates = detect_rooms(&extended.mask, config.min_area, config.max_area);

    stats.horizontal_lines = lines.horizontal.len();
    stats.vertical_lines = lines.vertical.len();
    stats.bridges_drawn = extended.bridges.len();
    stats.candidates = candidates.len();

    rank_rooms(candidates, &RankingParams::from(config))
}

/// Detect and label rooms in a grayscale blueprint
///
/// OCR runs only when `config.ocr_enabled` is set and a recognizer is given.
/// OCR failures are logged and the rooms keep generic names.
pub fn detect_rooms_in_image(
    grayscale: &GrayImage,
    config: &PipelineConfig,
    recognizer: Option<&dyn TextRecognizer>,
) -> Result<DetectionOutput> {
    let started = Instant::now();
    let (width, height) = grayscale.dimensions();
    if width == 0 || height == 0 {
        return Err(VisionError::InvalidImage(format!(
            "image dimensions must be non-zero (got {}x{})",
            width, height
        )));
    }
    config.validate()?;

    let mut stats = DetectionStats {
        image_width: width,
        image_height: height,
        ..Default::default()
    };

    tracing::info!(width, height, door_gap_closing = ?config.door_gap_closing, "Preprocessing blueprint");
    let mask = build_wall_mask(grayscale, config);
    let ranked = rank_room_candidates(&mask, config, &mut stats);

    let texts = match recognizer.filter(|_| config.ocr_enabled) {
        Some(ocr) => match extract_text_regions(ocr, grayscale) {
            Ok(texts) => texts,
            Err(e) => {
                tracing::warn!(error = %e, "OCR failed, falling back to generic room names");
                Vec::new()
            }
        },
        None => Vec::new(),
    };
    stats.text_regions = texts.len();

    let matches = associate_text(&ranked, &texts, config.association_strategy);
    let rooms = format_rooms(&ranked, &matches);

    stats.total_time_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        rooms = rooms.len(),
        named = rooms.iter().filter(|r| r.detected_name.is_some()).count(),
        time_ms = stats.total_time_ms,
        "Detection complete"
    );

    Ok(DetectionOutput { rooms, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawTextBox;
    use image::Luma;

    /// 600x600 plan: a 400x400 building split into four rooms by two walls
    fn four_room_plan() -> GrayImage {
        let mut img = GrayImage::from_pixel(600, 600, Luma([255]));
        let mut wall = |x0: u32, y0: u32, x1: u32, y1: u32| {
            for y in y0..y1 {
                for x in x0..x1 {
                    img.put_pixel(x, y, Luma([0]));
                }
            }
        };
        wall(100, 100, 504, 104);
        wall(100, 500, 504, 504);
        wall(100, 100, 104, 504);
        wall(500, 100, 504, 504);
        wall(100, 300, 504, 304);
        wall(300, 100, 304, 504);
        img
    }

    struct FixedRecognizer(Vec<RawTextBox>);

    impl TextRecognizer for FixedRecognizer {
        fn recognize(&self, _image: &GrayImage) -> Result<Vec<RawTextBox>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenRecognizer;

    impl TextRecognizer for BrokenRecognizer {
        fn recognize(&self, _image: &GrayImage) -> Result<Vec<RawTextBox>> {
            Err(VisionError::Ocr("engine unavailable".to_string()))
        }
    }

    fn kitchen_label(confidence: f32) -> FixedRecognizer {
        FixedRecognizer(vec![RawTextBox {
            text: "Kitchen".to_string(),
            left: 160,
            top: 190,
            width: 60,
            height: 20,
            confidence,
        }])
    }

    #[test]
    fn test_four_rooms_detected() {
        let output = detect_rooms_in_image(&four_room_plan(), &PipelineConfig::default(), None).unwrap();

        assert_eq!(output.rooms.len(), 4);
        for room in &output.rooms {
            assert!(!room.is_hallway);
            assert!(room.confidence >= 0.8 && room.confidence <= 1.0);
            let b = room.bounding_box;
            assert!(0 <= b.x_min && b.x_min < b.x_max && b.x_max <= 1000);
            assert!(0 <= b.y_min && b.y_min < b.y_max && b.y_max <= 1000);
        }
        assert_eq!(output.stats.image_width, 600);
        assert_eq!(output.stats.text_regions, 0);
    }

    #[test]
    fn test_confident_label_names_room() {
        let ocr = kitchen_label(85.0);
        let output =
            detect_rooms_in_image(&four_room_plan(), &PipelineConfig::default(), Some(&ocr)).unwrap();

        let named: Vec<&Room> = output
            .rooms
            .iter()
            .filter(|r| r.detected_name.is_some())
            .collect();
        assert_eq!(named.len(), 1);
        let kitchen = named[0];
        assert_eq!(kitchen.name_hint, "Kitchen");
        assert!(kitchen.id.contains("kitchen"));
        assert_eq!(kitchen.text_confidence, Some(85));
        // The label sits in the top-left room
        assert!(kitchen.bounding_box.x_max <= 510);
        assert!(kitchen.bounding_box.y_max <= 510);
    }

    #[test]
    fn test_weak_label_keeps_generic_name() {
        let ocr = kitchen_label(45.0);
        let output =
            detect_rooms_in_image(&four_room_plan(), &PipelineConfig::default(), Some(&ocr)).unwrap();

        let labelled = output
            .rooms
            .iter()
            .find(|r| r.detected_name.as_deref() == Some("Kitchen"))
            .unwrap();
        assert!(labelled.name_hint.starts_with("Room "));
        assert!(labelled.id.starts_with("room_"));
    }

    #[test]
    fn test_ocr_disabled_skips_recognizer() {
        let ocr = kitchen_label(85.0);
        let config = PipelineConfig {
            ocr_enabled: false,
            ..Default::default()
        };
        let output = detect_rooms_in_image(&four_room_plan(), &config, Some(&ocr)).unwrap();
        assert!(output.rooms.iter().all(|r| r.detected_name.is_none()));
    }

    #[test]
    fn test_ocr_failure_is_recovered() {
        let output = detect_rooms_in_image(
            &four_room_plan(),
            &PipelineConfig::default(),
            Some(&BrokenRecognizer),
        )
        .unwrap();
        assert_eq!(output.rooms.len(), 4);
        assert!(output.rooms.iter().all(|r| r.name_hint.starts_with("Room ")));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let result = detect_rooms_in_image(&GrayImage::new(0, 0), &PipelineConfig::default(), None);
        assert!(matches!(result, Err(VisionError::InvalidImage(_))));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = PipelineConfig {
            min_confidence: -0.1,
            ..Default::default()
        };
        let result = detect_rooms_in_image(&four_room_plan(), &config, None);
        assert!(matches!(result, Err(VisionError::InvalidConfig(_))));
    }

    #[test]
    fn test_blank_page_has_no_rooms() {
        let img = GrayImage::from_pixel(300, 300, Luma([255]));
        let output = detect_rooms_in_image(&img, &PipelineConfig::default(), None).unwrap();
        assert!(output.rooms.is_empty());
    }
}
