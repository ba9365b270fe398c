// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary mask construction for blueprint images
//!
//! The output of [`build_wall_mask`] marks wall pixels as foreground (255)
//! and free space as background (0).

use crate::types::{DoorGapClosing, PipelineConfig, MAX_DOOR_KERNEL_LENGTH};
use image::{GrayImage, Luma};
use imageproc::morphology::{grayscale_close, Mask};

/// Apply Gaussian blur for noise reduction
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    imageproc::filter::gaussian_blur_f32(image, sigma)
}

/// Inverted adaptive threshold against the local mean
///
/// A pixel becomes foreground (255) when it is darker than the mean of its
/// `(2r+1)x(2r+1)` neighborhood by more than `offset`. Flat paper stays
/// background whatever its brightness.
pub fn adaptive_threshold(image: &GrayImage, block_radius: u32, offset: u8) -> GrayImage {
    let local_mean = imageproc::filter::box_filter(image, block_radius, block_radius);
    let mut out = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let mean = local_mean.get_pixel(x, y).0[0] as i16;
        if (pixel.0[0] as i16) < mean - offset as i16 {
            out.put_pixel(x, y, Luma([255]));
        }
    }
    out
}

/// Morphological dilation - expands white regions
pub fn dilate(image: &GrayImage, radius: u8) -> GrayImage {
    imageproc::morphology::dilate(image, imageproc::distance_transform::Norm::LInf, radius)
}

/// Morphological erosion - shrinks white regions
pub fn erode(image: &GrayImage, radius: u8) -> GrayImage {
    imageproc::morphology::erode(image, imageproc::distance_transform::Norm::LInf, radius)
}

/// Morphological closing (dilate then erode) - fills small gaps
pub fn morphological_close(image: &GrayImage, radius: u8) -> GrayImage {
    let dilated = dilate(image, radius);
    erode(&dilated, radius)
}

/// Morphological opening (erode then dilate) - removes small noise
pub fn morphological_open(image: &GrayImage, radius: u8) -> GrayImage {
    let eroded = erode(image, radius);
    dilate(&eroded, radius)
}

/// Kernel direction for line-shaped structuring elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Closing with a `length`-pixel line kernel along one axis
///
/// Bridges gaps shorter than the kernel in that direction, which is what a
/// door opening in a straight wall looks like. `length` is capped at
/// [`MAX_DOOR_KERNEL_LENGTH`].
pub fn directional_close(image: &GrayImage, length: u32, axis: Axis) -> GrayImage {
    let length = length.min(MAX_DOOR_KERNEL_LENGTH);
    if length <= 1 {
        return image.clone();
    }
    let center = ((length - 1) / 2) as u8;
    let (kernel, center_x, center_y) = match axis {
        Axis::Horizontal => (GrayImage::from_pixel(length, 1, Luma([255])), center, 0),
        Axis::Vertical => (GrayImage::from_pixel(1, length, Luma([255])), 0, center),
    };
    let mask = Mask::from_image(&kernel, center_x, center_y);
    grayscale_close(image, &mask)
}

/// Build the wall-foreground mask from a grayscale blueprint
pub fn build_wall_mask(grayscale: &GrayImage, config: &PipelineConfig) -> GrayImage {
    let blurred = gaussian_blur(grayscale, config.blur_sigma.max(0.1));

    let binary = adaptive_threshold(
        &blurred,
        config.threshold_block_radius.max(1),
        config.threshold_offset,
    );

    let closed = match config.door_gap_closing {
        DoorGapClosing::Aggressive => {
            let horizontal = directional_close(&binary, config.door_kernel_length, Axis::Horizontal);
            directional_close(&horizontal, config.door_kernel_length, Axis::Vertical)
        }
        DoorGapClosing::Off => morphological_close(&binary, 1),
    };

    // Remove specks left by text and hatching
    morphological_open(&closed, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adaptive_threshold_ignores_flat_paper() {
        for shade in [255u8, 180, 40] {
            let img = GrayImage::from_pixel(30, 30, Luma([shade]));
            let binary = adaptive_threshold(&img, 5, 2);
            assert!(binary.pixels().all(|p| p.0[0] == 0), "shade {}", shade);
        }
    }

    #[test]
    fn test_adaptive_threshold_marks_dark_strokes() {
        let mut img = GrayImage::from_pixel(30, 30, Luma([230]));
        for y in 0..30 {
            img.put_pixel(15, y, Luma([20]));
        }

        let binary = adaptive_threshold(&img, 5, 2);
        assert_eq!(binary.get_pixel(15, 15).0[0], 255);
        assert_eq!(binary.get_pixel(14, 15).0[0], 0);
        assert_eq!(binary.get_pixel(3, 15).0[0], 0);
    }

    #[test]
    fn test_directional_close_bridges_horizontal_gap() {
        // A horizontal wall with a 6 px opening
        let mut img = GrayImage::new(60, 10);
        for x in (5..25).chain(31..55) {
            img.put_pixel(x, 5, Luma([255]));
        }

        let closed = directional_close(&img, 15, Axis::Horizontal);
        for x in 5..55 {
            assert_eq!(closed.get_pixel(x, 5).0[0], 255, "gap left open at x={}", x);
        }
        // Nothing leaks into other rows
        assert_eq!(closed.get_pixel(30, 4).0[0], 0);
    }

    #[test]
    fn test_directional_close_leaves_wide_gap() {
        let mut img = GrayImage::new(80, 5);
        for x in (0..20).chain(60..80) {
            img.put_pixel(x, 2, Luma([255]));
        }

        let closed = directional_close(&img, 15, Axis::Horizontal);
        assert_eq!(closed.get_pixel(40, 2).0[0], 0);
    }

    #[test]
    fn test_directional_close_is_axis_specific() {
        let mut img = GrayImage::new(10, 60);
        for y in (5..25).chain(31..55) {
            img.put_pixel(5, y, Luma([255]));
        }

        let untouched = directional_close(&img, 15, Axis::Horizontal);
        assert_eq!(untouched.get_pixel(5, 28).0[0], 0);

        let closed = directional_close(&img, 15, Axis::Vertical);
        assert_eq!(closed.get_pixel(5, 28).0[0], 255);
    }

    #[test]
    fn test_directional_close_matches_binary_line_closing() {
        // Sparse dashes: gaps under 15 px close, the 20 px gap stays open
        let mut img = GrayImage::new(97, 3);
        for x in (0..10).chain(14..30).chain(50..60).chain(70..97) {
            img.put_pixel(x, 1, Luma([255]));
        }

        let closed = directional_close(&img, 15, Axis::Horizontal);
        assert!((10..14).all(|x| closed.get_pixel(x, 1).0[0] == 255));
        assert!((60..70).all(|x| closed.get_pixel(x, 1).0[0] == 255));
        assert!((30..50).all(|x| closed.get_pixel(x, 1).0[0] == 0));
        assert!(closed.rows().next().unwrap().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_oversized_kernel_is_capped() {
        let img = GrayImage::new(20, 20);
        let closed = directional_close(&img, MAX_DOOR_KERNEL_LENGTH + 100, Axis::Vertical);
        assert_eq!(closed.dimensions(), (20, 20));
    }

    #[test]
    fn test_wall_mask_marks_ink_as_foreground() {
        let mut img = GrayImage::from_pixel(100, 100, Luma([255]));
        for x in 10..90 {
            for y in 48..53 {
                img.put_pixel(x, y, Luma([0]));
            }
        }

        let config = PipelineConfig {
            door_gap_closing: DoorGapClosing::Off,
            ..Default::default()
        };
        let mask = build_wall_mask(&img, &config);

        assert_eq!(mask.get_pixel(50, 50).0[0], 255);
        assert_eq!(mask.get_pixel(50, 10).0[0], 0);
    }
}
