// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall line extraction: probabilistic Hough transform and axis classification

use crate::image_ops::dilate;
use crate::types::{LineSegment, Orientation, PipelineConfig, WallLine};
use image::GrayImage;
use std::f64::consts::PI;

/// Upper bound on accumulator peaks turned into segments
const MAX_PEAKS: usize = 500;

/// Distance (in rho units) for an edge point to count as lying on a peak line
const PEAK_BAND: f64 = 2.0;

/// Wall lines split by orientation
#[derive(Debug, Clone, Default)]
pub struct WallLines {
    pub horizontal: Vec<WallLine>,
    pub vertical: Vec<WallLine>,
}

impl WallLines {
    pub fn len(&self) -> usize {
        self.horizontal.len() + self.vertical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty() && self.vertical.is_empty()
    }
}

/// Detect line segments using a probabilistic Hough transform
///
/// Foreground pixels (> 128) vote in a 1 px / 1° accumulator. Peaks are visited
/// in vote order; the points on each peak line are split into runs wherever
/// consecutive points are further apart than `max_line_gap`, and runs at least
/// `min_line_length` long become segments. Segment endpoints are the run ends
/// projected onto the peak line. Points consumed by a segment no longer
/// contribute to later peaks.
pub fn detect_line_segments(
    mask: &GrayImage,
    threshold: u32,
    min_line_length: f64,
    max_line_gap: f64,
) -> Vec<LineSegment> {
    let width = mask.width() as i64;
    let height = mask.height() as i64;

    let num_thetas = 180usize;
    let cos_table: Vec<f64> = (0..num_thetas)
        .map(|i| (i as f64 * PI / num_thetas as f64).cos())
        .collect();
    let sin_table: Vec<f64> = (0..num_thetas)
        .map(|i| (i as f64 * PI / num_thetas as f64).sin())
        .collect();

    let max_rho = ((width * width + height * height) as f64).sqrt();
    let num_rhos = (2.0 * max_rho) as usize + 1;

    let points: Vec<(i64, i64)> = mask
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] > 128)
        .map(|(x, y, _)| (x as i64, y as i64))
        .collect();

    let mut accumulator = vec![0u32; num_thetas * num_rhos];
    for &(x, y) in &points {
        for t in 0..num_thetas {
            let rho = x as f64 * cos_table[t] + y as f64 * sin_table[t];
            let r = (rho + max_rho) as usize;
            if r < num_rhos {
                accumulator[t * num_rhos + r] += 1;
            }
        }
    }

    let mut peaks: Vec<(usize, usize, u32)> = accumulator
        .iter()
        .enumerate()
        .filter(|(_, &votes)| votes >= threshold)
        .map(|(i, &votes)| (i / num_rhos, i % num_rhos, votes))
        .collect();
    peaks.sort_by(|a, b| b.2.cmp(&a.2));

    let mut used = vec![false; points.len()];
    let mut segments = Vec::new();

    for &(t, r, _) in peaks.iter().take(MAX_PEAKS) {
        // Bin center
        let rho = r as f64 + 0.5 - max_rho;
        let (cos_t, sin_t) = (cos_table[t], sin_table[t]);
        let project = |x: i64, y: i64| -> (f64, f64) {
            let d = x as f64 * cos_t + y as f64 * sin_t - rho;
            (x as f64 - d * cos_t, y as f64 - d * sin_t)
        };

        let mut on_line: Vec<(i64, i64, usize)> = points
            .iter()
            .enumerate()
            .filter(|(i, &(x, y))| {
                !used[*i] && (x as f64 * cos_t + y as f64 * sin_t - rho).abs() < PEAK_BAND
            })
            .map(|(i, &(x, y))| (x, y, i))
            .collect();

        if on_line.len() < 2 {
            continue;
        }

        // Order along the line direction (-sin, cos)
        on_line.sort_by(|a, b| {
            let pa = -(a.0 as f64) * sin_t + a.1 as f64 * cos_t;
            let pb = -(b.0 as f64) * sin_t + b.1 as f64 * cos_t;
            pa.total_cmp(&pb)
        });

        let mut run_start = 0;
        for i in 1..=on_line.len() {
            let breaks = i == on_line.len() || {
                let dx = (on_line[i].0 - on_line[i - 1].0) as f64;
                let dy = (on_line[i].1 - on_line[i - 1].1) as f64;
                (dx * dx + dy * dy).sqrt() > max_line_gap
            };
            if !breaks {
                continue;
            }

            if i - run_start >= 2 {
                let (x1, y1) = project(on_line[run_start].0, on_line[run_start].1);
                let (x2, y2) = project(on_line[i - 1].0, on_line[i - 1].1);
                let segment = LineSegment::new(x1, y1, x2, y2);
                if segment.length() >= min_line_length {
                    segments.push(segment);
                    for &(_, _, idx) in &on_line[run_start..i] {
                        used[idx] = true;
                    }
                }
            }
            run_start = i;
        }
    }

    segments
}

/// Split raw segments into horizontal and vertical wall lines, dropping diagonals
pub fn classify_segments(segments: &[LineSegment]) -> WallLines {
    let mut lines = WallLines::default();
    for wall in segments.iter().copied().filter_map(WallLine::classify) {
        match wall.orientation {
            Orientation::Horizontal => lines.horizontal.push(wall),
            Orientation::Vertical => lines.vertical.push(wall),
        }
    }
    lines
}

/// Extract classified wall lines from a wall mask
///
/// The mask is dilated by one pixel first so hairline breaks do not split a wall.
pub fn extract_wall_lines(mask: &GrayImage, config: &PipelineConfig) -> WallLines {
    let dilated = dilate(mask, 1);
    let segments = detect_line_segments(
        &dilated,
        config.hough_threshold,
        config.min_line_length,
        config.max_line_gap,
    );
    let lines = classify_segments(&segments);

    tracing::info!(
        horizontal = lines.horizontal.len(),
        vertical = lines.vertical.len(),
        discarded = segments.len() - lines.len(),
        "Detected wall lines"
    );

    lines
}
