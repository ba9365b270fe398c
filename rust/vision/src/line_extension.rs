// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gap bridging between collinear wall lines
//!
//! Open doorways leave a gap between two wall segments that lie on the same
//! line. Contour tracing only finds closed regions, so these gaps are bridged
//! with short segments before segmentation.

use crate::types::{Orientation, Point2D, WallLine};
use image::{GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// Two lines are aligned when their midlines differ by less than this (pixels)
pub const ALIGNMENT_TOLERANCE: f64 = 15.0;

/// Thickness of a drawn bridge (pixels)
pub const BRIDGE_THICKNESS: u32 = 2;

/// A bridge drawn between two aligned wall lines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bridge {
    pub start: Point2D,
    pub end: Point2D,
    pub orientation: Orientation,
}

impl Bridge {
    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }
}

/// Mask with gaps closed plus the bridges that closed them
#[derive(Debug, Clone)]
pub struct ExtendedMask {
    pub mask: GrayImage,
    pub bridges: Vec<Bridge>,
}

/// Find the bridge between two lines of the same orientation, if any
///
/// The bridge starts at the trailing end of whichever line comes first along
/// the axis, runs toward the other line's leading end on the first line's
/// midline, and is `min(gap, max_extension)` long.
pub fn bridge_between(
    a: &WallLine,
    b: &WallLine,
    max_gap: f64,
    max_extension: f64,
) -> Option<Bridge> {
    if a.orientation != b.orientation {
        return None;
    }
    if (a.midline() - b.midline()).abs() >= ALIGNMENT_TOLERANCE {
        return None;
    }

    let (a_lead, a_trail) = a.span();
    let (b_lead, b_trail) = b.span();

    let (first, trail, lead) = if a_trail < b_lead {
        (a, a_trail, b_lead)
    } else if b_trail < a_lead {
        (b, b_trail, a_lead)
    } else {
        return None;
    };

    let gap = lead - trail;
    if gap <= 0.0 || gap >= max_gap {
        return None;
    }

    let length = gap.min(max_extension);
    let offset = first.midline();
    let (start, end) = match first.orientation {
        Orientation::Horizontal => (
            Point2D::new(trail, offset),
            Point2D::new(trail + length, offset),
        ),
        Orientation::Vertical => (
            Point2D::new(offset, trail),
            Point2D::new(offset, trail + length),
        ),
    };

    Some(Bridge {
        start,
        end,
        orientation: first.orientation,
    })
}

/// Collect bridges for every unordered pair of lines in one orientation group
pub fn find_bridges(lines: &[WallLine], max_gap: f64, max_extension: f64) -> Vec<Bridge> {
    let mut bridges = Vec::new();
    for (i, a) in lines.iter().enumerate() {
        for b in &lines[i + 1..] {
            if let Some(bridge) = bridge_between(a, b, max_gap, max_extension) {
                bridges.push(bridge);
            }
        }
    }
    bridges
}

fn draw_bridge(mask: &mut GrayImage, bridge: &Bridge) {
    let half = (BRIDGE_THICKNESS / 2) as i32;
    let length = bridge.length().ceil().max(1.0) as u32 + 1;
    let rect = match bridge.orientation {
        Orientation::Horizontal => Rect::at(
            bridge.start.x.floor() as i32,
            bridge.start.y.round() as i32 - half,
        )
        .of_size(length, BRIDGE_THICKNESS),
        Orientation::Vertical => Rect::at(
            bridge.start.x.round() as i32 - half,
            bridge.start.y.floor() as i32,
        )
        .of_size(BRIDGE_THICKNESS, length),
    };
    draw_filled_rect_mut(mask, rect, Luma([255]));
}

/// Close wall gaps between collinear lines
///
/// Returns a new mask; the input mask and line lists are left untouched.
pub fn extend_wall_lines(
    mask: &GrayImage,
    horizontal: &[WallLine],
    vertical: &[WallLine],
    max_gap: f64,
    max_extension: f64,
) -> ExtendedMask {
    let mut enhanced = mask.clone();

    let mut bridges = find_bridges(horizontal, max_gap, max_extension);
    bridges.extend(find_bridges(vertical, max_gap, max_extension));

    for bridge in &bridges {
        draw_bridge(&mut enhanced, bridge);
    }

    tracing::debug!(bridges = bridges.len(), "Extended wall lines across gaps");

    ExtendedMask {
        mask: enhanced,
        bridges,
    }
}
