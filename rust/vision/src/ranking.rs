// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Filtering, deduplication and ranking of room candidates
//!
//! The default [`OverlapStrategy::Reject`] keeps a candidate only if it
//! overlaps no already accepted candidate by more than 5% of either box.
//! [`OverlapStrategy::Merge`] instead folds moderately overlapping candidates
//! into the accepted one.

use crate::types::{BoundingBox, OverlapStrategy, PipelineConfig, RoomCandidate};

/// Largest normalized box area kept (a quarter of the 1000x1000 frame)
pub const MAX_NORMALIZED_AREA: i64 = 250_000;

/// Overlap fraction above which a candidate is rejected
pub const MAX_OVERLAP_RATIO: f64 = 0.05;

/// Upper edge of the merge band; anything above is a plain duplicate
pub const MERGE_CEILING: f64 = 0.9;

/// Parameters for [`rank_rooms`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingParams {
    pub min_confidence: f64,
    pub max_rooms: usize,
    pub merge_threshold: f64,
    pub strategy: OverlapStrategy,
}

impl Default for RankingParams {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for RankingParams {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            max_rooms: config.max_rooms,
            merge_threshold: config.merge_threshold,
            strategy: config.overlap_strategy,
        }
    }
}

/// Intersection as a fraction of each box: `(of_a, of_b)`
fn overlap_fractions(a: &BoundingBox, b: &BoundingBox) -> (f64, f64) {
    let inter = a.intersection_area(b) as f64;
    let frac = |area: i64| if area > 0 { inter / area as f64 } else { 0.0 };
    (frac(a.area()), frac(b.area()))
}

/// True when either box loses more than 5% of its area to the other
pub fn overlaps_materially(a: &BoundingBox, b: &BoundingBox) -> bool {
    let (of_a, of_b) = overlap_fractions(a, b);
    of_a > MAX_OVERLAP_RATIO || of_b > MAX_OVERLAP_RATIO
}

/// Intersection over the smaller box
pub fn overlap_ratio(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let (of_a, of_b) = overlap_fractions(a, b);
    of_a.max(of_b)
}

/// Whether two candidates overlap enough to be one room seen twice, but not so
/// much that one is a plain duplicate of the other
pub fn should_merge(a: &RoomCandidate, b: &RoomCandidate, threshold: f64) -> bool {
    let ratio = overlap_ratio(&a.bounding_box, &b.bounding_box);
    ratio >= threshold && ratio <= MERGE_CEILING
}

/// Combine two candidates into one covering both
pub fn merge_candidates(a: &RoomCandidate, b: &RoomCandidate) -> RoomCandidate {
    let bounding_box = a.bounding_box.union(&b.bounding_box);
    RoomCandidate {
        bounding_box,
        area: a.area + b.area,
        confidence: a.confidence.max(b.confidence),
        is_hallway: a.is_hallway && b.is_hallway,
        aspect_ratio: bounding_box.aspect_ratio().unwrap_or(1.0),
    }
}

/// Confidence and size filtering, then a stable sort by raw area, largest first
fn filter_and_sort(candidates: Vec<RoomCandidate>, min_confidence: f64) -> Vec<RoomCandidate> {
    let mut kept: Vec<RoomCandidate> = candidates
        .into_iter()
        .filter(|c| c.confidence >= min_confidence)
        .filter(|c| c.bounding_box.area() <= MAX_NORMALIZED_AREA)
        .collect();
    kept.sort_by(|a, b| b.area.total_cmp(&a.area));
    kept
}

fn dedupe_strict(sorted: Vec<RoomCandidate>, max_rooms: usize) -> Vec<RoomCandidate> {
    let mut accepted: Vec<RoomCandidate> = Vec::new();
    for candidate in sorted {
        if accepted.len() >= max_rooms {
            break;
        }
        let clashes = accepted
            .iter()
            .any(|kept| overlaps_materially(&candidate.bounding_box, &kept.bounding_box));
        if !clashes {
            accepted.push(candidate);
        }
    }
    accepted
}

fn dedupe_merging(
    sorted: Vec<RoomCandidate>,
    max_rooms: usize,
    merge_threshold: f64,
) -> Vec<RoomCandidate> {
    let mut accepted: Vec<RoomCandidate> = Vec::new();
    'candidates: for candidate in sorted {
        for kept in accepted.iter_mut() {
            let ratio = overlap_ratio(&candidate.bounding_box, &kept.bounding_box);
            if ratio > MERGE_CEILING {
                continue 'candidates;
            }
            if should_merge(kept, &candidate, merge_threshold) {
                *kept = merge_candidates(kept, &candidate);
                continue 'candidates;
            }
        }
        if accepted.len() < max_rooms {
            accepted.push(candidate);
        }
    }
    accepted
}

/// Filter, deduplicate and cap room candidates
///
/// 1. Drop candidates below `min_confidence`.
/// 2. Drop candidates whose normalized box exceeds a quarter of the frame.
/// 3. Sort by raw pixel area, largest first.
/// 4. Resolve overlaps with the configured strategy.
/// 5. Keep at most `max_rooms`.
pub fn rank_rooms(candidates: Vec<RoomCandidate>, params: &RankingParams) -> Vec<RoomCandidate> {
    let total = candidates.len();
    let sorted = filter_and_sort(candidates, params.min_confidence);
    let eligible = sorted.len();

    let ranked = match params.strategy {
        OverlapStrategy::Reject => dedupe_strict(sorted, params.max_rooms),
        OverlapStrategy::Merge => dedupe_merging(sorted, params.max_rooms, params.merge_threshold),
    };

    tracing::info!(
        total,
        eligible,
        kept = ranked.len(),
        strategy = ?params.strategy,
        "Filtered to non-overlapping rooms"
    );

    ranked
}
