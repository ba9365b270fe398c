// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text to room association
//!
//! Each room receives at most one text region and each region goes to at most
//! one room. A region is eligible for a room when its center falls inside the
//! room box grown by [`CONTAINMENT_MARGIN`], or lies within
//! [`NEARBY_DISTANCE`] of the room center.

use crate::types::{AssociationStrategy, RoomCandidate, TextRegion};
use rustc_hash::FxHashSet;

/// Margin added around a room box for the containment test (normalized units)
pub const CONTAINMENT_MARGIN: i32 = 50;

/// Center-to-center distance under which text counts as nearby (normalized units)
pub const NEARBY_DISTANCE: f64 = 150.0;

/// Cost standing in for an ineligible pair in the assignment solver
const INELIGIBLE_COST: f64 = 1e9;

/// Center-to-center distance if `text` may label `room`
fn eligible_distance(room: &RoomCandidate, text: &TextRegion) -> Option<f64> {
    let distance = room.bounding_box.center().distance_to(&text.center);
    let contained = room
        .bounding_box
        .expanded(CONTAINMENT_MARGIN)
        .contains(&text.center);
    (contained || distance <= NEARBY_DISTANCE).then_some(distance)
}

/// Attach text regions to rooms with the chosen strategy.
///
/// The result is aligned with `rooms`.
pub fn associate_text(
    rooms: &[RoomCandidate],
    texts: &[TextRegion],
    strategy: AssociationStrategy,
) -> Vec<Option<TextRegion>> {
    let matches = match strategy {
        AssociationStrategy::Greedy => associate_greedy(rooms, texts),
        AssociationStrategy::Optimal => associate_optimal(rooms, texts),
    };
    tracing::debug!(
        rooms = rooms.len(),
        texts = texts.len(),
        matched = matches.iter().filter(|m| m.is_some()).count(),
        "Associated text with rooms"
    );
    matches
}

/// Nearest available region per room, rooms taken in order.
///
/// Regions are ranked by OCR confidence first, so among equally distant
/// regions the more confident one wins.
pub fn associate_greedy(rooms: &[RoomCandidate], texts: &[TextRegion]) -> Vec<Option<TextRegion>> {
    let mut order: Vec<usize> = (0..texts.len()).collect();
    order.sort_by(|&a, &b| texts[b].confidence.cmp(&texts[a].confidence));

    let mut taken: FxHashSet<usize> = FxHashSet::default();

    rooms
        .iter()
        .map(|room| {
            let mut best: Option<(usize, f64)> = None;
            for &t in &order {
                if taken.contains(&t) {
                    continue;
                }
                let Some(distance) = eligible_distance(room, &texts[t]) else {
                    continue;
                };
                if best.map_or(true, |(_, d)| distance < d) {
                    best = Some((t, distance));
                }
            }
            best.map(|(t, _)| {
                taken.insert(t);
                texts[t].clone()
            })
        })
        .collect()
}

/// Assignment minimizing the total center distance over eligible pairs
pub fn associate_optimal(rooms: &[RoomCandidate], texts: &[TextRegion]) -> Vec<Option<TextRegion>> {
    if rooms.is_empty() || texts.is_empty() {
        return vec![None; rooms.len()];
    }

    let cost: Vec<Vec<f64>> = rooms
        .iter()
        .map(|room| {
            texts
                .iter()
                .map(|text| eligible_distance(room, text).unwrap_or(INELIGIBLE_COST))
                .collect()
        })
        .collect();

    // The solver needs rows <= columns
    let room_to_text: Vec<Option<usize>> = if rooms.len() <= texts.len() {
        solve_assignment(&cost)
    } else {
        let transposed: Vec<Vec<f64>> = (0..texts.len())
            .map(|t| cost.iter().map(|row| row[t]).collect())
            .collect();
        let text_to_room = solve_assignment(&transposed);
        let mut inverse = vec![None; rooms.len()];
        for (t, room) in text_to_room.into_iter().enumerate() {
            if let Some(r) = room {
                inverse[r] = Some(t);
            }
        }
        inverse
    };

    room_to_text
        .into_iter()
        .enumerate()
        .map(|(r, t)| {
            let t = t?;
            (cost[r][t] < INELIGIBLE_COST).then(|| texts[t].clone())
        })
        .collect()
}

/// Hungarian algorithm (potentials form) for a rectangular matrix with
/// `rows <= columns`. Returns the column assigned to each row.
fn solve_assignment(cost: &[Vec<f64>]) -> Vec<Option<usize>> {
    let n = cost.len();
    let m = cost.first().map_or(0, |row| row.len());
    if n == 0 || m < n {
        return vec![None; n];
    }

    // 1-based with column 0 as the virtual start
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; m + 1];
    let mut row_of = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        row_of[0] = i;
        let mut j0 = 0usize;
        let mut min_slack = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[j0] = true;
            let i0 = row_of[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;

            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let slack = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if slack < min_slack[j] {
                    min_slack[j] = slack;
                    way[j] = j0;
                }
                if min_slack[j] < delta {
                    delta = min_slack[j];
                    j1 = j;
                }
            }

            for j in 0..=m {
                if used[j] {
                    u[row_of[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_slack[j] -= delta;
                }
            }

            j0 = j1;
            if row_of[j0] == 0 {
                break;
            }
        }

        loop {
            let j1 = way[j0];
            row_of[j0] = row_of[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![None; n];
    for j in 1..=m {
        if row_of[j] != 0 {
            assignment[row_of[j] - 1] = Some(j - 1);
        }
    }
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;

    fn room(bbox: [i32; 4]) -> RoomCandidate {
        let bounding_box = BoundingBox::from(bbox);
        RoomCandidate {
            bounding_box,
            area: bounding_box.area() as f64,
            confidence: 0.9,
            is_hallway: false,
            aspect_ratio: bounding_box.aspect_ratio().unwrap(),
        }
    }

    fn text(label: &str, bbox: [i32; 4], confidence: i32) -> TextRegion {
        TextRegion::new(label.to_string(), BoundingBox::from(bbox), confidence)
    }

    fn labels(matches: &[Option<TextRegion>]) -> Vec<Option<&str>> {
        matches.iter().map(|m| m.as_ref().map(|t| t.text.as_str())).collect()
    }

    #[test]
    fn test_contained_text_is_matched() {
        let rooms = vec![room([100, 100, 400, 400])];
        let texts = vec![text("Kitchen", [200, 240, 300, 260], 85)];

        let matches = associate_greedy(&rooms, &texts);
        assert_eq!(labels(&matches), vec![Some("Kitchen")]);
    }

    #[test]
    fn test_far_text_is_not_matched() {
        let rooms = vec![room([0, 0, 100, 100])];
        let texts = vec![text("Garage", [700, 700, 800, 720], 90)];

        let matches = associate_greedy(&rooms, &texts);
        assert_eq!(labels(&matches), vec![None]);
    }

    #[test]
    fn test_nearby_text_outside_margin_is_matched() {
        // Center (50, 50); text center (50, 190) is 140 away and outside the margin
        let rooms = vec![room([30, 30, 70, 70])];
        let texts = vec![text("Closet", [40, 180, 60, 200], 70)];

        let matches = associate_greedy(&rooms, &texts);
        assert_eq!(labels(&matches), vec![Some("Closet")]);
    }

    #[test]
    fn test_text_used_at_most_once() {
        let rooms = vec![room([100, 100, 300, 300]), room([120, 120, 280, 280])];
        let texts = vec![text("Office", [180, 190, 220, 210], 80)];

        let matches = associate_greedy(&rooms, &texts);
        assert_eq!(labels(&matches), vec![Some("Office"), None]);
    }

    #[test]
    fn test_equal_distance_prefers_confident_text() {
        let rooms = vec![room([100, 100, 300, 300])];
        let texts = vec![
            text("Den", [140, 190, 160, 210], 50),
            text("Study", [240, 190, 260, 210], 90),
        ];

        let matches = associate_greedy(&rooms, &texts);
        assert_eq!(labels(&matches), vec![Some("Study")]);
    }

    #[test]
    fn test_nearest_wins_over_confident() {
        let rooms = vec![room([100, 100, 300, 300])];
        let texts = vec![
            text("Hall", [110, 110, 130, 130], 95),
            text("Lounge", [195, 195, 205, 205], 40),
        ];

        let matches = associate_greedy(&rooms, &texts);
        assert_eq!(labels(&matches), vec![Some("Lounge")]);
    }

    #[test]
    fn test_optimal_beats_greedy_when_order_matters() {
        let rooms = vec![room([50, 50, 150, 150]), room([210, 50, 310, 150])];
        let texts = vec![
            text("Bed", [160, 90, 180, 110], 80),
            text("Bath", [10, 90, 30, 110], 80),
        ];

        let greedy = associate_text(&rooms, &texts, AssociationStrategy::Greedy);
        assert_eq!(labels(&greedy), vec![Some("Bed"), None]);

        let optimal = associate_text(&rooms, &texts, AssociationStrategy::Optimal);
        assert_eq!(labels(&optimal), vec![Some("Bath"), Some("Bed")]);
    }

    #[test]
    fn test_optimal_with_more_rooms_than_text() {
        let rooms = vec![
            room([0, 0, 100, 100]),
            room([400, 400, 500, 500]),
            room([800, 800, 900, 900]),
        ];
        let texts = vec![text("Pantry", [440, 440, 460, 460], 70)];

        let matches = associate_optimal(&rooms, &texts);
        assert_eq!(labels(&matches), vec![None, Some("Pantry"), None]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(associate_greedy(&[], &[]).is_empty());
        let rooms = vec![room([0, 0, 100, 100])];
        assert_eq!(labels(&associate_optimal(&rooms, &[])), vec![None]);
    }
}
