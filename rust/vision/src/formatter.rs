// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Final room labeling: ids, display names and OCR metadata

use crate::types::{Room, RoomCandidate, TextRegion};

/// OCR confidence a detected name needs before it replaces the generic label
pub const NAMING_CONFIDENCE: i32 = 60;

/// Running per-class counters for generic labels, scoped to one request
#[derive(Debug, Default, Clone, Copy)]
pub struct LabelCounter {
    rooms: usize,
    hallways: usize,
}

impl LabelCounter {
    /// Next generic label for the class, e.g. "Room 3" or "Hallway 1"
    pub fn next_label(&mut self, is_hallway: bool) -> String {
        if is_hallway {
            self.hallways += 1;
            format!("Hallway {}", self.hallways)
        } else {
            self.rooms += 1;
            format!("Room {}", self.rooms)
        }
    }
}

/// Lowercase with spaces replaced by underscores
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Build the final rooms from ranked candidates and their matched text.
///
/// `matches` must be aligned with `candidates`; missing entries count as no
/// match.
pub fn format_rooms(candidates: &[RoomCandidate], matches: &[Option<TextRegion>]) -> Vec<Room> {
    let mut counter = LabelCounter::default();

    candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            let sequence = index + 1;
            let text = matches.get(index).and_then(|m| m.as_ref());

            let named = text.filter(|t| t.confidence > NAMING_CONFIDENCE);
            let (id, name_hint) = match named {
                Some(t) => (format!("{}_{:03}", slugify(&t.text), sequence), t.text.clone()),
                None => (
                    format!("room_{:03}", sequence),
                    counter.next_label(candidate.is_hallway),
                ),
            };

            Room {
                id,
                bounding_box: candidate.bounding_box,
                name_hint,
                confidence: round2(candidate.confidence),
                area: candidate.area.round(),
                is_hallway: candidate.is_hallway,
                aspect_ratio: round2(candidate.aspect_ratio),
                detected_name: text.map(|t| t.text.clone()),
                text_confidence: text.map(|t| t.confidence),
            }
        })
        .collect()
}
