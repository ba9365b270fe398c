// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use blueprint_vision::{DetectionOutput, DetectionStats, Room};
use serde::{Deserialize, Serialize};

/// Successful `POST /detect-rooms` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectRoomsResponse {
    /// Detected rooms, largest first.
    pub rooms: Vec<Room>,
    /// Number of rooms.
    pub count: usize,
    /// Processing statistics.
    pub stats: DetectionStats,
}

impl From<DetectionOutput> for DetectRoomsResponse {
    fn from(output: DetectionOutput) -> Self {
        Self {
            count: output.rooms.len(),
            rooms: output.rooms,
            stats: output.stats,
        }
    }
}
