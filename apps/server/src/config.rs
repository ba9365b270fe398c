// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use blueprint_vision::{DoorGapClosing, PipelineConfig};
use std::str::FromStr;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Timeout for fetching a blueprint image.
    pub download_timeout_secs: u64,
    /// Timeout for a whole request.
    pub request_timeout_secs: u64,
    /// Largest accepted image download in MB.
    pub max_image_size_mb: usize,
    /// Upper bound on concurrently running detections.
    pub worker_threads: usize,
    /// Whether OCR runs unless a request turns it off.
    pub ocr_enabled: bool,
    /// Default door-gap closing policy.
    pub door_gap_closing: DoorGapClosing,
    /// Tesseract executable.
    pub tesseract_cmd: String,
    /// Tesseract language codes.
    pub tesseract_lang: String,
    /// Limit for one OCR run before the engine is killed.
    pub ocr_timeout_secs: u64,
    /// Emit logs as JSON lines instead of pretty text.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5001,
            download_timeout_secs: 30,
            request_timeout_secs: 120,
            max_image_size_mb: 50,
            worker_threads: num_cpus::get(),
            ocr_enabled: true,
            door_gap_closing: DoorGapClosing::Aggressive,
            tesseract_cmd: "tesseract".into(),
            tesseract_lang: "eng".into(),
            ocr_timeout_secs: 60,
            log_json: false,
        }
    }
}

/// Read and parse an environment variable, falling back on absence or parse failure.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_door_gap_closing(value: &str) -> Option<DoorGapClosing> {
    match value.trim().to_ascii_lowercase().as_str() {
        "aggressive" | "on" | "true" => Some(DoorGapClosing::Aggressive),
        "off" | "none" | "false" => Some(DoorGapClosing::Off),
        _ => None,
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_or("PORT", defaults.port),
            download_timeout_secs: env_or("DOWNLOAD_TIMEOUT_SECS", defaults.download_timeout_secs),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            max_image_size_mb: env_or("MAX_IMAGE_SIZE_MB", defaults.max_image_size_mb),
            worker_threads: env_or("WORKER_THREADS", defaults.worker_threads).max(1),
            ocr_enabled: env_or("OCR_ENABLED", defaults.ocr_enabled),
            door_gap_closing: std::env::var("DOOR_GAP_CLOSING")
                .ok()
                .and_then(|v| parse_door_gap_closing(&v))
                .unwrap_or(defaults.door_gap_closing),
            tesseract_cmd: std::env::var("TESSERACT_CMD").unwrap_or(defaults.tesseract_cmd),
            tesseract_lang: std::env::var("TESSERACT_LANG").unwrap_or(defaults.tesseract_lang),
            ocr_timeout_secs: env_or("OCR_TIMEOUT_SECS", defaults.ocr_timeout_secs).max(1),
            log_json: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.log_json),
        }
    }

    /// Maximum image download size in bytes.
    pub fn max_image_bytes(&self) -> usize {
        self.max_image_size_mb * 1024 * 1024
    }

    /// Pipeline settings a request starts from before applying its options.
    pub fn pipeline_defaults(&self) -> PipelineConfig {
        PipelineConfig {
            door_gap_closing: self.door_gap_closing,
            ocr_enabled: self.ocr_enabled,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 5001);
        assert_eq!(config.download_timeout_secs, 30);
        assert_eq!(config.ocr_timeout_secs, 60);
        assert_eq!(config.max_image_bytes(), 50 * 1024 * 1024);
        assert!(config.worker_threads >= 1);
    }

    #[test]
    fn test_parse_door_gap_closing() {
        assert_eq!(parse_door_gap_closing("Aggressive"), Some(DoorGapClosing::Aggressive));
        assert_eq!(parse_door_gap_closing(" off "), Some(DoorGapClosing::Off));
        assert_eq!(parse_door_gap_closing("sometimes"), None);
    }

    #[test]
    fn test_pipeline_defaults_follow_server_policy() {
        let config = Config {
            ocr_enabled: false,
            door_gap_closing: DoorGapClosing::Off,
            ..Config::default()
        };
        let pipeline = config.pipeline_defaults();
        assert!(!pipeline.ocr_enabled);
        assert_eq!(pipeline.door_gap_closing, DoorGapClosing::Off);
        assert_eq!(pipeline.max_rooms, 20);
    }
}
