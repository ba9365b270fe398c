// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Blueprint Vision Server - room detection for blueprint images.
//!
//! The server downloads a blueprint image from a URL, runs the room
//! detection pipeline on the blocking thread pool and returns labeled room
//! boxes in a 0-1000 normalized frame.
//!
//! # Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Health check
//! - `POST /detect-rooms` - Detect rooms in the image at `blueprintUrl`

use anyhow::Context;
use blueprint_vision::{default_recognizer, TextRecognizer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

mod config;
mod error;
mod routes;
mod services;
mod types;

use config::Config;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Client reused for blueprint downloads.
    pub http: reqwest::Client,
    /// OCR engine; `None` when OCR is disabled server-wide.
    pub recognizer: Option<Arc<dyn TextRecognizer>>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("blueprint-vision/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let recognizer = config
            .ocr_enabled
            .then(|| {
                default_recognizer(
                    &config.tesseract_cmd,
                    &config.tesseract_lang,
                    Duration::from_secs(config.ocr_timeout_secs),
                )
            });

        Ok(Self {
            config: Arc::new(config),
            http,
            recognizer,
        })
    }
}

fn init_tracing(json: bool) {
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,tower_http=debug,blueprint_vision_server=debug".into());

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).pretty().init();
    }
}

fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(config.log_json);

    tracing::info!(
        port = config.port,
        download_timeout_secs = config.download_timeout_secs,
        max_image_size_mb = config.max_image_size_mb,
        worker_threads = config.worker_threads,
        ocr_enabled = config.ocr_enabled,
        door_gap_closing = ?config.door_gap_closing,
        "Starting Blueprint Vision Server"
    );

    // Detection runs on the blocking pool, so its size bounds concurrent detections
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .max_blocking_threads(config.worker_threads)
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(serve(config))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = routes::router(AppState::new(config)?);

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
