// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text region extraction
//!
//! The OCR engine sits behind [`TextRecognizer`]. The default implementation
//! runs the `tesseract` command line tool and parses its TSV output; with the
//! `tesseract` feature enabled, [`LeptessRecognizer`] calls libtesseract in
//! process instead.

use crate::error::{Result, VisionError};
use crate::types::{BoundingBox, RawTextBox, TextRegion};
use image::{GrayImage, ImageFormat};
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Text below this engine confidence is discarded
pub const MIN_TEXT_CONFIDENCE: f32 = 30.0;

/// Text boxes narrower or shorter than this (pixels) are discarded
pub const MIN_TEXT_SIZE: u32 = 10;

/// How long one tesseract run may take before it is killed
pub const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(60);

/// Interval between exit checks while waiting on tesseract
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// An OCR engine producing word boxes in source-pixel coordinates
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<RawTextBox>>;
}

/// Tesseract invoked through its command line interface
#[derive(Debug, Clone)]
pub struct TesseractCli {
    /// Executable name or path
    pub command: String,
    /// Language codes, e.g. "eng" or "eng+deu"
    pub language: String,
    /// Page segmentation mode (11 = sparse text, suited to drawings)
    pub page_segmentation_mode: u32,
    /// Wall-clock limit for one run
    pub timeout: Duration,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
            language: "eng".to_string(),
            page_segmentation_mode: 11,
            timeout: DEFAULT_OCR_TIMEOUT,
        }
    }
}

impl TesseractCli {
    pub fn new(command: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Drain a child pipe on its own thread so a chatty process cannot block on
/// a full pipe while we wait for it
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Wait for `child` to exit, killing it once `timeout` has passed
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Result<std::process::ExitStatus> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(VisionError::Ocr(format!(
                "tesseract timed out after {:?}",
                timeout
            )));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

impl TextRecognizer for TesseractCli {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<RawTextBox>> {
        let tmp = tempfile::Builder::new().suffix(".png").tempfile()?;
        image.save_with_format(tmp.path(), ImageFormat::Png)?;

        let mut child = Command::new(&self.command)
            .arg(tmp.path())
            .arg("stdout")
            .args(["-l", &self.language])
            .args(["--psm", &self.page_segmentation_mode.to_string()])
            .arg("tsv")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VisionError::Ocr(format!("cannot run '{}': {}", self.command, e)))?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        // On timeout the reader threads are left to finish on their own
        let status = wait_with_deadline(&mut child, self.timeout)?;

        let stdout = stdout
            .join()
            .map_err(|_| VisionError::Ocr("tesseract stdout reader panicked".to_string()))?;
        if !status.success() {
            let stderr = stderr.join().unwrap_or_default();
            return Err(VisionError::Ocr(format!(
                "tesseract exited with {}: {}",
                status,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        parse_tsv(&String::from_utf8_lossy(&stdout))
    }
}

/// Parse tesseract's TSV output into word boxes
///
/// Structural rows (page, block, line) carry a confidence of -1 and are skipped.
pub fn parse_tsv(tsv: &str) -> Result<Vec<RawTextBox>> {
    let mut boxes = Vec::new();

    for (line_no, line) in tsv.lines().enumerate() {
        if line_no == 0 && line.starts_with("level") {
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 11 {
            return Err(VisionError::Ocr(format!(
                "malformed TSV row {}: expected 12 columns, got {}",
                line_no + 1,
                cols.len()
            )));
        }

        let confidence: f32 = cols[10]
            .trim()
            .parse()
            .map_err(|_| VisionError::Ocr(format!("bad confidence on row {}", line_no + 1)))?;
        if confidence < 0.0 {
            continue;
        }

        let number = |idx: usize| -> Result<u32> {
            cols[idx]
                .trim()
                .parse::<i64>()
                .map(|v| v.max(0) as u32)
                .map_err(|_| VisionError::Ocr(format!("bad geometry on row {}", line_no + 1)))
        };

        boxes.push(RawTextBox {
            text: cols.get(11).copied().unwrap_or_default().to_string(),
            left: number(6)?,
            top: number(7)?,
            width: number(8)?,
            height: number(9)?,
            confidence,
        });
    }

    Ok(boxes)
}

/// In-process Tesseract through leptess
#[cfg(feature = "tesseract")]
#[derive(Debug, Clone)]
pub struct LeptessRecognizer {
    pub language: String,
}

#[cfg(feature = "tesseract")]
impl TextRecognizer for LeptessRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<RawTextBox>> {
        let mut lt = leptess::LepTess::new(None, &self.language)
            .map_err(|e| VisionError::Ocr(format!("failed to initialize Tesseract: {}", e)))?;

        let mut png = std::io::Cursor::new(Vec::new());
        image.write_to(&mut png, ImageFormat::Png)?;
        lt.set_image_from_mem(png.get_ref())
            .map_err(|e| VisionError::Ocr(format!("failed to load image: {}", e)))?;

        let Some(boxes) =
            lt.get_component_boxes(leptess::capi::TessPageIteratorLevel_RIL_WORD, true)
        else {
            return Ok(Vec::new());
        };

        let mut words = Vec::new();
        for bbox in &boxes {
            let geom = bbox.get_geometry();
            lt.set_rectangle(geom.x, geom.y, geom.w, geom.h);
            let text = lt.get_utf8_text().unwrap_or_default();
            words.push(RawTextBox {
                text,
                left: geom.x.max(0) as u32,
                top: geom.y.max(0) as u32,
                width: geom.w.max(0) as u32,
                height: geom.h.max(0) as u32,
                confidence: lt.mean_text_conf() as f32,
            });
        }

        Ok(words)
    }
}

/// The engine this build prefers for `language`
///
/// Uses libtesseract in process when built with the `tesseract` feature and
/// the CLI at `command`, killed after `timeout`, otherwise.
pub fn default_recognizer(command: &str, language: &str, timeout: Duration) -> Arc<dyn TextRecognizer> {
    #[cfg(feature = "tesseract")]
    {
        let _ = (command, timeout);
        Arc::new(LeptessRecognizer {
            language: language.to_string(),
        })
    }
    #[cfg(not(feature = "tesseract"))]
    {
        Arc::new(TesseractCli::new(command, language).with_timeout(timeout))
    }
}

/// Filter raw OCR output and move it into the normalized frame
///
/// Drops words under 30 confidence, boxes under 10 px on either side, and
/// blank text.
pub fn normalize_text_boxes(raw: &[RawTextBox], image_width: u32, image_height: u32) -> Vec<TextRegion> {
    raw.iter()
        .filter(|b| b.confidence >= MIN_TEXT_CONFIDENCE)
        .filter(|b| b.width >= MIN_TEXT_SIZE && b.height >= MIN_TEXT_SIZE)
        .filter_map(|b| {
            let text = b.text.trim();
            if text.is_empty() {
                return None;
            }
            let bbox = BoundingBox::from_pixel_rect(
                b.left,
                b.top,
                b.width,
                b.height,
                image_width,
                image_height,
            );
            Some(TextRegion::new(text.to_string(), bbox, b.confidence as i32))
        })
        .collect()
}

/// Run OCR and normalize the result
pub fn extract_text_regions(
    recognizer: &dyn TextRecognizer,
    image: &GrayImage,
) -> Result<Vec<TextRegion>> {
    let raw = recognizer.recognize(image)?;
    let regions = normalize_text_boxes(&raw, image.width(), image.height());
    tracing::info!(raw = raw.len(), kept = regions.len(), "Extracted text regions");
    Ok(regions)
}
