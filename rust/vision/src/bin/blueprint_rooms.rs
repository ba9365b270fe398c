// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: detect rooms in a blueprint image and print them as JSON
//!
//! Usage:
//!   blueprint-rooms <image_path> [options]

use anyhow::{bail, Context, Result};
use blueprint_vision::{
    default_recognizer, detect_rooms_in_image, DoorGapClosing, OverlapStrategy, PipelineConfig,
    DEFAULT_OCR_TIMEOUT,
};
use image::ImageReader;
use std::env;
use std::fs;
use std::time::Duration;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return Ok(());
    }

    let image_path = &args[1];

    let mut config = PipelineConfig::default();
    let mut output_path: Option<String> = None;
    let mut tesseract_cmd = String::from("tesseract");
    let mut language = String::from("eng");
    let mut ocr_timeout = DEFAULT_OCR_TIMEOUT;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--min-area" => {
                config.min_area = option_value(&args, &mut i)?
                    .parse()
                    .context("Invalid min area value")?;
            }
            "--max-area" => {
                config.max_area = Some(
                    option_value(&args, &mut i)?
                        .parse()
                        .context("Invalid max area value")?,
                );
            }
            "--max-rooms" => {
                config.max_rooms = option_value(&args, &mut i)?
                    .parse()
                    .context("Invalid max rooms value")?;
            }
            "--min-confidence" => {
                config.min_confidence = option_value(&args, &mut i)?
                    .parse()
                    .context("Invalid min confidence value")?;
            }
            "--tesseract" => {
                tesseract_cmd = option_value(&args, &mut i)?.to_string();
            }
            "--lang" => {
                language = option_value(&args, &mut i)?.to_string();
            }
            "--ocr-timeout" => {
                let secs: u64 = option_value(&args, &mut i)?
                    .parse()
                    .context("Invalid OCR timeout value")?;
                ocr_timeout = Duration::from_secs(secs.max(1));
            }
            "--output" => {
                output_path = Some(option_value(&args, &mut i)?.to_string());
            }
            "--no-ocr" => {
                config.ocr_enabled = false;
            }
            "--no-door-closing" => {
                config.door_gap_closing = DoorGapClosing::Off;
            }
            "--merge" => {
                config.overlap_strategy = OverlapStrategy::Merge;
            }
            other => {
                print_usage();
                bail!("Unknown option: {}", other);
            }
        }
        i += 1;
    }

    eprintln!("Loading image: {}", image_path);
    let img = ImageReader::open(image_path)
        .with_context(|| format!("Cannot open image '{}'", image_path))?
        .decode()
        .with_context(|| format!("Cannot decode image '{}'", image_path))?;
    let grayscale = img.to_luma8();
    eprintln!("  Image size: {}x{} pixels", grayscale.width(), grayscale.height());

    let ocr = default_recognizer(&tesseract_cmd, &language, ocr_timeout);
    let recognizer = config.ocr_enabled.then_some(ocr.as_ref());

    let output = detect_rooms_in_image(&grayscale, &config, recognizer)?;

    let stats = &output.stats;
    eprintln!(
        "  Lines: {} horizontal, {} vertical | bridges: {} | candidates: {} | text: {}",
        stats.horizontal_lines,
        stats.vertical_lines,
        stats.bridges_drawn,
        stats.candidates,
        stats.text_regions
    );
    eprintln!("  Rooms: {} ({} ms)", output.rooms.len(), stats.total_time_ms);

    let json = serde_json::to_string_pretty(&serde_json::json!({
        "rooms": output.rooms,
        "count": output.rooms.len(),
    }))?;

    match output_path {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("Cannot write '{}'", path))?;
            eprintln!("  Wrote {}", path);
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn option_value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .with_context(|| format!("Missing value for {}", flag))
}

fn print_usage() {
    eprintln!("Usage: blueprint-rooms <image_path> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --min-area <px>         Minimum region area in pixels (default: 1000)");
    eprintln!("  --max-area <px>         Maximum region area in pixels (default: half the image)");
    eprintln!("  --max-rooms <n>         Maximum number of rooms returned (default: 20)");
    eprintln!("  --min-confidence <f>    Minimum room confidence (default: 0.8)");
    eprintln!("  --tesseract <cmd>       Tesseract executable (default: tesseract)");
    eprintln!("  --lang <codes>          OCR languages (default: eng)");
    eprintln!("  --ocr-timeout <secs>    Kill tesseract after this many seconds (default: 60)");
    eprintln!("  --output <path>         Write JSON to a file instead of stdout");
    eprintln!("  --no-ocr                Skip text recognition");
    eprintln!("  --no-door-closing       Disable door-gap closing");
    eprintln!("  --merge                 Merge moderately overlapping rooms instead of dropping them");
}
