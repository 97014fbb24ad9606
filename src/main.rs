use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;

use mocap_core::bvh::{self, ExportOptions};
use mocap_core::config::Config;
use mocap_core::recorder;
use mocap_core::skeleton::Skeleton;

const CONFIG_PATH: &str = "config.toml";

fn parse_args() -> Option<(PathBuf, Option<PathBuf>)> {
    let args: Vec<String> = std::env::args().collect();
    // Usage: mocap-core <recording.json> [output.bvh]
    if args.len() < 2 || args.len() > 3 {
        return None;
    }
    let input = PathBuf::from(&args[1]);
    let output = args.get(2).map(PathBuf::from);
    Some((input, output))
}

fn default_output_path() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y-%m-%dT%H-%M-%S");
    PathBuf::from(format!("pose_motion_{}.bvh", stamp))
}

fn main() -> Result<()> {
    env_logger::init();

    let (input, output) = match parse_args() {
        Some(paths) => paths,
        None => bail!("usage: mocap-core <recording.json> [output.bvh]"),
    };

    let config = Config::load_or_default(CONFIG_PATH);

    println!("=== Pose Motion BVH Export ===");
    println!("Input: {}", input.display());
    println!("FPS: {} / Scale: {}", config.export.fps, config.export.scale);
    println!();

    let frames = recorder::load_frames(&input)
        .with_context(|| format!("Failed to load recording {}", input.display()))?;

    println!("Frames: {}", frames.len());
    if let Some(last) = frames.last() {
        println!("Duration: {:.2}s", last.frame_time);
        let avg_valid = frames
            .iter()
            .map(|f| f.summary().valid_points as f32)
            .sum::<f32>()
            / frames.len() as f32;
        println!("Valid points: {:.1}/17 avg", avg_valid);
    }

    let skeleton = Skeleton::mediapipe();
    let options = ExportOptions::from_config(&config.export);
    let bvh_text = bvh::export_motion_data(&skeleton, &frames, &options)
        .with_context(|| format!("Export failed ({} frames recorded)", frames.len()))?;

    if !bvh::validate(&bvh_text) {
        bail!("Generated BVH failed structural validation");
    }

    let output = output.unwrap_or_else(default_output_path);
    fs::write(&output, &bvh_text)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!();
    println!("Exported: {} ({} bytes)", output.display(), bvh_text.len());
    Ok(())
}
