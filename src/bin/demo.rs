//! demo - end-to-end synthetic run of the annotation pipeline
//!
//! Runs the full pipeline against the synthetic capture source with the
//! dependency-free backends, then prints what happened. Useful as a smoke
//! test on machines without a camera or model files.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::time::Duration;

use live_annotate::{
    CameraSettings, FrameStream, HeadlessSink, InferenceWorker, LandmarkSettings,
    LuminanceLandmarks, Orchestrator, OverlayRenderer, StubAge, SyntheticCapture,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Duration of the run in seconds.
    #[arg(long, default_value_t = 5)]
    seconds: u64,
    /// Synthetic capture frame rate.
    #[arg(long, default_value_t = 30)]
    fps: u32,
    /// Capture width.
    #[arg(long, default_value_t = 320)]
    width: u32,
    /// Capture height.
    #[arg(long, default_value_t = 240)]
    height: u32,
    /// Width of the downscaled working copy fed to landmark inference.
    #[arg(long, default_value_t = 160)]
    processing_width: u32,
    /// Confidence gate for the stub age backend.
    #[arg(long, default_value_t = 0.5)]
    age_threshold: f32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.fps == 0 {
        return Err(anyhow!("fps must be >= 1"));
    }
    if args.processing_width == 0 || args.processing_width > args.width {
        return Err(anyhow!("processing width must be within 1..=width"));
    }

    stage("start synthetic capture");
    let camera = CameraSettings {
        device: "stub://demo".to_string(),
        width: args.width,
        height: args.height,
        target_fps: args.fps,
    };
    let stream = FrameStream::spawn(Box::new(SyntheticCapture::new(camera)));

    stage("start inference workers");
    let landmarks = InferenceWorker::spawn(LuminanceLandmarks::new());
    let age = InferenceWorker::spawn(StubAge::new(args.age_threshold));
    let landmark_reader = landmarks.reader();
    let age_reader = age.reader();

    let renderer = OverlayRenderer::new(LandmarkSettings {
        enable_face: true,
        enable_pose: true,
        enable_hands: true,
        min_contrast: 1.2,
    });
    let sink = Box::new(
        HeadlessSink::new()
            .with_duration(Duration::from_secs(args.seconds))
            .with_throttle(Duration::from_millis(5)),
    );

    stage("run render loop");
    let mut orchestrator = Orchestrator::new(
        stream,
        landmarks,
        Some(age),
        renderer,
        sink,
        args.processing_width,
    );
    let reason = orchestrator.run()?;

    let landmark_result = landmark_reader.read();
    let age_result = age_reader.read();

    println!("demo summary:");
    println!("  frames rendered: {}", orchestrator.frames_rendered());
    println!("  stop reason: {:?}", reason);
    println!(
        "  landmark result: {}",
        match &landmark_result {
            Some(result) if result.face_box().is_some() => "face detected".to_string(),
            Some(_) => "present, no face".to_string(),
            None => "none".to_string(),
        }
    );
    println!(
        "  age estimate: {}",
        match &age_result {
            Some(estimate) => format!(
                "{} (confidence {:.2})",
                estimate.bucket, estimate.confidence
            ),
            None => "none".to_string(),
        }
    );

    if orchestrator.frames_rendered() == 0 {
        return Err(anyhow!("demo rendered no frames"));
    }
    Ok(())
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}
