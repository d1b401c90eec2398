//! annotate - live annotation viewer
//!
//! This application:
//! 1. Captures frames from the configured device (V4L2 or synthetic)
//! 2. Runs landmark detection on a downscaled copy in a background worker
//! 3. Runs age estimation on face crops in a second background worker
//! 4. Overlays whatever results are available onto each frame
//! 5. Hands frames to the configured display sink
//!
//! Configuration comes from the file named by ANNOTATE_CONFIG plus
//! ANNOTATE_* environment overrides; see `config`.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use live_annotate::{
    open_capture, AgeSettings, AppConfig, DisplaySink, FrameStream, HeadlessSink, InferenceWorker,
    LuminanceLandmarks, Orchestrator, OverlayRenderer,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = AppConfig::load()?;
    log::info!("{} starting", cfg.window_name);
    log::info!(
        "camera {} ({}x{} @ {} fps), processing width {}",
        cfg.camera.device,
        cfg.camera.width,
        cfg.camera.height,
        cfg.camera.target_fps,
        cfg.processing_width
    );

    let capture = open_capture(&cfg.camera)?;
    let stream = FrameStream::spawn(capture);

    let landmarks = InferenceWorker::spawn(
        LuminanceLandmarks::new().with_min_contrast(cfg.landmarks.min_contrast),
    );
    let age = build_age_worker(&cfg.age);

    let renderer = OverlayRenderer::new(cfg.landmarks.clone());
    let sink = build_sink()?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .expect("error setting Ctrl-C handler");
    }

    let mut orchestrator = Orchestrator::new(
        stream,
        landmarks,
        age,
        renderer,
        sink,
        cfg.processing_width,
    )
    .with_stop_flag(stop);

    log::info!("render loop running (Ctrl-C to exit)");
    let reason = orchestrator.run()?;
    log::info!(
        "stopped ({:?}), {} frames rendered",
        reason,
        orchestrator.frames_rendered()
    );
    Ok(())
}

fn build_age_worker(
    settings: &AgeSettings,
) -> Option<InferenceWorker<live_annotate::AgeEstimate>> {
    let Some(path) = settings.model_path.as_deref() else {
        log::info!("age estimation disabled: no model configured");
        return None;
    };

    #[cfg(feature = "backend-tract")]
    {
        log::info!("age estimation enabled, model {}", path);
        Some(InferenceWorker::spawn(live_annotate::AgeNetBackend::new(
            path,
            settings.confidence_threshold,
        )))
    }
    #[cfg(not(feature = "backend-tract"))]
    {
        log::warn!(
            "age model {} configured but this build lacks the backend-tract feature; \
             age estimation disabled",
            path
        );
        None
    }
}

/// Pick the display sink. With the snapshot-sink feature and
/// ANNOTATE_SNAPSHOT_DIR set, overlays are written as periodic JPEGs;
/// otherwise frames are consumed headlessly and the overlay state is only
/// visible through the log.
fn build_sink() -> Result<Box<dyn DisplaySink>> {
    #[cfg(feature = "snapshot-sink")]
    if let Ok(dir) = std::env::var("ANNOTATE_SNAPSHOT_DIR") {
        if !dir.trim().is_empty() {
            let every = std::env::var("ANNOTATE_SNAPSHOT_EVERY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30);
            log::info!("writing every {}th frame to {}", every, dir);
            return Ok(Box::new(live_annotate::SnapshotSink::new(dir, every)?));
        }
    }
    Ok(Box::new(HeadlessSink::new()))
}
