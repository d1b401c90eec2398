use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_DEVICE: &str = "stub://camera";
const DEFAULT_WIDTH: u32 = 800;
const DEFAULT_HEIGHT: u32 = 600;
const DEFAULT_TARGET_FPS: u32 = 30;
const DEFAULT_PROCESSING_WIDTH: u32 = 320;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_WINDOW_NAME: &str = "Face & Hand Landmarks + Age Estimation";

#[derive(Debug, Deserialize, Default)]
struct AppConfigFile {
    window_name: Option<String>,
    processing_width: Option<u32>,
    camera: Option<CameraConfigFile>,
    landmarks: Option<LandmarkConfigFile>,
    age: Option<AgeConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct LandmarkConfigFile {
    enable_face: Option<bool>,
    enable_pose: Option<bool>,
    enable_hands: Option<bool>,
    min_contrast: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct AgeConfigFile {
    model_path: Option<String>,
    confidence_threshold: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub window_name: String,
    /// Width of the downscaled working copy handed to landmark inference.
    pub processing_width: u32,
    pub camera: CameraSettings,
    pub landmarks: LandmarkSettings,
    pub age: AgeSettings,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Device path, or `stub://…` for the synthetic scene.
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
}

#[derive(Debug, Clone)]
pub struct LandmarkSettings {
    pub enable_face: bool,
    pub enable_pose: bool,
    pub enable_hands: bool,
    /// Contrast gate for the luminance backend.
    pub min_contrast: f32,
}

#[derive(Debug, Clone)]
pub struct AgeSettings {
    /// Path to the age net ONNX model. `None` disables age estimation.
    pub model_path: Option<String>,
    pub confidence_threshold: f32,
}

impl AppConfig {
    /// Load from the file named by `ANNOTATE_CONFIG` (when set), then apply
    /// `ANNOTATE_*` environment overrides, then validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("ANNOTATE_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: AppConfigFile) -> Self {
        let camera = CameraSettings {
            device: file
                .camera
                .as_ref()
                .and_then(|camera| camera.device.clone())
                .unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
            width: file
                .camera
                .as_ref()
                .and_then(|camera| camera.width)
                .unwrap_or(DEFAULT_WIDTH),
            height: file
                .camera
                .as_ref()
                .and_then(|camera| camera.height)
                .unwrap_or(DEFAULT_HEIGHT),
            target_fps: file
                .camera
                .and_then(|camera| camera.target_fps)
                .unwrap_or(DEFAULT_TARGET_FPS),
        };
        let landmarks = LandmarkSettings {
            enable_face: file
                .landmarks
                .as_ref()
                .and_then(|landmarks| landmarks.enable_face)
                .unwrap_or(true),
            enable_pose: file
                .landmarks
                .as_ref()
                .and_then(|landmarks| landmarks.enable_pose)
                .unwrap_or(true),
            enable_hands: file
                .landmarks
                .as_ref()
                .and_then(|landmarks| landmarks.enable_hands)
                .unwrap_or(true),
            min_contrast: file
                .landmarks
                .and_then(|landmarks| landmarks.min_contrast)
                .unwrap_or(1.2),
        };
        let age = AgeSettings {
            model_path: file.age.as_ref().and_then(|age| age.model_path.clone()),
            confidence_threshold: file
                .age
                .and_then(|age| age.confidence_threshold)
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
        };
        Self {
            window_name: file
                .window_name
                .unwrap_or_else(|| DEFAULT_WINDOW_NAME.to_string()),
            processing_width: file.processing_width.unwrap_or(DEFAULT_PROCESSING_WIDTH),
            camera,
            landmarks,
            age,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("ANNOTATE_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(width) = std::env::var("ANNOTATE_PROCESSING_WIDTH") {
            self.processing_width = width
                .parse()
                .map_err(|_| anyhow!("ANNOTATE_PROCESSING_WIDTH must be an integer"))?;
        }
        if let Ok(path) = std::env::var("ANNOTATE_AGE_MODEL") {
            if !path.trim().is_empty() {
                self.age.model_path = Some(path);
            }
        }
        if let Ok(threshold) = std::env::var("ANNOTATE_AGE_THRESHOLD") {
            self.age.confidence_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("ANNOTATE_AGE_THRESHOLD must be a number"))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera resolution must be non-zero"));
        }
        if self.processing_width == 0 {
            return Err(anyhow!("processing_width must be >= 1"));
        }
        if self.processing_width > self.camera.width {
            return Err(anyhow!(
                "processing_width {} exceeds camera width {}",
                self.processing_width,
                self.camera.width
            ));
        }
        if !(0.0..=1.0).contains(&self.age.confidence_threshold) {
            return Err(anyhow!("age confidence_threshold must be within 0..=1"));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_file(AppConfigFile::default())
    }
}

fn read_config_file(path: &Path) -> Result<AppConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.camera.width, 800);
        assert_eq!(cfg.camera.height, 600);
        assert_eq!(cfg.processing_width, 320);
        assert!(cfg.age.model_path.is_none());
    }

    #[test]
    fn rejects_processing_width_above_capture_width() {
        let mut cfg = AppConfig::default();
        cfg.processing_width = cfg.camera.width + 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut cfg = AppConfig::default();
        cfg.age.confidence_threshold = 1.5;
        assert!(cfg.validate().is_err());
    }
}
