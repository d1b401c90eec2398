use std::sync::Mutex;

use tempfile::NamedTempFile;

use live_annotate::AppConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "ANNOTATE_CONFIG",
        "ANNOTATE_DEVICE",
        "ANNOTATE_PROCESSING_WIDTH",
        "ANNOTATE_AGE_MODEL",
        "ANNOTATE_AGE_THRESHOLD",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = AppConfig::load().expect("load config");

    assert_eq!(cfg.camera.device, "stub://camera");
    assert_eq!(cfg.camera.width, 800);
    assert_eq!(cfg.camera.height, 600);
    assert_eq!(cfg.processing_width, 320);
    assert!(cfg.landmarks.enable_face);
    assert!(cfg.age.model_path.is_none());
    assert_eq!(cfg.age.confidence_threshold, 0.5);

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "window_name": "bench rig",
        "processing_width": 240,
        "camera": {
            "device": "/dev/video2",
            "width": 1280,
            "height": 720,
            "target_fps": 25
        },
        "landmarks": {
            "enable_pose": false,
            "min_contrast": 1.5
        },
        "age": {
            "model_path": "models/age_net.onnx",
            "confidence_threshold": 0.6
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("ANNOTATE_CONFIG", file.path());
    std::env::set_var("ANNOTATE_DEVICE", "stub://override");
    std::env::set_var("ANNOTATE_AGE_THRESHOLD", "0.7");

    let cfg = AppConfig::load().expect("load config");

    assert_eq!(cfg.window_name, "bench rig");
    assert_eq!(cfg.processing_width, 240);
    // Env wins over the file.
    assert_eq!(cfg.camera.device, "stub://override");
    assert_eq!(cfg.camera.width, 1280);
    assert_eq!(cfg.camera.height, 720);
    assert_eq!(cfg.camera.target_fps, 25);
    assert!(cfg.landmarks.enable_face);
    assert!(!cfg.landmarks.enable_pose);
    assert_eq!(cfg.landmarks.min_contrast, 1.5);
    assert_eq!(cfg.age.model_path.as_deref(), Some("models/age_net.onnx"));
    assert_eq!(cfg.age.confidence_threshold, 0.7);

    clear_env();
}

#[test]
fn rejects_invalid_processing_width() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("ANNOTATE_PROCESSING_WIDTH", "4096");
    assert!(AppConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_unparseable_env_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("ANNOTATE_AGE_THRESHOLD", "not-a-number");
    assert!(AppConfig::load().is_err());

    clear_env();
}
