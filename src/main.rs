use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

mod args;

use args::Args;
use rusty_hands::camera::{self, CameraSource};
use rusty_hands::config::AppConfig;
use rusty_hands::detector::{HandDetector, OnnxHandDetector};
use rusty_hands::library::GestureLibrary;
use rusty_hands::output::WindowOutput;
use rusty_hands::overlay::OverlayStyle;
use rusty_hands::session::{Session, SessionOptions, StdinPrompt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rusty_hands=info")),
        )
        .init();

    let args = Args::parse();

    if args.list {
        return camera::list_cameras();
    }

    // 0. Load Config
    let config = AppConfig::load(&args.config)?;

    // 1. Load the gesture library before touching any device. A library that
    //    cannot be read stops here so it is never overwritten.
    let library_path = args
        .library
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.defaults.library_path));
    let library = GestureLibrary::load(&library_path).with_context(|| {
        format!(
            "Refusing to start with unreadable library {}",
            library_path.display()
        )
    })?;

    // 2. Setup Inference
    let model_path = args
        .model
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.defaults.model_path));
    let detector = OnnxHandDetector::new(&model_path, config.defaults.presence_threshold)?;
    info!("Active Detector: {}", detector.name());

    // 3. Setup Camera and Output
    let camera = CameraSource::new(args.cam_index)?;
    let window = WindowOutput::new(
        &config.ui.window_title,
        camera.width() as usize,
        camera.height() as usize,
    )?;

    let options = SessionOptions {
        mirror: args.mirror || config.defaults.mirror_mode,
        max_consecutive_failures: config.defaults.max_consecutive_failures,
        style: OverlayStyle::from_config(&config.ui),
    };

    // The session owns the camera; dropping it releases the stream on every path.
    let mut session = Session::new(camera, detector, window, StdinPrompt, library, options);
    if args.watch {
        session.watch()
    } else {
        session.run()
    }
}
