use clap::Parser;
use rusty_hands::config::AppConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Camera Index (default 0)
    #[arg(short, long, default_value_t = 0)]
    pub cam_index: u32,

    /// Hand landmark ONNX model (overrides config)
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Gesture library file (overrides config)
    #[arg(long)]
    pub library: Option<PathBuf>,

    /// Configuration file
    #[arg(long, default_value = AppConfig::PATH)]
    pub config: PathBuf,

    /// Mirror the camera output
    #[arg(long, default_value_t = false)]
    pub mirror: bool,

    /// Query every frame instead of waiting for key presses
    #[arg(long)]
    pub watch: bool,

    /// List available cameras
    #[arg(long)]
    pub list: bool,
}
