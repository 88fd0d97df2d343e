use anyhow::{bail, Context, Result};
use image::{imageops::FilterType, RgbImage};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use tracing::{debug, info};

use crate::types::{HandDetection, Landmark, Pose, LANDMARK_COUNT};

/// Finds hands in a frame. Zero hands is a valid answer, not an error.
pub trait HandDetector {
    fn name(&self) -> String;
    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<HandDetection>>;
}

const INPUT_SIZE: u32 = 224;

// Output order of the MediaPipe hand landmark model.
const SCREEN_LANDMARKS: usize = 0;
const HAND_PRESENCE: usize = 1;
const WORLD_LANDMARKS: usize = 3;

/// Single-hand landmark model (MediaPipe `hand_landmark` exported to ONNX),
/// run on the centre square of the frame.
pub struct OnnxHandDetector {
    session: Session,
    presence_threshold: f32,
}

impl OnnxHandDetector {
    pub fn new(model_path: &Path, presence_threshold: f32) -> Result<Self> {
        if !model_path.exists() {
            bail!("Hand landmark model not found at {}", model_path.display());
        }

        info!("Loading hand landmark model from {}...", model_path.display());
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .with_execution_providers([
                ort::execution_providers::CPUExecutionProvider::default().build(),
            ])?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load {}", model_path.display()))?;

        Ok(Self {
            session,
            presence_threshold,
        })
    }
}

impl HandDetector for OnnxHandDetector {
    fn name(&self) -> String {
        "Hand Landmarks (21 pts)".to_string()
    }

    fn detect(&mut self, frame: &RgbImage) -> Result<Vec<HandDetection>> {
        let crop = CenterCrop::of(frame.width(), frame.height());
        if crop.side == 0 {
            return Ok(Vec::new());
        }

        let square =
            image::imageops::crop_imm(frame, crop.x, crop.y, crop.side, crop.side).to_image();
        let resized =
            image::imageops::resize(&square, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

        // NHWC, 0..1
        let mut input_data = Vec::with_capacity((INPUT_SIZE * INPUT_SIZE * 3) as usize);
        for pixel in resized.pixels() {
            input_data.push(pixel[0] as f32 / 255.0);
            input_data.push(pixel[1] as f32 / 255.0);
            input_data.push(pixel[2] as f32 / 255.0);
        }

        let shape = vec![1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3];
        let input = Tensor::from_array((shape, input_data))?;
        let outputs = self.session.run(ort::inputs![input])?;

        let (_, presence) = outputs[HAND_PRESENCE].try_extract_tensor::<f32>()?;
        let score = presence.first().copied().unwrap_or(0.0);
        if score < self.presence_threshold {
            debug!("No hand (presence {:.2})", score);
            return Ok(Vec::new());
        }

        let (_, screen) = outputs[SCREEN_LANDMARKS].try_extract_tensor::<f32>()?;
        let (_, world) = outputs[WORLD_LANDMARKS].try_extract_tensor::<f32>()?;
        if screen.len() < LANDMARK_COUNT * 3 || world.len() < LANDMARK_COUNT * 3 {
            bail!(
                "Unexpected landmark output size: screen {}, world {}",
                screen.len(),
                world.len()
            );
        }

        let world = Pose::try_from(triples(world, |x, y, z| Landmark::new(x, y, z)))?;
        let image = Pose::try_from(triples(screen, |x, y, z| {
            crop.to_frame(x, y, z, frame.width(), frame.height())
        }))?;

        Ok(vec![HandDetection { world, image }])
    }
}

fn triples(data: &[f32], map: impl Fn(f64, f64, f64) -> Landmark) -> Vec<Landmark> {
    data.chunks_exact(3)
        .take(LANDMARK_COUNT)
        .map(|c| map(c[0] as f64, c[1] as f64, c[2] as f64))
        .collect()
}

/// The largest centred square of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CenterCrop {
    x: u32,
    y: u32,
    side: u32,
}

impl CenterCrop {
    fn of(width: u32, height: u32) -> Self {
        let side = width.min(height);
        Self {
            x: (width - side) / 2,
            y: (height - side) / 2,
            side,
        }
    }

    /// Model input pixels -> frame coordinates normalized to `0..1`.
    fn to_frame(&self, mx: f64, my: f64, mz: f64, width: u32, height: u32) -> Landmark {
        let scale = self.side as f64 / INPUT_SIZE as f64;
        Landmark::new(
            (self.x as f64 + mx * scale) / width as f64,
            (self.y as f64 + my * scale) / height as f64,
            mz / INPUT_SIZE as f64,
        )
    }
}
