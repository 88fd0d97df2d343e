//! Interactive capture/query loop.
//!
//! Preview: every frame is shown and one key is polled.
//! - `x` ends the session, `r` reloads the library.
//! - `s`, `q` and `h` run the detector on the current frame and, if exactly
//!   one hand is found, enter the captured state.
//!
//! Captured: the result stays on screen until `q`/`x` (discard), `s` (prompt
//! for a name and save) or `h` (show the landmark overlay).
//!
//! Everything runs on one thread. A detector call that hangs stalls the
//! session; there is no timeout.

use anyhow::{Context, Result};
use colored::*;
use image::RgbImage;
use std::io::{self, BufRead, Write};
use tracing::{debug, error, warn};

use crate::camera::FrameSource;
use crate::detector::HandDetector;
use crate::library::GestureLibrary;
use crate::normalize::{normalize, NormalizedPose};
use crate::output::Viewer;
use crate::overlay::{draw_hand, OverlayStyle};
use crate::ranking::{best_match, rank, MatchOutcome};
use crate::types::HandDetection;

/// Asks the user for a gesture name.
pub trait NamePrompt {
    fn prompt_name(&mut self) -> Result<String>;
}

/// Reads the name from the terminal, blocking the loop.
pub struct StdinPrompt;

impl NamePrompt for StdinPrompt {
    fn prompt_name(&mut self) -> Result<String> {
        print!("name: ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read name from stdin")?;
        Ok(line.trim().to_string())
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub mirror: bool,
    pub max_consecutive_failures: u32,
    pub style: OverlayStyle,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mirror: false,
            max_consecutive_failures: 30,
            style: OverlayStyle::default(),
        }
    }
}

/// Key that moved the session out of preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Save,
    Query,
    Hands,
}

/// What was shown for a captured pose.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureResult {
    Landmarks,
    Match(MatchOutcome),
}

/// How the captured state was left.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Discarded,
    Saved(String),
    WindowClosed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Idle,
    Exit,
    Reloaded,
    UnexpectedHandCount(usize),
    Captured {
        result: CaptureResult,
        decision: Decision,
    },
    Queried(MatchOutcome),
}

pub struct Session<S, D, V, P> {
    source: S,
    detector: D,
    viewer: V,
    prompt: P,
    library: GestureLibrary,
    options: SessionOptions,
}

impl<S, D, V, P> Session<S, D, V, P>
where
    S: FrameSource,
    D: HandDetector,
    V: Viewer,
    P: NamePrompt,
{
    pub fn new(
        source: S,
        detector: D,
        viewer: V,
        prompt: P,
        library: GestureLibrary,
        options: SessionOptions,
    ) -> Self {
        Self {
            source,
            detector,
            viewer,
            prompt,
            library,
            options,
        }
    }

    pub fn library(&self) -> &GestureLibrary {
        &self.library
    }

    /// Runs the key-driven capture/query loop until `x` or the window closes.
    pub fn run(&mut self) -> Result<()> {
        println!("Controls: [s] save  [q] query  [h] hand landmarks  [r] reload library  [x] exit");
        self.drive(Self::handle_frame)
    }

    /// Queries every frame against the library until `x` or the window closes.
    pub fn watch(&mut self) -> Result<()> {
        println!("Watching. [x] exit");
        self.drive(Self::watch_frame)
    }

    fn drive(
        &mut self,
        mut handle: impl FnMut(&mut Self, RgbImage) -> Result<StepOutcome>,
    ) -> Result<()> {
        let mut failures = 0u32;
        while self.viewer.is_open() {
            let frame = match self.next_frame() {
                Ok(frame) => {
                    failures = 0;
                    frame
                }
                Err(e) => {
                    failures += 1;
                    warn!("Frame capture failed ({} in a row): {:#}", failures, e);
                    if failures >= self.options.max_consecutive_failures {
                        return Err(e.context("Camera stopped delivering frames"));
                    }
                    continue;
                }
            };

            match handle(self, frame) {
                Ok(StepOutcome::Exit) => break,
                Ok(outcome) => debug!("{:?}", outcome),
                Err(e) => error!("{:#}", e),
            }
        }
        Ok(())
    }

    fn next_frame(&mut self) -> Result<RgbImage> {
        let mut frame = self.source.capture()?;
        if self.options.mirror {
            image::imageops::flip_horizontal_in_place(&mut frame);
        }
        Ok(frame)
    }

    /// One preview iteration: show `frame`, poll a key and act on it.
    pub fn handle_frame(&mut self, frame: RgbImage) -> Result<StepOutcome> {
        self.viewer.show("frame", &frame)?;
        let trigger = match self.viewer.poll_key()? {
            Some('x') => return Ok(StepOutcome::Exit),
            Some('r') => {
                self.library.reload().context("Failed to reload gesture library")?;
                println!("{}", format!("Reloaded {} examples", self.library.len()).green());
                return Ok(StepOutcome::Reloaded);
            }
            Some('s') => Trigger::Save,
            Some('q') => Trigger::Query,
            Some('h') => Trigger::Hands,
            _ => return Ok(StepOutcome::Idle),
        };

        let hand = match self.detect_one(&frame)? {
            Ok(hand) => hand,
            Err(count) => return Ok(StepOutcome::UnexpectedHandCount(count)),
        };
        let pose = normalize(&hand.world)?;
        let overlay = draw_hand(&frame, &hand.image, &self.options.style);

        let result = match trigger {
            Trigger::Hands => {
                self.viewer.show("hand landmarks", &overlay)?;
                CaptureResult::Landmarks
            }
            Trigger::Save | Trigger::Query => {
                let outcome = best_match(rank(&pose, &self.library));
                report(&outcome)?;
                self.present(&outcome, &overlay)?;
                CaptureResult::Match(outcome)
            }
        };

        let decision = self.await_decision(&frame, pose, &overlay)?;
        Ok(StepOutcome::Captured { result, decision })
    }

    /// One watch iteration: show `frame` and query whatever hand it holds.
    pub fn watch_frame(&mut self, frame: RgbImage) -> Result<StepOutcome> {
        self.viewer.show("frame", &frame)?;
        if self.viewer.poll_key()? == Some('x') {
            return Ok(StepOutcome::Exit);
        }

        let hand = match self.detect_one(&frame)? {
            Ok(hand) => hand,
            Err(count) => return Ok(StepOutcome::UnexpectedHandCount(count)),
        };
        let pose = normalize(&hand.world)?;
        let outcome = best_match(rank(&pose, &self.library));
        report_brief(&outcome);
        Ok(StepOutcome::Queried(outcome))
    }

    /// Runs the detector; `Err(count)` when it did not find exactly one hand.
    fn detect_one(
        &mut self,
        frame: &RgbImage,
    ) -> Result<std::result::Result<HandDetection, usize>> {
        let hands = self.detector.detect(frame)?;
        match <[HandDetection; 1]>::try_from(hands) {
            Ok([hand]) => Ok(Ok(hand)),
            Err(hands) => {
                println!("{}", format!("unexpected number of hands: {}", hands.len()).yellow());
                Ok(Err(hands.len()))
            }
        }
    }

    fn present(&mut self, outcome: &MatchOutcome, overlay: &RgbImage) -> Result<()> {
        match outcome {
            MatchOutcome::NoMatch => self.viewer.show("no match", overlay),
            MatchOutcome::Ambiguous { .. } => self.viewer.show("multiple match", overlay),
            MatchOutcome::Unique(best) => {
                let path = self.library.image_path(&best.image_reference);
                match image::open(&path) {
                    Ok(img) => self.viewer.show("match", &img.to_rgb8()),
                    Err(e) => {
                        warn!("Cannot open reference image {:?}: {}", path, e);
                        self.viewer.show("match", overlay)
                    }
                }
            }
        }
    }

    fn await_decision(
        &mut self,
        frame: &RgbImage,
        pose: NormalizedPose,
        overlay: &RgbImage,
    ) -> Result<Decision> {
        loop {
            if !self.viewer.is_open() {
                return Ok(Decision::WindowClosed);
            }
            match self.viewer.poll_key()? {
                Some('q') | Some('x') => return Ok(Decision::Discarded),
                Some('s') => {
                    let name = self.prompt.prompt_name()?;
                    let reference = self.library.save(&name, pose, Some(frame))?;
                    println!("{}", format!("Saved '{}' as {}", name.trim(), reference).green());
                    return Ok(Decision::Saved(reference));
                }
                Some('h') => self.viewer.show("hand landmarks", overlay)?,
                _ => {}
            }
        }
    }
}

fn report(outcome: &MatchOutcome) -> Result<()> {
    match outcome {
        MatchOutcome::NoMatch => println!("{}", "matched nothing".yellow()),
        MatchOutcome::Ambiguous { score, names } => {
            println!("{}", format!("multiple names matched at {}: {:?}", score, names).yellow())
        }
        MatchOutcome::Unique(best) => {
            println!("{}", serde_json::to_string_pretty(&best.closeness)?);
            println!(
                "{}",
                format!("matched {} {} {}", best.name, best.score, best.image_reference).green()
            );
        }
    }
    Ok(())
}

fn report_brief(outcome: &MatchOutcome) {
    match outcome {
        MatchOutcome::NoMatch => println!("matched nothing"),
        MatchOutcome::Ambiguous { names, .. } => println!("multiple names matched: {:?}", names),
        MatchOutcome::Unique(best) => println!("matched {} {}", best.score, best.image_reference),
    }
}
