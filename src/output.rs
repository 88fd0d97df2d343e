use anyhow::Result;
use image::RgbImage;
use minifb::{Key, KeyRepeat};
use std::collections::VecDeque;

/// Where frames are shown and keys are read from.
pub trait Viewer {
    fn is_open(&self) -> bool;
    /// Shows `image` under `title` until the next call.
    fn show(&mut self, title: &str, image: &RgbImage) -> Result<()>;
    /// Processes window events and returns the first key pressed since the
    /// last poll, as a lowercase character. Escape reads as `x`.
    fn poll_key(&mut self) -> Result<Option<char>>;
}

pub struct WindowOutput {
    window: minifb::Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
    base_title: String,
    keys: KeyQueue,
}

impl WindowOutput {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = minifb::Window::new(
            title,
            width,
            height,
            minifb::WindowOptions {
                resize: true,
                ..minifb::WindowOptions::default()
            },
        )
        .map_err(|e| anyhow::anyhow!("Failed to create window: {}", e))?;

        window.set_target_fps(60);

        Ok(Self {
            window,
            buffer: vec![0; width * height],
            width,
            height,
            base_title: title.to_string(),
            keys: KeyQueue::default(),
        })
    }

    /// Pushes the buffer and records the keys reported by this update.
    fn update(&mut self) -> Result<()> {
        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| anyhow::anyhow!("Window update failed: {}", e))?;
        self.keys.record(self.window.get_keys_pressed(KeyRepeat::No));
        Ok(())
    }
}

impl Viewer for WindowOutput {
    fn is_open(&self) -> bool {
        self.window.is_open()
    }

    fn show(&mut self, title: &str, image: &RgbImage) -> Result<()> {
        let target_w = image.width() as usize;
        let target_h = image.height() as usize;
        if target_w != self.width || target_h != self.height {
            self.width = target_w;
            self.height = target_h;
        }
        if self.buffer.len() != self.width * self.height {
            self.buffer.resize(self.width * self.height, 0);
        }

        // RGB8 -> 0RGB
        for (dst, pixel) in self.buffer.iter_mut().zip(image.pixels()) {
            let r = pixel[0] as u32;
            let g = pixel[1] as u32;
            let b = pixel[2] as u32;
            *dst = (r << 16) | (g << 8) | b;
        }

        self.window.set_title(&format!("{} - {}", self.base_title, title));
        self.update()
    }

    fn poll_key(&mut self) -> Result<Option<char>> {
        if let Some(c) = self.keys.next() {
            return Ok(Some(c));
        }
        // redraw the current buffer; this also paces the caller's loop
        self.update()?;
        Ok(self.keys.next())
    }
}

/// Presses seen by any window update, oldest first, until polled.
#[derive(Debug, Default)]
struct KeyQueue(VecDeque<char>);

impl KeyQueue {
    fn record(&mut self, keys: impl IntoIterator<Item = Key>) {
        self.0.extend(keys.into_iter().filter_map(key_char));
    }

    fn next(&mut self) -> Option<char> {
        self.0.pop_front()
    }
}

fn key_char(key: Key) -> Option<char> {
    let c = match key {
        Key::A => 'a',
        Key::B => 'b',
        Key::C => 'c',
        Key::D => 'd',
        Key::E => 'e',
        Key::F => 'f',
        Key::G => 'g',
        Key::H => 'h',
        Key::I => 'i',
        Key::J => 'j',
        Key::K => 'k',
        Key::L => 'l',
        Key::M => 'm',
        Key::N => 'n',
        Key::O => 'o',
        Key::P => 'p',
        Key::Q => 'q',
        Key::R => 'r',
        Key::S => 's',
        Key::T => 't',
        Key::U => 'u',
        Key::V => 'v',
        Key::W => 'w',
        Key::X => 'x',
        Key::Y => 'y',
        Key::Z => 'z',
        Key::Escape => 'x',
        _ => return None,
    };
    Some(c)
}
