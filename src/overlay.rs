//! Landmark overlay drawn straight into an RGB frame.

use image::{Rgb, RgbImage};

use crate::config::UiConfig;
use crate::types::Pose;

/// Bones of the hand skeleton as landmark index pairs.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (5, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (9, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (13, 17),
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub dot_size: usize,
    pub landmark_color: Rgb<u8>,
    pub connection_color: Rgb<u8>,
}

impl OverlayStyle {
    pub fn from_config(ui: &UiConfig) -> Self {
        let (r, g, b) = parse_hex(&ui.landmark_color_hex);
        let (cr, cg, cb) = parse_hex(&ui.connection_color_hex);
        Self {
            dot_size: ui.landmark_dot_size.max(1),
            landmark_color: Rgb([r, g, b]),
            connection_color: Rgb([cr, cg, cb]),
        }
    }
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self::from_config(&UiConfig::default())
    }
}

/// Copy of `frame` with the hand skeleton drawn on top. `hand` holds frame
/// coordinates normalized to `0..1`.
pub fn draw_hand(frame: &RgbImage, hand: &Pose, style: &OverlayStyle) -> RgbImage {
    let mut out = frame.clone();
    let (w, h) = (frame.width() as f64, frame.height() as f64);
    let to_px = |i: usize| {
        let p = hand.point(i);
        (p.x * w, p.y * h)
    };

    for &(a, b) in HAND_CONNECTIONS.iter() {
        draw_line(&mut out, to_px(a), to_px(b), style.connection_color);
    }
    for i in 0..hand.points().len() {
        let (x, y) = to_px(i);
        draw_dot(&mut out, x, y, style.dot_size, style.landmark_color);
    }
    out
}

fn put(img: &mut RgbImage, x: f64, y: f64, color: Rgb<u8>) {
    if x < 0.0 || y < 0.0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x < img.width() && y < img.height() {
        img.put_pixel(x, y, color);
    }
}

fn draw_line(img: &mut RgbImage, from: (f64, f64), to: (f64, f64), color: Rgb<u8>) {
    let mut t = 0.0;
    while t <= 1.0 {
        let px = from.0 + (to.0 - from.0) * t;
        let py = from.1 + (to.1 - from.1) * t;
        put(img, px, py, color);
        t += 0.005;
    }
}

fn draw_dot(img: &mut RgbImage, x: f64, y: f64, size: usize, color: Rgb<u8>) {
    let half = size as f64 / 2.0;
    for dy in 0..size {
        for dx in 0..size {
            put(img, x - half + dx as f64, y - half + dy as f64, color);
        }
    }
}

pub fn parse_hex(hex: &str) -> (u8, u8, u8) {
    if hex.len() == 7 && hex.starts_with('#') {
        let r = u8::from_str_radix(&hex[1..3], 16).unwrap_or(255);
        let g = u8::from_str_radix(&hex[3..5], 16).unwrap_or(0);
        let b = u8::from_str_radix(&hex[5..7], 16).unwrap_or(0);
        (r, g, b)
    } else {
        (255, 0, 0) // Default Red
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Landmark, LANDMARK_COUNT};

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#FF0000"), (255, 0, 0));
        assert_eq!(parse_hex("#00FF00"), (0, 255, 0));
        assert_eq!(parse_hex("#FFFFFF"), (255, 255, 255));
        assert_eq!(parse_hex("invalid"), (255, 0, 0)); // Fallback
    }

    #[test]
    fn test_draw_hand_marks_landmarks_and_leaves_input() {
        let frame = RgbImage::new(100, 100);
        let mut points = [Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        points[8] = Landmark::new(0.2, 0.3, 0.0);
        let hand = Pose::new(points);
        let style = OverlayStyle::default();

        let out = draw_hand(&frame, &hand, &style);
        assert_eq!(*out.get_pixel(50, 50), style.landmark_color);
        assert_eq!(*out.get_pixel(20, 30), style.landmark_color);
        assert_eq!(*frame.get_pixel(50, 50), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_points_outside_frame_are_clipped() {
        let frame = RgbImage::new(10, 10);
        let hand = Pose::new([Landmark::new(-1.0, 2.0, 0.0); LANDMARK_COUNT]);
        let out = draw_hand(&frame, &hand, &OverlayStyle::default());
        assert_eq!(out, frame);
    }
}
