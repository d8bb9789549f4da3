use glam::Vec2;

use crate::clock::ClockSample;
use crate::config::Settings;
use crate::palette::{self, Color};
use crate::render::petal::{Petal, MIN_VISIBLE_LENGTH};

/// Number of petals (one per hour).
pub const NUM_HOURS: usize = 24;
/// Alpha of completed hours (of 255).
pub const FULL_ALPHA: f32 = 128.0;
/// Period of the growing-petal pulse in milliseconds.
const PULSE_PERIOD_MS: f32 = 2000.0;

const LABEL_CURRENT: u8 = 255;
const LABEL_FUTURE: u8 = 180;
const LABEL_PAST: u8 = 120;

/// Screen direction of an hour in degrees. Hour 0 points straight up,
/// each hour advances 15 degrees clockwise.
pub fn hours_to_angle(hour: f32) -> f32 {
    -90.0 + hour * (360.0 / NUM_HOURS as f32)
}

/// Breathing alpha for the growing petal: 0 -> 128 -> 0 every two seconds.
pub fn pulse_alpha(second: u32, millis: u32) -> f32 {
    let phase = ((second % 2) * 1000 + millis) as f32;
    64.0 * (1.0 - (std::f32::consts::TAU * phase / PULSE_PERIOD_MS).cos())
}

/// Where things go on the current window.
#[derive(Debug, Clone, Copy)]
pub struct FlowerLayout {
    pub center: Vec2,
    pub petal_radius: f32,
    pub label_radius: f32,
    /// Y coordinate of the ground the midnight petals fall onto.
    pub floor_y: f32,
}

impl FlowerLayout {
    pub fn for_screen(width: f32, height: f32, settings: &Settings) -> Self {
        Self {
            center: Vec2::new(width * 0.5, height * 0.5),
            petal_radius: settings.petal_radius,
            label_radius: settings.label_radius,
            floor_y: height - settings.floor_margin,
        }
    }
}

/// Append the live flower's petals in increasing hour order.
pub fn build_petals(clock: &ClockSample, layout: &FlowerLayout, buf: &mut Vec<Petal>) {
    let rgb = palette::live_color(clock.hour, clock.minute);
    let growing_hour = (clock.hour as usize + 1) % NUM_HOURS;
    let growing_len = (clock.minute as f32 / 60.0) * layout.petal_radius;
    let pulse = pulse_alpha(clock.second, clock.millis);

    for h in 0..NUM_HOURS {
        let (length, alpha) = if h <= clock.hour as usize {
            (layout.petal_radius, FULL_ALPHA)
        } else if h == growing_hour {
            (growing_len, pulse)
        } else {
            continue;
        };
        if length < MIN_VISIBLE_LENGTH {
            continue;
        }
        buf.push(Petal {
            anchor: layout.center,
            angle: hours_to_angle(h as f32),
            length,
            color: Color::new(rgb, alpha),
        });
    }
}

/// An hour number placed around the flower.
#[derive(Debug, Clone, PartialEq)]
pub struct HourLabel {
    pub text: String,
    /// Center of the text.
    pub pos: Vec2,
    /// Text rotation in degrees.
    pub rotation: f32,
    pub gray: u8,
}

/// Lay out all 24 hour labels. Labels on the lower half are turned around
/// so their text never reads upside down.
pub fn hour_labels(center: Vec2, label_radius: f32, current_hour: u32) -> Vec<HourLabel> {
    (0..NUM_HOURS)
        .map(|h| {
            let angle = hours_to_angle(h as f32);
            let pos = center + Vec2::from_angle(angle.to_radians()) * label_radius;
            let rotation = if angle > 0.0 && angle < 180.0 {
                angle - 90.0
            } else {
                angle + 90.0
            };
            let gray = match (h as u32).cmp(&current_hour) {
                std::cmp::Ordering::Equal => LABEL_CURRENT,
                std::cmp::Ordering::Less => LABEL_PAST,
                std::cmp::Ordering::Greater => LABEL_FUTURE,
            };
            HourLabel {
                text: format!("{h:02}"),
                pos,
                rotation,
                gray,
            }
        })
        .collect()
}
