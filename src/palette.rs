/// Time-of-day palette.
/// The flower fades from a warm pink at midnight to white at 23:59.

/// Color at 00:00 (sRGB, 0-255).
pub const START: [f32; 3] = [252.0, 54.0, 92.0];
/// Color at 23:59.
pub const END: [f32; 3] = [255.0, 255.0, 255.0];
/// Background clear color (#2b2b2b).
pub const BACKGROUND: [f32; 3] = [43.0, 43.0, 43.0];

const MINUTES_PER_DAY: f32 = 24.0 * 60.0;

/// An sRGB color with straight alpha, all channels 0-255.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub rgb: [f32; 3],
    pub alpha: f32,
}

impl Color {
    pub fn new(rgb: [f32; 3], alpha: f32) -> Self {
        Self { rgb, alpha }
    }

    /// Premultiplied 0-1 RGBA for the petal pipeline.
    pub fn premultiplied(self) -> [f32; 4] {
        let a = (self.alpha / 255.0).clamp(0.0, 1.0);
        [
            self.rgb[0] / 255.0 * a,
            self.rgb[1] / 255.0 * a,
            self.rgb[2] / 255.0 * a,
            a,
        ]
    }

    pub fn to_egui(self) -> egui::Color32 {
        let [r, g, b] = self.rgb.map(|c| c.round().clamp(0.0, 255.0) as u8);
        egui::Color32::from_rgba_unmultiplied(r, g, b, self.alpha.round().clamp(0.0, 255.0) as u8)
    }
}

/// Lerp between two [f32; 3] arrays.
fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Gradient color at fraction `t`. Callers keep `t` in [0, 1].
pub fn gradient(t: f32) -> [f32; 3] {
    lerp3(START, END, t)
}

/// Day fraction for a wall-clock minute: 0.0 at 00:00, 1.0 at 23:59.
pub fn day_fraction(hour: u32, minute: u32) -> f32 {
    (hour * 60 + minute) as f32 / (MINUTES_PER_DAY - 1.0)
}

/// Flower color for the current minute.
pub fn live_color(hour: u32, minute: u32) -> [f32; 3] {
    gradient(day_fraction(hour, minute))
}

/// Color of the day's last minute, used for the petals that fall at midnight.
pub fn end_of_day_color() -> [f32; 3] {
    gradient(day_fraction(23, 59))
}
