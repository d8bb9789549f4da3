use glam::Vec2;

use crate::palette;

/// Caption under the legend; its measured width sets the bar width.
pub const LEGEND_CAPTION: &str = "closer to midnight";
pub const TITLE: &str = "Flower\nclock";
/// Top-left corner of the title.
pub const TITLE_ANCHOR: Vec2 = Vec2::new(40.0, 40.0);

const MARGIN: f32 = 40.0;
const BAR_HEIGHT: f32 = 16.0;
/// Gap between the bar and the arrow line.
const ARROW_GAP: f32 = 16.0;
const ARROW_HEAD_LEN: f32 = 7.0;
const ARROW_HEAD_HALF: f32 = 4.0;
/// Gap between the bar and the caption's top edge.
const CAPTION_GAP: f32 = 32.0;
/// Readout baseline distance from the bottom edge.
const READOUT_LIFT: f32 = 36.0;

/// Placement of the gradient legend in the top-right corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendLayout {
    /// Top-left corner of the gradient bar.
    pub origin: Vec2,
    pub width: f32,
    pub height: f32,
}

impl LegendLayout {
    pub fn new(screen_width: f32, caption_width: f32) -> Self {
        Self {
            origin: Vec2::new(screen_width - caption_width - MARGIN, MARGIN),
            width: caption_width,
            height: BAR_HEIGHT,
        }
    }

    /// One-pixel gradient columns as (x offset, color).
    /// Empty when the caption could not be measured.
    pub fn gradient_samples(&self) -> Vec<(f32, [f32; 3])> {
        if !self.width.is_finite() || self.width <= 0.0 {
            return Vec::new();
        }
        let columns = self.width.floor() as usize;
        (0..=columns)
            .map(|i| {
                let x = i as f32;
                (x, palette::gradient(x / self.width))
            })
            .collect()
    }

    /// Horizontal line under the bar, left to right.
    pub fn arrow_line(&self) -> [Vec2; 2] {
        let y = self.origin.y + self.height + ARROW_GAP;
        [
            Vec2::new(self.origin.x, y),
            Vec2::new(self.origin.x + self.width, y),
        ]
    }

    /// Arrowhead at the right end of the line, pointing right.
    pub fn arrow_head(&self) -> [Vec2; 3] {
        let [_, tip] = self.arrow_line();
        [
            tip,
            Vec2::new(tip.x - ARROW_HEAD_LEN, tip.y - ARROW_HEAD_HALF),
            Vec2::new(tip.x - ARROW_HEAD_LEN, tip.y + ARROW_HEAD_HALF),
        ]
    }

    /// Top-right corner of the caption.
    pub fn caption_anchor(&self) -> Vec2 {
        Vec2::new(self.origin.x + self.width, self.origin.y + self.height + CAPTION_GAP)
    }
}

/// Bottom-center anchor of the digital readout.
pub fn readout_anchor(screen_width: f32, screen_height: f32) -> Vec2 {
    Vec2::new(screen_width * 0.5, screen_height - READOUT_LIFT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legend_hugs_top_right() {
        let legend = LegendLayout::new(1280.0, 150.0);
        assert_eq!(legend.origin, Vec2::new(1090.0, 40.0));
        assert_eq!(legend.caption_anchor(), Vec2::new(1240.0, 88.0));
    }

    #[test]
    fn test_gradient_spans_palette() {
        let legend = LegendLayout::new(800.0, 100.0);
        let samples = legend.gradient_samples();
        assert_eq!(samples.len(), 101);
        assert_eq!(samples[0], (0.0, palette::START));
        assert_eq!(samples[100], (100.0, palette::END));
    }

    #[test]
    fn test_fractional_width_stays_inside_bar() {
        let samples = LegendLayout::new(800.0, 10.5).gradient_samples();
        assert_eq!(samples.len(), 11);
        assert!(samples.iter().all(|&(x, _)| x <= 10.5));
    }

    #[test]
    fn test_unmeasured_caption_draws_nothing() {
        assert!(LegendLayout::new(800.0, 0.0).gradient_samples().is_empty());
        assert!(LegendLayout::new(800.0, -3.0).gradient_samples().is_empty());
        assert!(LegendLayout::new(800.0, f32::NAN).gradient_samples().is_empty());
    }

    #[test]
    fn test_arrow_points_right_below_bar() {
        let legend = LegendLayout::new(500.0, 100.0);
        let [start, end] = legend.arrow_line();
        assert_eq!(start, Vec2::new(360.0, 72.0));
        assert_eq!(end, Vec2::new(460.0, 72.0));
        let [tip, upper, lower] = legend.arrow_head();
        assert_eq!(tip, end);
        assert!(upper.x < tip.x && lower.x < tip.x);
        assert_eq!(upper.y + lower.y, 2.0 * tip.y);
    }

    #[test]
    fn test_readout_anchor() {
        assert_eq!(readout_anchor(800.0, 600.0), Vec2::new(400.0, 564.0));
    }
}
