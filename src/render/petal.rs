use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::palette::Color;

/// Petals shorter than this are not drawn.
pub const MIN_VISIBLE_LENGTH: f32 = 1.0;
/// Line segments per Bézier side when flattening.
const CURVE_SEGMENTS: usize = 16;
/// Triangle-fan vertices emitted for one visible petal.
pub const VERTICES_PER_PETAL: usize = CURVE_SEGMENTS * 2 * 3;

/// Per-vertex data for petal triangles.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PetalVertex {
    pub position: [f32; 2],
    pub color: [f32; 4], // premultiplied RGBA
}

/// One petal to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Petal {
    /// Base of the petal (logical pixels).
    pub anchor: Vec2,
    /// Direction in degrees: 0 = east, positive clockwise on screen.
    pub angle: f32,
    pub length: f32,
    pub color: Color,
}

/// Proportions shared by every petal on screen.
#[derive(Debug, Clone, Copy)]
pub struct PetalShape {
    pub max_length: f32,
    pub max_width: f32,
}

impl PetalShape {
    pub fn new(max_length: f32, max_width: f32) -> Self {
        Self {
            max_length,
            max_width,
        }
    }

    /// Width scales with length so short petals stay slender.
    pub fn width_for(&self, length: f32) -> f32 {
        if self.max_length <= 0.0 {
            return 0.0;
        }
        (length / self.max_length) * self.max_width
    }

    /// Closed outline of the lens, base first, tip at index `CURVE_SEGMENTS`.
    /// Returns false (and writes nothing) for petals too short to see.
    pub fn outline(&self, petal: &Petal, out: &mut Vec<Vec2>) -> bool {
        let len = petal.length;
        if !(len >= MIN_VISIBLE_LENGTH) {
            return false;
        }
        let w = self.width_for(len);

        // Local frame: base at origin, tip straight "up" at (0, -len).
        let base = Vec2::ZERO;
        let tip = Vec2::new(0.0, -len);
        let right = [base, Vec2::new(w, -len * 0.25), Vec2::new(w, -len * 0.75), tip];
        let left = [tip, Vec2::new(-w, -len * 0.75), Vec2::new(-w, -len * 0.25), base];

        let rot = Vec2::from_angle((petal.angle + 90.0).to_radians());
        let to_world = |p: Vec2| petal.anchor + rot.rotate(p);

        for i in 0..=CURVE_SEGMENTS {
            let t = i as f32 / CURVE_SEGMENTS as f32;
            out.push(to_world(cubic(right, t)));
        }
        for i in 1..CURVE_SEGMENTS {
            let t = i as f32 / CURVE_SEGMENTS as f32;
            out.push(to_world(cubic(left, t)));
        }
        true
    }

    /// Append the petal as a triangle fan around its midpoint.
    pub fn tessellate(&self, petal: &Petal, scratch: &mut Vec<Vec2>, out: &mut Vec<PetalVertex>) {
        scratch.clear();
        if !self.outline(petal, scratch) {
            return;
        }

        let dir = Vec2::from_angle(petal.angle.to_radians());
        let center = petal.anchor + dir * (petal.length * 0.5);
        let color = petal.color.premultiplied();
        let vertex = |p: Vec2| PetalVertex {
            position: p.into(),
            color,
        };

        let n = scratch.len();
        for i in 0..n {
            let a = scratch[i];
            let b = scratch[(i + 1) % n];
            out.push(vertex(center));
            out.push(vertex(a));
            out.push(vertex(b));
        }
    }
}

/// Point on a cubic Bézier.
fn cubic([p0, p1, p2, p3]: [Vec2; 4], t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}
