pub mod layout;

use std::path::Path;
use std::sync::Arc;

use egui::epaint::TextShape;
use egui::{Align2, Color32, FontFamily, FontId, Stroke};
use glam::Vec2;
use winit::window::Window;

use self::layout::{LegendLayout, LEGEND_CAPTION, TITLE, TITLE_ANCHOR};
use crate::clock::ClockSample;
use crate::config::Settings;
use crate::flower::HourLabel;
use crate::palette::Color;
use crate::render::GpuState;

/// Font family for labels, legend and readout.
const TEXT_FAMILY: &str = "clock-text";
/// Font family for the title.
const TITLE_FAMILY: &str = "clock-title";

const TEXT_SIZE: f32 = 16.0;
const TITLE_SIZE: f32 = 45.0;
const CHROME_GRAY: u8 = 180;

/// Everything the overlay needs for one frame.
pub struct ChromeFrame<'a> {
    pub clock: &'a ClockSample,
    pub labels: &'a [HourLabel],
    /// Logical window size.
    pub width: f32,
    pub height: f32,
}

/// Text and decorations painted over the petals with egui.
pub struct ChromeOverlay {
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl ChromeOverlay {
    pub fn new(window: &Window, gpu: &GpuState, settings: &Settings) -> Self {
        let egui_ctx = egui::Context::default();
        egui_ctx.set_fonts(font_definitions(
            settings.text_font.as_deref(),
            settings.title_font.as_deref(),
        ));

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(gpu.device.limits().max_texture_dimension_2d as usize),
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.surface_config.format,
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                dithering: true,
                predictable_texture_filtering: false,
            },
        );

        Self {
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    /// Keep egui's idea of the window size in sync. Other input is ignored.
    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) {
        use winit::event::WindowEvent;
        if matches!(
            event,
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. }
        ) {
            let _ = self.egui_state.on_window_event(window, event);
        }
    }

    /// Run the egui frame and produce paint output.
    /// Returns (clipped_primitives, textures_delta, screen_descriptor).
    pub fn run_frame(
        &mut self,
        window: &Window,
        frame: &ChromeFrame<'_>,
        size_in_pixels: [u32; 2],
    ) -> (
        Vec<egui::epaint::ClippedPrimitive>,
        egui::TexturesDelta,
        egui_wgpu::ScreenDescriptor,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        let ctx = self.egui_ctx.clone();
        let full_output = ctx.run(raw_input, |ctx| paint(ctx, frame));

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let pixels_per_point = full_output.pixels_per_point;
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes, pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point,
        };

        (clipped_primitives, full_output.textures_delta, screen_descriptor)
    }

    /// Upload egui textures and buffers. Call before the overlay render pass.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::epaint::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) -> Vec<wgpu::CommandBuffer> {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor)
    }

    /// Render egui into the given render pass.
    pub fn render(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::epaint::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures after present.
    pub fn free_textures(&mut self, textures_delta: &egui::TexturesDelta) {
        for &id in &textures_delta.free {
            self.egui_renderer.free_texture(&id);
        }
    }
}

fn text_font(size: f32) -> FontId {
    FontId::new(size, FontFamily::Name(TEXT_FAMILY.into()))
}

fn pos2(v: Vec2) -> egui::Pos2 {
    egui::pos2(v.x, v.y)
}

/// Paint labels, title, legend and readout on the background layer.
fn paint(ctx: &egui::Context, frame: &ChromeFrame<'_>) {
    let painter = ctx.layer_painter(egui::LayerId::background());
    let gray = Color32::from_gray(CHROME_GRAY);

    // --- Hour labels, centered and turned along the circle ---
    for label in frame.labels {
        let color = Color32::from_gray(label.gray);
        let galley = painter.layout_no_wrap(label.text.clone(), text_font(TEXT_SIZE), color);
        let angle = label.rotation.to_radians();
        let half = galley.size() / 2.0;
        let top_left = pos2(label.pos) - egui::emath::Rot2::from_angle(angle) * half;
        painter.add(TextShape::new(top_left, galley, color).with_angle(angle));
    }

    // --- Title ---
    painter.text(
        pos2(TITLE_ANCHOR),
        Align2::LEFT_TOP,
        TITLE,
        FontId::new(TITLE_SIZE, FontFamily::Name(TITLE_FAMILY.into())),
        Color32::WHITE,
    );

    // --- Legend ---
    let caption = painter.layout_no_wrap(LEGEND_CAPTION.to_owned(), text_font(TEXT_SIZE), gray);
    let legend = LegendLayout::new(frame.width, caption.size().x);
    for (dx, rgb) in legend.gradient_samples() {
        let min = pos2(legend.origin + Vec2::new(dx, 0.0));
        painter.rect_filled(
            egui::Rect::from_min_size(min, egui::vec2(1.0, legend.height)),
            0.0,
            Color::new(rgb, 255.0).to_egui(),
        );
    }
    let [start, end] = legend.arrow_line();
    painter.line_segment([pos2(start), pos2(end)], Stroke::new(1.0, gray));
    painter.add(egui::Shape::convex_polygon(
        legend.arrow_head().map(pos2).to_vec(),
        gray,
        Stroke::NONE,
    ));
    let anchor = legend.caption_anchor();
    let caption_pos = egui::pos2(anchor.x - caption.size().x, anchor.y);
    painter.galley(caption_pos, caption, gray);

    // --- Digital readout ---
    painter.text(
        pos2(layout::readout_anchor(frame.width, frame.height)),
        Align2::CENTER_BOTTOM,
        frame.clock.readout(),
        text_font(TEXT_SIZE),
        gray,
    );
}

/// TTF, OTF and TTC signatures.
fn looks_like_font(bytes: &[u8]) -> bool {
    matches!(
        bytes.get(..4),
        Some([0x00, 0x01, 0x00, 0x00]) | Some(b"OTTO") | Some(b"true") | Some(b"ttcf")
    )
}

/// egui fonts with the two clock families registered. A family whose file
/// is missing or unreadable falls back to egui's proportional font.
fn font_definitions(text_font: Option<&Path>, title_font: Option<&Path>) -> egui::FontDefinitions {
    let mut fonts = egui::FontDefinitions::default();
    let fallback = fonts
        .families
        .get(&FontFamily::Proportional)
        .cloned()
        .unwrap_or_default();

    for (family, path) in [(TEXT_FAMILY, text_font), (TITLE_FAMILY, title_font)] {
        let mut chain = Vec::with_capacity(fallback.len() + 1);
        if let Some(path) = path {
            match std::fs::read(path) {
                Ok(bytes) if looks_like_font(&bytes) => {
                    log::debug!("Loaded {} font from {}", family, path.display());
                    fonts.font_data.insert(
                        family.to_owned(),
                        Arc::new(egui::FontData::from_owned(bytes)),
                    );
                    chain.push(family.to_owned());
                }
                Ok(_) => log::warn!(
                    "{} is not a TrueType/OpenType font, using the default font",
                    path.display()
                ),
                Err(e) => log::warn!(
                    "Could not read font {}: {e}, using the default font",
                    path.display()
                ),
            }
        }
        chain.extend(fallback.iter().cloned());
        fonts.families.insert(FontFamily::Name(family.into()), chain);
    }

    fonts
}
