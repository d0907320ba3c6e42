//! Camera, zoom and coloring state shared by the render stage.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Most colors a palette can carry into the view uniform.
pub const PALETTE_CAPACITY: usize = 16;

/// Zoom limits and the size the fit-to-world zoom is computed against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomConfig {
    pub base_size: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            base_size: 1.0,
            min_zoom: 0.05,
            max_zoom: 50.0,
        }
    }
}

impl ZoomConfig {
    pub fn clamp(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Zoom level that fits a world of half-extent `world_size` on screen.
    pub fn fit(&self, world_size: f32) -> f32 {
        self.clamp(self.base_size / world_size.max(f32::EPSILON))
    }
}

/// Fragment-stage color treatment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorEffect {
    #[default]
    Flat,
    Textured,
    Highlighted,
    GrayscaleHighlighted,
}

impl ColorEffect {
    pub const ALL: [ColorEffect; 4] = [
        ColorEffect::Flat,
        ColorEffect::Textured,
        ColorEffect::Highlighted,
        ColorEffect::GrayscaleHighlighted,
    ];

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|&e| e == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorEffect::Flat => "flat",
            ColorEffect::Textured => "textured",
            ColorEffect::Highlighted => "highlighted",
            ColorEffect::GrayscaleHighlighted => "grayscale highlighted",
        }
    }

    /// Value of `effect` in the shader.
    pub fn shader_id(self) -> u32 {
        self as u32
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    pub camera: Vec2,
    pub zoom: f32,
    /// Surface size in physical pixels.
    pub window_size: [u32; 2],
    pub palette_index: usize,
    pub species_color_offset: u32,
    pub color_effect: ColorEffect,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            camera: Vec2::ZERO,
            zoom: 1.0,
            window_size: [1280, 720],
            palette_index: 0,
            species_color_offset: 0,
            color_effect: ColorEffect::Flat,
        }
    }
}

impl ViewState {
    pub fn aspect_ratio(&self) -> f32 {
        let [w, h] = self.window_size;
        w.max(1) as f32 / h.max(1) as f32
    }

    /// Move the camera by a world-space delta.
    pub fn pan(&mut self, delta: Vec2) {
        self.camera += delta;
    }

    pub fn zoom_in(&mut self, step: f32, limits: &ZoomConfig) {
        self.zoom = limits.clamp(self.zoom * (1.0 + step));
    }

    pub fn zoom_out(&mut self, step: f32, limits: &ZoomConfig) {
        self.zoom = limits.clamp(self.zoom / (1.0 + step));
    }

    pub fn reset_pan_zoom(&mut self, world_size: f32, limits: &ZoomConfig) {
        self.camera = Vec2::ZERO;
        self.zoom = limits.fit(world_size);
    }

    /// Pack for the GPU with the resolved palette colors.
    pub fn to_uniform(&self, point_size: f32, palette: &[[f32; 4]]) -> ViewUniform {
        let mut colors = [[0.0; 4]; PALETTE_CAPACITY];
        let palette_size = palette.len().min(PALETTE_CAPACITY);
        colors[..palette_size].copy_from_slice(&palette[..palette_size]);

        ViewUniform {
            camera: self.camera.to_array(),
            window_size: [self.window_size[0] as f32, self.window_size[1] as f32],
            zoom: self.zoom,
            point_size,
            palette_size: palette_size.max(1) as u32,
            color_offset: self.species_color_offset,
            effect: self.color_effect.shader_id(),
            _padding: [0; 3],
            colors,
        }
    }
}

/// View uniform (matches `View` in particle.wgsl).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ViewUniform {
    pub camera: [f32; 2],
    pub window_size: [f32; 2],

    pub zoom: f32,
    pub point_size: f32,
    pub palette_size: u32,
    pub color_offset: u32,

    pub effect: u32,
    pub _padding: [u32; 3],

    pub colors: [[f32; 4]; PALETTE_CAPACITY],
}

impl Default for ViewUniform {
    fn default() -> Self {
        ViewState::default().to_uniform(particle_physics::DEFAULT_POINT_SIZE, &[[1.0; 4]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_in_then_out_restores_zoom() {
        let limits = ZoomConfig::default();
        let mut view = ViewState::default();
        view.zoom_in(0.1, &limits);
        assert!(view.zoom > 1.0);
        view.zoom_out(0.1, &limits);
        assert!((view.zoom - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zoom_stays_within_limits() {
        let limits = ZoomConfig::default();
        let mut view = ViewState::default();
        for _ in 0..500 {
            view.zoom_in(0.5, &limits);
        }
        assert_eq!(view.zoom, limits.max_zoom);
        for _ in 0..1000 {
            view.zoom_out(0.5, &limits);
        }
        assert_eq!(view.zoom, limits.min_zoom);
    }

    #[test]
    fn reset_fits_world_and_centers_camera() {
        let limits = ZoomConfig::default();
        let mut view = ViewState::default();
        view.pan(Vec2::new(3.0, -2.0));
        view.reset_pan_zoom(4.0, &limits);
        assert_eq!(view.camera, Vec2::ZERO);
        assert!((view.zoom - 0.25).abs() < 1e-6);

        view.reset_pan_zoom(1000.0, &limits);
        assert_eq!(view.zoom, limits.min_zoom);
    }

    #[test]
    fn color_effects_cycle() {
        let mut effect = ColorEffect::Flat;
        for _ in 0..ColorEffect::ALL.len() {
            effect = effect.next();
        }
        assert_eq!(effect, ColorEffect::Flat);
        assert_eq!(ColorEffect::GrayscaleHighlighted.shader_id(), 3);
    }

    #[test]
    fn uniform_truncates_oversized_palettes() {
        let palette = vec![[0.5; 4]; PALETTE_CAPACITY + 4];
        let uniform = ViewState::default().to_uniform(2.0, &palette);
        assert_eq!(uniform.palette_size as usize, PALETTE_CAPACITY);
        assert_eq!(std::mem::size_of::<ViewUniform>(), 48 + 16 * PALETTE_CAPACITY);
    }
}
