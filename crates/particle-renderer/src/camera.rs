//! 2D camera math
//!
//! CPU mirror of the vertex transform in particle.wgsl. World units map to NDC
//! through the camera offset and zoom, with X divided by the aspect ratio so a
//! world unit is square on screen.

use glam::Vec2;
use particle_simulation::ViewState;

/// World position to normalized device coordinates.
pub fn world_to_ndc(view: &ViewState, world: Vec2) -> Vec2 {
    (world - view.camera) * view.zoom / Vec2::new(view.aspect_ratio(), 1.0)
}

pub fn ndc_to_world(view: &ViewState, ndc: Vec2) -> Vec2 {
    ndc * Vec2::new(view.aspect_ratio(), 1.0) / view.zoom + view.camera
}

/// Window pixel (origin top-left, Y down) to world position.
pub fn screen_to_world(view: &ViewState, pixel: Vec2) -> Vec2 {
    let size = window_size(view);
    let ndc = Vec2::new(pixel.x / size.x * 2.0 - 1.0, 1.0 - pixel.y / size.y * 2.0);
    ndc_to_world(view, ndc)
}

/// Pixel drag distance to the world-space distance it covers.
pub fn screen_delta_to_world(view: &ViewState, delta: Vec2) -> Vec2 {
    let size = window_size(view);
    Vec2::new(delta.x / size.x * 2.0, -delta.y / size.y * 2.0) * Vec2::new(view.aspect_ratio(), 1.0)
        / view.zoom
}

fn window_size(view: &ViewState) -> Vec2 {
    Vec2::new(
        view.window_size[0].max(1) as f32,
        view.window_size[1].max(1) as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> ViewState {
        ViewState {
            camera: Vec2::new(0.3, -0.2),
            zoom: 2.5,
            window_size: [1600, 900],
            ..Default::default()
        }
    }

    #[test]
    fn camera_center_maps_to_origin() {
        let view = view();
        assert!(world_to_ndc(&view, view.camera).length() < 1e-6);
        let center = screen_to_world(&view, Vec2::new(800.0, 450.0));
        assert!((center - view.camera).length() < 1e-6);
    }

    #[test]
    fn screen_to_world_inverts_world_to_ndc() {
        let view = view();
        for &pixel in &[
            Vec2::new(0.0, 0.0),
            Vec2::new(1600.0, 900.0),
            Vec2::new(123.0, 456.0),
        ] {
            let world = screen_to_world(&view, pixel);
            let ndc = world_to_ndc(&view, world);
            let back = Vec2::new((ndc.x + 1.0) * 800.0, (1.0 - ndc.y) * 450.0);
            assert!((back - pixel).length() < 1e-3, "{pixel} -> {back}");
        }
    }

    #[test]
    fn top_left_pixel_is_up_and_left() {
        let view = ViewState::default();
        let world = screen_to_world(&view, Vec2::ZERO);
        assert!(world.x < 0.0 && world.y > 0.0);
        assert!((world.y - 1.0).abs() < 1e-6);
        assert!((world.x + view.aspect_ratio()).abs() < 1e-5);
    }

    #[test]
    fn drag_delta_matches_positions() {
        let view = view();
        let a = screen_to_world(&view, Vec2::new(100.0, 100.0));
        let b = screen_to_world(&view, Vec2::new(160.0, 40.0));
        let delta = screen_delta_to_world(&view, Vec2::new(60.0, -60.0));
        assert!((b - a - delta).length() < 1e-5);
    }
}
