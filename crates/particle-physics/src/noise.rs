//! 2D gradient noise used to carve voids into the noise-masked distribution.

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::Rng;

/// Seeded 2D Perlin-style gradient noise.
///
/// `sample` returns values roughly in `[-1, 1]` that vary smoothly with the
/// input position.
pub struct GradientNoise {
    permutation: [u8; 512],
}

impl GradientNoise {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(rng);

        let mut permutation = [0u8; 512];
        for (i, slot) in permutation.iter_mut().enumerate() {
            *slot = table[i & 255];
        }
        Self { permutation }
    }

    pub fn sample(&self, point: Vec2) -> f32 {
        let cell = point.floor();
        let local = point - cell;
        let xi = (cell.x as i32 & 255) as usize;
        let yi = (cell.y as i32 & 255) as usize;

        let u = fade(local.x);
        let v = fade(local.y);

        let p = &self.permutation;
        let aa = p[p[xi] as usize + yi];
        let ab = p[p[xi] as usize + yi + 1];
        let ba = p[p[xi + 1] as usize + yi];
        let bb = p[p[xi + 1] as usize + yi + 1];

        let x1 = lerp(gradient(aa, local), gradient(ba, local - Vec2::X), u);
        let x2 = lerp(gradient(ab, local - Vec2::Y), gradient(bb, local - Vec2::ONE), u);
        lerp(x1, x2, v)
    }
}

fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn gradient(hash: u8, offset: Vec2) -> f32 {
    match hash & 7 {
        0 => offset.x + offset.y,
        1 => -offset.x + offset.y,
        2 => offset.x - offset.y,
        3 => -offset.x - offset.y,
        4 => offset.x,
        5 => -offset.x,
        6 => offset.y,
        _ => -offset.y,
    }
}
