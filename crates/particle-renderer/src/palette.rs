//! Species color tables.
//!
//! Colors are stored linear, ready for an sRGB surface.

use catppuccin::{Flavor, PALETTE};

/// Number of built-in palettes; indices wrap around.
pub const PALETTE_COUNT: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    pub name: &'static str,
    pub colors: Vec<[f32; 4]>,
}

impl Palette {
    /// Palette at `index`, wrapping past the last one.
    pub fn resolve(index: usize) -> Self {
        match index % PALETTE_COUNT {
            0 => Self::catppuccin("Mocha", &PALETTE.mocha),
            1 => Self::catppuccin("Macchiato", &PALETTE.macchiato),
            2 => Self::catppuccin("Frappé", &PALETTE.frappe),
            3 => Self::catppuccin("Latte", &PALETTE.latte),
            _ => Self::rainbow(),
        }
    }

    fn catppuccin(name: &'static str, flavor: &Flavor) -> Self {
        let c = &flavor.colors;
        let accents = [
            &c.red, &c.peach, &c.yellow, &c.green, &c.teal, &c.sky, &c.blue, &c.mauve, &c.pink,
        ];
        Self {
            name,
            colors: accents
                .iter()
                .map(|color| srgb_to_linear(color.rgb.r, color.rgb.g, color.rgb.b))
                .collect(),
        }
    }

    fn rainbow() -> Self {
        const RAINBOW: [(u8, u8, u8); 9] = [
            (255, 59, 48),
            (255, 149, 0),
            (255, 214, 10),
            (52, 199, 89),
            (0, 199, 190),
            (50, 173, 230),
            (10, 96, 255),
            (175, 82, 222),
            (255, 55, 95),
        ];
        Self {
            name: "Rainbow",
            colors: RAINBOW
                .iter()
                .map(|&(r, g, b)| srgb_to_linear(r, g, b))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

fn srgb_to_linear(r: u8, g: u8, b: u8) -> [f32; 4] {
    let channel = |c: u8| {
        let c = c as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(r), channel(g), channel(b), 1.0]
}

/// Linear clear color matching the Mocha base.
pub fn background() -> wgpu::Color {
    let base = PALETTE.mocha.colors.base.rgb;
    let [r, g, b, _] = srgb_to_linear(base.r, base.g, base.b);
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use particle_physics::MAX_SPECIES;

    #[test]
    fn every_palette_covers_all_species() {
        for index in 0..PALETTE_COUNT {
            let palette = Palette::resolve(index);
            assert!(palette.len() >= MAX_SPECIES, "{} too small", palette.name);
            for color in &palette.colors {
                assert!(color.iter().all(|c| (0.0..=1.0).contains(c)));
            }
        }
    }

    #[test]
    fn index_wraps() {
        assert_eq!(Palette::resolve(PALETTE_COUNT + 1), Palette::resolve(1));
    }

    #[test]
    fn mocha_base_is_dark() {
        let color = background();
        assert!(color.r < 0.05 && color.g < 0.05 && color.b < 0.05);
    }
}
