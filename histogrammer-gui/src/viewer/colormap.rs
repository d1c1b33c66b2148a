//! Colormaps for the 2-D count map.

use crate::util::f32_to_u8;

/// Available colormaps for the 2-D view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    /// Dark blue through teal and green to yellow.
    #[default]
    Viridis,
    /// Black to red to yellow to white.
    Hot,
    /// Black to white.
    Grayscale,
}

/// Anchor colours of the viridis ramp at 0, 0.25, 0.5, 0.75 and 1.
const VIRIDIS: [[f32; 3]; 5] = [
    [68.0, 1.0, 84.0],
    [59.0, 82.0, 139.0],
    [33.0, 145.0, 140.0],
    [94.0, 201.0, 98.0],
    [253.0, 231.0, 37.0],
];

impl std::fmt::Display for Colormap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Colormap::Viridis => write!(f, "Viridis"),
            Colormap::Hot => write!(f, "Hot"),
            Colormap::Grayscale => write!(f, "Grayscale"),
        }
    }
}

impl Colormap {
    /// Every colormap, in menu order.
    pub const ALL: [Colormap; 3] = [Colormap::Viridis, Colormap::Hot, Colormap::Grayscale];

    /// Maps a normalized value in `[0, 1]` to opaque RGBA bytes.
    #[must_use]
    pub fn apply(self, val: f32) -> [u8; 4] {
        let val = val.clamp(0.0, 1.0);
        match self {
            Colormap::Viridis => {
                let scaled = val * 4.0;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let i = (scaled.floor() as usize).min(3);
                #[allow(clippy::cast_precision_loss)]
                let t = scaled - i as f32;
                let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
                let mix = |k: usize| f32_to_u8(a[k] + (b[k] - a[k]) * t);
                [mix(0), mix(1), mix(2), 255]
            }
            Colormap::Hot => {
                let r = f32_to_u8(val * 3.0 * 255.0);
                let g = f32_to_u8((val * 3.0 - 1.0) * 255.0);
                let b = f32_to_u8((val * 3.0 - 2.0) * 255.0);
                [r, g, b, 255]
            }
            Colormap::Grayscale => {
                let v = f32_to_u8(val * 255.0);
                [v, v, v, 255]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viridis_endpoints() {
        assert_eq!(Colormap::Viridis.apply(0.0), [68, 1, 84, 255]);
        assert_eq!(Colormap::Viridis.apply(1.0), [253, 231, 37, 255]);
        assert_eq!(Colormap::Viridis.apply(0.5), [33, 145, 140, 255]);
    }

    #[test]
    fn test_hot_ramp() {
        assert_eq!(Colormap::Hot.apply(0.0), [0, 0, 0, 255]);
        assert_eq!(Colormap::Hot.apply(1.0), [255, 255, 255, 255]);
        assert_eq!(Colormap::Hot.apply(1.0 / 3.0)[1], 0);
    }
}
