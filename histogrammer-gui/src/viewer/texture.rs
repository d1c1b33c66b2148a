//! Texture generation for the 2-D count map.

use egui::ColorImage;
use histogrammer_core::Histogram2D;

use crate::util::u64_to_f64;
use crate::viewer::Colormap;

/// Renders the counts of `histogram` on a logarithmic colour scale.
///
/// One pixel per bin, with the highest y bin in the top row. Empty bins
/// are transparent. The scale runs from the smallest non-zero count to the
/// largest.
#[must_use]
pub fn color_map_image(histogram: &Histogram2D, colormap: Colormap) -> ColorImage {
    let (nx, ny) = histogram.bin_counts();
    let counts = histogram.counts();

    let min_count = counts.iter().copied().filter(|&c| c > 0).min().unwrap_or(1);
    let log_min = u64_to_f64(min_count).ln();
    let log_span = u64_to_f64(histogram.max_count().max(min_count)).ln() - log_min;

    let mut pixels = vec![0u8; nx * ny * 4];
    for row in 0..ny {
        let j = ny - 1 - row;
        for i in 0..nx {
            let count = counts[[i, j]];
            if count == 0 {
                continue;
            }
            let val = if log_span > 0.0 {
                (u64_to_f64(count).ln() - log_min) / log_span
            } else {
                1.0
            };
            #[allow(clippy::cast_possible_truncation)]
            let rgba = colormap.apply(val as f32);
            let offset = (row * nx + i) * 4;
            pixels[offset..offset + 4].copy_from_slice(&rgba);
        }
    }

    ColorImage::from_rgba_unmultiplied([nx, ny], &pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use histogrammer_core::Histogram2dConfig;

    #[test]
    fn test_log_scaled_pixels() {
        let pairs = [(0.5, 0.5), (1.5, 1.5), (1.5, 1.5), (1.5, 1.5)];
        let hist = Histogram2D::from_pairs(&pairs, &Histogram2dConfig::new((2, 2), (0.0, 2.0), (0.0, 2.0))).unwrap();
        let image = color_map_image(&hist, Colormap::Grayscale);

        assert_eq!(image.size, [2, 2]);
        // top row holds y bin 1: empty, then the maximum
        assert_eq!(image.pixels[0].a(), 0);
        assert_eq!(image.pixels[1], egui::Color32::from_rgba_unmultiplied(255, 255, 255, 255));
        // bottom row holds y bin 0: the minimum, then empty
        assert_eq!(image.pixels[2], egui::Color32::from_rgba_unmultiplied(0, 0, 0, 255));
        assert_eq!(image.pixels[3].a(), 0);
    }
}
