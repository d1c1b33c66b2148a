//! Numeric conversion utilities for histogrammer-gui.
//!
//! egui works in `f32` and `usize` while the histograms work in `f64` and
//! `u64`; these helpers keep the lossy casts in one place.

/// Convert u64 to f64 with allowed precision loss.
#[allow(clippy::cast_precision_loss)]
pub fn u64_to_f64(value: u64) -> f64 {
    value as f64
}

/// Convert f64 to f32 with allowed precision loss.
#[allow(clippy::cast_possible_truncation)]
pub fn f64_to_f32(value: f64) -> f32 {
    value as f32
}

/// Convert f32 to u8 with clamping to [0, 255].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn f32_to_u8(value: f32) -> u8 {
    let clamped = value.clamp(0.0, 255.0);
    clamped.round() as u8
}

/// Format a count with comma separators for readability.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_count(12345678), "12,345,678");
/// assert_eq!(format_count(42), "42");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(12_345_678), "12,345,678");
    }

    #[test]
    fn test_f32_to_u8_clamps() {
        assert_eq!(f32_to_u8(-3.0), 0);
        assert_eq!(f32_to_u8(127.6), 128);
        assert_eq!(f32_to_u8(300.0), 255);
    }
}
