//! Encodings shared by the matrix and the hierarchy.

/// Mean values at which the three color stops sit.
pub const MEAN_DOMAIN: [f64; 3] = [-0.01, 0.0, 0.01];

/// Negative (#f55442), neutral (#f5ad42) and positive (#5ec744) stop colors.
const MEAN_COLORS: [Rgb; 3] = [
    Rgb(245.0, 84.0, 66.0),
    Rgb(245.0, 173.0, 66.0),
    Rgb(94.0, 199.0, 68.0),
];

pub const OPACITY_MIN: f64 = 0.1;
pub const OPACITY_MAX: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rgb(f64, f64, f64);

impl Rgb {
    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        Rgb(
            self.0 + (other.0 - self.0) * t,
            self.1 + (other.1 - self.1) * t,
            self.2 + (other.2 - self.2) * t,
        )
    }

    fn to_hex(self) -> String {
        let c = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        format!("#{:02x}{:02x}{:02x}", c(self.0), c(self.1), c(self.2))
    }
}

/// Linear map of `value` from `[from_lo, from_hi]` onto `[to_lo, to_hi]`,
/// clamped to the output range.
pub fn map_range(value: f64, from_lo: f64, from_hi: f64, to_lo: f64, to_hi: f64) -> f64 {
    if from_hi == from_lo {
        return to_hi;
    }
    let t = ((value - from_lo) / (from_hi - from_lo)).clamp(0.0, 1.0);
    to_lo + (to_hi - to_lo) * t
}

/// Diverging color for a pair's mean main attribute. Values beyond the
/// outer stops are clamped.
pub fn mean_color(mean: f64) -> String {
    let [lo, mid, hi] = MEAN_DOMAIN;
    let [negative, neutral, positive] = MEAN_COLORS;

    let color = if mean <= mid {
        negative.lerp(neutral, map_range(mean, lo, mid, 0.0, 1.0))
    } else {
        neutral.lerp(positive, map_range(mean, mid, hi, 0.0, 1.0))
    };
    color.to_hex()
}

/// Opacity for a pair's link count, `0..=max_total` onto `0.1..=1.0`.
pub fn total_opacity(total: usize, max_total: usize) -> f64 {
    map_range(total as f64, 0.0, max_total as f64, OPACITY_MIN, OPACITY_MAX)
}
