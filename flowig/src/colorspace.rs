//! # RGB/HSL conversion
//!
//! Used as an intermediate representation by the hue/saturation/colour/
//! luminosity blend modes.

/// Below this normalised channel spread a colour is treated as achromatic,
/// short-circuiting hue and saturation to 0 instead of dividing by a tiny
/// denominator.
const ACHROMATIC_EPS: f32 = 0.01;

/// Convert an 8-bit RGB triple to HSL, each component in `0.0..=1.0`.
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    let delta = max - min;
    if delta < ACHROMATIC_EPS {
        return (0.0, 0.0, l);
    }

    let s = if l > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    let h = if max == r {
        (g - b) / delta + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    (h / 6.0, s, l)
}

/// Convert an HSL triple (components in `0.0..=1.0`) back to 8-bit RGB.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    if s < ACHROMATIC_EPS {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let to_byte = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;

    (
        to_byte(hue_to_channel(p, q, h + 1.0 / 3.0)),
        to_byte(hue_to_channel(p, q, h)),
        to_byte(hue_to_channel(p, q, h - 1.0 / 3.0)),
    )
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    // Wrap the hue offset back into [0; 1).
    let t = if t < 0.0 {
        t + 1.0
    } else if t >= 1.0 {
        t - 1.0
    } else {
        t
    };

    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn primaries() {
        let (h, s, l) = rgb_to_hsl(255, 0, 0);
        assert_approx_eq!(h, 0.0);
        assert_approx_eq!(s, 1.0);
        assert_approx_eq!(l, 0.5);

        let (h, _, _) = rgb_to_hsl(0, 255, 0);
        assert_approx_eq!(h, 1.0 / 3.0);

        let (h, _, _) = rgb_to_hsl(0, 0, 255);
        assert_approx_eq!(h, 2.0 / 3.0);
    }

    #[test]
    fn achromatic_short_circuit() {
        let (h, s, l) = rgb_to_hsl(128, 128, 128);
        assert_approx_eq!(h, 0.0);
        assert_approx_eq!(s, 0.0);
        assert_approx_eq!(l, 128.0 / 255.0, 0.01);

        assert_eq!(hsl_to_rgb(0.9, 0.0, 0.5), (128, 128, 128));
    }

    #[test]
    fn roundtrip_within_one() {
        // Spot-check a grid of colours rather than the full cube.
        for r in (0..=255).step_by(17) {
            for g in (0..=255).step_by(17) {
                for b in (0..=255).step_by(17) {
                    let (h, s, l) = rgb_to_hsl(r as u8, g as u8, b as u8);
                    let (r2, g2, b2) = hsl_to_rgb(h, s, l);
                    // Achromatic inputs collapse to their luma, which is the
                    // documented short-circuit, not a conversion error.
                    let spread = r.max(g).max(b) - r.min(g).min(b);
                    if spread > 3 {
                        assert!((r as i32 - r2 as i32).abs() <= 1, "{r} {g} {b}");
                        assert!((g as i32 - g2 as i32).abs() <= 1, "{r} {g} {b}");
                        assert!((b as i32 - b2 as i32).abs() <= 1, "{r} {g} {b}");
                    }
                }
            }
        }
    }
}
