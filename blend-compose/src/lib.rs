//! # Pixel blend compositing
//!
//! Combines two RGBA pixel sources under a selectable blend rule plus a
//! global opacity. Each mode is a pure function of a source/destination
//! pixel pair; alpha always accumulates the same way regardless of mode.

use flowig::colorspace::{hsl_to_rgb, rgb_to_hsl};
use flowig::prelude::v1::{Rgba, RgbaRaster};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Compositing errors.
#[derive(Debug, thiserror::Error)]
pub enum BlendError {
    /// Opacity must stay within `[0; 1]`.
    #[error("invalid argument: opacity {0} outside [0; 1]")]
    InvalidArgument(f32),
    /// Defensive contract for dispatch tables built from untyped input.
    /// Unreachable through the typed [`BlendMode`] API.
    #[error("unsupported blend mode '{0}'")]
    UnsupportedMode(String),
}

/// Blend rule selection.
///
/// Every mode is a deterministic arithmetic rule over 8-bit channel pairs,
/// independent of pixel position. The hue/saturation/colour/luminosity
/// modes recombine HSL channels of the pixel pair instead of operating
/// per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    Average,
    Multiply,
    Screen,
    Darken,
    Lighten,
    Overlay,
    HardLight,
    SoftLight,
    Difference,
    Negation,
    Exclusion,
    ColorDodge,
    InverseColorDodge,
    SoftDodge,
    ColorBurn,
    InverseColorBurn,
    SoftBurn,
    Reflect,
    Glow,
    Freeze,
    Heat,
    Add,
    Subtract,
    Stamp,
    Red,
    Green,
    Blue,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl std::str::FromStr for BlendMode {
    type Err = BlendError;

    fn from_str(s: &str) -> Result<Self, BlendError> {
        use BlendMode::*;
        Ok(match s {
            "Average" => Average,
            "Multiply" => Multiply,
            "Screen" => Screen,
            "Darken" => Darken,
            "Lighten" => Lighten,
            "Overlay" => Overlay,
            "HardLight" => HardLight,
            "SoftLight" => SoftLight,
            "Difference" => Difference,
            "Negation" => Negation,
            "Exclusion" => Exclusion,
            "ColorDodge" => ColorDodge,
            "InverseColorDodge" => InverseColorDodge,
            "SoftDodge" => SoftDodge,
            "ColorBurn" => ColorBurn,
            "InverseColorBurn" => InverseColorBurn,
            "SoftBurn" => SoftBurn,
            "Reflect" => Reflect,
            "Glow" => Glow,
            "Freeze" => Freeze,
            "Heat" => Heat,
            "Add" => Add,
            "Subtract" => Subtract,
            "Stamp" => Stamp,
            "Red" => Red,
            "Green" => Green,
            "Blue" => Blue,
            "Hue" => Hue,
            "Saturation" => Saturation,
            "Color" => Color,
            "Luminosity" => Luminosity,
            _ => return Err(BlendError::UnsupportedMode(s.into())),
        })
    }
}

/// Per-channel arithmetic for the channel-independent modes.
///
/// `s` and `d` are 8-bit values widened to `i32`; the result is clamped
/// back into `0..=255` by the caller.
fn blend_channel(mode: BlendMode, s: i32, d: i32) -> i32 {
    use BlendMode::*;
    match mode {
        Average => (s + d) / 2,
        Multiply => s * d / 255,
        Screen => 255 - (255 - s) * (255 - d) / 255,
        Darken => s.min(d),
        Lighten => s.max(d),
        Overlay => {
            if d < 128 {
                s * d / 128
            } else {
                255 - (255 - s) * (255 - d) / 128
            }
        }
        HardLight => {
            if s < 128 {
                s * d / 128
            } else {
                255 - (255 - s) * (255 - d) / 128
            }
        }
        SoftLight => {
            let mix = s * d / 255;
            mix + s * (255 - (255 - s) * (255 - d) / 255 - mix) / 255
        }
        Difference => (s - d).abs(),
        Negation => 255 - (255 - s - d).abs(),
        Exclusion => s + d - s * d / 128,
        // A fully lit source channel dodges to white instead of dividing
        // by zero; the burn/freeze/heat guards are symmetric.
        ColorDodge => {
            if s == 255 {
                255
            } else {
                (d * 255 / (255 - s)).min(255)
            }
        }
        InverseColorDodge => {
            if d == 255 {
                255
            } else {
                (s * 255 / (255 - d)).min(255)
            }
        }
        SoftDodge => {
            if s + d < 256 {
                if s == 255 {
                    255
                } else {
                    (d * 128 / (255 - s)).min(255)
                }
            } else {
                (255 - (255 - s) * 128 / d).max(0)
            }
        }
        ColorBurn => {
            if s == 0 {
                0
            } else {
                (255 - (255 - d) * 255 / s).max(0)
            }
        }
        InverseColorBurn => {
            if d == 0 {
                0
            } else {
                (255 - (255 - s) * 255 / d).max(0)
            }
        }
        SoftBurn => {
            if s + d < 256 {
                if d == 255 {
                    255
                } else {
                    (s * 128 / (255 - d)).min(255)
                }
            } else {
                (255 - (255 - d) * 128 / s).max(0)
            }
        }
        Reflect => {
            if s == 255 {
                255
            } else {
                (d * d / (255 - s)).min(255)
            }
        }
        Glow => {
            if d == 255 {
                255
            } else {
                (s * s / (255 - d)).min(255)
            }
        }
        Freeze => {
            if s == 0 {
                0
            } else {
                (255 - (255 - d) * (255 - d) / s).max(0)
            }
        }
        Heat => {
            if d == 0 {
                0
            } else {
                (255 - (255 - s) * (255 - s) / d).max(0)
            }
        }
        Add => (s + d).min(255),
        Subtract => (s + d - 255).max(0),
        Stamp => (d + 2 * s - 256).clamp(0, 255),
        // Whole-pixel modes are handled before channel dispatch.
        Red | Green | Blue | Hue | Saturation | Color | Luminosity => {
            unreachable!("whole-pixel mode in channel dispatch")
        }
    }
}

/// Apply the pure blend rule to a pixel pair, including alpha accumulation,
/// with no opacity interpolation.
fn blend_pixel(mode: BlendMode, src: Rgba, dst: Rgba) -> Rgba {
    use BlendMode::*;

    let (r, g, b) = match mode {
        Red => (src.r, dst.g, dst.b),
        Green => (dst.r, src.g, dst.b),
        Blue => (dst.r, dst.g, src.b),
        Hue | Saturation | Color | Luminosity => {
            let (sh, ss, sl) = rgb_to_hsl(src.r, src.g, src.b);
            let (dh, ds, dl) = rgb_to_hsl(dst.r, dst.g, dst.b);
            let (h, s, l) = match mode {
                Hue => (sh, ds, dl),
                Saturation => (dh, ss, dl),
                Color => (sh, ss, dl),
                _ => (dh, ds, sl),
            };
            hsl_to_rgb(h, s, l)
        }
        _ => {
            let ch = |s: u8, d: u8| blend_channel(mode, s as i32, d as i32).clamp(0, 255) as u8;
            (
                ch(src.r, dst.r),
                ch(src.g, dst.g),
                ch(src.b, dst.b),
            )
        }
    };

    let sa = src.a as i32;
    let da = dst.a as i32;
    let a = (sa + da - sa * da / 255).min(255) as u8;

    Rgba::new(r, g, b, a)
}

/// Blend a source pixel over a destination pixel.
///
/// Opacity interpolates every output channel between the untouched
/// destination (0) and the fully applied blend rule (1).
///
/// # Arguments
///
/// * `mode` - blend rule to apply.
/// * `src` - source (overlay) pixel.
/// * `dst` - destination pixel.
/// * `opacity` - blend strength in `[0; 1]`.
pub fn blend(mode: BlendMode, src: Rgba, dst: Rgba, opacity: f32) -> Result<Rgba, BlendError> {
    if !(0.0..=1.0).contains(&opacity) {
        return Err(BlendError::InvalidArgument(opacity));
    }
    Ok(blend_with_opacity(mode, src, dst, opacity))
}

fn blend_with_opacity(mode: BlendMode, src: Rgba, dst: Rgba, opacity: f32) -> Rgba {
    let result = blend_pixel(mode, src, dst);

    let lerp = |d: u8, r: u8| (d as f32 + (r as f32 - d as f32) * opacity).round() as u8;

    Rgba::new(
        lerp(dst.r, result.r),
        lerp(dst.g, result.g),
        lerp(dst.b, result.b),
        lerp(dst.a, result.a),
    )
}

/// Composite a source raster onto a destination raster.
///
/// Differing dimensions are not an error: only the overlapping top-left
/// `min(widths) x min(heights)` region is blended, the rest of the
/// destination passes through unchanged.
///
/// # Arguments
///
/// * `src` - source (overlay) raster.
/// * `dst` - destination raster.
/// * `mode` - blend rule to apply.
/// * `opacity` - blend strength in `[0; 1]`.
pub fn composite_rasters(
    src: &RgbaRaster,
    dst: &RgbaRaster,
    mode: BlendMode,
    opacity: f32,
) -> Result<RgbaRaster, BlendError> {
    if !(0.0..=1.0).contains(&opacity) {
        return Err(BlendError::InvalidArgument(opacity));
    }

    let (sw, sh) = src.dim();
    let (dw, dh) = dst.dim();
    let (w, h) = (sw.min(dw), sh.min(dh));

    let mut out = dst.clone();

    // Each output row depends on exactly one source and destination row.
    out.as_mut_slice()
        .par_chunks_mut(dw.max(1))
        .enumerate()
        .for_each(|(y, row)| {
            if y >= h {
                return;
            }
            for (x, out) in row.iter_mut().enumerate().take(w) {
                *out = blend_with_opacity(mode, src.get(x, y), *out, opacity);
            }
        });

    Ok(out)
}
