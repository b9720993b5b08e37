//! # Flow field colour rendering
//!
//! Maps a dense flow field to an RGB raster: the vector's angle selects a
//! hue from a fixed colour wheel, its magnitude drives saturation. Invalid
//! cells stay at the raster's background value.

use flowig::prelude::v1::*;
use once_cell::sync::Lazy;
use rayon::prelude::*;

// Arc lengths of the six hue segments,
// red -> yellow -> green -> cyan -> blue -> magenta -> red.
const RY: usize = 15;
const YG: usize = 6;
const GC: usize = 4;
const CB: usize = 11;
const BM: usize = 13;
const MR: usize = 6;

/// Number of entries in the colour wheel.
pub const WHEEL_SIZE: usize = RY + YG + GC + CB + BM + MR;

static COLOR_WHEEL: Lazy<[Rgb; WHEEL_SIZE]> = Lazy::new(|| {
    let mut wheel = [Rgb::default(); WHEEL_SIZE];
    let mut k = 0;
    for i in 0..RY {
        wheel[k] = Rgb::new(255, (255 * i / RY) as u8, 0);
        k += 1;
    }
    for i in 0..YG {
        wheel[k] = Rgb::new((255 - 255 * i / YG) as u8, 255, 0);
        k += 1;
    }
    for i in 0..GC {
        wheel[k] = Rgb::new(0, 255, (255 * i / GC) as u8);
        k += 1;
    }
    for i in 0..CB {
        wheel[k] = Rgb::new(0, (255 - 255 * i / CB) as u8, 255);
        k += 1;
    }
    for i in 0..BM {
        wheel[k] = Rgb::new((255 * i / BM) as u8, 0, 255);
        k += 1;
    }
    for i in 0..MR {
        wheel[k] = Rgb::new(255, 0, (255 - 255 * i / MR) as u8);
        k += 1;
    }
    wheel
});

/// The process-wide colour wheel.
///
/// Built on first use, immutable afterwards.
pub fn color_wheel() -> &'static [Rgb; WHEEL_SIZE] {
    &COLOR_WHEEL
}

/// Colour a single normalised flow vector.
///
/// # Arguments
///
/// * `fx` - horizontal flow component, normalised by the motion range.
/// * `fy` - vertical flow component, normalised by the motion range.
pub fn compute_color(fx: f32, fy: f32) -> Rgb {
    let rad = (fx * fx + fy * fy).sqrt();
    let angle = (-fy).atan2(-fx) / std::f32::consts::PI;
    compute_color_rad(rad, angle)
}

/// Colour a flow vector given in polar form.
///
/// The hue wheel is indexed by angle with linear interpolation between
/// neighbouring entries. Magnitudes within range pull the hue towards white
/// as they shrink; out-of-range magnitudes are darkened instead.
///
/// The wheel's `(r, g, b)` triple is written reversed into the output
/// pixel's channel order, matching the layout the flow images have always
/// been produced in.
///
/// # Arguments
///
/// * `rad` - normalised magnitude.
/// * `angle` - direction divided by pi, in `[-1; 1]`.
pub fn compute_color_rad(rad: f32, angle: f32) -> Rgb {
    let wheel = color_wheel();

    let fk = (angle + 1.0) / 2.0 * (WHEEL_SIZE - 1) as f32;
    let k0 = fk as usize;
    let k1 = (k0 + 1) % WHEEL_SIZE;
    let f = fk - k0 as f32;

    let mut pix = Rgb::default();

    for b in 0..3 {
        let col0 = wheel[k0].channel(b) as f32 / 255.0;
        let col1 = wheel[k1].channel(b) as f32 / 255.0;

        let mut col = (1.0 - f) * col0 + f * col1;

        if rad <= 1.0 {
            col = 1.0 - rad * (1.0 - col); // increase saturation with radius
        } else {
            col *= 0.75; // out of range
        }
        pix.set_channel(2 - b, (255.0 * col).round() as u8);
    }

    pix
}

/// Render a flow field as an RGB raster.
///
/// Invalid cells (NaN or oversized vectors) are left at the background value
/// and excluded from the motion range. A field with zero valid cells yields
/// an all-background raster.
///
/// # Arguments
///
/// * `field` - flow field to render.
/// * `max_motion` - motion range to normalise against; values `<= 0` derive
///   the range from the field itself.
/// * `color_scale` - saturation scale multiplier applied to the output.
pub fn encode_flow(field: &FlowField, max_motion: f32, color_scale: f32) -> RgbRaster {
    let (width, height) = field.dim();
    let mut dst = RgbRaster::new(width, height);

    let maxrad = if max_motion <= 0.0 {
        field.max_radius()
    } else {
        max_motion
    };

    // Each output row only reads its own field cells, so rows can be
    // coloured independently.
    dst.as_mut_slice()
        .par_chunks_mut(width.max(1))
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let motion = field.get_motion(x, y);
                if !flow_valid(motion.x, motion.y) {
                    continue;
                }
                let c = compute_color(motion.x / maxrad, motion.y / maxrad);
                *out = scale_color(c, color_scale);
            }
        });

    dst
}

fn scale_color(c: Rgb, scale: f32) -> Rgb {
    if scale == 1.0 {
        return c;
    }
    let s = |v: u8| (v as f32 * scale).round().clamp(0.0, 255.0) as u8;
    Rgb::new(s(c.r), s(c.g), s(c.b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;

    #[test]
    fn wheel_shape() {
        let wheel = color_wheel();
        assert_eq!(wheel.len(), 55);

        // Segment anchors follow the hue progression.
        assert_eq!(wheel[0], Rgb::new(255, 0, 0));
        assert_eq!(wheel[RY], Rgb::new(255, 255, 0));
        assert_eq!(wheel[RY + YG], Rgb::new(0, 255, 0));
        assert_eq!(wheel[RY + YG + GC], Rgb::new(0, 255, 255));
        assert_eq!(wheel[RY + YG + GC + CB], Rgb::new(0, 0, 255));
        assert_eq!(wheel[RY + YG + GC + CB + BM], Rgb::new(255, 0, 255));
    }

    #[test]
    fn zero_vector_renders_white() {
        // radius 0 fully desaturates regardless of hue.
        assert_eq!(compute_color(0.0, 0.0), Rgb::new(255, 255, 255));
    }

    #[test]
    fn out_of_range_darkens() {
        let unit = compute_color(1.0, 0.0);
        let over = compute_color(2.0, 0.0);
        assert!(over.r <= unit.r && over.g <= unit.g && over.b <= unit.b);
        assert_ne!(over, unit);
    }

    #[test]
    fn channels_are_reversed() {
        let wheel = color_wheel();
        // angle = 0 lands in the middle of the wheel; at radius 1 the output
        // is the interpolated wheel colour with r and b swapped.
        let fk = 0.5 * (WHEEL_SIZE - 1) as f32;
        let k0 = fk as usize;
        let expected = wheel[k0];
        let c = compute_color_rad(1.0, 0.0);
        assert_eq!(c.b, expected.r);
        assert_eq!(c.g, expected.g);
        assert_eq!(c.r, expected.b);
    }

    #[test]
    fn zero_field_is_all_white() {
        let field = FlowField::new(3, 2);
        let img = encode_flow(&field, 0.0, 1.0);
        assert_eq!(img.dim(), (3, 2));
        for (_, _, p) in img.iter() {
            assert_eq!(p, Rgb::new(255, 255, 255));
        }
    }

    #[test]
    fn invalid_cells_stay_background() {
        let mut field = FlowField::new(2, 1);
        field.set_motion(0, 0, Vector2::new(f32::NAN, 0.0));
        field.set_motion(1, 0, Vector2::new(1.0, 0.0));
        let img = encode_flow(&field, 0.0, 1.0);
        assert_eq!(img.get(0, 0), Rgb::default());
        assert_ne!(img.get(1, 0), Rgb::default());
    }

    #[test]
    fn all_invalid_field_is_all_background() {
        let field = FlowField::from_fn(4, 4, |_, _| Vector2::new(f32::NAN, f32::NAN));
        let img = encode_flow(&field, 0.0, 1.0);
        assert!(img.iter().all(|(_, _, p)| p == Rgb::default()));
    }

    #[test]
    fn explicit_max_motion_overrides_range() {
        let mut field = FlowField::new(1, 1);
        field.set_motion(0, 0, Vector2::new(10.0, 0.0));
        // With the range forced to 20 the vector sits at radius 0.5 and gets
        // a partially desaturated colour.
        let half = encode_flow(&field, 20.0, 1.0).get(0, 0);
        let full = encode_flow(&field, 10.0, 1.0).get(0, 0);
        assert_ne!(half, full);
    }

    #[test]
    fn color_scale_multiplies_output() {
        let mut field = FlowField::new(1, 1);
        field.set_motion(0, 0, Vector2::new(1.0, 0.0));
        let base = encode_flow(&field, 1.0, 1.0).get(0, 0);
        let dimmed = encode_flow(&field, 1.0, 0.5).get(0, 0);
        assert_eq!(dimmed.r, ((base.r as f32) * 0.5).round() as u8);
        assert_eq!(dimmed.g, ((base.g as f32) * 0.5).round() as u8);
        assert_eq!(dimmed.b, ((base.b as f32) * 0.5).round() as u8);
    }
}
