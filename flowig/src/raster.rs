//! # Raster frames

use bytemuck::{Pod, Zeroable};

/// RGB colour structure.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Get a channel by index (0 = red, 1 = green, 2 = blue).
    pub fn channel(&self, i: usize) -> u8 {
        match i {
            0 => self.r,
            1 => self.g,
            2 => self.b,
            _ => 0,
        }
    }

    /// Set a channel by index (0 = red, 1 = green, 2 = blue).
    pub fn set_channel(&mut self, i: usize, c: u8) {
        match i {
            0 => self.r = c,
            1 => self.g = c,
            2 => self.b = c,
            _ => {}
        }
    }
}

/// RGBA colour structure.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert from a slice containing `[r, g, b]` elements.
    pub fn from_rgb_slice(rgb: &[u8]) -> Self {
        Self {
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
            a: 255,
        }
    }

    /// Convert from a slice containing `[r, g, b, a]` elements.
    pub fn from_rgba_slice(rgba: &[u8]) -> Self {
        Self {
            r: rgba[0],
            g: rgba[1],
            b: rgba[2],
            a: rgba[3],
        }
    }

    /// Pack into `0xAARRGGBB` form.
    ///
    /// This is the representation marker colours are configured in.
    pub fn packed_argb(&self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Unpack from `0xAARRGGBB` form.
    pub fn from_packed_argb(packed: u32) -> Self {
        Self {
            a: (packed >> 24) as u8,
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        }
    }
}

impl From<Rgb> for Rgba {
    fn from(Rgb { r, g, b }: Rgb) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Fixed size 2D pixel grid in row-major order.
///
/// A raster is produced once by a pipeline stage and consumed read-only by
/// the next one. Stages never mutate their inputs in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster<P> {
    data: Vec<P>,
    width: usize,
}

/// Single-channel 8-bit raster.
pub type GrayRaster = Raster<u8>;
/// 3-channel 8-bit raster.
pub type RgbRaster = Raster<Rgb>;
/// 4-channel 8-bit raster.
pub type RgbaRaster = Raster<Rgba>;

impl<P: Copy + Default> Raster<P> {
    /// Create a new zero/background-filled raster.
    ///
    /// # Arguments
    ///
    /// * `width` - width of the raster.
    /// * `height` - height of the raster.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![P::default(); width * height],
            width,
        }
    }
}

impl<P: Copy> Raster<P> {
    /// Wrap existing row-major pixel data.
    ///
    /// Panics if the data length is not a multiple of `width`.
    pub fn from_vec(data: Vec<P>, width: usize) -> Self {
        assert!(width != 0 || data.is_empty());
        assert_eq!(data.len() % width.max(1), 0);
        Self { data, width }
    }

    /// Get width and height of the raster.
    pub fn dim(&self) -> (usize, usize) {
        if self.width == 0 {
            (0, 0)
        } else {
            (self.width, self.data.len() / self.width)
        }
    }

    /// Get size of the raster.
    ///
    /// This is the same as `width * height`.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Get the pixel at given coordinates.
    pub fn get(&self, x: usize, y: usize) -> P {
        self.data[self.width * y + x]
    }

    /// Set the pixel at given coordinates.
    pub fn set(&mut self, x: usize, y: usize, pixel: P) {
        self.data[self.width * y + x] = pixel;
    }

    /// Get the pixels in row-major order.
    pub fn as_slice(&self) -> &[P] {
        &self.data
    }

    /// Get the pixels in row-major order, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [P] {
        &mut self.data
    }

    /// Iterate every pixel of the raster.
    ///
    /// The resulting iterator yields `(x, y, pixel)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, P)> + '_ {
        let (width, height) = self.dim();
        (0..height).flat_map(move |y| (0..width).map(move |x| (x, y, self.get(x, y))))
    }

    /// Upscale by pixel replication, doubling both dimensions.
    ///
    /// Used to undo a matching [`GrayRaster::pyr_down`] before display.
    pub fn pyr_up(&self) -> Self {
        let (w, h) = self.dim();
        let mut data = Vec::with_capacity(w * h * 4);
        for y in 0..h * 2 {
            for x in 0..w * 2 {
                data.push(self.get(x / 2, y / 2));
            }
        }
        Self {
            data,
            width: w * 2,
        }
    }
}

impl Raster<Rgba> {
    /// Downscale by averaging 2x2 blocks per channel, halving both
    /// dimensions.
    pub fn pyr_down(&self) -> RgbaRaster {
        let (w, h) = self.dim();
        let (ow, oh) = (w / 2, h / 2);
        let mut data = Vec::with_capacity(ow * oh);
        for y in 0..oh {
            for x in 0..ow {
                let block = [
                    self.get(x * 2, y * 2),
                    self.get(x * 2 + 1, y * 2),
                    self.get(x * 2, y * 2 + 1),
                    self.get(x * 2 + 1, y * 2 + 1),
                ];
                let avg = |ch: fn(&Rgba) -> u8| {
                    (block.iter().map(|p| ch(p) as u32).sum::<u32>() / 4) as u8
                };
                data.push(Rgba::new(
                    avg(|p| p.r),
                    avg(|p| p.g),
                    avg(|p| p.b),
                    avg(|p| p.a),
                ));
            }
        }
        RgbaRaster { data, width: ow }
    }

    /// Convert to a single-channel luma raster.
    ///
    /// Uses the usual BT.601 integer weights.
    pub fn to_gray(&self) -> GrayRaster {
        let data = self
            .data
            .iter()
            .map(|p| ((p.r as u32 * 299 + p.g as u32 * 587 + p.b as u32 * 114) / 1000) as u8)
            .collect();
        GrayRaster {
            data,
            width: self.width,
        }
    }
}

impl Raster<Rgb> {
    /// Convert to an RGBA raster with opaque alpha.
    pub fn to_rgba(&self) -> RgbaRaster {
        RgbaRaster {
            data: self.data.iter().copied().map(Rgba::from).collect(),
            width: self.width,
        }
    }
}

impl Raster<u8> {
    /// Stretch the intensity histogram over the full 8-bit range.
    pub fn equalize_hist(&self) -> GrayRaster {
        let mut hist = [0usize; 256];
        for &v in &self.data {
            hist[v as usize] += 1;
        }

        let mut cdf = [0usize; 256];
        let mut acc = 0;
        for (i, &h) in hist.iter().enumerate() {
            acc += h;
            cdf[i] = acc;
        }

        let total = self.data.len();
        let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);
        if total == cdf_min {
            // Flat image, nothing to stretch.
            return self.clone();
        }

        let mut lut = [0u8; 256];
        for i in 0..256 {
            let scaled =
                (cdf[i].saturating_sub(cdf_min)) as f32 / (total - cdf_min) as f32 * 255.0;
            lut[i] = scaled.round() as u8;
        }

        GrayRaster {
            data: self.data.iter().map(|&v| lut[v as usize]).collect(),
            width: self.width,
        }
    }

    /// Downscale by averaging 2x2 blocks, halving both dimensions.
    pub fn pyr_down(&self) -> GrayRaster {
        let (w, h) = self.dim();
        let (ow, oh) = (w / 2, h / 2);
        let mut data = Vec::with_capacity(ow * oh);
        for y in 0..oh {
            for x in 0..ow {
                let sum = self.get(x * 2, y * 2) as u32
                    + self.get(x * 2 + 1, y * 2) as u32
                    + self.get(x * 2, y * 2 + 1) as u32
                    + self.get(x * 2 + 1, y * 2 + 1) as u32;
                data.push((sum / 4) as u8);
            }
        }
        GrayRaster { data, width: ow }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_argb_roundtrip() {
        let magenta = Rgba::new(255, 0, 255, 255);
        assert_eq!(magenta.packed_argb(), 0xff_ff_00_ff);
        assert_eq!(Rgba::from_packed_argb(0xff_ff_00_ff), magenta);
    }

    #[test]
    fn raster_dim_and_access() {
        let mut r = RgbaRaster::new(3, 2);
        assert_eq!(r.dim(), (3, 2));
        assert_eq!(r.size(), 6);
        r.set(2, 1, Rgba::new(1, 2, 3, 4));
        assert_eq!(r.get(2, 1), Rgba::new(1, 2, 3, 4));
        assert_eq!(r.iter().count(), 6);
    }

    #[test]
    fn pyramid_dims() {
        let g = GrayRaster::new(8, 6);
        let down = g.pyr_down();
        assert_eq!(down.dim(), (4, 3));
        assert_eq!(down.pyr_up().dim(), (8, 6));
    }

    #[test]
    fn pyr_down_averages() {
        let g = GrayRaster::from_vec(vec![0, 100, 50, 50], 2);
        assert_eq!(g.pyr_down().get(0, 0), 50);
    }

    #[test]
    fn rgba_pyr_down_averages_channels() {
        let mut r = RgbaRaster::new(2, 2);
        r.set(0, 0, Rgba::new(0, 40, 100, 255));
        r.set(1, 0, Rgba::new(100, 40, 100, 255));
        r.set(0, 1, Rgba::new(50, 40, 100, 255));
        r.set(1, 1, Rgba::new(50, 40, 100, 255));
        let down = r.pyr_down();
        assert_eq!(down.dim(), (1, 1));
        assert_eq!(down.get(0, 0), Rgba::new(50, 40, 100, 255));
    }

    #[test]
    fn equalize_flat_is_identity() {
        let g = GrayRaster::from_vec(vec![7; 9], 3);
        assert_eq!(g.equalize_hist().as_slice(), g.as_slice());
    }

    #[test]
    fn equalize_stretches_range() {
        let g = GrayRaster::from_vec(vec![100, 100, 150, 200], 2);
        let eq = g.equalize_hist();
        assert_eq!(eq.get(0, 0), 0);
        assert_eq!(eq.get(1, 1), 255);
    }
}
