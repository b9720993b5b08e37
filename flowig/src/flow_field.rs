//! # Fixed size dense flow field

use nalgebra::*;

/// Largest component magnitude a flow vector may have and still be
/// considered usable by downstream stages.
pub const MAX_FLOW_COMPONENT: f32 = 1e9;

/// Check whether a flow vector carries usable information.
///
/// Estimators are allowed to emit NaN or absurdly large vectors for cells
/// they could not resolve. Such cells are excluded from all aggregation and
/// colouring rather than treated as errors.
pub fn flow_valid(ux: f32, uy: f32) -> bool {
    !ux.is_nan() && !uy.is_nan() && ux.abs() < MAX_FLOW_COMPONENT && uy.abs() < MAX_FLOW_COMPONENT
}

/// Fixed size dense optical flow field.
///
/// One `(dx, dy)` pair per pixel of the source frame pair.
#[derive(Clone, Debug)]
pub struct FlowField {
    vf: Matrix2xX<f32>,
    width: usize,
}

impl FlowField {
    /// Create a new zero-filled flow field.
    ///
    /// # Arguments
    ///
    /// * `width` - width of the field.
    /// * `height` - height of the field.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            vf: Matrix2xX::repeat(width * height, 0f32),
            width,
        }
    }

    /// Create a flow field by evaluating a function at every cell.
    ///
    /// # Arguments
    ///
    /// * `width` - width of the field.
    /// * `height` - height of the field.
    /// * `f` - producer invoked as `f(x, y)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> Vector2<f32>) -> Self {
        let mut field = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                field.set_motion(x, y, f(x, y));
            }
        }
        field
    }

    /// Get width and height of the flow field.
    pub fn dim(&self) -> (usize, usize) {
        if self.width == 0 {
            (0, 0)
        } else {
            (self.width, self.vf.ncols() / self.width)
        }
    }

    /// Get size of the flow field.
    ///
    /// This is the same as `width * height`.
    pub fn size(&self) -> usize {
        self.vf.ncols()
    }

    /// Get the flow field in row-major order.
    ///
    /// The elements returned are in the following order:
    ///
    /// `field[0,0].x, field[0,0].y, field[0,1].x, ... field[0,N].y, field[1,0].x, ... field[N,N].y`
    pub fn as_slice(&self) -> &[f32] {
        self.vf.as_slice()
    }

    /// Set motion at given position.
    ///
    /// # Arguments
    ///
    /// * `x` - horizontal coordinate to set at.
    /// * `y` - vertical coordinate to set at.
    /// * `motion` - motion to set.
    pub fn set_motion(&mut self, x: usize, y: usize, motion: Vector2<f32>) {
        self.vf.set_column(self.width * y + x, &motion);
    }

    /// Get motion at coordinates.
    ///
    /// # Arguments
    ///
    /// * `x` - horizontal coordinate.
    /// * `y` - vertical coordinate.
    pub fn get_motion(&self, x: usize, y: usize) -> Vector2<f32> {
        self.vf.column(self.width * y + x).into()
    }

    /// Check whether the cell at given coordinates carries usable flow.
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        let m = self.get_motion(x, y);
        flow_valid(m.x, m.y)
    }

    /// Iterate every element of the flow field.
    ///
    /// The resulting iterator yields `(x, y, motion)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Vector2<f32>)> + '_ {
        let (width, height) = self.dim();
        (0..height).flat_map(move |y| (0..width).map(move |x| (x, y, self.get_motion(x, y))))
    }

    /// Largest magnitude among valid cells, clamped to at least 1.
    ///
    /// Used to normalise the field before colouring when no explicit motion
    /// range is configured.
    pub fn max_radius(&self) -> f32 {
        self.iter()
            .filter(|(_, _, m)| flow_valid(m.x, m.y))
            .fold(1f32, |maxrad, (_, _, m)| maxrad.max(m.magnitude()))
    }
}
