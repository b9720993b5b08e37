//! # Marker centroid tracking
//!
//! Frames carry a uniquely coloured marker region painted over the tracked
//! object. Each frame's marker pixels are reduced to an axis-aligned
//! bounding box, the box to a centroid, and consecutive centroids to
//! displacement vectors.

use flowig::prelude::v1::*;
use log::*;
use nalgebra as na;

/// Marker colour frames are scanned for by default, in packed
/// `0xAARRGGBB` form (magenta).
pub const DEFAULT_MARKER_COLOR: u32 = 0xff_ff_00_ff;

/// Axis-aligned integer pixel rectangle.
///
/// A degenerate box (zero width or height) means "marker not found in this
/// frame" and is a normal value, not an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// True when the box covers no pixels.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Float midpoint of the box.
    ///
    /// Integer box, float centre: components are `x + width / 2.0`, never
    /// integer-divided.
    pub fn centroid(&self) -> na::Point2<f32> {
        na::Point2::new(
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }
}

/// Displacement between two consecutive valid centroids.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionVector {
    /// Index of the later of the two frames the vector was derived from.
    pub frame_index: usize,
    pub displacement: na::Vector2<f32>,
    pub speed: f32,
    /// Unit direction, or `None` when the centroid did not move (a zero
    /// displacement has no defined direction).
    pub direction: Option<na::Vector2<f32>>,
}

impl MotionVector {
    fn between(frame_index: usize, a: na::Point2<f32>, b: na::Point2<f32>) -> Self {
        let displacement = b - a;
        let speed = displacement.magnitude();
        let direction = if speed > 0.0 {
            Some(displacement / speed)
        } else {
            None
        };
        Self {
            frame_index,
            displacement,
            speed,
            direction,
        }
    }
}

/// Find the bounding box of all pixels exactly matching `marker_color`.
///
/// Scans every pixel of the frame. Returns a degenerate `(0, 0, 0, 0)` box
/// when no pixel matches; callers skip such frames entirely.
///
/// # Arguments
///
/// * `frame` - frame to scan.
/// * `marker_color` - packed `0xAARRGGBB` colour to match.
pub fn detect_marker_bounds(frame: &RgbaRaster, marker_color: u32) -> BoundingBox {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut found = false;

    for (x, y, pixel) in frame.iter() {
        if pixel.packed_argb() == marker_color {
            found = true;
            min_x = min_x.min(x as u32);
            min_y = min_y.min(y as u32);
            max_x = max_x.max(x as u32);
            max_y = max_y.max(y as u32);
        }
    }

    if !found {
        return BoundingBox::default();
    }

    BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    }
}

/// Track the marker centroid across an ordered frame sequence.
///
/// Frames without a marker contribute no centroid and no vector, but do not
/// break the sequence: the next valid centroid pairs with the most recent
/// valid one, not strictly the previous frame index. One `MotionVector` is
/// emitted per consecutive pair of valid centroids, in frame order.
///
/// # Arguments
///
/// * `frames` - ordered frame sequence.
/// * `marker_color` - packed `0xAARRGGBB` colour to match.
pub fn track_centroids(
    frames: &[RgbaRaster],
    marker_color: u32,
) -> (Vec<na::Point2<f32>>, Vec<MotionVector>) {
    let mut centroids = Vec::new();
    let mut vectors = Vec::new();

    for (frame_index, frame) in frames.iter().enumerate() {
        let bounds = detect_marker_bounds(frame, marker_color);
        if bounds.is_degenerate() {
            debug!("frame {}: no marker", frame_index);
            continue;
        }

        let centroid = bounds.centroid();
        centroids.push(centroid);

        if centroids.len() > 1 {
            let vector =
                MotionVector::between(frame_index, centroids[centroids.len() - 2], centroid);
            debug!(
                "frame {}: velocity {} direction {:?}",
                frame_index, vector.speed, vector.direction
            );
            vectors.push(vector);
        }
    }

    (centroids, vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_markers(w: usize, h: usize, markers: &[(usize, usize)]) -> RgbaRaster {
        let mut frame = RgbaRaster::new(w, h);
        for &(x, y) in markers {
            frame.set(x, y, Rgba::from_packed_argb(DEFAULT_MARKER_COLOR));
        }
        frame
    }

    #[test]
    fn bounds_of_two_pixels() {
        let frame = frame_with_markers(10, 10, &[(2, 3), (5, 7)]);
        let bounds = detect_marker_bounds(&frame, DEFAULT_MARKER_COLOR);
        assert_eq!(
            bounds,
            BoundingBox {
                x: 2,
                y: 3,
                width: 4,
                height: 5
            }
        );
    }

    #[test]
    fn no_marker_is_degenerate() {
        let frame = RgbaRaster::new(8, 8);
        let bounds = detect_marker_bounds(&frame, DEFAULT_MARKER_COLOR);
        assert!(bounds.is_degenerate());
        assert_eq!(bounds, BoundingBox::default());
    }

    #[test]
    fn centroid_is_float_midpoint() {
        let bounds = BoundingBox {
            x: 2,
            y: 3,
            width: 3,
            height: 5,
        };
        assert_eq!(bounds.centroid(), nalgebra::Point2::new(3.5, 5.5));
    }

    #[test]
    fn missing_frame_pairs_across_gap() {
        let frames = vec![
            frame_with_markers(10, 10, &[(1, 1)]),
            RgbaRaster::new(10, 10),
            frame_with_markers(10, 10, &[(5, 1)]),
        ];

        let (centroids, vectors) = track_centroids(&frames, DEFAULT_MARKER_COLOR);
        assert_eq!(centroids.len(), 2);
        assert_eq!(vectors.len(), 1);

        let v = &vectors[0];
        assert_eq!(v.frame_index, 2);
        assert_eq!(v.displacement, nalgebra::Vector2::new(4.0, 0.0));
        assert_eq!(v.speed, 4.0);
        assert_eq!(v.direction, Some(nalgebra::Vector2::new(1.0, 0.0)));
    }

    #[test]
    fn stationary_marker_has_no_direction() {
        let frames = vec![
            frame_with_markers(6, 6, &[(2, 2)]),
            frame_with_markers(6, 6, &[(2, 2)]),
        ];

        let (_, vectors) = track_centroids(&frames, DEFAULT_MARKER_COLOR);
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].speed, 0.0);
        assert_eq!(vectors[0].direction, None);
    }

    #[test]
    fn vectors_follow_frame_order() {
        let frames = vec![
            frame_with_markers(12, 12, &[(0, 0)]),
            frame_with_markers(12, 12, &[(3, 0)]),
            frame_with_markers(12, 12, &[(3, 4)]),
        ];

        let (centroids, vectors) = track_centroids(&frames, DEFAULT_MARKER_COLOR);
        assert_eq!(centroids.len(), 3);
        let indices: Vec<_> = vectors.iter().map(|v| v.frame_index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(vectors[0].speed, 3.0);
        assert_eq!(vectors[1].speed, 4.0);
    }
}
