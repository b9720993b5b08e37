//! # Movement visualisation pipeline
//!
//! Wires the flowig crates together: tracks the marker centroid across an
//! ordered frame sequence, renders dense flow between consecutive frame
//! pairs as colour images, and composites those back onto the original
//! frames for display.
//!
//! Image decoding and flow estimation stay behind the
//! [`ImageSource`](flowig::source::ImageSource) and
//! [`FlowEstimator`](flowig::estimator::FlowEstimator) ports.

use blend_compose::{composite_rasters, BlendMode};
use flow_render::encode_flow;
use flowig::prelude::v1::*;
use flowig::source::collect_frames;
use log::*;
use marker_tracker::{track_centroids, MotionVector, DEFAULT_MARKER_COLOR};
use nalgebra as na;
use serde::{Deserialize, Serialize};

pub use blend_compose::BlendError;
pub use marker_tracker::BoundingBox;

/// Pipeline configuration.
///
/// Only the resulting values matter here; parsing them out of plugin
/// arguments or config files is the caller's concern.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct VizConfig {
    /// Packed `0xAARRGGBB` marker colour to track.
    pub marker_color: u32,
    /// How often frames are halved before flow estimation (and the flow
    /// image doubled back afterwards).
    pub scale_size: u32,
    /// Saturation scale factor for the flow visualisation.
    pub color_scale: f32,
    /// Motion range for flow normalisation; `<= 0` derives it per field.
    pub max_motion: f32,
    /// Blend rule used when compositing flow images onto frames.
    pub blend_mode: BlendMode,
    /// Global blend opacity in `[0; 1]`.
    pub opacity: f32,
    /// Flow algorithm key passed through to the estimator.
    pub algorithm: FlowAlgorithm,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            marker_color: DEFAULT_MARKER_COLOR,
            scale_size: 0,
            color_scale: 1.0,
            max_motion: -1.0,
            blend_mode: BlendMode::Multiply,
            opacity: 1.0,
            algorithm: FlowAlgorithm::default(),
        }
    }
}

/// Everything the pipeline derives from one frame sequence.
pub struct Visualisation {
    /// Marker centroids of the frames that had one.
    pub centroids: Vec<na::Point2<f32>>,
    /// Displacements between consecutive valid centroids.
    pub vectors: Vec<MotionVector>,
    /// One rendered flow image per input frame.
    pub flow_images: Vec<RgbRaster>,
    /// Input frames with the flow images composited on top.
    pub composited: Vec<RgbaRaster>,
}

/// Track marker movement across the sequence.
///
/// Thin wrapper over [`marker_tracker::track_centroids`] that reports each
/// vector through the log facade.
pub fn bounds_based_movement(
    frames: &[RgbaRaster],
    marker_color: u32,
) -> (Vec<na::Point2<f32>>, Vec<MotionVector>) {
    let (centroids, vectors) = track_centroids(frames, marker_color);
    for v in &vectors {
        info!("{}: ", v.frame_index);
        info!("Velocity: {}", v.speed);
        if let Some(direction) = v.direction {
            info!("Direction: ({},{})", direction.x, direction.y);
        }
    }
    (centroids, vectors)
}

/// Colour frames are downscaled first, then grayscaled and equalised at
/// the reduced resolution; equalisation is resolution-dependent, so the
/// order matters to the estimator.
fn preprocess(frame: &RgbaRaster, scale_size: u32) -> GrayRaster {
    if scale_size == 0 {
        return frame.to_gray().equalize_hist();
    }
    let mut small = frame.pyr_down();
    for _ in 1..scale_size {
        small = small.pyr_down();
    }
    small.to_gray().equalize_hist()
}

/// Render one flow image per frame.
///
/// Frames are pyramid-downscaled, grayscaled and histogram-equalised before
/// estimation; the rendered flow image is upscaled back by the same number
/// of levels. The first image pairs the first frame with itself so flow
/// images stay 1:1 with frames. Fewer than two frames yields no images.
///
/// # Arguments
///
/// * `frames` - ordered frame sequence.
/// * `estimator` - flow estimation backend.
/// * `cfg` - pipeline configuration.
pub fn flow_based_movement(
    frames: &[RgbaRaster],
    estimator: &mut dyn FlowEstimator,
    cfg: &VizConfig,
) -> Result<Vec<RgbRaster>> {
    if frames.len() < 2 {
        return Ok(vec![]);
    }

    let mut images = Vec::with_capacity(frames.len());
    let mut prev = preprocess(&frames[0], cfg.scale_size);

    for frame in frames {
        let cur = preprocess(frame, cfg.scale_size);
        let field = estimator.compute_flow(&prev, &cur, cfg.algorithm)?;

        let mut image = encode_flow(&field, cfg.max_motion, cfg.color_scale);
        for _ in 0..cfg.scale_size {
            image = image.pyr_up();
        }

        images.push(image);
        prev = cur;
    }

    Ok(images)
}

/// Composite flow images onto their frames.
///
/// # Arguments
///
/// * `frames` - ordered frame sequence.
/// * `flow_images` - one flow image per frame.
/// * `cfg` - pipeline configuration.
pub fn composite_movement(
    frames: &[RgbaRaster],
    flow_images: &[RgbRaster],
    cfg: &VizConfig,
) -> Result<Vec<RgbaRaster>> {
    frames
        .iter()
        .zip(flow_images)
        .map(|(frame, flow)| {
            composite_rasters(&flow.to_rgba(), frame, cfg.blend_mode, cfg.opacity)
                .map_err(Error::from)
        })
        .collect()
}

/// Run the whole pipeline over an image source.
///
/// # Arguments
///
/// * `source` - ordered frame source.
/// * `estimator` - flow estimation backend.
/// * `cfg` - pipeline configuration.
pub fn visualise(
    source: &mut dyn ImageSource,
    estimator: &mut dyn FlowEstimator,
    cfg: &VizConfig,
) -> Result<Visualisation> {
    let frames = collect_frames(source)?;
    debug!("loaded {} frames", frames.len());

    let (centroids, vectors) = bounds_based_movement(&frames, cfg.marker_color);
    let flow_images = flow_based_movement(&frames, estimator, cfg)?;
    let composited = composite_movement(&frames, &flow_images, cfg)?;

    Ok(Visualisation {
        centroids,
        vectors,
        flow_images,
        composited,
    })
}
