//! # Ordered frame source port

use crate::raster::RgbaRaster;
use anyhow::Result;

/// Ordered, finite source of decoded frames.
///
/// Implementations own directory scanning and image decoding; they must
/// yield frames in lexicographic path order with plain string comparison as
/// the tie-break. The core never touches the filesystem itself.
pub trait ImageSource {
    /// Fetch the next frame in the sequence.
    ///
    /// Returns `Ok(None)` once the sequence is exhausted.
    fn next_frame(&mut self) -> Result<Option<RgbaRaster>>;

    /// Number of frames remaining, if known up front.
    fn frame_count_hint(&self) -> Option<usize> {
        None
    }
}

/// Drain a source into a frame vector.
pub fn collect_frames(source: &mut dyn ImageSource) -> Result<Vec<RgbaRaster>> {
    let mut frames = Vec::with_capacity(source.frame_count_hint().unwrap_or(0));
    while let Some(frame) = source.next_frame()? {
        frames.push(frame);
    }
    Ok(frames)
}
