//! # Dense optical flow estimation port

use crate::flow_field::FlowField;
use crate::raster::GrayRaster;
use anyhow::{anyhow, Error, Result};

/// Named dense flow algorithms an estimator may implement.
///
/// The core passes the selection through unchanged; it is an opaque key as
/// far as this library is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlowAlgorithm {
    SparseToDense,
    Farneback,
    DeepFlow,
    Dis,
    DualTvl1,
}

impl Default for FlowAlgorithm {
    fn default() -> Self {
        FlowAlgorithm::Dis
    }
}

impl std::str::FromStr for FlowAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SparseToDense" => Ok(Self::SparseToDense),
            "FarneBack" | "Farneback" => Ok(Self::Farneback),
            "DeepFlow" => Ok(Self::DeepFlow),
            "DIS" | "Dis" => Ok(Self::Dis),
            "DualTVL1" | "DualTvl1" => Ok(Self::DualTvl1),
            _ => Err(anyhow!("unknown flow algorithm '{}'", s)),
        }
    }
}

/// Dense optical flow estimator.
///
/// Implementations wrap an external estimation backend. The core never
/// implements flow estimation itself, it only consumes the resulting field.
pub trait FlowEstimator {
    /// Estimate dense flow between two grayscale frames.
    ///
    /// The returned field has the same dimensions as the input frames, one
    /// `(dx, dy)` pair per pixel. Cells the backend could not resolve may be
    /// NaN or oversized; consumers filter them with
    /// [`flow_valid`](crate::flow_field::flow_valid).
    ///
    /// # Arguments
    ///
    /// * `frame_a` - earlier frame of the pair.
    /// * `frame_b` - later frame of the pair.
    /// * `algorithm` - backend algorithm to use.
    fn compute_flow(
        &mut self,
        frame_a: &GrayRaster,
        frame_b: &GrayRaster,
        algorithm: FlowAlgorithm,
    ) -> Result<FlowField>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_from_str() {
        assert_eq!("DIS".parse::<FlowAlgorithm>().unwrap(), FlowAlgorithm::Dis);
        assert_eq!(
            "FarneBack".parse::<FlowAlgorithm>().unwrap(),
            FlowAlgorithm::Farneback
        );
        assert!("Lucas-Kanade".parse::<FlowAlgorithm>().is_err());
    }
}
