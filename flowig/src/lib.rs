//! # Flowig core library
//!
//! This library provides the data types and capability ports shared by the
//! flowig movement visualisation crates: raster frames, dense flow fields,
//! HSL colour conversion, and the `ImageSource`/`FlowEstimator` traits that
//! external collaborators implement.
//!
//! The easiest way to use the library is to import its prelude:
//!
//! ```
//! use flowig::prelude::v1::*;
//! ```
//!
//! You may need [`nalgebra`](https://crates.io/crates/nalgebra) to make use of the functionality.

pub mod colorspace;
pub mod estimator;
pub mod flow_field;
pub mod raster;
pub mod source;

pub mod prelude {
    pub mod v1 {
        pub use crate::{
            estimator::{FlowAlgorithm, FlowEstimator},
            flow_field::{flow_valid, FlowField},
            raster::{GrayRaster, Raster, Rgb, RgbRaster, Rgba, RgbaRaster},
            source::ImageSource,
        };
        pub use anyhow::{anyhow, Error, Result};
    }
}
