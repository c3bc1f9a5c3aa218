#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! Given a single-channel `f32` image and a scale, [`compute_scale`] returns
//! three feature maps in a fixed channel order: gaussian smoothing, gradient
//! magnitude and laplacian of gaussian. [`compute_kernels`] does the same with
//! caller supplied 1D kernels.
//!
//! ```
//! use fastfilters::{compute_scale, FeatureChannel};
//! use fastfilters_image::{Image, ImageSize};
//!
//! let size = ImageSize { width: 16, height: 16 };
//! let image = Image::from_size_val(size, 1.0f32).unwrap();
//!
//! let features = compute_scale(&image, 1.0).unwrap();
//! let smoothing = features.channel(FeatureChannel::Smoothing);
//! assert!((smoothing[0] - 1.0).abs() < 1e-5);
//! ```

/// Error types for the filters.
pub mod error;

/// feature map pipeline module.
pub mod features;

/// image filtering module.
pub mod filter;

/// entry points over externally owned buffers.
pub mod host;

/// module containing parallization utilities.
pub mod parallel;

pub use crate::error::FilterError;
pub use crate::features::{
    compute_kernels, compute_kernels_with_options, compute_scale, compute_scale_with_options,
    run, FeatureChannel, FilterOptions, OutputStack,
};
pub use crate::parallel::ExecutionStrategy;
