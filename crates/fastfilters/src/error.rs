use fastfilters_image::ImageError;
use thiserror::Error;

use crate::filter::Axis;

/// Errors that can occur while computing feature maps.
#[derive(Error, Debug, PartialEq)]
pub enum FilterError {
    /// The scale is zero, negative, not finite, or too small or large to discretize.
    #[error("scale must be positive and finite, got {0}")]
    InvalidScale(f32),

    /// A caller supplied kernel cannot be used.
    #[error("kernel of order {order} is invalid: {reason}")]
    InvalidKernel {
        /// Derivative order of the kernel (0, 1 or 2).
        order: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// The image has a zero extent or an extent beyond the supported maximum.
    #[error("invalid image shape {width}x{height}, extents must be in 1..={max}")]
    InvalidImageShape {
        /// Width of the image.
        width: usize,
        /// Height of the image.
        height: usize,
        /// Largest accepted extent.
        max: usize,
    },

    /// A kernel does not fit inside the image along an axis.
    #[error("kernel radius {radius} does not fit an image extent of {extent} along {axis}")]
    KernelTooLarge {
        /// Axis the kernel is applied along.
        axis: Axis,
        /// Radius of the largest kernel.
        radius: usize,
        /// Image extent along `axis`.
        extent: usize,
    },

    /// A fixed thread count of zero was requested.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The compute backend failed (thread pool, lock poisoning, ...).
    #[error("internal compute failure: {0}")]
    InternalComputeFailure(String),

    /// An image or host buffer error.
    #[error(transparent)]
    Image(#[from] ImageError),
}
