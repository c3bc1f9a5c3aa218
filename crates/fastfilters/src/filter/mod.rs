//! Filter operations
//!
//! Kernel generation and the 1D convolution primitive the feature maps are built from.

/// Mirror-interior boundary handling.
mod boundary;
pub use boundary::*;

/// Per-scale kernel memoization.
mod cache;
pub use cache::*;

/// Axis-wise convolution.
mod convolution;
pub use convolution::*;
pub(crate) use convolution::{correlate_column, correlate_row};

/// Gaussian and derivative kernels.
pub mod kernels;
pub use kernels::{generate_kernels, validate_kernels, Kernel, KernelSet};
