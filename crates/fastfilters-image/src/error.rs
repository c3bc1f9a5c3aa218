/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when the data length does not match the image size.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidDataLength(usize, usize),

    /// Error when the pixel data cannot be cast to the requested type.
    #[error("Failed to cast pixel value to {0}")]
    CastError(String),

    /// Error when a pixel index falls outside the image.
    #[error("Pixel index ({0}, {1}) is out of bounds ({2}, {3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when a host buffer has a zero or oversized extent.
    #[error("{name} has invalid shape {shape:?}")]
    InvalidShape {
        /// Name of the offending buffer.
        name: String,
        /// The rejected shape.
        shape: Vec<usize>,
    },

    /// Error when a host buffer has a stride that is not a positive multiple of 4 bytes.
    #[error("{name} has invalid stride {strides:?}")]
    InvalidStride {
        /// Name of the offending buffer.
        name: String,
        /// The rejected byte strides.
        strides: Vec<isize>,
    },

    /// Error when a host buffer is neither C nor Fortran contiguous.
    #[error("{0} is not contiguous")]
    NotContiguous(String),

    /// Error when a host buffer has an unexpected number of dimensions.
    #[error("{name} must have {expected} dimensions, got {actual}")]
    InvalidDimensions {
        /// Name of the offending buffer.
        name: String,
        /// Expected number of dimensions.
        expected: usize,
        /// Actual number of dimensions.
        actual: usize,
    },
}
