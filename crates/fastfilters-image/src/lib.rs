#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// single-channel image representation.
pub mod image;

/// Error types for the image module.
pub mod error;

/// validated views over externally owned, strided buffers.
pub mod host;

pub use crate::error::ImageError;
pub use crate::host::{HostArray, HostArrayMut};
pub use crate::image::{Image, ImageSize, MemoryLayout, MAX_EXTENT};
