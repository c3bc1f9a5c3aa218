use fastfilters_image::{HostArray, HostArrayMut};

use crate::{
    error::FilterError,
    features::{compute_kernels_with_options, compute_scale_with_options, output_strides, FilterOptions},
};

fn host_kernel(order: usize, kernel: &HostArray) -> Result<Vec<f32>, FilterError> {
    kernel.to_vector().map_err(|e| FilterError::InvalidKernel {
        order,
        reason: e.to_string(),
    })
}

/// Compute the feature maps of a 2D host array at `scale` and write them into `out`.
///
/// `out` must have shape `(3, H, W)` or `(H, W, 3)`. Both buffers may be C or
/// Fortran ordered. Every check runs before `out` is written, so on error it
/// is left untouched.
///
/// # Examples
///
/// ```
/// use fastfilters::{host::filter_host, FilterOptions};
/// use fastfilters_image::{HostArray, HostArrayMut, MemoryLayout};
///
/// let data = vec![1.0f32; 16 * 16];
/// let arr = HostArray::contiguous("arr", &data, &[16, 16], MemoryLayout::RowMajor).unwrap();
///
/// let mut buf = vec![0.0f32; 3 * 16 * 16];
/// let mut out =
///     HostArrayMut::contiguous("out", &mut buf, &[3, 16, 16], MemoryLayout::RowMajor).unwrap();
///
/// filter_host(&arr, 1.0, &mut out, &FilterOptions::default()).unwrap();
/// assert!((buf[0] - 1.0).abs() < 1e-5);
/// ```
pub fn filter_host(
    arr: &HostArray,
    scale: f32,
    out: &mut HostArrayMut,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    let image = arr.to_image()?;
    output_strides(out, image.size())?;

    let stack = compute_scale_with_options(&image, scale, options)?;
    stack.write_to(out)
}

/// Compute the feature maps of a 2D host array with caller supplied 1D kernels.
pub fn filter_host_with_kernels(
    arr: &HostArray,
    k0: &HostArray,
    k1: &HostArray,
    k2: &HostArray,
    out: &mut HostArrayMut,
    options: &FilterOptions,
) -> Result<(), FilterError> {
    let image = arr.to_image()?;
    let (k0, k1, k2) = (host_kernel(0, k0)?, host_kernel(1, k1)?, host_kernel(2, k2)?);
    output_strides(out, image.size())?;

    let stack = compute_kernels_with_options(&image, &k0, &k1, &k2, options)?;
    stack.write_to(out)
}
