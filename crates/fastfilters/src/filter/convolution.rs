use fastfilters_image::{Image, ImageSize, MAX_EXTENT};

use crate::{error::FilterError, parallel::ExecutionStrategy};

use super::{boundary::BoundaryView, kernels::Kernel};

/// Image axis a 1D kernel is applied along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Along rows (horizontal).
    X,
    /// Along columns (vertical).
    Y,
}

impl Axis {
    /// Extent of `size` along this axis.
    pub fn extent(&self, size: ImageSize) -> usize {
        match self {
            Axis::X => size.width,
            Axis::Y => size.height,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Checks both extents are in `1..=MAX_EXTENT`.
pub fn check_image_size(size: ImageSize) -> Result<(), FilterError> {
    let valid = |d: usize| d > 0 && d <= MAX_EXTENT;
    if !(valid(size.width) && valid(size.height)) {
        return Err(FilterError::InvalidImageShape {
            width: size.width,
            height: size.height,
            max: MAX_EXTENT,
        });
    }
    Ok(())
}

/// Checks a kernel of `radius` can be reflected inside `size` along `axis`.
///
/// The mirror-interior reflection is single valued for offsets up to `extent - 1`.
pub fn check_kernel_fits(radius: usize, size: ImageSize, axis: Axis) -> Result<(), FilterError> {
    let extent = axis.extent(size);
    if radius >= extent {
        return Err(FilterError::KernelTooLarge {
            axis,
            radius,
            extent,
        });
    }
    Ok(())
}

/// Correlate one row with `weights`, reflecting taps that fall outside the row.
#[inline]
pub(crate) fn correlate_row(src: &[f32], dst: &mut [f32], weights: &[f32]) {
    let n = src.len();
    let r = weights.len() / 2;

    for (x, out) in dst.iter_mut().enumerate() {
        *out = if x >= r && x + r < n {
            src[x - r..=x + r]
                .iter()
                .zip(weights.iter())
                .map(|(&s, &k)| s * k)
                .sum()
        } else {
            weights
                .iter()
                .enumerate()
                .map(|(t, &k)| {
                    let xi = x as isize + t as isize - r as isize;
                    k * src[super::boundary::mirror_interior(xi, n)]
                })
                .sum()
        };
    }
}

/// Correlate the column neighbourhood of row `y` with `weights`, writing a whole output row.
///
/// Rows are accumulated one tap at a time so the inner loop runs over contiguous memory.
#[inline]
pub(crate) fn correlate_column(view: &BoundaryView, y: usize, weights: &[f32], dst: &mut [f32]) {
    let r = weights.len() / 2;
    dst.fill(0.0);
    for (t, &k) in weights.iter().enumerate() {
        let src = view.row(y as isize + t as isize - r as isize);
        dst.iter_mut().zip(src.iter()).for_each(|(d, &s)| *d += k * s);
    }
}

/// Correlate an image with a 1D kernel along one axis.
///
/// `dst[p] = sum_t kernel[t] * src[p + t * axis]` for `t` in `-r..=r`, with
/// samples outside the image read through a mirror-interior boundary.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `kernel` - The kernel, centered at `kernel.center()`.
/// * `axis` - The axis to filter along.
/// * `strategy` - Execution strategy: `Serial`, `Parallel`, `Auto` or `Fixed`.
///
/// # Returns
///
/// A new image with the same size as `src`.
///
/// # Errors
///
/// [`FilterError::InvalidImageShape`] for empty images and
/// [`FilterError::KernelTooLarge`] if the kernel radius reaches the image extent.
pub fn convolve_axis(
    src: &Image<f32>,
    kernel: &Kernel,
    axis: Axis,
    strategy: ExecutionStrategy,
) -> Result<Image<f32>, FilterError> {
    check_image_size(src.size())?;
    check_kernel_fits(kernel.radius(), src.size(), axis)?;
    strategy.validate()?;

    let mut dst = Image::from_size_val(src.size(), 0.0f32)?;
    let cols = src.cols();
    let parallel = strategy.is_parallel(src.size().num_pixels());
    let view = BoundaryView::new(src);
    let weights = kernel.as_slice();

    let dst_data = dst.as_slice_mut();
    strategy.install(|| match axis {
        Axis::X => crate::parallel::for_each_row(dst_data, cols, parallel, |y, row| {
            correlate_row(view.row(y as isize), row, weights)
        }),
        Axis::Y => crate::parallel::for_each_row(dst_data, cols, parallel, |y, row| {
            correlate_column(&view, y, weights, row)
        }),
    })?;

    Ok(dst)
}
