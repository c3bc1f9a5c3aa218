use std::time::Instant;

use fastfilters_image::{HostArrayMut, Image, ImageError, ImageSize};

use crate::{
    error::FilterError,
    filter::{
        check_image_size, check_kernel_fits, correlate_column, correlate_row, kernels,
        Axis, BoundaryView, KernelCache, KernelSet,
    },
    parallel::{for_each_row3, ExecutionStrategy},
};

/// The feature maps produced for every image, in output channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureChannel {
    /// Gaussian smoothing.
    Smoothing = 0,
    /// Gaussian gradient magnitude.
    GradientMagnitude = 1,
    /// Laplacian of gaussian.
    Laplacian = 2,
}

impl FeatureChannel {
    /// All channels in output order.
    pub const ALL: [FeatureChannel; 3] = [
        FeatureChannel::Smoothing,
        FeatureChannel::GradientMagnitude,
        FeatureChannel::Laplacian,
    ];

    /// Position of the channel in the output stack.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Options shared by the feature map entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FilterOptions {
    /// How the filter passes are executed.
    pub strategy: ExecutionStrategy,
    /// Reuse analytic kernels through [`KernelCache::global`].
    pub use_kernel_cache: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::Auto,
            use_kernel_cache: true,
        }
    }
}

/// The three feature maps of an image, stored channel-major with shape `(3, H, W)`.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputStack {
    size: ImageSize,
    data: Vec<f32>,
}

impl OutputStack {
    /// Size of every feature map.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Shape of the stack, `[3, height, width]`.
    pub fn shape(&self) -> [usize; 3] {
        [3, self.size.height, self.size.width]
    }

    /// All feature maps, channel-major and row-major within a channel.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// The row-major pixels of one feature map.
    pub fn channel(&self, channel: FeatureChannel) -> &[f32] {
        let n = self.size.num_pixels();
        let start = channel.index() * n;
        &self.data[start..start + n]
    }

    /// Gaussian smoothing map.
    pub fn smoothing(&self) -> &[f32] {
        self.channel(FeatureChannel::Smoothing)
    }

    /// Gradient magnitude map.
    pub fn gradient_magnitude(&self) -> &[f32] {
        self.channel(FeatureChannel::GradientMagnitude)
    }

    /// Laplacian of gaussian map.
    pub fn laplacian(&self) -> &[f32] {
        self.channel(FeatureChannel::Laplacian)
    }

    /// Value of `channel` at `(x, y)`.
    pub fn get(&self, channel: FeatureChannel, x: usize, y: usize) -> Option<f32> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        Some(self.channel(channel)[y * self.size.width + x])
    }

    /// Split the stack into one image per channel.
    pub fn into_images(self) -> Result<[Image<f32>; 3], ImageError> {
        let n = self.size.num_pixels();
        let mut data = self.data;
        let laplacian = data.split_off(2 * n);
        let gradient_magnitude = data.split_off(n);
        Ok([
            Image::new(self.size, data)?,
            Image::new(self.size, gradient_magnitude)?,
            Image::new(self.size, laplacian)?,
        ])
    }

    /// Write the stack into a host buffer.
    ///
    /// The buffer must have shape `(3, H, W)` or, channel-last, `(H, W, 3)`, in
    /// either C or Fortran order. A `(3, 3, 3)` buffer is treated as channel-major.
    pub fn write_to(&self, out: &mut HostArrayMut) -> Result<(), FilterError> {
        let (h, w) = (self.size.height, self.size.width);
        let [cs, ys, xs] = output_strides(out, self.size)?;

        let dst = out.as_slice_mut();
        for (c, plane) in self.data.chunks_exact(h * w).enumerate() {
            for (y, row) in plane.chunks_exact(w).enumerate() {
                for (x, &v) in row.iter().enumerate() {
                    dst[c * cs + y * ys + x * xs] = v;
                }
            }
        }
        Ok(())
    }
}

/// Element strides `[channel, y, x]` for writing an output stack of `size` into `out`.
pub(crate) fn output_strides(out: &HostArrayMut, size: ImageSize) -> Result<[usize; 3], FilterError> {
    let (h, w) = (size.height, size.width);
    let strides = out.element_strides();

    match *out.shape() {
        [3, oh, ow] if oh == h && ow == w => Ok([strides[0], strides[1], strides[2]]),
        [oh, ow, 3] if oh == h && ow == w => Ok([strides[2], strides[0], strides[1]]),
        _ => Err(ImageError::InvalidShape {
            name: out.name().to_string(),
            shape: out.shape().to_vec(),
        }
        .into()),
    }
}

/// Compute the feature maps of `image` at `scale` with the default options.
///
/// # Arguments
///
/// * `image` - The source image.
/// * `scale` - The gaussian sigma, positive and finite.
///
/// # Returns
///
/// The smoothing, gradient magnitude and laplacian maps.
///
/// # Errors
///
/// [`FilterError::InvalidScale`], [`FilterError::InvalidImageShape`] or
/// [`FilterError::KernelTooLarge`] when the kernels do not fit the image.
pub fn compute_scale(image: &Image<f32>, scale: f32) -> Result<OutputStack, FilterError> {
    compute_scale_with_options(image, scale, &FilterOptions::default())
}

/// Compute the feature maps of `image` at `scale`.
pub fn compute_scale_with_options(
    image: &Image<f32>,
    scale: f32,
    options: &FilterOptions,
) -> Result<OutputStack, FilterError> {
    // validate before building kernels, the radii alone tell whether they fit
    let radius = kernels::kernel_radii(scale)?
        .into_iter()
        .max()
        .unwrap_or_default();
    check_image_size(image.size())?;
    check_kernel_fits(radius, image.size(), Axis::X)?;
    check_kernel_fits(radius, image.size(), Axis::Y)?;

    if options.use_kernel_cache {
        let kernels = KernelCache::global().get_or_generate(scale)?;
        run(image, &kernels, options.strategy)
    } else {
        let kernels = kernels::generate_kernels(scale)?;
        run(image, &kernels, options.strategy)
    }
}

/// Compute the feature maps of `image` with caller supplied kernels and the default options.
///
/// # Arguments
///
/// * `image` - The source image.
/// * `k0` - Smoothing kernel.
/// * `k1` - First derivative kernel.
/// * `k2` - Second derivative kernel.
///
/// Every kernel must have an odd length and is centered at `len / 2`.
pub fn compute_kernels(
    image: &Image<f32>,
    k0: &[f32],
    k1: &[f32],
    k2: &[f32],
) -> Result<OutputStack, FilterError> {
    compute_kernels_with_options(image, k0, k1, k2, &FilterOptions::default())
}

/// Compute the feature maps of `image` with caller supplied kernels.
pub fn compute_kernels_with_options(
    image: &Image<f32>,
    k0: &[f32],
    k1: &[f32],
    k2: &[f32],
    options: &FilterOptions,
) -> Result<OutputStack, FilterError> {
    let kernels = kernels::validate_kernels(k0, k1, k2)?;
    run(image, &kernels, options.strategy)
}

/// Run the separable pipeline: a horizontal pass producing three intermediate
/// planes, then a vertical pass combining them into the output stack.
///
/// * smoothing = `k0(y) * k0(x)`
/// * gradient magnitude = `hypot(k0(y) * k1(x), k1(y) * k0(x))`
/// * laplacian = `k0(y) * k2(x) + k2(y) * k0(x)`
///
/// Every precondition is checked before any plane is allocated.
pub fn run(
    image: &Image<f32>,
    kernels: &KernelSet,
    strategy: ExecutionStrategy,
) -> Result<OutputStack, FilterError> {
    let size = image.size();
    check_image_size(size)?;
    check_kernel_fits(kernels.max_radius(), size, Axis::X)?;
    check_kernel_fits(kernels.max_radius(), size, Axis::Y)?;
    strategy.validate()?;

    let parallel = strategy.is_parallel(size.num_pixels());
    log::debug!(
        "computing features for {} with radii ({}, {}, {}), parallel: {}",
        size,
        kernels.smoothing.radius(),
        kernels.first_derivative.radius(),
        kernels.second_derivative.radius(),
        parallel,
    );

    let start = Instant::now();
    let stack = strategy.install(|| -> Result<OutputStack, FilterError> {
        let intermediate = horizontal_pass(image, kernels, parallel)?;
        log::trace!("horizontal pass done in {:?}", start.elapsed());
        vertical_pass(&intermediate, kernels, parallel)
    })??;
    log::debug!("elapsed: {:?}", start.elapsed());

    Ok(stack)
}

/// Rows of `image` filtered by k0, k1 and k2 along x.
fn horizontal_pass(
    image: &Image<f32>,
    kernels: &KernelSet,
    parallel: bool,
) -> Result<[Image<f32>; 3], FilterError> {
    let size = image.size();
    let mut h0 = Image::from_size_val(size, 0.0f32)?;
    let mut h1 = Image::from_size_val(size, 0.0f32)?;
    let mut h2 = Image::from_size_val(size, 0.0f32)?;

    let view = BoundaryView::new(image);
    for_each_row3(
        [h0.as_slice_mut(), h1.as_slice_mut(), h2.as_slice_mut()],
        size.width,
        parallel,
        0,
        |y, [r0, r1, r2], _| {
            let src = view.row(y as isize);
            correlate_row(src, r0, kernels.smoothing.as_slice());
            correlate_row(src, r1, kernels.first_derivative.as_slice());
            correlate_row(src, r2, kernels.second_derivative.as_slice());
        },
    );

    Ok([h0, h1, h2])
}

/// Filter the intermediate planes along y and combine them into the output channels.
fn vertical_pass(
    intermediate: &[Image<f32>; 3],
    kernels: &KernelSet,
    parallel: bool,
) -> Result<OutputStack, FilterError> {
    let size = intermediate[0].size();
    let cols = size.width;
    let n = size.num_pixels();

    let mut data = vec![0.0f32; 3 * n];
    let (smoothing, rest) = data.split_at_mut(n);
    let (gradient_magnitude, laplacian) = rest.split_at_mut(n);

    let [h0, h1, h2] = intermediate;
    let (h0, h1, h2) = (
        BoundaryView::new(h0),
        BoundaryView::new(h1),
        BoundaryView::new(h2),
    );
    let k0 = kernels.smoothing.as_slice();
    let k1 = kernels.first_derivative.as_slice();
    let k2 = kernels.second_derivative.as_slice();

    for_each_row3(
        [smoothing, gradient_magnitude, laplacian],
        cols,
        parallel,
        cols,
        |y, [smooth, grad, lap], scratch| {
            correlate_column(&h0, y, k0, smooth);

            // d/dx: k1 along x, k0 along y; d/dy: k0 along x, k1 along y
            correlate_column(&h1, y, k0, grad);
            correlate_column(&h0, y, k1, scratch);
            grad.iter_mut()
                .zip(scratch.iter())
                .for_each(|(gx, &gy)| *gx = gx.hypot(gy));

            // d2/dx2 + d2/dy2
            correlate_column(&h2, y, k0, lap);
            correlate_column(&h0, y, k2, scratch);
            lap.iter_mut()
                .zip(scratch.iter())
                .for_each(|(dxx, &dyy)| *dxx += dyy);
        },
    );

    Ok(OutputStack { size, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn impulse(size: ImageSize, x: usize, y: usize) -> Image<f32> {
        Image::from_fn(size, |i, j| if i == x && j == y { 1.0 } else { 0.0 })
    }

    #[test]
    fn test_constant_image() -> Result<(), FilterError> {
        let image = Image::from_size_val(
            ImageSize {
                width: 17,
                height: 12,
            },
            3.0f32,
        )?;

        for scale in [0.7, 1.0, 1.6] {
            let out = compute_scale(&image, scale)?;
            for &v in out.smoothing() {
                assert_abs_diff_eq!(v, 3.0, epsilon = 1e-5);
            }
            for &v in out.gradient_magnitude() {
                assert_abs_diff_eq!(v, 0.0, epsilon = 1e-4);
            }
            for &v in out.laplacian() {
                assert_abs_diff_eq!(v, 0.0, epsilon = 1e-4);
            }
        }
        Ok(())
    }

    #[test]
    fn test_impulse_response() -> Result<(), FilterError> {
        // the impulse sits in the middle so both mirrored copies are equally far
        let size = ImageSize {
            width: 9,
            height: 9,
        };
        let out = compute_scale(&impulse(size, 4, 4), 1.0)?;
        let s = |x, y| out.get(FeatureChannel::Smoothing, x, y).unwrap_or(f32::NAN);
        let g = |x, y| {
            out.get(FeatureChannel::GradientMagnitude, x, y)
                .unwrap_or(f32::NAN)
        };

        // a gaussian bump peaked at the impulse
        let peak = s(4, 4);
        for y in 0..9 {
            for x in 0..9 {
                if (x, y) != (4, 4) {
                    assert!(s(x, y) < peak);
                }
            }
        }
        for d in 1..=2 {
            assert_abs_diff_eq!(s(4 + d, 4), s(4 - d, 4), epsilon = 1e-7);
            assert_abs_diff_eq!(s(4, 4 + d), s(4, 4 - d), epsilon = 1e-7);
            assert_abs_diff_eq!(s(4 + d, 4), s(4, 4 + d), epsilon = 1e-7);
        }

        // a ring of gradient around the center, flat at the center and far away
        assert_abs_diff_eq!(g(4, 4), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(g(0, 0), 0.0, epsilon = 1e-6);
        for (x, y) in [(3, 4), (5, 4), (4, 3), (4, 5)] {
            assert!(g(x, y) > 1e-2);
        }

        // the laplacian is negative at a peak
        assert!(out.laplacian()[4 * 9 + 4] < 0.0);
        Ok(())
    }

    #[test]
    fn test_identity_smoothing_kernel() -> Result<(), FilterError> {
        let image = Image::from_fn(
            ImageSize {
                width: 5,
                height: 4,
            },
            |x, y| (x as f32 + 1.0) * (y as f32 + 0.5),
        );
        let out = compute_kernels(&image, &[1.0], &[-0.5, 0.0, 0.5], &[1.0, -2.0, 1.0])?;
        assert_eq!(out.smoothing(), image.as_slice());
        Ok(())
    }

    #[test]
    fn test_explicit_kernels_match_scale() -> Result<(), FilterError> {
        let image = Image::from_fn(
            ImageSize {
                width: 12,
                height: 10,
            },
            |x, y| ((x * 5 + y * 11) % 7) as f32,
        );
        let k = kernels::generate_kernels(1.0)?;
        let a = compute_scale(&image, 1.0)?;
        let b = compute_kernels(
            &image,
            k.smoothing.as_slice(),
            k.first_derivative.as_slice(),
            k.second_derivative.as_slice(),
        )?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn test_strategies_and_cache_agree() -> Result<(), FilterError> {
        let image = Image::from_fn(
            ImageSize {
                width: 23,
                height: 19,
            },
            |x, y| ((x * 13 + y * 7) % 17) as f32 / 17.0,
        );

        let reference = compute_scale_with_options(
            &image,
            1.6,
            &FilterOptions {
                strategy: ExecutionStrategy::Serial,
                use_kernel_cache: false,
            },
        )?;
        for strategy in [
            ExecutionStrategy::Parallel,
            ExecutionStrategy::Auto,
            ExecutionStrategy::Fixed(3),
        ] {
            let out = compute_scale_with_options(
                &image,
                1.6,
                &FilterOptions {
                    strategy,
                    use_kernel_cache: true,
                },
            )?;
            assert_eq!(out, reference);
        }
        Ok(())
    }

    #[test]
    fn test_invalid_inputs() -> Result<(), FilterError> {
        let image = Image::from_size_val(
            ImageSize {
                width: 16,
                height: 16,
            },
            0.0f32,
        )?;
        assert_eq!(
            compute_scale(&image, 0.0).err(),
            Some(FilterError::InvalidScale(0.0))
        );
        assert_eq!(
            compute_scale(&image, -1.0).err(),
            Some(FilterError::InvalidScale(-1.0))
        );
        assert!(matches!(
            compute_kernels(&image, &[0.25; 4], &[1.0], &[1.0]),
            Err(FilterError::InvalidKernel { order: 0, .. })
        ));

        let empty = Image::new(
            ImageSize {
                width: 16,
                height: 0,
            },
            vec![],
        )?;
        assert!(matches!(
            compute_scale(&empty, 1.0),
            Err(FilterError::InvalidImageShape { height: 0, .. })
        ));

        let options = FilterOptions {
            strategy: ExecutionStrategy::Fixed(0),
            ..Default::default()
        };
        assert_eq!(
            compute_scale_with_options(&image, 1.0, &options).err(),
            Some(FilterError::InvalidThreadCount(0))
        );
        Ok(())
    }

    #[test]
    fn test_kernel_too_large() -> Result<(), FilterError> {
        let image = Image::from_size_val(
            ImageSize {
                width: 16,
                height: 4,
            },
            0.0f32,
        )?;
        // r2 = 4 reaches the height
        assert_eq!(
            compute_scale(&image, 1.0).err(),
            Some(FilterError::KernelTooLarge {
                axis: Axis::Y,
                radius: 4,
                extent: 4,
            })
        );
        // a single pixel still works with radius 0 kernels
        let pixel = Image::from_size_val(
            ImageSize {
                width: 1,
                height: 1,
            },
            2.0f32,
        )?;
        let out = compute_kernels(&pixel, &[1.0], &[0.0], &[0.0])?;
        assert_eq!(out.as_slice(), &[2.0, 0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_into_images() -> Result<(), FilterError> {
        let size = ImageSize {
            width: 9,
            height: 9,
        };
        let out = compute_scale(&impulse(size, 4, 4), 0.7)?;
        let copy = out.clone();
        let [smoothing, gradient_magnitude, laplacian] = out.into_images()?;
        assert_eq!(smoothing.as_slice(), copy.smoothing());
        assert_eq!(gradient_magnitude.as_slice(), copy.gradient_magnitude());
        assert_eq!(laplacian.as_slice(), copy.laplacian());
        assert_eq!(copy.shape(), [3, 9, 9]);
        Ok(())
    }
}
