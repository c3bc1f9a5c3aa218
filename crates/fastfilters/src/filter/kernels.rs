use fastfilters_image::MAX_EXTENT;

use crate::error::FilterError;

/// Radius of the smoothing kernel in units of the scale.
pub const SMOOTHING_RADIUS_FACTOR: f32 = 3.0;

/// Radius of the first derivative kernel in units of the scale.
pub const FIRST_DERIVATIVE_RADIUS_FACTOR: f32 = 3.5;

/// Radius of the second derivative kernel in units of the scale.
pub const SECOND_DERIVATIVE_RADIUS_FACTOR: f32 = 4.0;

/// A 1D kernel of odd length `2r + 1`, centered at index `r`.
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel {
    weights: Vec<f32>,
}

impl Kernel {
    /// Create a kernel from its weights.
    ///
    /// # Arguments
    ///
    /// * `order` - The derivative order, only used to report errors.
    /// * `weights` - The kernel weights, odd length and all finite.
    ///
    /// # Errors
    ///
    /// [`FilterError::InvalidKernel`] if the kernel is empty, has an even
    /// length or holds a non-finite weight.
    pub fn new(order: usize, weights: Vec<f32>) -> Result<Self, FilterError> {
        if weights.is_empty() {
            return Err(FilterError::InvalidKernel {
                order,
                reason: "kernel is empty".to_string(),
            });
        }

        if weights.len() % 2 == 0 {
            return Err(FilterError::InvalidKernel {
                order,
                reason: format!("kernel length {} is even", weights.len()),
            });
        }

        if let Some(index) = weights.iter().position(|w| !w.is_finite()) {
            return Err(FilterError::InvalidKernel {
                order,
                reason: format!("weight {} at index {} is not finite", weights[index], index),
            });
        }

        Ok(Self { weights })
    }

    /// Number of taps on each side of the center.
    pub fn radius(&self) -> usize {
        self.weights.len() / 2
    }

    /// Index of the center tap.
    pub fn center(&self) -> usize {
        self.radius()
    }

    /// Number of taps.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Always false, kernels hold at least one tap.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// The kernel weights, offsets `-r..=r`.
    pub fn as_slice(&self) -> &[f32] {
        &self.weights
    }
}

/// The kernels of order 0, 1 and 2 used to build the feature maps.
#[derive(Clone, Debug, PartialEq)]
pub struct KernelSet {
    /// Order 0, smoothing.
    pub smoothing: Kernel,
    /// Order 1, first derivative.
    pub first_derivative: Kernel,
    /// Order 2, second derivative.
    pub second_derivative: Kernel,
}

impl KernelSet {
    /// Largest radius over the three kernels.
    pub fn max_radius(&self) -> usize {
        self.smoothing
            .radius()
            .max(self.first_derivative.radius())
            .max(self.second_derivative.radius())
    }
}

/// Checks the scale is positive and finite.
pub fn check_scale(scale: f32) -> Result<(), FilterError> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(FilterError::InvalidScale(scale));
    }
    Ok(())
}

/// Radii `[r0, r1, r2]` of the analytic kernels for `scale`.
///
/// # Errors
///
/// [`FilterError::InvalidScale`] if the scale is invalid or the radii exceed the supported extent.
pub fn kernel_radii(scale: f32) -> Result<[usize; 3], FilterError> {
    check_scale(scale)?;

    let radius = |factor: f32| -> Result<usize, FilterError> {
        let r = (factor * scale).ceil();
        if !r.is_finite() || r > MAX_EXTENT as f32 {
            return Err(FilterError::InvalidScale(scale));
        }
        Ok(r as usize)
    };

    Ok([
        radius(SMOOTHING_RADIUS_FACTOR)?,
        radius(FIRST_DERIVATIVE_RADIUS_FACTOR)?,
        radius(SECOND_DERIVATIVE_RADIUS_FACTOR)?,
    ])
}

fn offsets(radius: usize) -> impl Iterator<Item = f64> {
    let r = radius as f64;
    (0..2 * radius + 1).map(move |i| i as f64 - r)
}

fn into_kernel(order: usize, scale: f32, weights: Vec<f64>) -> Result<Kernel, FilterError> {
    let weights = weights.into_iter().map(|w| w as f32).collect::<Vec<_>>();
    // tiny scales underflow every tap but the center and the normalization divides by zero
    if weights.iter().any(|w| !w.is_finite()) {
        return Err(FilterError::InvalidScale(scale));
    }
    Kernel::new(order, weights)
}

/// Create a gaussian smoothing kernel of radius `ceil(3 * scale)`.
///
/// The weights sum to one.
///
/// # Arguments
///
/// * `scale` - The sigma of the gaussian kernel.
///
/// # Examples
///
/// ```
/// use fastfilters::filter::kernels::gaussian_kernel_1d;
///
/// let kernel = gaussian_kernel_1d(1.0).unwrap();
/// assert_eq!(kernel.len(), 7);
/// assert!((kernel.as_slice().iter().sum::<f32>() - 1.0).abs() < 1e-6);
/// ```
pub fn gaussian_kernel_1d(scale: f32) -> Result<Kernel, FilterError> {
    let [r0, _, _] = kernel_radii(scale)?;

    let sigma = scale as f64;
    let a0 = 1.0 / ((std::f64::consts::TAU).sqrt() * sigma);
    let b = -0.5 / (sigma * sigma);

    let mut weights = offsets(r0)
        .map(|x| a0 * (b * x * x).exp())
        .collect::<Vec<_>>();

    // unit DC gain
    let norm = weights.iter().sum::<f64>();
    weights.iter_mut().for_each(|k| *k /= norm);

    into_kernel(0, scale, weights)
}

/// Create a first derivative of gaussian kernel of radius `ceil(3.5 * scale)`.
///
/// The kernel is normalized so that its response to a unit ramp has unit magnitude.
pub fn gaussian_derivative_kernel_1d(scale: f32) -> Result<Kernel, FilterError> {
    let [_, r1, _] = kernel_radii(scale)?;

    let sigma = scale as f64;
    let sigma2 = sigma * sigma;
    let a1 = -1.0 / ((std::f64::consts::TAU).sqrt() * sigma * sigma2);
    let b = -0.5 / sigma2;

    let mut weights = offsets(r1)
        .map(|x| a1 * x * (b * x * x).exp())
        .collect::<Vec<_>>();

    let norm = offsets(r1)
        .zip(weights.iter())
        .map(|(x, k)| x * k)
        .sum::<f64>()
        .abs();
    weights.iter_mut().for_each(|k| *k /= norm);

    into_kernel(1, scale, weights)
}

/// Create a second derivative of gaussian kernel of radius `ceil(4 * scale)`.
///
/// The mean is removed so the kernel has no DC response, then it is normalized
/// so that its response to a unit quadratic has unit magnitude.
pub fn gaussian_second_derivative_kernel_1d(scale: f32) -> Result<Kernel, FilterError> {
    let [_, _, r2] = kernel_radii(scale)?;

    let sigma = scale as f64;
    let sigma2 = sigma * sigma;
    let a1 = -1.0 / ((std::f64::consts::TAU).sqrt() * sigma * sigma2);
    let a2 = -a1 / sigma2;
    let b = -0.5 / sigma2;

    let mut weights = offsets(r2)
        .map(|x| (a1 + a2 * x * x) * (b * x * x).exp())
        .collect::<Vec<_>>();

    let mean = weights.iter().sum::<f64>() / weights.len() as f64;
    weights.iter_mut().for_each(|k| *k -= mean);

    let norm = offsets(r2)
        .zip(weights.iter())
        .map(|(x, k)| x * x * k)
        .sum::<f64>()
        / 2.0;
    weights.iter_mut().for_each(|k| *k /= norm);

    into_kernel(2, scale, weights)
}

/// Build the smoothing, first and second derivative kernels for `scale`.
///
/// # Errors
///
/// [`FilterError::InvalidScale`] if the scale is not positive and finite.
pub fn generate_kernels(scale: f32) -> Result<KernelSet, FilterError> {
    Ok(KernelSet {
        smoothing: gaussian_kernel_1d(scale)?,
        first_derivative: gaussian_derivative_kernel_1d(scale)?,
        second_derivative: gaussian_second_derivative_kernel_1d(scale)?,
    })
}

/// Validate caller supplied kernels of order 0, 1 and 2.
///
/// Each kernel must have an odd, non-zero length and finite weights. It is
/// centered at `len / 2` and used as is, without normalization.
pub fn validate_kernels(k0: &[f32], k1: &[f32], k2: &[f32]) -> Result<KernelSet, FilterError> {
    Ok(KernelSet {
        smoothing: Kernel::new(0, k0.to_vec())?,
        first_derivative: Kernel::new(1, k1.to_vec())?,
        second_derivative: Kernel::new(2, k2.to_vec())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SCALES: [f32; 7] = [0.3, 0.7, 1.0, 1.6, 3.5, 5.0, 10.0];

    fn moment(kernel: &Kernel, power: i32) -> f64 {
        let r = kernel.radius() as f64;
        kernel
            .as_slice()
            .iter()
            .enumerate()
            .map(|(i, &k)| k as f64 * (i as f64 - r).powi(power))
            .sum()
    }

    #[test]
    fn test_kernel_radii() -> Result<(), FilterError> {
        assert_eq!(kernel_radii(1.0)?, [3, 4, 4]);
        assert_eq!(kernel_radii(0.3)?, [1, 2, 2]);
        assert_eq!(kernel_radii(1.6)?, [5, 6, 7]);
        assert_eq!(kernel_radii(10.0)?, [30, 35, 40]);
        Ok(())
    }

    #[test]
    fn test_gaussian_kernel_1d() -> Result<(), FilterError> {
        for scale in SCALES {
            let k0 = gaussian_kernel_1d(scale)?;
            assert_eq!(k0.len(), 2 * kernel_radii(scale)?[0] + 1);
            assert_abs_diff_eq!(moment(&k0, 0), 1.0, epsilon = 1e-5);

            // symmetric and peaked at the center
            let w = k0.as_slice();
            for i in 0..k0.radius() {
                assert_eq!(w[i], w[w.len() - 1 - i]);
                assert!(w[i] < w[i + 1]);
            }
        }
        Ok(())
    }

    #[test]
    fn test_gaussian_kernel_1d_values() -> Result<(), FilterError> {
        let k0 = gaussian_kernel_1d(1.0)?;
        let expected = [
            0.004433, 0.054006, 0.242036, 0.399050, 0.242036, 0.054006, 0.004433,
        ];
        for (&k, &e) in k0.as_slice().iter().zip(expected.iter()) {
            assert_abs_diff_eq!(k, e, epsilon = 1e-5);
        }
        Ok(())
    }

    #[test]
    fn test_gaussian_derivative_kernel_1d() -> Result<(), FilterError> {
        for scale in SCALES {
            let k1 = gaussian_derivative_kernel_1d(scale)?;
            assert_abs_diff_eq!(moment(&k1, 0), 0.0, epsilon = 1e-6);
            assert_abs_diff_eq!(moment(&k1, 1).abs(), 1.0, epsilon = 1e-5);

            // antisymmetric with a zero center tap
            let w = k1.as_slice();
            assert_eq!(w[k1.center()], 0.0);
            for i in 0..k1.radius() {
                assert_eq!(w[i], -w[w.len() - 1 - i]);
            }
        }
        Ok(())
    }

    #[test]
    fn test_gaussian_second_derivative_kernel_1d() -> Result<(), FilterError> {
        for scale in SCALES {
            let k2 = gaussian_second_derivative_kernel_1d(scale)?;
            assert_abs_diff_eq!(moment(&k2, 0), 0.0, epsilon = 1e-5);
            assert_abs_diff_eq!(moment(&k2, 2) / 2.0, 1.0, epsilon = 1e-4);
            assert!(k2.as_slice()[k2.center()] < 0.0);
        }
        Ok(())
    }

    #[test]
    fn test_generate_kernels_invalid_scale() {
        for scale in [0.0, -1.0, f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            assert!(matches!(
                generate_kernels(scale),
                Err(FilterError::InvalidScale(_))
            ));
        }
        assert!(matches!(
            generate_kernels(f32::MAX),
            Err(FilterError::InvalidScale(_))
        ));
    }

    #[test]
    fn test_generate_kernels_tiny_scale() {
        assert!(matches!(
            generate_kernels(1e-30),
            Err(FilterError::InvalidScale(_))
        ));
    }

    #[test]
    fn test_validate_kernels() -> Result<(), FilterError> {
        let kernels = validate_kernels(&[1.0], &[-0.5, 0.0, 0.5], &[1.0, -2.0, 1.0])?;
        assert_eq!(kernels.smoothing.radius(), 0);
        assert_eq!(kernels.first_derivative.center(), 1);
        assert_eq!(kernels.max_radius(), 1);
        // no normalization for caller supplied kernels
        assert_eq!(kernels.second_derivative.as_slice(), &[1.0, -2.0, 1.0]);
        Ok(())
    }

    #[test]
    fn test_validate_kernels_invalid() {
        let res = validate_kernels(&[0.25; 4], &[1.0], &[1.0]);
        assert!(matches!(
            res,
            Err(FilterError::InvalidKernel { order: 0, .. })
        ));

        let res = validate_kernels(&[1.0], &[], &[1.0]);
        assert!(matches!(
            res,
            Err(FilterError::InvalidKernel { order: 1, .. })
        ));

        let res = validate_kernels(&[1.0], &[1.0], &[1.0, f32::NAN, 1.0]);
        assert!(matches!(
            res,
            Err(FilterError::InvalidKernel { order: 2, .. })
        ));
    }
}
