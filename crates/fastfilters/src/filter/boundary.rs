use fastfilters_image::{Image, ImageSize};

/// Maps index `i` into `[0, len)` by reflecting about the edge samples without repeating them.
///
/// This is a reflection of period `2 * len - 2`: `-1` maps to `1` and `len` maps to `len - 2`.
///
/// # Examples
///
/// ```
/// use fastfilters::filter::mirror_interior;
///
/// assert_eq!(mirror_interior(-1, 5), 1);
/// assert_eq!(mirror_interior(5, 5), 3);
/// assert_eq!(mirror_interior(2, 5), 2);
/// ```
#[inline]
pub fn mirror_interior(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let len = len as isize;
    let period = 2 * (len - 1);
    let i = i.rem_euclid(period);
    if i < len {
        i as usize
    } else {
        (period - i) as usize
    }
}

/// An infinite extent, read-only view over an image with mirror-interior boundaries.
#[derive(Clone, Copy, Debug)]
pub struct BoundaryView<'a> {
    data: &'a [f32],
    size: ImageSize,
}

impl<'a> BoundaryView<'a> {
    /// Create a view over `image`.
    pub fn new(image: &'a Image<f32>) -> Self {
        Self {
            data: image.as_slice(),
            size: image.size(),
        }
    }

    /// Size of the underlying image.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The sample at `(x, y)`, reflected into the image when it lies outside.
    #[inline]
    pub fn get(&self, x: isize, y: isize) -> f32 {
        let x = mirror_interior(x, self.size.width);
        let y = mirror_interior(y, self.size.height);
        self.data[y * self.size.width + x]
    }

    /// The row `y`, reflected into the image when it lies outside.
    #[inline]
    pub fn row(&self, y: isize) -> &'a [f32] {
        let y = mirror_interior(y, self.size.height);
        let start = y * self.size.width;
        &self.data[start..start + self.size.width]
    }
}
