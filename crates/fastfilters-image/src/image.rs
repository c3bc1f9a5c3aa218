use crate::error::ImageError;

/// Largest extent accepted along any image axis.
pub const MAX_EXTENT: usize = i32::MAX as usize;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use fastfilters_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Total number of pixels.
    pub fn num_pixels(&self) -> usize {
        self.width * self.height
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

/// Order in which the elements of a 2D buffer are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemoryLayout {
    /// Consecutive elements of a row are adjacent in memory (C order).
    #[default]
    RowMajor,
    /// Consecutive elements of a column are adjacent in memory (Fortran order).
    ColumnMajor,
}

/// Represents a single-channel image with pixel data.
///
/// Pixels are stored in row-major order regardless of how the data was
/// provided, and are addressed by their logical `(x, y)` coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T> Image<T> {
    /// Create a new image from row-major pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The pixel data of the image.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastfilters_image::{Image, ImageSize};
    ///
    /// let image = Image::<f32>::new(
    ///     ImageSize {
    ///         width: 10,
    ///         height: 20,
    ///     },
    ///     vec![0f32; 10 * 20],
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(image.width(), 10);
    /// assert_eq!(image.height(), 20);
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        if data.len() != size.num_pixels() {
            return Err(ImageError::InvalidDataLength(
                data.len(),
                size.num_pixels(),
            ));
        }

        Ok(Self { size, data })
    }

    /// Create a new image with every pixel set to `val`.
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        Image::new(size, vec![val; size.num_pixels()])
    }

    /// Create a new image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(size: ImageSize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(size.num_pixels());
        for y in 0..size.height {
            for x in 0..size.width {
                data.push(f(x, y));
            }
        }
        Self { size, data }
    }

    /// Create a new image from a buffer stored in the given layout.
    ///
    /// Column-major data is reordered so the resulting image is row-major.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastfilters_image::{Image, ImageSize, MemoryLayout};
    ///
    /// // 2 rows, 3 columns stored column by column
    /// let data = [1.0f32, 4.0, 2.0, 5.0, 3.0, 6.0];
    /// let image = Image::from_slice_with_layout(
    ///     ImageSize { width: 3, height: 2 },
    ///     &data,
    ///     MemoryLayout::ColumnMajor,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(image.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// ```
    pub fn from_slice_with_layout(
        size: ImageSize,
        data: &[T],
        layout: MemoryLayout,
    ) -> Result<Self, ImageError>
    where
        T: Copy,
    {
        if data.len() != size.num_pixels() {
            return Err(ImageError::InvalidDataLength(
                data.len(),
                size.num_pixels(),
            ));
        }

        let data = match layout {
            MemoryLayout::RowMajor => data.to_vec(),
            MemoryLayout::ColumnMajor => {
                let mut out = Vec::with_capacity(data.len());
                for y in 0..size.height {
                    for x in 0..size.width {
                        out.push(data[x * size.height + y]);
                    }
                }
                out
            }
        };

        Ok(Self { size, data })
    }

    /// Copy the pixel data out in the given layout.
    pub fn to_vec_with_layout(&self, layout: MemoryLayout) -> Vec<T>
    where
        T: Copy,
    {
        match layout {
            MemoryLayout::RowMajor => self.data.clone(),
            MemoryLayout::ColumnMajor => {
                let mut out = Vec::with_capacity(self.data.len());
                for x in 0..self.width() {
                    for y in 0..self.height() {
                        out.push(self.data[y * self.width() + x]);
                    }
                }
                out
            }
        }
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of columns of the image.
    pub fn cols(&self) -> usize {
        self.width()
    }

    /// Get the number of rows of the image.
    pub fn rows(&self) -> usize {
        self.height()
    }

    /// Get the row-major pixel data.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get the row-major pixel data mutably.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the image and return its row-major pixel data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Get the pixels of row `y`.
    pub fn row(&self, y: usize) -> Option<&[T]> {
        if y >= self.height() {
            return None;
        }
        let start = y * self.width();
        Some(&self.data[start..start + self.width()])
    }

    /// Get the pixel at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        self.data.get(y * self.width() + x)
    }

    /// Get the pixel at `(x, y)` or an error if it lies outside the image.
    pub fn get_pixel(&self, x: usize, y: usize) -> Result<T, ImageError>
    where
        T: Copy,
    {
        self.get(x, y)
            .copied()
            .ok_or(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ))
    }

    /// Cast the pixel data of the image to a different type.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastfilters_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8>::new(ImageSize { width: 2, height: 1 }, vec![0, 255]).unwrap();
    /// let image_f32 = image.cast::<f32>().unwrap();
    ///
    /// assert_eq!(image_f32.as_slice(), &[0.0, 255.0]);
    /// ```
    pub fn cast<U>(&self) -> Result<Image<U>, ImageError>
    where
        T: Copy + num_traits::NumCast,
        U: num_traits::NumCast,
    {
        let casted_data = self
            .data
            .iter()
            .map(|&x| {
                U::from(x).ok_or_else(|| ImageError::CastError(std::any::type_name::<U>().to_string()))
            })
            .collect::<Result<Vec<U>, ImageError>>()?;

        Image::new(self.size, casted_data)
    }
}
