use crate::{
    error::ImageError,
    image::{Image, ImageSize, MemoryLayout, MAX_EXTENT},
};

const ELEMENT_SIZE: isize = std::mem::size_of::<f32>() as isize;

/// Checks the shape and byte strides of a host buffer holding `len` f32 elements.
///
/// Returns the memory layout the buffer is contiguous in. C order is preferred
/// when both apply (e.g. 1-D buffers).
fn validate_buffer(
    name: &str,
    len: usize,
    shape: &[usize],
    strides: &[isize],
) -> Result<MemoryLayout, ImageError> {
    if shape.len() != strides.len() {
        return Err(ImageError::InvalidStride {
            name: name.to_string(),
            strides: strides.to_vec(),
        });
    }

    // a zero extent means an empty array, reject these
    if shape.iter().any(|&d| d == 0 || d > MAX_EXTENT) {
        return Err(ImageError::InvalidShape {
            name: name.to_string(),
            shape: shape.to_vec(),
        });
    }

    // zero strides come from broadcasting, which we do not support
    if strides
        .iter()
        .any(|&s| s <= 0 || s > i32::MAX as isize || s % ELEMENT_SIZE != 0)
    {
        return Err(ImageError::InvalidStride {
            name: name.to_string(),
            strides: strides.to_vec(),
        });
    }

    let layout = if is_contiguous(shape, strides, (0..shape.len()).rev()) {
        MemoryLayout::RowMajor
    } else if is_contiguous(shape, strides, 0..shape.len()) {
        MemoryLayout::ColumnMajor
    } else {
        return Err(ImageError::NotContiguous(name.to_string()));
    };

    let expected = shape.iter().product::<usize>();
    if len != expected {
        return Err(ImageError::InvalidDataLength(len, expected));
    }

    Ok(layout)
}

/// Walks the dimensions from fastest to slowest varying and checks the strides are packed.
fn is_contiguous(shape: &[usize], strides: &[isize], dims: impl Iterator<Item = usize>) -> bool {
    let mut expected = ELEMENT_SIZE;
    for i in dims {
        if shape[i] > 1 && strides[i] != expected {
            return false;
        }
        expected = match expected.checked_mul(shape[i] as isize) {
            Some(e) => e,
            None => return false,
        };
    }
    true
}

/// Byte strides of a packed buffer with the given shape and layout.
pub fn contiguous_strides(shape: &[usize], layout: MemoryLayout) -> Vec<isize> {
    element_strides(shape, layout)
        .into_iter()
        .map(|s| s as isize * ELEMENT_SIZE)
        .collect()
}

fn element_strides(shape: &[usize], layout: MemoryLayout) -> Vec<usize> {
    let mut strides = vec![0; shape.len()];
    let mut acc = 1;
    match layout {
        MemoryLayout::RowMajor => {
            for i in (0..shape.len()).rev() {
                strides[i] = acc;
                acc *= shape[i];
            }
        }
        MemoryLayout::ColumnMajor => {
            for i in 0..shape.len() {
                strides[i] = acc;
                acc *= shape[i];
            }
        }
    }
    strides
}

/// A read-only view over a buffer owned by the caller.
///
/// The view is validated once on construction: it must be C or Fortran
/// contiguous, every extent must be in `1..=MAX_EXTENT` and every byte stride
/// must be a positive multiple of 4.
#[derive(Debug)]
pub struct HostArray<'a> {
    name: String,
    data: &'a [f32],
    shape: Vec<usize>,
    layout: MemoryLayout,
}

impl<'a> HostArray<'a> {
    /// Wrap a host buffer described by its shape and byte strides.
    ///
    /// # Arguments
    ///
    /// * `name` - Name used in error messages.
    /// * `data` - The buffer elements.
    /// * `shape` - Extent of every dimension, slowest-varying first for C order.
    /// * `strides` - Byte stride of every dimension.
    ///
    /// # Examples
    ///
    /// ```
    /// use fastfilters_image::{HostArray, MemoryLayout};
    ///
    /// let data = vec![0f32; 6];
    /// let arr = HostArray::new("arr", &data, &[2, 3], &[12, 4]).unwrap();
    /// assert_eq!(arr.layout(), MemoryLayout::RowMajor);
    ///
    /// let arr = HostArray::new("arr", &data, &[2, 3], &[4, 8]).unwrap();
    /// assert_eq!(arr.layout(), MemoryLayout::ColumnMajor);
    /// ```
    pub fn new(
        name: &str,
        data: &'a [f32],
        shape: &[usize],
        strides: &[isize],
    ) -> Result<Self, ImageError> {
        let layout = validate_buffer(name, data.len(), shape, strides)?;
        Ok(Self {
            name: name.to_string(),
            data,
            shape: shape.to_vec(),
            layout,
        })
    }

    /// Wrap a packed host buffer stored in `layout`.
    pub fn contiguous(
        name: &str,
        data: &'a [f32],
        shape: &[usize],
        layout: MemoryLayout,
    ) -> Result<Self, ImageError> {
        Self::new(name, data, shape, &contiguous_strides(shape, layout))
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Extent of every dimension.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Layout the buffer is contiguous in.
    pub fn layout(&self) -> MemoryLayout {
        self.layout
    }

    /// The raw buffer elements.
    pub fn as_slice(&self) -> &[f32] {
        self.data
    }

    /// Interpret a `(height, width)` buffer as an image.
    pub fn to_image(&self) -> Result<Image<f32>, ImageError> {
        if self.ndim() != 2 {
            return Err(ImageError::InvalidDimensions {
                name: self.name.clone(),
                expected: 2,
                actual: self.ndim(),
            });
        }

        let size = ImageSize {
            width: self.shape[1],
            height: self.shape[0],
        };
        Image::from_slice_with_layout(size, self.data, self.layout)
    }

    /// Interpret a 1-D buffer as a vector.
    pub fn to_vector(&self) -> Result<Vec<f32>, ImageError> {
        if self.ndim() != 1 {
            return Err(ImageError::InvalidDimensions {
                name: self.name.clone(),
                expected: 1,
                actual: self.ndim(),
            });
        }
        Ok(self.data.to_vec())
    }
}

/// A writable view over a buffer owned by the caller.
///
/// Validated with the same rules as [`HostArray`].
#[derive(Debug)]
pub struct HostArrayMut<'a> {
    name: String,
    data: &'a mut [f32],
    shape: Vec<usize>,
    layout: MemoryLayout,
}

impl<'a> HostArrayMut<'a> {
    /// Wrap a writable host buffer described by its shape and byte strides.
    pub fn new(
        name: &str,
        data: &'a mut [f32],
        shape: &[usize],
        strides: &[isize],
    ) -> Result<Self, ImageError> {
        let layout = validate_buffer(name, data.len(), shape, strides)?;
        Ok(Self {
            name: name.to_string(),
            data,
            shape: shape.to_vec(),
            layout,
        })
    }

    /// Wrap a packed writable host buffer stored in `layout`.
    pub fn contiguous(
        name: &str,
        data: &'a mut [f32],
        shape: &[usize],
        layout: MemoryLayout,
    ) -> Result<Self, ImageError> {
        let strides = contiguous_strides(shape, layout);
        Self::new(name, data, shape, &strides)
    }

    /// Name used in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Extent of every dimension.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Layout the buffer is contiguous in.
    pub fn layout(&self) -> MemoryLayout {
        self.layout
    }

    /// Stride of every dimension counted in elements.
    pub fn element_strides(&self) -> Vec<usize> {
        element_strides(&self.shape, self.layout)
    }

    /// The raw buffer elements.
    pub fn as_slice_mut(&mut self) -> &mut [f32] {
        &mut *self.data
    }
}
