use rayon::prelude::*;

use crate::error::FilterError;

/// Number of pixels from which [`ExecutionStrategy::Auto`] switches to parallel execution.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 100_000;

/// Controls how the filter passes are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionStrategy {
    /// Run sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,

    /// Use the global Rayon thread pool to process rows in parallel.
    Parallel,

    /// Parallel for images with at least [`PARALLEL_PIXEL_THRESHOLD`] pixels, serial otherwise.
    #[default]
    Auto,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    /// Use this primarily for benchmarking or specific isolation needs.
    Fixed(usize),
}

impl ExecutionStrategy {
    /// Whether rows are processed in parallel for an image of `num_pixels` pixels.
    pub fn is_parallel(&self, num_pixels: usize) -> bool {
        match self {
            ExecutionStrategy::Serial => false,
            ExecutionStrategy::Parallel | ExecutionStrategy::Fixed(_) => true,
            ExecutionStrategy::Auto => num_pixels >= PARALLEL_PIXEL_THRESHOLD,
        }
    }

    /// Check the strategy can be executed.
    pub fn validate(&self) -> Result<(), FilterError> {
        match self {
            ExecutionStrategy::Fixed(0) => Err(FilterError::InvalidThreadCount(0)),
            _ => Ok(()),
        }
    }

    /// Run `op` on the thread pool selected by the strategy.
    pub(crate) fn install<R, F>(&self, op: F) -> Result<R, FilterError>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match self {
            ExecutionStrategy::Fixed(n) => {
                self.validate()?;
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(*n)
                    .build()
                    .map_err(|e| FilterError::InternalComputeFailure(e.to_string()))?;
                Ok(pool.install(op))
            }
            _ => Ok(op()),
        }
    }
}

/// Apply `f(row_index, row)` to every row of `dst`.
pub(crate) fn for_each_row<F>(dst: &mut [f32], cols: usize, parallel: bool, f: F)
where
    F: Fn(usize, &mut [f32]) + Send + Sync,
{
    if parallel {
        dst.par_chunks_mut(cols)
            .enumerate()
            .for_each(|(r, row)| f(r, row));
    } else {
        dst.chunks_mut(cols)
            .enumerate()
            .for_each(|(r, row)| f(r, row));
    }
}

/// Apply `f(row_index, rows, scratch)` to matching rows of three planes.
///
/// Each task owns a scratch buffer of `scratch_len` elements that is reused across rows.
pub(crate) fn for_each_row3<F>(
    planes: [&mut [f32]; 3],
    cols: usize,
    parallel: bool,
    scratch_len: usize,
    f: F,
) where
    F: Fn(usize, [&mut [f32]; 3], &mut [f32]) + Send + Sync,
{
    let [a, b, c] = planes;
    if parallel {
        a.par_chunks_mut(cols)
            .zip(b.par_chunks_mut(cols))
            .zip(c.par_chunks_mut(cols))
            .enumerate()
            .for_each_init(
                || vec![0.0f32; scratch_len],
                |scratch, (r, ((ra, rb), rc))| f(r, [ra, rb, rc], scratch),
            );
    } else {
        let mut scratch = vec![0.0f32; scratch_len];
        a.chunks_mut(cols)
            .zip(b.chunks_mut(cols))
            .zip(c.chunks_mut(cols))
            .enumerate()
            .for_each(|(r, ((ra, rb), rc))| f(r, [ra, rb, rc], &mut scratch));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_parallel() {
        assert!(!ExecutionStrategy::Serial.is_parallel(usize::MAX));
        assert!(ExecutionStrategy::Parallel.is_parallel(1));
        assert!(ExecutionStrategy::Fixed(2).is_parallel(1));
        assert!(!ExecutionStrategy::Auto.is_parallel(PARALLEL_PIXEL_THRESHOLD - 1));
        assert!(ExecutionStrategy::Auto.is_parallel(PARALLEL_PIXEL_THRESHOLD));
    }

    #[test]
    fn test_install_fixed_error() {
        let res = ExecutionStrategy::Fixed(0).install(|| 1);
        assert_eq!(res, Err(FilterError::InvalidThreadCount(0)));
    }

    #[test]
    fn test_install_fixed_success() -> Result<(), FilterError> {
        let n = ExecutionStrategy::Fixed(2).install(rayon::current_num_threads)?;
        assert_eq!(n, 2);
        Ok(())
    }

    #[test]
    fn test_for_each_row_serial_parallel() {
        let mut serial = vec![0.0; 12];
        let mut parallel = vec![0.0; 12];
        for_each_row(&mut serial, 4, false, |r, row| row.fill(r as f32));
        for_each_row(&mut parallel, 4, true, |r, row| row.fill(r as f32));
        assert_eq!(serial, parallel);
        assert_eq!(serial[8..], [2.0; 4]);
    }

    #[test]
    fn test_for_each_row3() {
        let mut a = vec![0.0; 6];
        let mut b = vec![0.0; 6];
        let mut c = vec![0.0; 6];
        for_each_row3(
            [a.as_mut_slice(), b.as_mut_slice(), c.as_mut_slice()],
            3,
            true,
            3,
            |r, [ra, rb, rc], scratch| {
                scratch.fill(r as f32);
                ra.copy_from_slice(scratch);
                rb.fill(1.0);
                rc.fill(-(r as f32));
            },
        );
        assert_eq!(a, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        assert_eq!(b, vec![1.0; 6]);
        assert_eq!(c, vec![0.0, 0.0, 0.0, -1.0, -1.0, -1.0]);
    }
}
