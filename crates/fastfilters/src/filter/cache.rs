use std::{
    collections::HashMap,
    sync::{Arc, Mutex, OnceLock},
};

use crate::error::FilterError;

use super::kernels::{check_scale, generate_kernels, KernelSet};

/// Scales whose kernels are built when the global cache is first used.
pub const PRECOMPUTED_SCALES: [f32; 7] = [0.3, 0.7, 1.0, 1.6, 3.5, 5.0, 10.0];

/// A thread-safe memo of analytic kernels, keyed by the exact bits of the scale.
///
/// Caching never changes results, the cached kernels are the ones
/// [`generate_kernels`] returns.
#[derive(Debug, Default)]
pub struct KernelCache {
    entries: Mutex<HashMap<u32, Arc<KernelSet>>>,
}

impl KernelCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache holding the kernels for every scale in `scales`.
    pub fn with_scales(scales: &[f32]) -> Result<Self, FilterError> {
        let cache = Self::new();
        for &scale in scales {
            cache.get_or_generate(scale)?;
        }
        Ok(cache)
    }

    /// The process wide cache, seeded with [`PRECOMPUTED_SCALES`].
    pub fn global() -> &'static KernelCache {
        static CACHE: OnceLock<KernelCache> = OnceLock::new();
        CACHE.get_or_init(|| KernelCache::with_scales(&PRECOMPUTED_SCALES).unwrap_or_default())
    }

    /// Return the kernels for `scale`, generating and storing them on a miss.
    pub fn get_or_generate(&self, scale: f32) -> Result<Arc<KernelSet>, FilterError> {
        check_scale(scale)?;
        let key = scale.to_bits();

        if let Some(kernels) = self.lock()?.get(&key) {
            log::trace!("kernel cache hit for scale {}", scale);
            return Ok(Arc::clone(kernels));
        }

        // generate outside the lock, a concurrent miss on the same scale just races to insert
        log::debug!("kernel cache miss for scale {}", scale);
        let kernels = Arc::new(generate_kernels(scale)?);

        let mut entries = self.lock()?;
        Ok(Arc::clone(entries.entry(key).or_insert(kernels)))
    }

    /// Number of cached scales.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether no scale is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<u32, Arc<KernelSet>>>, FilterError> {
        self.entries
            .lock()
            .map_err(|e| FilterError::InternalComputeFailure(e.to_string()))
    }
}
