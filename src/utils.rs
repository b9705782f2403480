//! Common utilities used across the crate.
//!
//! This module provides parallelism configuration, thread pool setup and the
//! small statistical helpers shared by training and model selection.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

// =============================================================================
// Statistical Utilities
// =============================================================================

/// Mean and population standard deviation (ddof = 0) of a slice.
///
/// Returns `(NaN, NaN)` for an empty slice.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Number of hardware threads available to this process.
pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Resolve an `n_jobs`-style thread count (0 = all cores) to a concrete count.
pub fn resolve_threads(n_threads: usize) -> usize {
    if n_threads == 0 {
        available_cores()
    } else {
        n_threads
    }
}

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// This is a simple flag passed through training components.
/// When `Parallel`, components may use `rayon` parallel iterators.
/// When `Sequential`, components must use sequential iteration.
///
/// The actual thread pool is set up at the estimator level via `n_jobs`
/// (see [`run_with_threads`]). Components never manage thread pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if rayon pool has multiple threads, sequential otherwise)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }

    /// Run `f` over disjoint mutable chunks of `data`, in parallel when allowed.
    ///
    /// `f` receives the chunk index and the chunk.
    #[inline]
    pub fn maybe_par_chunks_mut<T, F>(self, data: &mut [T], chunk_size: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync + Send,
    {
        let chunk_size = chunk_size.max(1);
        if self.is_parallel() {
            data.par_chunks_mut(chunk_size)
                .enumerate()
                .for_each(|(i, chunk)| f(i, chunk));
        } else {
            data.chunks_mut(chunk_size)
                .enumerate()
                .for_each(|(i, chunk)| f(i, chunk));
        }
    }
}

/// Run `f` with the requested thread budget.
///
/// Threading contract:
/// - `n_threads == 0`: use rayon's global pool
/// - `n_threads == 1`: run strictly sequential (no dedicated pool, no thread spawn)
/// - `n_threads > 1`: create a dedicated pool for this call, unless the
///   current pool already has exactly that many threads
///
/// If the dedicated pool cannot be created the work runs on the global pool.
pub fn run_with_threads<T, F>(n_threads: usize, f: F) -> T
where
    T: Send,
    F: FnOnce(Parallelism) -> T + Send,
{
    let parallelism = Parallelism::from_threads(n_threads);
    match n_threads {
        0 | 1 => f(parallelism),
        n if n == rayon::current_num_threads() => f(parallelism),
        _ => match ThreadPoolBuilder::new().num_threads(n_threads).build() {
            Ok(pool) => pool.install(|| f(parallelism)),
            Err(err) => {
                tracing::warn!(n_threads, error = %err, "failed to build thread pool, using global pool");
                f(parallelism)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mean_std_population() {
        let (mean, std) = mean_std(&[1.0, 2.0, 3.0, 4.0]);
        assert_abs_diff_eq!(mean, 2.5, epsilon = 1e-12);
        // population variance = 1.25
        assert_abs_diff_eq!(std, 1.25f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_mean_std_empty_is_nan() {
        let (mean, std) = mean_std(&[]);
        assert!(mean.is_nan());
        assert!(std.is_nan());
    }

    #[test]
    fn test_parallelism_from_threads() {
        assert_eq!(Parallelism::from_threads(1), Parallelism::Sequential);
        assert_eq!(Parallelism::from_threads(4), Parallelism::Parallel);
    }

    #[test]
    fn test_maybe_par_map_preserves_order() {
        for par in [Parallelism::Sequential, Parallelism::Parallel] {
            let out = par.maybe_par_map(0..100usize, |i| i * 2);
            assert_eq!(out, (0..100).map(|i| i * 2).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_maybe_par_chunks_mut_visits_every_chunk() {
        let mut data = vec![0usize; 10];
        Parallelism::Parallel.maybe_par_chunks_mut(&mut data, 3, |i, chunk| {
            for v in chunk.iter_mut() {
                *v = i;
            }
        });
        assert_eq!(data, vec![0, 0, 0, 1, 1, 1, 2, 2, 2, 3]);
    }

    #[test]
    fn test_run_with_threads_dedicated_pool() {
        let n = run_with_threads(2, |par| {
            assert!(par.is_parallel());
            rayon::current_num_threads()
        });
        assert_eq!(n, 2);
    }
}
