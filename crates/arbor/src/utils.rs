//! Parallelism configuration and thread pool setup.

use rayon::prelude::*;

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// When `Parallel`, row ranges are split into one contiguous block per rayon
/// worker of the current pool. When `Sequential`, the whole range is a single
/// block processed on the calling thread.
///
/// The thread pool itself is set up by the caller, see [`run_with_threads`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if the rayon pool has multiple threads)
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

    /// Number of row blocks to split work into.
    #[inline]
    pub fn n_workers(self) -> usize {
        match self {
            Parallelism::Sequential => 1,
            Parallelism::Parallel => rayon::current_num_threads().max(1),
        }
    }

    #[inline]
    pub fn maybe_par_for_each<T, I, F>(self, iter: I, f: F)
    where
        T: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().for_each(f);
        } else {
            iter.into_iter().for_each(f);
        }
    }

    /// Fallible for_each; stops at the first error and returns it once all
    /// running work has finished.
    #[inline]
    pub fn maybe_par_try_for_each<T, E, I, F>(self, iter: I, f: F) -> Result<(), E>
    where
        T: Send,
        E: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> Result<(), E> + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().try_for_each(f)
        } else {
            iter.into_iter().try_for_each(f)
        }
    }
}

/// Length of each block when splitting `n` items over `n_workers` blocks.
///
/// Never 0, so it can be passed to `chunks_mut` directly.
#[inline]
pub fn block_len(n: usize, n_workers: usize) -> usize {
    n.div_ceil(n_workers.max(1)).max(1)
}

// =============================================================================
// Thread Pool Setup
// =============================================================================

/// Run a closure with the appropriate thread pool.
///
/// Thread count semantics:
/// - `0` = auto (use the current/global pool)
/// - `1` = sequential (no thread pool)
/// - `n > 1` = use exactly `n` threads
///
/// # Example
///
/// ```
/// use arbor::run_with_threads;
///
/// let workers = run_with_threads(4, |parallelism| parallelism.n_workers()).unwrap();
/// assert_eq!(workers, 4);
/// ```
pub fn run_with_threads<T: Send>(
    n_threads: usize,
    f: impl FnOnce(Parallelism) -> T + Send,
) -> Result<T, rayon::ThreadPoolBuildError> {
    match Parallelism::from_threads(n_threads) {
        Parallelism::Sequential => Ok(f(Parallelism::Sequential)),
        Parallelism::Parallel if n_threads == 0 => Ok(f(Parallelism::Parallel)),
        Parallelism::Parallel => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build()?;
            Ok(pool.install(|| f(Parallelism::Parallel)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallelism_from_threads() {
        assert!(!Parallelism::from_threads(1).is_parallel());
        assert!(Parallelism::from_threads(2).is_parallel());
        assert!(Parallelism::from_threads(8).is_parallel());
    }

    #[test]
    fn test_sequential_has_one_worker() {
        assert_eq!(Parallelism::Sequential.n_workers(), 1);
    }

    #[test]
    fn test_block_len() {
        assert_eq!(block_len(10, 1), 10);
        assert_eq!(block_len(10, 3), 4);
        assert_eq!(block_len(10, 20), 1);
        assert_eq!(block_len(0, 4), 1);
        assert_eq!(block_len(5, 0), 5);
    }

    #[test]
    fn test_run_with_threads_sequential() {
        let result = run_with_threads(1, |p| (p, 42)).unwrap();
        assert_eq!(result, (Parallelism::Sequential, 42));
    }

    #[test]
    fn test_run_with_threads_explicit() {
        let result = run_with_threads(3, |p| (p.n_workers(), rayon::current_num_threads())).unwrap();
        assert_eq!(result, (3, 3));
    }

    #[test]
    fn test_maybe_par_try_for_each_reports_error() {
        for parallelism in [Parallelism::Sequential, Parallelism::Parallel] {
            let result = parallelism.maybe_par_try_for_each(0..100usize, |i| {
                if i == 57 {
                    Err(i)
                } else {
                    Ok(())
                }
            });
            assert_eq!(result, Err(57));
        }
    }

    #[test]
    fn test_maybe_par_for_each() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        for parallelism in [Parallelism::Sequential, Parallelism::Parallel] {
            let sum = AtomicUsize::new(0);
            parallelism.maybe_par_for_each(0..10usize, |i| {
                sum.fetch_add(i, Ordering::Relaxed);
            });
            assert_eq!(sum.load(Ordering::Relaxed), 45);
        }
    }
}
