//! Parallel utilities with feature-gated implementations
//!
//! Index-parallel maps over rayon when the `rayon` feature is enabled, with
//! a sequential fallback. Results are always returned in index order.

/// Parallel map with index
#[cfg(feature = "rayon")]
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    use rayon::prelude::*;
    (0..count).into_par_iter().map(f).collect()
}

/// Sequential map with index (fallback)
#[cfg(not(feature = "rayon"))]
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    (0..count).map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_map_indexed_keeps_order() {
        let result = parallel_map_indexed(6, |i| i * i);
        assert_eq!(result, vec![0, 1, 4, 9, 16, 25]);
    }

    #[test]
    fn test_parallel_map_indexed_empty() {
        let result: Vec<usize> = parallel_map_indexed(0, |i| i);
        assert!(result.is_empty());
    }
}
