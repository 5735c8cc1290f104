//! Fork/join over disjoint row ranges.
//!
//! Rows are split into at most `threads` contiguous chunks, one per worker.
//! Each worker writes only to its own chunk of the output buffers, so no
//! locking is involved. With a single thread everything runs inline on the
//! caller.

use crate::core::error::{BoostingError, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

#[derive(Debug)]
pub struct RowPool {
    pool: Option<ThreadPool>,
    threads: usize,
}

impl RowPool {
    pub fn new(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(BoostingError::invalid_parameter(
                "thread_count",
                "0",
                "must be at least 1",
            ));
        }
        let pool = if threads == 1 {
            None
        } else {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("jit-trees-{}", i))
                    .build()
                    .map_err(|e| {
                        BoostingError::internal(format!("Failed to create thread pool: {}", e))
                    })?,
            )
        };
        Ok(RowPool { pool, threads })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    fn chunk_len(&self, rows: usize) -> usize {
        ((rows + self.threads - 1) / self.threads).max(1)
    }

    /// Call `f(row, &mut out[row])` for every row.
    pub fn for_each_row<F>(&self, out: &mut [f64], f: F)
    where
        F: Fn(usize, &mut f64) + Sync,
    {
        match &self.pool {
            None => out.iter_mut().enumerate().for_each(|(row, o)| f(row, o)),
            Some(pool) => {
                let chunk = self.chunk_len(out.len());
                pool.install(|| {
                    out.par_chunks_mut(chunk)
                        .enumerate()
                        .for_each(|(c, slice)| {
                            let base = c * chunk;
                            for (offset, o) in slice.iter_mut().enumerate() {
                                f(base + offset, o);
                            }
                        })
                });
            }
        }
    }

    /// Call `f(row, &mut a[row], &mut b[row])` for every row. The buffers must
    /// have the same length.
    pub fn for_each_row_pair<F>(&self, a: &mut [f64], b: &mut [f64], f: F)
    where
        F: Fn(usize, &mut f64, &mut f64) + Sync,
    {
        debug_assert_eq!(a.len(), b.len());
        match &self.pool {
            None => a
                .iter_mut()
                .zip(b.iter_mut())
                .enumerate()
                .for_each(|(row, (x, y))| f(row, x, y)),
            Some(pool) => {
                let chunk = self.chunk_len(a.len());
                pool.install(|| {
                    a.par_chunks_mut(chunk)
                        .zip(b.par_chunks_mut(chunk))
                        .enumerate()
                        .for_each(|(c, (xs, ys))| {
                            let base = c * chunk;
                            for (offset, (x, y)) in xs.iter_mut().zip(ys.iter_mut()).enumerate() {
                                f(base + offset, x, y);
                            }
                        })
                });
            }
        }
    }

    /// Run two independent jobs, in parallel when the pool has workers.
    pub fn join<A, B, RA, RB>(&self, a: A, b: B) -> (RA, RB)
    where
        A: FnOnce() -> RA + Send,
        B: FnOnce() -> RB + Send,
        RA: Send,
        RB: Send,
    {
        match &self.pool {
            None => (a(), b()),
            Some(pool) => pool.install(|| rayon::join(a, b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_threads() {
        assert!(RowPool::new(0).is_err());
    }

    #[test]
    fn test_every_row_visited_once() {
        for threads in [1, 3, 8] {
            let pool = RowPool::new(threads).unwrap();
            let mut out = vec![0.0; 17];
            pool.for_each_row(&mut out, |row, o| *o += row as f64);
            let expected: Vec<f64> = (0..17).map(|r| r as f64).collect();
            assert_eq!(out, expected);
        }
    }

    #[test]
    fn test_row_pairs() {
        let pool = RowPool::new(4).unwrap();
        let mut a = vec![10.0; 9];
        let mut b = vec![0.0; 9];
        pool.for_each_row_pair(&mut a, &mut b, |row, x, y| {
            *x -= row as f64;
            *y += row as f64;
        });
        assert_eq!(a[8], 2.0);
        assert_eq!(b[8], 8.0);
        assert!(a.iter().zip(&b).all(|(x, y)| x + y == 10.0));
    }

    #[test]
    fn test_join_and_empty_buffers() {
        let pool = RowPool::new(2).unwrap();
        let (x, y) = pool.join(|| 1 + 1, || "done");
        assert_eq!((x, y), (2, "done"));

        let mut empty: Vec<f64> = Vec::new();
        pool.for_each_row(&mut empty, |_, o| *o = 1.0);
        assert!(empty.is_empty());
    }
}
