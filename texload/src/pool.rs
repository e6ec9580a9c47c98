// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{
  ops::Deref,
  sync::{Arc, Mutex, Weak},
};

use lazy_static::lazy_static;
use log::{debug, trace};
use rayon::prelude::*;

use crate::{DecodeError, Result, envparams};

lazy_static! {
  static ref SHARED_POOL: Mutex<Weak<WorkerPool>> = Mutex::new(Weak::new());
}

/// Thread pool running the per pixel work of all decoders.
///
/// Every call blocks until all partitions are finished, so no caller can
/// observe a partially written buffer.
pub struct WorkerPool {
  pool: rayon::ThreadPool,
  chunk: usize,
}

impl WorkerPool {
  pub fn new(threads: Option<usize>, chunk: usize) -> Result<Self> {
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("texload-worker-{}", i));
    if let Some(threads) = threads {
      builder = builder.num_threads(threads);
    }
    let pool = builder
      .build()
      .map_err(|e| DecodeError::Decoder(format!("Failed to start worker pool: {}", e)))?;
    Ok(Self { pool, chunk: chunk.max(1) })
  }

  pub fn threads(&self) -> usize {
    self.pool.current_num_threads()
  }

  pub fn chunk_size(&self) -> usize {
    self.chunk
  }

  /// Process rows of `out` in parallel. `work` gets the row index and the row buffer.
  pub fn parallel_rows<T, F>(&self, out: &mut [T], row_len: usize, priority: i32, work: F)
  where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
  {
    if row_len == 0 {
      return;
    }
    trace!("parallel_rows(): {} rows, priority {}", out.len() / row_len, priority);
    self.pool.install(|| {
      out.par_chunks_mut(row_len).enumerate().for_each(|(row, line)| work(row, line));
    });
  }

  /// Split every plane into the same index partitions and run `work` once per
  /// partition. `work` receives the first linear index of the partition and
  /// the partition's slice of every plane, so no two workers touch the same
  /// index. Returns after every partition has finished.
  pub fn scatter<T, F>(&self, planes: Vec<&mut [T]>, priority: i32, work: F)
  where
    T: Send,
    F: Fn(usize, &mut [&mut [T]]) + Sync + Send,
  {
    let len = planes.first().map(|plane| plane.len()).unwrap_or(0);
    debug_assert!(planes.iter().all(|plane| plane.len() == len));
    let chunk = self.chunk;

    let mut parts: Vec<Vec<&mut [T]>> = (0..len.div_ceil(chunk)).map(|_| Vec::with_capacity(planes.len())).collect();
    for plane in planes {
      for (part, piece) in parts.iter_mut().zip(plane.chunks_mut(chunk)) {
        part.push(piece);
      }
    }
    trace!("scatter(): {} indices in {} partitions, priority {}", len, parts.len(), priority);

    self.pool.install(|| {
      parts.into_par_iter().enumerate().for_each(|(i, mut part)| work(i * chunk, &mut part));
    });
  }
}

impl Drop for WorkerPool {
  fn drop(&mut self) {
    debug!("Worker pool with {} threads released", self.threads());
  }
}

/// Process wide decoding runtime, shared by all decoders holding a handle.
///
/// The pool is started by the first `acquire()` and shut down when the last
/// handle is dropped.
#[derive(Clone)]
pub struct PoolHandle {
  pool: Arc<WorkerPool>,
}

impl PoolHandle {
  pub fn acquire() -> Result<Self> {
    let mut shared = SHARED_POOL
      .lock()
      .map_err(|_| DecodeError::Decoder("Worker pool registry is poisoned".into()))?;
    if let Some(pool) = shared.upgrade() {
      return Ok(Self { pool });
    }
    let pool = Arc::new(WorkerPool::new(envparams::texload_threads(), envparams::texload_scatter_chunk())?);
    debug!("Worker pool started with {} threads", pool.threads());
    *shared = Arc::downgrade(&pool);
    Ok(Self { pool })
  }

  /// Number of live handles to the shared pool
  pub fn active_handles() -> usize {
    SHARED_POOL.lock().map(|shared| shared.strong_count()).unwrap_or(0)
  }

  pub fn shares_pool_with(&self, other: &PoolHandle) -> bool {
    Arc::ptr_eq(&self.pool, &other.pool)
  }
}

impl Deref for PoolHandle {
  type Target = WorkerPool;

  fn deref(&self) -> &Self::Target {
    &self.pool
  }
}
