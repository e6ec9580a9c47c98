// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use log::warn;

/// Default number of pixels handed to one scatter partition
pub const DEFAULT_SCATTER_CHUNK: usize = 16384;

pub(crate) fn texload_threads() -> Option<usize> {
  match std::env::var("TEXLOAD_THREADS").map(|val| val.parse::<usize>()) {
    Ok(Ok(0)) => {
      warn!("TEXLOAD_THREADS must be greater than zero");
      None
    }
    Ok(Ok(value)) => Some(value),
    Ok(Err(_)) => {
      warn!("Invalid value for TEXLOAD_THREADS");
      None
    }
    Err(_) => None,
  }
}

pub(crate) fn texload_scatter_chunk() -> usize {
  match std::env::var("TEXLOAD_SCATTER_CHUNK").map(|val| val.parse::<usize>()) {
    Ok(Ok(value)) => value.max(1),
    Ok(Err(_)) => {
      warn!("Invalid value for TEXLOAD_SCATTER_CHUNK");
      DEFAULT_SCATTER_CHUNK
    }
    Err(_) => DEFAULT_SCATTER_CHUNK,
  }
}
