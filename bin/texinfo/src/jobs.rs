// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{
  fmt::{Debug, Display},
  path::PathBuf,
  time::Instant,
};

use async_trait::async_trait;
use futures::future::join_all;
use log::debug;
use texload::{
  analyze::{AnalyzerResult, analyze_file_structure, analyze_image},
  decoders::DecodeParams,
};
use tokio::task::spawn_blocking;

use crate::{AppError, Result};

/// Number of jobs running at the same time
const PARALLEL_JOBS: usize = 8;

#[async_trait]
pub trait Job: Clone + Debug + Send {
  type Output: Debug + Send;

  /// Execute the job
  async fn execute(&self) -> Self::Output;
}

/// Decode one file and summarize it
#[derive(Debug, Clone)]
pub struct AnalyzeJob {
  pub input: PathBuf,
  pub params: DecodeParams,
  /// Only dump the container structure
  pub structure: bool,
}

#[derive(Debug)]
pub struct JobResult {
  pub job: AnalyzeJob,
  pub duration: f32,
  pub result: Result<AnalyzerResult>,
}

impl Display for JobResult {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self.result {
      Err(error) => f.write_fmt(format_args!("Failed: '{}', {}", self.job.input.display(), error)),
      Ok(_) => f.write_fmt(format_args!("Analyzed '{}' (in {:.2}s)", self.job.input.display(), self.duration)),
    }
  }
}

impl AnalyzeJob {
  fn internal_exec(&self) -> Result<AnalyzerResult> {
    let result = if self.structure {
      analyze_file_structure(&self.input)?
    } else {
      analyze_image(&self.input, &self.params)?
    };
    Ok(result)
  }
}

#[async_trait]
impl Job for AnalyzeJob {
  type Output = JobResult;

  async fn execute(&self) -> Self::Output {
    debug!("Job running: input: {:?}, priority: {}", self.input, self.params.priority);
    let now = Instant::now();
    let cp = self.clone();
    let handle = spawn_blocking(move || cp.internal_exec());
    let result = match handle.await {
      Ok(result) => result,
      Err(e) => Err(AppError::General(format!("Join handle failed: {:?}", e))),
    };
    JobResult {
      job: self.clone(),
      duration: now.elapsed().as_secs_f32(),
      result,
    }
  }
}

/// Run jobs a few at a time in command line order. Results come back in
/// the same order.
pub async fn run_all(jobs: Vec<AnalyzeJob>) -> Vec<JobResult> {
  let mut results = Vec::with_capacity(jobs.len());
  for chunk in jobs.chunks(PARALLEL_JOBS) {
    results.extend(join_all(chunk.iter().map(|job| job.execute())).await);
  }
  results
}
