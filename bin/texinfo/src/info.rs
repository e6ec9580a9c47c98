// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{path::PathBuf, time::Instant};

use clap::ArgMatches;
use log::debug;
use texload::analyze::{AnalyzerData, AnalyzerResult, ImageSummary};

use crate::app::decode_params;
use crate::jobs::{AnalyzeJob, run_all};

/// Entry point for Clap sub command `info`
pub async fn info(options: &ArgMatches) -> crate::Result<()> {
  let now = Instant::now();
  let params = decode_params(options);
  let structure = options.get_flag("structure");
  let verbose = options.get_flag("verbose");

  let jobs: Vec<AnalyzeJob> = options
    .get_many::<PathBuf>("FILE")
    .into_iter()
    .flatten()
    .map(|input| AnalyzeJob {
      input: input.clone(),
      params: params.clone(),
      structure,
    })
    .collect();
  debug!("Created {} jobs", jobs.len());

  let results = run_all(jobs).await;
  let mut succeeded: Vec<&AnalyzerResult> = Vec::new();
  let mut failed = 0;
  for res in &results {
    if verbose {
      eprintln!("Status: {}", res);
    }
    match &res.result {
      Ok(analyze) => succeeded.push(analyze),
      Err(e) => {
        eprintln!("{}: {}", res.job.input.display(), e);
        failed += 1;
      }
    }
  }

  if options.get_flag("json") || structure {
    println!("{}", serde_json::to_string_pretty(&succeeded)?);
  } else {
    for analyze in &succeeded {
      print_summary(analyze);
    }
  }

  if verbose {
    eprintln!("Total time: {:.2}s", now.elapsed().as_secs_f32());
  }
  if failed > 0 {
    return Err(crate::AppError::General(format!("{} of {} files failed", failed, results.len())));
  }
  Ok(())
}

fn print_summary(analyze: &AnalyzerResult) {
  println!("{} ({} bytes)", analyze.file.file_name, analyze.file.file_size);
  if let Some(AnalyzerData::Summary(summary)) = &analyze.data {
    print_channels(summary);
  }
}

fn print_channels(summary: &ImageSummary) {
  println!("  Decoder:       {}", summary.decoder);
  println!("  Format:        {}", summary.format);
  println!("  sRGB:          {}", summary.srgb);
  println!("  Premultiplied: {}", summary.premultiplied_alpha);
  println!("  Layers:        {}", summary.layers.len());
  for ch in &summary.channels {
    println!(
      "  {:<24} {:>5}x{:<5} min {:>12.6} max {:>12.6} mean {:>12.6}",
      ch.name, ch.width, ch.height, ch.min, ch.max, ch.mean
    );
  }
}
