// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{
  fs::File,
  io::{BufWriter, Write},
  path::PathBuf,
};

use clap::ArgMatches;
use log::{debug, info};
use texload::{Image, ImageSource, analyze::channel_as_pfm};
use tokio::task::spawn_blocking;

use crate::AppError;
use crate::app::decode_params;

/// Entry point for Clap sub command `dump`
pub async fn dump(options: &ArgMatches) -> crate::Result<()> {
  let in_file: PathBuf = options
    .get_one::<PathBuf>("FILE")
    .cloned()
    .ok_or(AppError::InvalidCmdSwitch("FILE not available".into()))?;
  let name: String = options
    .get_one::<String>("channel")
    .cloned()
    .ok_or(AppError::InvalidCmdSwitch("channel not available".into()))?;
  let output = options.get_one::<PathBuf>("output").cloned();
  let params = decode_params(options);

  debug!("Infile: {:?}, channel: {}", in_file, name);

  let image = spawn_blocking(move || -> crate::Result<Image> {
    let source = ImageSource::new(&in_file)?;
    Ok(texload::decode(&source, &params)?)
  })
  .await
  .map_err(|e| AppError::General(format!("Join handle failed: {:?}", e)))??;

  let channel = image.channel(&name).ok_or_else(|| AppError::NoSuchChannel(name.clone()))?;
  match output {
    Some(path) => {
      let mut writer = BufWriter::new(File::create(&path)?);
      channel_as_pfm(channel, &mut writer)?;
      writer.flush()?;
      info!("Channel {} written to {}", name, path.display());
    }
    None => {
      let mut writer = BufWriter::new(std::io::stdout());
      channel_as_pfm(channel, &mut writer)?;
      writer.flush()?;
    }
  }
  Ok(())
}
