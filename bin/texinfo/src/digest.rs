use std::path::PathBuf;

use clap::ArgMatches;
use texload::analyze::channel_digest;
use texload::{Image, ImageSource};
use tokio::task::spawn_blocking;

use crate::AppError;
use crate::app::decode_params;

/// Entry point for Clap sub command `digest`
pub async fn digest(options: &ArgMatches) -> crate::Result<()> {
  let in_file: PathBuf = options
    .get_one::<PathBuf>("FILE")
    .cloned()
    .ok_or(AppError::InvalidCmdSwitch("FILE not available".into()))?;
  let params = decode_params(options);

  let image = spawn_blocking(move || -> crate::Result<Image> {
    let source = ImageSource::new(&in_file)?;
    Ok(texload::decode(&source, &params)?)
  })
  .await
  .map_err(|e| AppError::General(format!("Join handle failed: {:?}", e)))??;

  for channel in &image.channels {
    println!("{}  {}", channel_digest(channel), channel.name);
  }
  Ok(())
}
