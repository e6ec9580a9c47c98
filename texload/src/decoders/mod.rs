// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::io::{Read, Seek, SeekFrom};
use std::panic;
use std::panic::AssertUnwindSafe;
use std::path::Path;

use log::{debug, warn};

use crate::DecodeError;
use crate::Image;
use crate::ImageSource;
use crate::Result;
use crate::source::Readable;

pub mod dds;
pub mod pfm;
pub mod raster;

pub use dds::DdsDecoder;
pub use pfm::PfmDecoder;
pub use raster::RasterDecoder;

const BUG: &str = "\nThis is a bug in texload, please report it.";

/// Per request options
#[derive(Clone, Debug, Default)]
pub struct DecodeParams {
  /// Advisory channel selection, decoders may ignore it
  pub channel_selector: String,
  /// Scheduling priority among concurrent decodes, higher runs first
  pub priority: i32,
}

impl DecodeParams {
  pub fn with_priority(priority: i32) -> Self {
    Self {
      priority,
      ..Default::default()
    }
  }
}

/// A format plugin of the loader
pub trait Decoder: Send + Sync {
  /// Short name for logs and the CLI
  fn name(&self) -> &'static str;

  /// Check if the stream looks like this format. The stream position is
  /// restored before returning, whatever the outcome.
  fn can_load(&self, stream: &mut dyn Readable) -> bool;

  /// Decode the stream, starting at its current position.
  /// `path` is a hint for messages only.
  fn load(&self, stream: &mut dyn Readable, path: &Path, params: &DecodeParams) -> Result<Image>;
}

/// Read up to `len` bytes and seek back to the position on entry, even if
/// reading fails or hits the end of the stream.
pub fn peek(stream: &mut dyn Readable, len: usize) -> std::io::Result<Vec<u8>> {
  let start = stream.stream_position()?;
  let mut buf = Vec::with_capacity(len);
  let read = Read::take(&mut *stream, len as u64).read_to_end(&mut buf);
  stream.seek(SeekFrom::Start(start))?;
  read?;
  Ok(buf)
}

/// The decoder registry. Decoders are probed in order, specific
/// formats first and generic fallbacks last.
pub struct Loader {
  decoders: Vec<Box<dyn Decoder>>,
}

impl Loader {
  /// Build the default registry. Decoders that fail to start are skipped.
  pub fn new() -> Loader {
    let mut decoders: Vec<Box<dyn Decoder>> = Vec::new();
    decoders.push(Box::new(PfmDecoder::new()));
    match DdsDecoder::new() {
      Ok(dec) => decoders.push(Box::new(dec)),
      Err(e) => warn!("DDS decoder is not available: {}", e),
    }
    decoders.push(Box::new(RasterDecoder::new()));
    Self::with_decoders(decoders)
  }

  pub fn with_decoders(decoders: Vec<Box<dyn Decoder>>) -> Loader {
    debug!("Registered decoders: {:?}", decoders.iter().map(|d| d.name()).collect::<Vec<_>>());
    Self { decoders }
  }

  pub fn decoders(&self) -> &[Box<dyn Decoder>] {
    &self.decoders
  }

  /// Returns the first decoder accepting the stream
  pub fn get_decoder(&self, stream: &mut dyn Readable) -> Result<&dyn Decoder> {
    for decoder in &self.decoders {
      if decoder.can_load(stream) {
        debug!("Found decoder: {}", decoder.name());
        return Ok(decoder.as_ref());
      }
    }
    Err(DecodeError::NoDecoder)
  }

  fn decode_unsafe(&self, source: &ImageSource, params: &DecodeParams) -> Result<Image> {
    let mut stream = source.reader();
    let decoder = self.get_decoder(&mut stream)?;
    debug!("Decode {:?} with {} decoder, priority {}", source.path(), decoder.name(), params.priority);
    decoder.load(&mut stream, source.path(), params)
  }

  /// Decode a source, panics inside decoders are reported as errors
  pub fn decode(&self, source: &ImageSource, params: &DecodeParams) -> Result<Image> {
    match panic::catch_unwind(AssertUnwindSafe(|| self.decode_unsafe(source, params))) {
      Ok(val) => val,
      Err(_) => Err(DecodeError::Decoder(format!("Caught a panic while decoding.{}", BUG))),
    }
  }

  /// Decodes a file into an Image
  pub fn decode_file(&self, path: &Path, params: &DecodeParams) -> Result<Image> {
    let source = match ImageSource::new(path) {
      Ok(val) => val,
      Err(e) => return Err(DecodeError::with_io_error("decode_file()", path, e)),
    };
    self.decode(&source, params)
  }
}

impl Default for Loader {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  struct Panicking;

  impl Decoder for Panicking {
    fn name(&self) -> &'static str {
      "panic"
    }

    fn can_load(&self, _stream: &mut dyn Readable) -> bool {
      true
    }

    fn load(&self, _stream: &mut dyn Readable, _path: &Path, _params: &DecodeParams) -> Result<Image> {
      panic!("broken decoder");
    }
  }

  #[test]
  fn peek_restores_position() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut stream = Cursor::new(vec![1_u8, 2, 3]);
    stream.set_position(1);
    assert_eq!(peek(&mut stream, 4)?, [2, 3]);
    assert_eq!(stream.stream_position()?, 1);
    Ok(())
  }

  #[test]
  fn registry_order() {
    crate::init_test_logger();
    let names: Vec<&str> = Loader::new().decoders().iter().map(|d| d.name()).collect();
    assert_eq!(names, ["pfm", "dds", "raster"]);
  }

  #[test]
  fn unknown_data_has_no_decoder() {
    let loader = Loader::new();
    let source = ImageSource::new_from_slice(b"this is not an image");
    assert!(matches!(loader.decode(&source, &DecodeParams::default()), Err(DecodeError::NoDecoder)));
  }

  #[test]
  fn panics_are_caught() {
    let loader = Loader::with_decoders(vec![Box::new(Panicking) as Box<dyn Decoder>]);
    let source = ImageSource::new_from_slice(b"x");
    assert!(matches!(loader.decode(&source, &DecodeParams::default()), Err(DecodeError::Decoder(_))));
  }
}
