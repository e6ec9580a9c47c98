//! Library to decode texture containers and simple image files into a set of
//! named, planar floating point channels. Given a file in a supported format
//! you get every array slice, mip level and depth slice as its own group of
//! channels, ready to be shown by a viewer.
//!
//! # Example
//! ```rust,no_run
//! use std::env;
//!
//! fn main() {
//!   let args: Vec<_> = env::args().collect();
//!   if args.len() != 2 {
//!     println!("Usage: {} <file>", args[0]);
//!     std::process::exit(2);
//!   }
//!   let image = texload::decode_file(&args[1]).unwrap();
//!
//!   println!("{}", image.format);
//!   for channel in &image.channels {
//!     println!("{} {}x{}", channel.name, channel.width, channel.height);
//!   }
//! }
//! ```

#![deny(
    //missing_docs,
    //missing_debug_implementations,
    //missing_copy_implementations,
    //unsafe_code,
    unstable_features,
    //unused_import_braces,
    //unused_qualifications
  )]

use decoders::DecodeParams;
use decoders::Decoder;
use decoders::Loader;
use lazy_static::lazy_static;

pub mod analyze;
pub mod convert;
pub mod decoders;
pub mod decompressors;
pub mod envparams;
pub mod formats;
pub mod image;
pub mod pool;
pub mod source;

pub use image::Channel;
pub use image::Image;
pub use source::ImageSource;

lazy_static! {
  static ref LOADER: Loader = Loader::new();
}

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
  #[error("Malformed header: {}", _0)]
  MalformedHeader(String),

  #[error("Unsupported pixel format: {}", _0)]
  UnsupportedFormat(String),

  #[error("Image has zero pixels")]
  EmptyImage,

  #[error("Failed to convert layer '{}': {}", layer, reason)]
  Conversion { layer: String, reason: String },

  #[error("Couldn't find a decoder for this file")]
  NoDecoder,

  #[error("I/O error: {}", _0)]
  Io(#[from] std::io::Error),

  #[error("{}", _0)]
  Decoder(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

impl DecodeError {
  pub fn with_io_error(context: &str, path: impl AsRef<Path>, error: std::io::Error) -> Self {
    Self::Decoder(format!("I/O error in {} on file: {:?}, {}", context, path.as_ref(), error))
  }

  pub fn conversion(layer: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::Conversion {
      layer: layer.into(),
      reason: reason.into(),
    }
  }
}

impl From<String> for DecodeError {
  fn from(str: String) -> Self {
    Self::Decoder(str)
  }
}

impl From<&str> for DecodeError {
  fn from(str: &str) -> Self {
    Self::Decoder(str.to_string())
  }
}

/// Take a path to an image file and return the decoded channels or an error
///
/// # Example
/// ```rust,ignore
/// let image = match texload::decode_file("path/to/your/texture.dds") {
///   Ok(val) => val,
///   Err(e) => ... some appropriate action when the file is unreadable ...
/// };
/// ```
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<Image> {
  LOADER.decode_file(path.as_ref(), &DecodeParams::default())
}

/// Decode an already opened source
pub fn decode(source: &ImageSource, params: &DecodeParams) -> Result<Image> {
  LOADER.decode(source, params)
}

/// Returns the first registered decoder that accepts the source
pub fn get_decoder(source: &ImageSource) -> Result<&'static dyn Decoder> {
  LOADER.get_decoder(&mut source.reader())
}

/// Names of all registered decoders in probing order
pub fn decoder_names() -> Vec<&'static str> {
  LOADER.decoders().iter().map(|dec| dec.name()).collect()
}

// Used to force lazy_static initializations. Useful for benchmarks.
#[doc(hidden)]
pub fn force_initialization() {
  lazy_static::initialize(&LOADER);
}

#[cfg(test)]
pub(crate) fn init_test_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}
