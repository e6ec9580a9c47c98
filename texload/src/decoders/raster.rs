use std::io::{Cursor, Read};
use std::path::Path;

use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use log::debug;

use super::{DecodeParams, Decoder, peek};
use crate::image::{Image, make_channels};
use crate::source::Readable;
use crate::{DecodeError, Result};

/// Enough bytes for every signature `image` knows
const SNIFF_LEN: usize = 32;

const SUPPORTED: [ImageFormat; 6] = [
  ImageFormat::Png,
  ImageFormat::Jpeg,
  ImageFormat::Bmp,
  ImageFormat::Gif,
  ImageFormat::Qoi,
  ImageFormat::Hdr,
];

/// Fallback for common raster formats, decoded through the `image` crate
#[derive(Debug, Default)]
pub struct RasterDecoder {}

impl RasterDecoder {
  pub fn new() -> Self {
    Self {}
  }
}

fn sniff(bytes: &[u8]) -> Option<ImageFormat> {
  image::guess_format(bytes).ok().filter(|format| SUPPORTED.contains(format))
}

/// Interleaved float samples and channel count, integer formats normalized to `[0, 1]`
fn float_samples(img: &DynamicImage) -> (Vec<f32>, usize) {
  match img.color() {
    ColorType::L8 | ColorType::L16 => (img.to_luma32f().into_raw(), 1),
    ColorType::La8 | ColorType::La16 => (img.to_luma_alpha32f().into_raw(), 2),
    ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => (img.to_rgba32f().into_raw(), 4),
    _ => (img.to_rgb32f().into_raw(), 3),
  }
}

impl Decoder for RasterDecoder {
  fn name(&self) -> &'static str {
    "raster"
  }

  fn can_load(&self, stream: &mut dyn Readable) -> bool {
    peek(stream, SNIFF_LEN).map(|bytes| sniff(&bytes).is_some()).unwrap_or(false)
  }

  fn load(&self, stream: &mut dyn Readable, path: &Path, _params: &DecodeParams) -> Result<Image> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf)?;
    let format = sniff(&buf).ok_or_else(|| DecodeError::Decoder("Unknown raster format".into()))?;

    let img = ImageReader::with_format(Cursor::new(&buf), format)
      .decode()
      .map_err(|e| DecodeError::Decoder(format!("Failed to decode {:?} image: {}", format, e)))?;
    let (width, height) = (img.width() as usize, img.height() as usize);
    if width * height == 0 {
      return Err(DecodeError::EmptyImage);
    }
    let color = img.color();
    let (samples, n) = float_samples(&img);
    debug!("{:?} {:?}: {}x{} {:?}", format, path, width, height, color);

    let mut channels = make_channels(n, width, height, "");
    for (c, channel) in channels.iter_mut().enumerate() {
      for (i, v) in channel.pixels_mut().iter_mut().enumerate() {
        *v = samples[i * n + c];
      }
    }

    Ok(Image {
      channels,
      has_premultiplied_alpha: false,
      // 8 and 16 bit formats carry sRGB encoded values
      srgb: !matches!(color, ColorType::Rgb32F | ColorType::Rgba32F),
      format: format!("{:?} - {:?}", format, color),
    })
  }
}
