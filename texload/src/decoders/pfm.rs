use std::io::Read;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::debug;

use super::{DecodeParams, Decoder, peek};
use crate::image::{Image, make_channels};
use crate::source::Readable;
use crate::{DecodeError, Result};

/// Portable float map: text header followed by raw 32 bit floats,
/// bottom row first. A negative scale means little endian samples.
#[derive(Debug, Default)]
pub struct PfmDecoder {}

impl PfmDecoder {
  pub fn new() -> Self {
    Self {}
  }
}

struct PfmHeader {
  channels: usize,
  width: usize,
  height: usize,
  scale: f32,
  data_offset: usize,
}

/// Whitespace separated words of the text header
struct Tokens<'a> {
  buf: &'a [u8],
  pos: usize,
}

impl<'a> Tokens<'a> {
  fn next_word(&mut self) -> Result<&'a str> {
    let buf = self.buf;
    while self.pos < buf.len() && buf[self.pos].is_ascii_whitespace() {
      self.pos += 1;
    }
    let start = self.pos;
    while self.pos < buf.len() && !buf[self.pos].is_ascii_whitespace() {
      self.pos += 1;
    }
    if start == self.pos {
      return Err(DecodeError::Decoder("PFM header is truncated".into()));
    }
    std::str::from_utf8(&buf[start..self.pos]).map_err(|_| DecodeError::Decoder("PFM header is not ASCII".into()))
  }
}

fn parse_header(buf: &[u8]) -> Result<PfmHeader> {
  let mut tokens = Tokens { buf, pos: 0 };
  let channels = match tokens.next_word()? {
    "PF" => 3,
    "Pf" => 1,
    magic => return Err(DecodeError::Decoder(format!("Invalid PFM magic: {}", magic))),
  };
  let number = |s: &str| s.parse::<usize>().map_err(|_| DecodeError::Decoder(format!("Invalid PFM size: {}", s)));
  let width = number(tokens.next_word()?)?;
  let height = number(tokens.next_word()?)?;
  let scale_str = tokens.next_word()?;
  let scale: f32 = scale_str
    .parse()
    .map_err(|_| DecodeError::Decoder(format!("Invalid PFM scale: {}", scale_str)))?;
  if scale == 0.0 || !scale.is_finite() {
    return Err(DecodeError::Decoder(format!("Invalid PFM scale: {}", scale)));
  }
  // A single whitespace character separates header and samples
  let data_offset = tokens.pos + 1;
  Ok(PfmHeader {
    channels,
    width,
    height,
    scale,
    data_offset,
  })
}

impl Decoder for PfmDecoder {
  fn name(&self) -> &'static str {
    "pfm"
  }

  fn can_load(&self, stream: &mut dyn Readable) -> bool {
    matches!(peek(stream, 3).as_deref(), Ok([b'P', b'F' | b'f', ws]) if ws.is_ascii_whitespace())
  }

  fn load(&self, stream: &mut dyn Readable, path: &Path, _params: &DecodeParams) -> Result<Image> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf)?;
    let header = parse_header(&buf)?;
    let PfmHeader {
      channels: n,
      width,
      height,
      ..
    } = header;
    if width == 0 || height == 0 {
      return Err(DecodeError::EmptyImage);
    }

    let oversized = || DecodeError::Decoder(format!("PFM size {}x{} is too large", width, height));
    let row_len = width.checked_mul(n).ok_or_else(oversized)?;
    let expected = row_len.checked_mul(height).and_then(|v| v.checked_mul(4)).ok_or_else(oversized)?;
    let end = header.data_offset.checked_add(expected).ok_or_else(oversized)?;
    let data = buf
      .get(header.data_offset..end)
      .ok_or_else(|| DecodeError::Decoder(format!("PFM data truncated, expected {} bytes", expected)))?;
    debug!("PFM {:?}: {}x{}, {} channels, scale {}", path, width, height, n, header.scale);

    let little_endian = header.scale < 0.0;
    let factor = header.scale.abs();
    let mut channels = make_channels(n, width, height, "");
    let mut samples = vec![0.0_f32; row_len];
    for (file_row, src) in data.chunks_exact(row_len * 4).enumerate() {
      if little_endian {
        LittleEndian::read_f32_into(src, &mut samples);
      } else {
        BigEndian::read_f32_into(src, &mut samples);
      }
      let y = height - 1 - file_row;
      for (c, channel) in channels.iter_mut().enumerate() {
        let dst = &mut channel.pixels_mut()[y * width..(y + 1) * width];
        for (x, v) in dst.iter_mut().enumerate() {
          *v = samples[x * n + c] * factor;
        }
      }
    }

    Ok(Image {
      channels,
      has_premultiplied_alpha: false,
      srgb: false,
      format: if n == 3 { "PFM RGB".into() } else { "PFM Grayscale".into() },
    })
  }
}
