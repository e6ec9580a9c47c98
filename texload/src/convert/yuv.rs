//! Video range YUV and packed 4:2:2 formats

use byteorder::{ByteOrder, LittleEndian};

use super::texel::unorm8;
use crate::formats::dds::dxgi::DxgiFormat;

/// Luma weights of a YUV matrix
#[derive(Debug, Clone, Copy)]
pub struct YuvMatrix {
  kr: f32,
  kb: f32,
}

pub const BT601: YuvMatrix = YuvMatrix { kr: 0.299, kb: 0.114 };
pub const BT2020: YuvMatrix = YuvMatrix { kr: 0.2627, kb: 0.0593 };

impl YuvMatrix {
  /// Convert a video range sample with `bits` per component to RGB in `[0, 1]`.
  pub fn to_rgb(self, y: u32, u: u32, v: u32, bits: u32) -> [f32; 3] {
    let scale = (1_u32 << (bits - 8)) as f32;
    let y = (y as f32 - 16.0 * scale) / (219.0 * scale);
    let cb = (u as f32 - 128.0 * scale) / (224.0 * scale);
    let cr = (v as f32 - 128.0 * scale) / (224.0 * scale);

    let r = y + 2.0 * (1.0 - self.kr) * cr;
    let b = y + 2.0 * (1.0 - self.kb) * cb;
    let g = (y - self.kr * r - self.kb * b) / (1.0 - self.kr - self.kb);
    [r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0)]
  }
}

fn matrix_for(bits: u32) -> YuvMatrix {
  if bits > 8 { BT2020 } else { BT601 }
}

/// AYUV: V, U, Y, A bytes
pub fn ayuv(s: &[u8], d: &mut [f32]) {
  d[..3].copy_from_slice(&BT601.to_rgb(s[2] as u32, s[1] as u32, s[0] as u32, 8));
}

/// Y410: U in bits 0..10, Y in 10..20, V in 20..30
pub fn y410(s: &[u8], d: &mut [f32]) {
  let v = LittleEndian::read_u32(s);
  let (u, y, vv) = (v & 0x3ff, (v >> 10) & 0x3ff, (v >> 20) & 0x3ff);
  d[..3].copy_from_slice(&matrix_for(10).to_rgb(y, u, vv, 10));
}

/// Y416: U, Y, V, A words
pub fn y416(s: &[u8], d: &mut [f32]) {
  let u = LittleEndian::read_u16(&s[0..]) as u32;
  let y = LittleEndian::read_u16(&s[2..]) as u32;
  let v = LittleEndian::read_u16(&s[4..]) as u32;
  d[..3].copy_from_slice(&matrix_for(16).to_rgb(y, u, v, 16));
}

/// Packed formats where two horizontal pixels share their chroma
/// (or red and blue) samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackedPair {
  Rgbg,
  Grgb,
  Yuy2,
  Y210,
  Y216,
}

impl PackedPair {
  pub fn for_format(format: DxgiFormat) -> Option<Self> {
    Some(match format {
      DxgiFormat::R8G8_B8G8_UNORM => Self::Rgbg,
      DxgiFormat::G8R8_G8B8_UNORM => Self::Grgb,
      DxgiFormat::YUY2 => Self::Yuy2,
      DxgiFormat::Y210 => Self::Y210,
      DxgiFormat::Y216 => Self::Y216,
      _ => return None,
    })
  }

  /// Bytes per pair of pixels
  pub fn pair_bytes(self) -> usize {
    match self {
      Self::Rgbg | Self::Grgb | Self::Yuy2 => 4,
      Self::Y210 | Self::Y216 => 8,
    }
  }

  /// Convert one row of `width` pixels to RGB. `src` must hold
  /// `width.div_ceil(2)` pairs.
  pub fn convert_row(self, src: &[u8], dst: &mut [f32], width: usize) {
    let pair = self.pair_bytes();
    for x in 0..width {
      let p = &src[(x / 2) * pair..(x / 2 + 1) * pair];
      let second = x % 2 == 1;
      let rgb = match self {
        Self::Rgbg => [unorm8(p[0]), unorm8(if second { p[3] } else { p[1] }), unorm8(p[2])],
        Self::Grgb => [unorm8(p[1]), unorm8(if second { p[2] } else { p[0] }), unorm8(p[3])],
        Self::Yuy2 => {
          let y = if second { p[2] } else { p[0] };
          BT601.to_rgb(y as u32, p[1] as u32, p[3] as u32, 8)
        }
        Self::Y210 | Self::Y216 => {
          // Y210 keeps its 10 bit samples in the high bits
          let (shift, bits) = if self == Self::Y210 { (6, 10) } else { (0, 16) };
          let word = |i: usize| (LittleEndian::read_u16(&p[i * 2..]) >> shift) as u32;
          let y = if second { word(2) } else { word(0) };
          matrix_for(bits).to_rgb(y, word(1), word(3), bits)
        }
      };
      dst[x * 3..x * 3 + 3].copy_from_slice(&rgb);
    }
  }
}
