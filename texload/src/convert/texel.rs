//! Per texel decoding of uncompressed formats

use byteorder::{ByteOrder, LittleEndian};
use half::f16;

use super::yuv;
use crate::formats::dds::dxgi::DxgiFormat::{self, *};

/// Storage type of one component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
  F32,
  U32,
  I32,
  F16,
  Unorm16,
  Snorm16,
  U16,
  I16,
  Unorm8,
  Snorm8,
  U8,
  I8,
}

impl Component {
  pub fn size(self) -> usize {
    match self {
      Self::F32 | Self::U32 | Self::I32 => 4,
      Self::F16 | Self::Unorm16 | Self::Snorm16 | Self::U16 | Self::I16 => 2,
      Self::Unorm8 | Self::Snorm8 | Self::U8 | Self::I8 => 1,
    }
  }

  #[inline(always)]
  pub fn read(self, b: &[u8]) -> f32 {
    match self {
      Self::F32 => LittleEndian::read_f32(b),
      Self::U32 => LittleEndian::read_u32(b) as f32,
      Self::I32 => LittleEndian::read_i32(b) as f32,
      Self::F16 => f16::from_bits(LittleEndian::read_u16(b)).to_f32(),
      Self::Unorm16 => unorm16(LittleEndian::read_u16(b)),
      Self::Snorm16 => (LittleEndian::read_i16(b) as f32 / 32767.0).max(-1.0),
      Self::U16 => LittleEndian::read_u16(b) as f32,
      Self::I16 => LittleEndian::read_i16(b) as f32,
      Self::Unorm8 => unorm8(b[0]),
      Self::Snorm8 => (b[0] as i8 as f32 / 127.0).max(-1.0),
      Self::U8 => b[0] as f32,
      Self::I8 => b[0] as i8 as f32,
    }
  }
}

pub type TexelFn = fn(&[u8], &mut [f32]);

/// How to turn the bytes of one texel into output components
#[derive(Clone, Copy)]
pub enum TexelLayout {
  /// `count` components of the same type, stored in output order
  Plain { component: Component, count: usize },
  /// Bit packed or reordered texels
  Custom { bytes: usize, read: TexelFn },
}

impl TexelLayout {
  pub fn bytes(&self) -> usize {
    match self {
      Self::Plain { component, count } => component.size() * count,
      Self::Custom { bytes, .. } => *bytes,
    }
  }

  #[inline(always)]
  pub fn read(&self, src: &[u8], dst: &mut [f32]) {
    match self {
      Self::Plain { component, count } => {
        let size = component.size();
        for (c, v) in dst.iter_mut().enumerate().take(*count) {
          *v = component.read(&src[c * size..]);
        }
      }
      Self::Custom { read, .. } => read(src, dst),
    }
  }
}

/// Layout for every format that converts texel by texel. Block compressed,
/// packed pair, planar and palettized formats and `R1_UNORM` are not covered.
/// TYPELESS formats with 32 bit components read as float, the others as UNORM.
pub fn texel_layout(format: DxgiFormat) -> Option<TexelLayout> {
  use Component::*;
  fn plain(component: Component, count: usize) -> Option<TexelLayout> {
    Some(TexelLayout::Plain { component, count })
  }
  fn custom(bytes: usize, read: TexelFn) -> Option<TexelLayout> {
    Some(TexelLayout::Custom { bytes, read })
  }

  match format {
    R32G32B32A32_TYPELESS | R32G32B32A32_FLOAT => plain(F32, 4),
    R32G32B32A32_UINT => plain(U32, 4),
    R32G32B32A32_SINT => plain(I32, 4),
    R32G32B32_TYPELESS | R32G32B32_FLOAT => plain(F32, 3),
    R32G32B32_UINT => plain(U32, 3),
    R32G32B32_SINT => plain(I32, 3),
    R32G32_TYPELESS | R32G32_FLOAT => plain(F32, 2),
    R32G32_UINT => plain(U32, 2),
    R32G32_SINT => plain(I32, 2),
    R32_TYPELESS | R32_FLOAT | D32_FLOAT => plain(F32, 1),
    R32_UINT => plain(U32, 1),
    R32_SINT => plain(I32, 1),

    R16G16B16A16_FLOAT => plain(F16, 4),
    R16G16B16A16_TYPELESS | R16G16B16A16_UNORM => plain(Unorm16, 4),
    R16G16B16A16_UINT => plain(U16, 4),
    R16G16B16A16_SNORM => plain(Snorm16, 4),
    R16G16B16A16_SINT => plain(I16, 4),
    R16G16_FLOAT => plain(F16, 2),
    R16G16_TYPELESS | R16G16_UNORM => plain(Unorm16, 2),
    R16G16_UINT => plain(U16, 2),
    R16G16_SNORM => plain(Snorm16, 2),
    R16G16_SINT => plain(I16, 2),
    R16_FLOAT => plain(F16, 1),
    R16_TYPELESS | R16_UNORM | D16_UNORM => plain(Unorm16, 1),
    R16_UINT => plain(U16, 1),
    R16_SNORM => plain(Snorm16, 1),
    R16_SINT => plain(I16, 1),

    R8G8B8A8_TYPELESS | R8G8B8A8_UNORM | R8G8B8A8_UNORM_SRGB => plain(Unorm8, 4),
    R8G8B8A8_UINT => plain(U8, 4),
    R8G8B8A8_SNORM => plain(Snorm8, 4),
    R8G8B8A8_SINT => plain(I8, 4),
    R8G8_TYPELESS | R8G8_UNORM => plain(Unorm8, 2),
    R8G8_UINT => plain(U8, 2),
    R8G8_SNORM => plain(Snorm8, 2),
    R8G8_SINT => plain(I8, 2),
    R8_TYPELESS | R8_UNORM | A8_UNORM => plain(Unorm8, 1),
    R8_UINT => plain(U8, 1),
    R8_SNORM => plain(Snorm8, 1),
    R8_SINT => plain(I8, 1),

    R10G10B10A2_TYPELESS | R10G10B10A2_UNORM => custom(4, rgb10a2_unorm),
    R10G10B10A2_UINT => custom(4, rgb10a2_uint),
    R10G10B10_XR_BIAS_A2_UNORM => custom(4, rgb10_xr_bias_a2),
    R11G11B10_FLOAT => custom(4, rg11b10_float),
    R9G9B9E5_SHAREDEXP => custom(4, rgb9e5),
    B5G6R5_UNORM => custom(2, b5g6r5),
    B5G5R5A1_UNORM => custom(2, b5g5r5a1),
    B4G4R4A4_UNORM => custom(2, b4g4r4a4),
    B8G8R8A8_TYPELESS | B8G8R8A8_UNORM | B8G8R8A8_UNORM_SRGB => custom(4, bgra8),
    B8G8R8X8_TYPELESS | B8G8R8X8_UNORM | B8G8R8X8_UNORM_SRGB => custom(4, bgrx8),

    R32G8X24_TYPELESS | D32_FLOAT_S8X24_UINT => custom(8, d32_s8),
    R32_FLOAT_X8X24_TYPELESS => custom(8, |s, d| d[0] = LittleEndian::read_f32(s)),
    X32_TYPELESS_G8X24_UINT => custom(8, |s, d| d[0] = s[4] as f32),
    R24G8_TYPELESS | D24_UNORM_S8_UINT => custom(4, d24_s8),
    R24_UNORM_X8_TYPELESS => custom(4, |s, d| d[0] = unorm24(LittleEndian::read_u32(s))),
    X24_TYPELESS_G8_UINT => custom(4, |s, d| d[0] = s[3] as f32),

    AYUV => custom(4, yuv::ayuv),
    Y410 => custom(4, yuv::y410),
    Y416 => custom(8, yuv::y416),

    _ => None,
  }
}

#[inline(always)]
pub fn unorm8(v: u8) -> f32 {
  v as f32 / 255.0
}

#[inline(always)]
pub fn unorm16(v: u16) -> f32 {
  v as f32 / 65535.0
}

fn unorm24(v: u32) -> f32 {
  (v & 0xff_ffff) as f32 / 16_777_215.0
}

fn bits(v: u32, shift: u32, width: u32) -> u32 {
  (v >> shift) & ((1 << width) - 1)
}

fn unorm_bits(v: u32, shift: u32, width: u32) -> f32 {
  bits(v, shift, width) as f32 / ((1 << width) - 1) as f32
}

fn rgb10a2_unorm(s: &[u8], d: &mut [f32]) {
  let v = LittleEndian::read_u32(s);
  d[0] = unorm_bits(v, 0, 10);
  d[1] = unorm_bits(v, 10, 10);
  d[2] = unorm_bits(v, 20, 10);
  d[3] = unorm_bits(v, 30, 2);
}

fn rgb10a2_uint(s: &[u8], d: &mut [f32]) {
  let v = LittleEndian::read_u32(s);
  d[0] = bits(v, 0, 10) as f32;
  d[1] = bits(v, 10, 10) as f32;
  d[2] = bits(v, 20, 10) as f32;
  d[3] = bits(v, 30, 2) as f32;
}

// Extended range: 0x180 maps to 0.0 and 0x37e to 1.0
fn rgb10_xr_bias_a2(s: &[u8], d: &mut [f32]) {
  let v = LittleEndian::read_u32(s);
  for (c, out) in d.iter_mut().take(3).enumerate() {
    *out = (bits(v, 10 * c as u32, 10) as f32 - 384.0) / 510.0;
  }
  d[3] = unorm_bits(v, 30, 2);
}

/// Unsigned float with 5 bit exponent, as used by R11G11B10
fn small_float(v: u32, mantissa_bits: u32) -> f32 {
  let exponent = v >> mantissa_bits;
  let mantissa = (v & ((1 << mantissa_bits) - 1)) as f32 / (1 << mantissa_bits) as f32;
  match exponent {
    0 => mantissa * 2.0_f32.powi(-14),
    31 if mantissa == 0.0 => f32::INFINITY,
    31 => f32::NAN,
    e => 2.0_f32.powi(e as i32 - 15) * (1.0 + mantissa),
  }
}

fn rg11b10_float(s: &[u8], d: &mut [f32]) {
  let v = LittleEndian::read_u32(s);
  d[0] = small_float(bits(v, 0, 11), 6);
  d[1] = small_float(bits(v, 11, 11), 6);
  d[2] = small_float(bits(v, 22, 10), 5);
}

fn rgb9e5(s: &[u8], d: &mut [f32]) {
  let v = LittleEndian::read_u32(s);
  let scale = 2.0_f32.powi(bits(v, 27, 5) as i32 - 15 - 9);
  d[0] = bits(v, 0, 9) as f32 * scale;
  d[1] = bits(v, 9, 9) as f32 * scale;
  d[2] = bits(v, 18, 9) as f32 * scale;
}

fn b5g6r5(s: &[u8], d: &mut [f32]) {
  let v = LittleEndian::read_u16(s) as u32;
  d[0] = unorm_bits(v, 11, 5);
  d[1] = unorm_bits(v, 5, 6);
  d[2] = unorm_bits(v, 0, 5);
}

fn b5g5r5a1(s: &[u8], d: &mut [f32]) {
  let v = LittleEndian::read_u16(s) as u32;
  d[0] = unorm_bits(v, 10, 5);
  d[1] = unorm_bits(v, 5, 5);
  d[2] = unorm_bits(v, 0, 5);
  d[3] = unorm_bits(v, 15, 1);
}

fn b4g4r4a4(s: &[u8], d: &mut [f32]) {
  let v = LittleEndian::read_u16(s) as u32;
  d[0] = unorm_bits(v, 8, 4);
  d[1] = unorm_bits(v, 4, 4);
  d[2] = unorm_bits(v, 0, 4);
  d[3] = unorm_bits(v, 12, 4);
}

fn bgra8(s: &[u8], d: &mut [f32]) {
  d[0] = unorm8(s[2]);
  d[1] = unorm8(s[1]);
  d[2] = unorm8(s[0]);
  d[3] = unorm8(s[3]);
}

fn bgrx8(s: &[u8], d: &mut [f32]) {
  d[0] = unorm8(s[2]);
  d[1] = unorm8(s[1]);
  d[2] = unorm8(s[0]);
}

fn d32_s8(s: &[u8], d: &mut [f32]) {
  d[0] = LittleEndian::read_f32(s);
  d[1] = s[4] as f32;
}

fn d24_s8(s: &[u8], d: &mut [f32]) {
  let v = LittleEndian::read_u32(s);
  d[0] = unorm24(v);
  d[1] = (v >> 24) as f32;
}
