// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! Block decompression for BC1 to BC7
//!
//! All codecs decode 4x4 texel blocks into floats. Blocks at the right and
//! bottom border are cropped to the image extent.

use crate::formats::dds::dxgi::DxgiFormat;
use crate::pool::WorkerPool;

const BLOCK_DIM: usize = 4;

type Block = [[f32; 4]; 16];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockCodec {
  Bc1,
  Bc2,
  Bc3,
  Bc4 { signed: bool },
  Bc5 { signed: bool },
  Bc6h { signed: bool },
  Bc7,
}

impl BlockCodec {
  /// TYPELESS variants decode through their UNORM view
  pub fn for_format(format: DxgiFormat) -> Option<Self> {
    use DxgiFormat::*;
    Some(match format {
      BC1_TYPELESS | BC1_UNORM | BC1_UNORM_SRGB => Self::Bc1,
      BC2_TYPELESS | BC2_UNORM | BC2_UNORM_SRGB => Self::Bc2,
      BC3_TYPELESS | BC3_UNORM | BC3_UNORM_SRGB => Self::Bc3,
      BC4_TYPELESS | BC4_UNORM => Self::Bc4 { signed: false },
      BC4_SNORM => Self::Bc4 { signed: true },
      BC5_TYPELESS | BC5_UNORM => Self::Bc5 { signed: false },
      BC5_SNORM => Self::Bc5 { signed: true },
      BC6H_TYPELESS | BC6H_UF16 => Self::Bc6h { signed: false },
      BC6H_SF16 => Self::Bc6h { signed: true },
      BC7_TYPELESS | BC7_UNORM | BC7_UNORM_SRGB => Self::Bc7,
      _ => return None,
    })
  }

  pub fn block_bytes(self) -> usize {
    match self {
      Self::Bc1 | Self::Bc4 { .. } => 8,
      _ => 16,
    }
  }

  /// Channels per decoded texel
  pub fn channels(self) -> usize {
    match self {
      Self::Bc4 { .. } => 1,
      Self::Bc5 { .. } => 2,
      Self::Bc6h { .. } => 3,
      _ => 4,
    }
  }

  fn decode_block(self, block: &[u8], out: &mut Block) {
    match self {
      Self::Bc1 => decode_bc1(block, out),
      Self::Bc2 => {
        decode_color(&block[8..16], out, false);
        decode_explicit_alpha(&block[0..8], out);
      }
      Self::Bc3 => {
        decode_color(&block[8..16], out, false);
        decode_interpolated(&block[0..8], false, out, 3);
      }
      Self::Bc4 { signed } => decode_interpolated(block, signed, out, 0),
      Self::Bc5 { signed } => {
        decode_interpolated(&block[0..8], signed, out, 0);
        decode_interpolated(&block[8..16], signed, out, 1);
      }
      Self::Bc6h { signed } => {
        let mut decoded = [0.0_f32; 16 * 3];
        bcdec_rs::bc6h_float(block, &mut decoded, BLOCK_DIM * 3, signed);
        for (texel, rgb) in out.iter_mut().zip(decoded.chunks_exact(3)) {
          texel[..3].copy_from_slice(rgb);
          texel[3] = 1.0;
        }
      }
      Self::Bc7 => {
        let mut decoded = [0_u8; 16 * 4];
        bcdec_rs::bc7(block, &mut decoded, BLOCK_DIM * 4);
        for (texel, rgba) in out.iter_mut().zip(decoded.chunks_exact(4)) {
          for (v, b) in texel.iter_mut().zip(rgba) {
            *v = *b as f32 / 255.0;
          }
        }
      }
    }
  }
}

/// Decompress a whole image into `width * height * codec.channels()` floats.
pub fn decompress(
  codec: BlockCodec,
  data: &[u8],
  width: usize,
  height: usize,
  row_pitch: usize,
  pool: &WorkerPool,
  priority: i32,
) -> std::result::Result<Vec<f32>, String> {
  let blocks_x = width.div_ceil(BLOCK_DIM);
  let blocks_y = height.div_ceil(BLOCK_DIM);
  let block_bytes = codec.block_bytes();
  if row_pitch < blocks_x * block_bytes {
    return Err(format!("row pitch {} too small for {} blocks", row_pitch, blocks_x));
  }
  if data.len() < row_pitch * blocks_y {
    return Err(format!("{} bytes of block data, expected {}", data.len(), row_pitch * blocks_y));
  }

  let n = codec.channels();
  let mut out = vec![0.0_f32; width * height * n];
  // One work item is a full row of blocks, four texel rows
  pool.parallel_rows(&mut out, width * n * BLOCK_DIM, priority, |by, rows| {
    let src = &data[by * row_pitch..];
    let mut texels: Block = [[0.0; 4]; 16];
    let rows_here = rows.len() / (width * n);
    for bx in 0..blocks_x {
      let block = &src[bx * block_bytes..(bx + 1) * block_bytes];
      codec.decode_block(block, &mut texels);
      for py in 0..rows_here {
        for px in 0..BLOCK_DIM {
          let x = bx * BLOCK_DIM + px;
          if x >= width {
            break;
          }
          let dst = (py * width + x) * n;
          rows[dst..dst + n].copy_from_slice(&texels[py * BLOCK_DIM + px][..n]);
        }
      }
    }
  });
  Ok(out)
}

fn rgb565(c: u16) -> [f32; 3] {
  [
    ((c >> 11) & 0x1f) as f32 / 31.0,
    ((c >> 5) & 0x3f) as f32 / 63.0,
    (c & 0x1f) as f32 / 31.0,
  ]
}

fn lerp3(a: [f32; 3], b: [f32; 3], wa: f32, wb: f32, div: f32) -> [f32; 3] {
  [
    (a[0] * wa + b[0] * wb) / div,
    (a[1] * wa + b[1] * wb) / div,
    (a[2] * wa + b[2] * wb) / div,
  ]
}

fn decode_bc1(block: &[u8], out: &mut Block) {
  decode_color(block, out, true);
}

/// Color part shared by BC1, BC2 and BC3. Only BC1 has the
/// three color mode with transparent black.
fn decode_color(block: &[u8], out: &mut Block, allow_punchthrough: bool) {
  let c0 = u16::from_le_bytes([block[0], block[1]]);
  let c1 = u16::from_le_bytes([block[2], block[3]]);
  let indices = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
  let (a, b) = (rgb565(c0), rgb565(c1));

  let mut palette = [[0.0_f32; 4]; 4];
  let four_color = c0 > c1 || !allow_punchthrough;
  let (p2, p3) = if four_color {
    (lerp3(a, b, 2.0, 1.0, 3.0), lerp3(a, b, 1.0, 2.0, 3.0))
  } else {
    (lerp3(a, b, 1.0, 1.0, 2.0), [0.0; 3])
  };
  for (entry, rgb) in palette.iter_mut().zip([a, b, p2, p3]) {
    entry[..3].copy_from_slice(&rgb);
    entry[3] = 1.0;
  }
  if !four_color {
    palette[3][3] = 0.0;
  }

  for (i, texel) in out.iter_mut().enumerate() {
    *texel = palette[((indices >> (2 * i)) & 0b11) as usize];
  }
}

fn decode_explicit_alpha(block: &[u8], out: &mut Block) {
  let bits = u64::from_le_bytes([block[0], block[1], block[2], block[3], block[4], block[5], block[6], block[7]]);
  for (i, texel) in out.iter_mut().enumerate() {
    texel[3] = ((bits >> (4 * i)) & 0xf) as f32 / 15.0;
  }
}

/// Eight entry interpolated block used by BC3 alpha, BC4 and BC5.
/// Writes into component `channel` of every texel.
fn decode_interpolated(block: &[u8], signed: bool, out: &mut Block, channel: usize) {
  let (e0, e1, less_or_equal) = if signed {
    let a = (block[0] as i8).max(-127);
    let b = (block[1] as i8).max(-127);
    (a as f32 / 127.0, b as f32 / 127.0, a <= b)
  } else {
    (block[0] as f32 / 255.0, block[1] as f32 / 255.0, block[0] <= block[1])
  };

  let mut palette = [0.0_f32; 8];
  palette[0] = e0;
  palette[1] = e1;
  if !less_or_equal {
    for i in 1..7 {
      palette[i + 1] = (e0 * (7 - i) as f32 + e1 * i as f32) / 7.0;
    }
  } else {
    for i in 1..5 {
      palette[i + 1] = (e0 * (5 - i) as f32 + e1 * i as f32) / 5.0;
    }
    palette[6] = if signed { -1.0 } else { 0.0 };
    palette[7] = 1.0;
  }

  let bits = block[2..8].iter().rev().fold(0_u64, |acc, b| (acc << 8) | *b as u64);
  for (i, texel) in out.iter_mut().enumerate() {
    texel[channel] = palette[((bits >> (3 * i)) & 0b111) as usize];
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pool() -> WorkerPool {
    WorkerPool::new(Some(2), 64).expect("pool")
  }

  #[test]
  fn bc1_four_color_mode() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // white and black endpoints, one index per row: 0, 1, 2, 3
    let block = [0xff, 0xff, 0x00, 0x00, 0x00, 0x55, 0xaa, 0xff];
    let out = decompress(BlockCodec::Bc1, &block, 4, 4, 8, &pool(), 0)?;
    assert_eq!(out.len(), 64);
    assert_eq!(&out[0..4], &[1.0, 1.0, 1.0, 1.0]);
    assert_eq!(&out[16..20], &[0.0, 0.0, 0.0, 1.0]);
    assert!((out[32] - 2.0 / 3.0).abs() < 1e-6);
    assert!((out[48] - 1.0 / 3.0).abs() < 1e-6);
    Ok(())
  }

  #[test]
  fn bc1_punchthrough_alpha() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // c0 <= c1 selects three colors plus transparent black
    let block = [0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
    let out = decompress(BlockCodec::Bc1, &block, 4, 4, 8, &pool(), 0)?;
    assert!(out.chunks_exact(4).all(|px| px == [0.0, 0.0, 0.0, 0.0]));
    Ok(())
  }

  #[test]
  fn bc2_explicit_alpha() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut block = [0_u8; 16];
    block[0] = 0xf0; // texel 1 alpha 15, texel 0 alpha 0
    block[8] = 0xff;
    block[9] = 0xff;
    let out = decompress(BlockCodec::Bc2, &block, 4, 4, 16, &pool(), 0)?;
    assert_eq!(out[3], 0.0);
    assert_eq!(out[7], 1.0);
    assert_eq!(&out[0..3], &[1.0, 1.0, 1.0]);
    Ok(())
  }

  #[test]
  fn bc4_endpoints_and_cropping() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // All indices 1 select the second endpoint
    let block = [0, 255, 0b0100_1001, 0b1001_0010, 0b0010_0100, 0b0100_1001, 0b1001_0010, 0b0010_0100];
    let out = decompress(BlockCodec::Bc4 { signed: false }, &block, 3, 2, 8, &pool(), 0)?;
    assert_eq!(out, vec![1.0; 6]);
    Ok(())
  }

  #[test]
  fn bc4_signed_range() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // -128 clamps to -127, both endpoints equal, index 0 everywhere
    let block = [0x80, 0x80, 0, 0, 0, 0, 0, 0];
    let out = decompress(BlockCodec::Bc4 { signed: true }, &block, 4, 4, 8, &pool(), 0)?;
    assert!(out.iter().all(|v| *v == -1.0));
    Ok(())
  }

  #[test]
  fn bc5_two_channels() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut block = [0_u8; 16];
    block[0] = 255;
    block[8] = 0;
    let out = decompress(BlockCodec::Bc5 { signed: false }, &block, 4, 4, 16, &pool(), 0)?;
    assert_eq!(out.len(), 32);
    assert!(out.chunks_exact(2).all(|px| px == [1.0, 0.0]));
    Ok(())
  }

  #[test]
  fn bc6h_single_region_max_red() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // mode 11: raw 10 bit endpoints, red at its maximum, all indices 0
    let bits: u128 = 0b11 | (1023 << 5) | (1023 << 35);
    let out = decompress(BlockCodec::Bc6h { signed: false }, &bits.to_le_bytes(), 4, 4, 16, &pool(), 0)?;
    assert_eq!(out.len(), 48);
    assert!(out.chunks_exact(3).all(|px| px == [65504.0, 0.0, 0.0]));
    Ok(())
  }

  #[test]
  fn bc7_mode6_endpoints() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // mode 6: 7 bit endpoints plus p-bits 0, red and alpha at 127, all indices 0
    let bits: u128 = (1 << 6) | (127 << 7) | (127 << 14) | (127 << 49) | (127 << 56);
    let out = decompress(BlockCodec::Bc7, &bits.to_le_bytes(), 3, 3, 16, &pool(), 0)?;
    assert_eq!(out.len(), 36);
    let v = 254.0 / 255.0;
    assert!(out.chunks_exact(4).all(|px| px == [v, 0.0, 0.0, v]));
    Ok(())
  }

  #[test]
  fn short_block_data() {
    let out = decompress(BlockCodec::Bc7, &[0; 15], 4, 4, 16, &pool(), 0);
    assert!(out.is_err());
  }

  #[test]
  fn codec_mapping() {
    assert_eq!(BlockCodec::for_format(DxgiFormat::BC6H_SF16), Some(BlockCodec::Bc6h { signed: true }));
    assert_eq!(BlockCodec::for_format(DxgiFormat::BC7_UNORM_SRGB), Some(BlockCodec::Bc7));
    assert_eq!(BlockCodec::for_format(DxgiFormat::R8_UNORM), None);
    for format in [DxgiFormat::BC1_UNORM, DxgiFormat::BC4_SNORM, DxgiFormat::BC5_UNORM, DxgiFormat::BC6H_UF16] {
      let codec = BlockCodec::for_format(format).expect("codec");
      assert_eq!(codec.channels(), format.channel_count());
      assert_eq!(Some(codec.block_bytes()), format.block_bytes());
    }
  }
}
