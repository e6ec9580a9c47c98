// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! Pixel normalization
//!
//! Turns the native bytes of one sub-resource into interleaved floats with
//! the channel count given by the format classifier.

use byteorder::{ByteOrder, LittleEndian};
use log::trace;

use crate::decompressors::{BlockCodec, bcn};
use crate::formats::dds::dxgi::DxgiFormat;
use crate::pool::WorkerPool;

pub mod texel;
pub mod yuv;

/// Native texels of one sub-resource
#[derive(Debug, Clone, Copy)]
pub struct NativeImage<'a> {
  pub format: DxgiFormat,
  pub data: &'a [u8],
  pub width: usize,
  pub height: usize,
  pub row_pitch: usize,
}

/// Convert to `width * height * n` floats, `n` being the channel count of the format.
/// The error describes why the texels can't be converted.
pub fn normalize(native: &NativeImage, pool: &WorkerPool, priority: i32) -> std::result::Result<Vec<f32>, String> {
  let NativeImage {
    format,
    data,
    width,
    height,
    row_pitch,
  } = *native;

  if let Some(codec) = BlockCodec::for_format(format) {
    trace!("normalize(): decompress {}x{} {}", width, height, format);
    return bcn::decompress(codec, data, width, height, row_pitch, pool, priority);
  }

  let n = format.channel_count();
  let target = DxgiFormat::float_target(n).ok_or_else(|| format!("{} can't be converted", format))?;
  if format.is_planar() {
    return Err(format!("planar format {} is not supported", format));
  }
  if format.is_palettized() {
    return Err(format!("palettized format {} is not supported", format));
  }
  if data.len() < row_pitch * height {
    return Err(format!("{} bytes of pixel data, expected {}", data.len(), row_pitch * height));
  }

  let row_len = width * n;
  let mut out = vec![0.0_f32; row_len * height];

  if format == target {
    if row_pitch < row_len * 4 {
      return Err(format!("row pitch {} too small for {} floats", row_pitch, row_len));
    }
    trace!("normalize(): {} is already the target format", format);
    pool.parallel_rows(&mut out, row_len, priority, |y, row| {
      let src = &data[y * row_pitch..y * row_pitch + row_len * 4];
      LittleEndian::read_f32_into(src, row);
    });
    return Ok(out);
  }

  if let Some(packed) = yuv::PackedPair::for_format(format) {
    if row_pitch < width.div_ceil(2) * packed.pair_bytes() {
      return Err(format!("row pitch {} too small for {} pixels", row_pitch, width));
    }
    pool.parallel_rows(&mut out, row_len, priority, |y, row| {
      packed.convert_row(&data[y * row_pitch..], row, width);
    });
    return Ok(out);
  }

  if format == DxgiFormat::R1_UNORM {
    pool.parallel_rows(&mut out, row_len, priority, |y, row| {
      let src = &data[y * row_pitch..];
      for (x, v) in row.iter_mut().enumerate() {
        *v = ((src[x / 8] >> (7 - x % 8)) & 1) as f32;
      }
    });
    return Ok(out);
  }

  let layout = texel::texel_layout(format).ok_or_else(|| format!("no conversion for {}", format))?;
  let bytes = layout.bytes();
  if row_pitch < width * bytes {
    return Err(format!("row pitch {} too small for {} pixels", row_pitch, width));
  }
  pool.parallel_rows(&mut out, row_len, priority, |y, row| {
    let src = &data[y * row_pitch..];
    for (x, texel) in row.chunks_exact_mut(n).enumerate() {
      layout.read(&src[x * bytes..], texel);
    }
  });
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pool() -> WorkerPool {
    WorkerPool::new(Some(2), 16).expect("pool")
  }

  fn native(format: DxgiFormat, data: &[u8], width: usize, height: usize, row_pitch: usize) -> NativeImage<'_> {
    NativeImage {
      format,
      data,
      width,
      height,
      row_pitch,
    }
  }

  #[test]
  fn float_target_is_copied() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut data = Vec::new();
    for v in [0.25_f32, -1.5, 3.0, 7.0] {
      data.extend_from_slice(&v.to_le_bytes());
    }
    // Row padding of 4 bytes after each 1x1 RG texel
    data.splice(8..8, [0xaa; 4]);
    data.extend_from_slice(&[0xaa; 4]);
    let out = normalize(&native(DxgiFormat::R32G32_FLOAT, &data, 1, 2, 12), &pool(), 0)?;
    assert_eq!(out, [0.25, -1.5, 3.0, 7.0]);
    Ok(())
  }

  #[test]
  fn row_pitch_is_respected() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // 3x2 R8 with rows padded to 4 bytes
    let data = [0, 255, 0, 9, 255, 0, 255, 9];
    let out = normalize(&native(DxgiFormat::R8_UNORM, &data, 3, 2, 4), &pool(), 0)?;
    assert_eq!(out, [0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
    Ok(())
  }

  #[test]
  fn one_bit_per_pixel() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let data = [0b1010_0000];
    let out = normalize(&native(DxgiFormat::R1_UNORM, &data, 4, 1, 1), &pool(), 0)?;
    assert_eq!(out, [1.0, 0.0, 1.0, 0.0]);
    Ok(())
  }

  #[test]
  fn packed_yuy2_rows() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // two rows of one YUY2 pair, second row padded
    let data = [235, 128, 16, 128, 0, 16, 128, 235, 128, 0];
    let out = normalize(&native(DxgiFormat::YUY2, &data, 2, 2, 5), &pool(), 0)?;
    let expected = [1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
    assert!(out.iter().zip(expected).all(|(a, b)| (a - b).abs() < 1e-5));
    assert!(normalize(&native(DxgiFormat::YUY2, &data, 2, 2, 3), &pool(), 0).is_err());
    Ok(())
  }

  #[test]
  fn planar_and_palettized_fail() {
    let data = [0_u8; 64];
    assert!(normalize(&native(DxgiFormat::NV12, &data, 4, 4, 4), &pool(), 0).is_err());
    assert!(normalize(&native(DxgiFormat::P8, &data, 4, 4, 4), &pool(), 0).is_err());
    assert!(normalize(&native(DxgiFormat::UNKNOWN, &data, 4, 4, 4), &pool(), 0).is_err());
  }

  #[test]
  fn short_data_fails() {
    let data = [0_u8; 15];
    assert!(normalize(&native(DxgiFormat::R8G8B8A8_UNORM, &data, 2, 2, 8), &pool(), 0).is_err());
  }
}
