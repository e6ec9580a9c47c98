// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

#![allow(dead_code)]

pub(crate) const DDPF_ALPHAPIXELS: u32 = 0x1;
pub(crate) const DDPF_FOURCC: u32 = 0x4;
pub(crate) const DDPF_RGB: u32 = 0x40;

const DDSD_CAPS: u32 = 0x1;
const DDSD_HEIGHT: u32 = 0x2;
const DDSD_WIDTH: u32 = 0x4;
const DDSD_PIXELFORMAT: u32 = 0x1000;
const DDSD_MIPMAPCOUNT: u32 = 0x2_0000;
const DDSD_DEPTH: u32 = 0x80_0000;
const DDSCAPS_TEXTURE: u32 = 0x1000;
const DDSCAPS2_CUBEMAP: u32 = 0x200;
const DDSCAPS2_CUBEMAP_ALLFACES: u32 = 0xFC00;

pub(crate) const DIMENSION_1D: u32 = 2;
pub(crate) const DIMENSION_2D: u32 = 3;
pub(crate) const DIMENSION_3D: u32 = 4;

pub(crate) const R32G32B32A32_FLOAT: u32 = 2;
pub(crate) const R8G8B8A8_UNORM: u32 = 28;
pub(crate) const R8G8B8A8_UNORM_SRGB: u32 = 29;
pub(crate) const R32_FLOAT: u32 = 41;
pub(crate) const R8G8_UNORM: u32 = 49;
pub(crate) const R8_UNORM: u32 = 61;
pub(crate) const NV12: u32 = 103;

/// Pre-DX10 pixel format description
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LegacyFormat {
  pub flags: u32,
  pub four_cc: u32,
  pub bits: u32,
  pub masks: [u32; 4],
}

impl LegacyFormat {
  pub fn four_cc(code: &[u8; 4]) -> Self {
    Self {
      flags: DDPF_FOURCC,
      four_cc: u32::from_le_bytes(*code),
      ..Default::default()
    }
  }
}

/// Builds DDS files in memory
#[derive(Clone, Debug)]
pub(crate) struct DdsBuilder {
  pub width: u32,
  pub height: u32,
  pub depth: u32,
  pub mips: u32,
  pub array_size: u32,
  pub dxgi_format: u32,
  pub dimension: u32,
  pub cubemap: bool,
  pub misc_flags2: u32,
  pub legacy: Option<LegacyFormat>,
}

impl DdsBuilder {
  pub fn dx10(dxgi_format: u32, width: u32, height: u32) -> Self {
    Self {
      width,
      height,
      depth: 1,
      mips: 1,
      array_size: 1,
      dxgi_format,
      dimension: DIMENSION_2D,
      cubemap: false,
      misc_flags2: 0,
      legacy: None,
    }
  }

  pub fn legacy(format: LegacyFormat, width: u32, height: u32) -> Self {
    Self {
      legacy: Some(format),
      ..Self::dx10(0, width, height)
    }
  }

  pub fn mips(mut self, mips: u32) -> Self {
    self.mips = mips;
    self
  }

  pub fn array(mut self, array_size: u32) -> Self {
    self.array_size = array_size;
    self
  }

  pub fn cube(mut self) -> Self {
    self.cubemap = true;
    self
  }

  pub fn volume(mut self, depth: u32) -> Self {
    self.depth = depth;
    self.dimension = DIMENSION_3D;
    self
  }

  pub fn premultiplied(mut self) -> Self {
    self.misc_flags2 = 2;
    self
  }

  /// Header words followed by `payload`
  pub fn build(&self, payload: &[u8]) -> Vec<u8> {
    let mut flags = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT;
    if self.mips > 1 {
      flags |= DDSD_MIPMAPCOUNT;
    }
    if self.dimension == DIMENSION_3D {
      flags |= DDSD_DEPTH;
    }
    let mut caps2 = 0;
    let pf = match self.legacy {
      Some(pf) => {
        if self.cubemap {
          caps2 = DDSCAPS2_CUBEMAP | DDSCAPS2_CUBEMAP_ALLFACES;
        }
        pf
      }
      None => LegacyFormat::four_cc(b"DX10"),
    };

    let mut words = vec![124, flags, self.height, self.width, 0, self.depth, self.mips];
    words.extend_from_slice(&[0; 11]);
    words.extend_from_slice(&[32, pf.flags, pf.four_cc, pf.bits]);
    words.extend_from_slice(&pf.masks);
    words.extend_from_slice(&[DDSCAPS_TEXTURE, caps2, 0, 0, 0]);
    if self.legacy.is_none() {
      let misc_flag = if self.cubemap { 0x4 } else { 0 };
      words.extend_from_slice(&[self.dxgi_format, self.dimension, misc_flag, self.array_size, self.misc_flags2]);
    }

    let mut buf = b"DDS ".to_vec();
    for w in words {
      buf.extend_from_slice(&w.to_le_bytes());
    }
    buf.extend_from_slice(payload);
    buf
  }
}

pub(crate) fn f32_bytes(values: &[f32]) -> Vec<u8> {
  values.iter().flat_map(|v| v.to_le_bytes()).collect()
}
