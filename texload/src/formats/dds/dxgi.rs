// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use serde::Serialize;
use std::fmt;

/// Native texel encodings a DDS container can carry
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, enumn::N, Serialize)]
#[repr(u32)]
pub enum DxgiFormat {
  UNKNOWN = 0,
  R32G32B32A32_TYPELESS = 1,
  R32G32B32A32_FLOAT = 2,
  R32G32B32A32_UINT = 3,
  R32G32B32A32_SINT = 4,
  R32G32B32_TYPELESS = 5,
  R32G32B32_FLOAT = 6,
  R32G32B32_UINT = 7,
  R32G32B32_SINT = 8,
  R16G16B16A16_TYPELESS = 9,
  R16G16B16A16_FLOAT = 10,
  R16G16B16A16_UNORM = 11,
  R16G16B16A16_UINT = 12,
  R16G16B16A16_SNORM = 13,
  R16G16B16A16_SINT = 14,
  R32G32_TYPELESS = 15,
  R32G32_FLOAT = 16,
  R32G32_UINT = 17,
  R32G32_SINT = 18,
  R32G8X24_TYPELESS = 19,
  D32_FLOAT_S8X24_UINT = 20,
  R32_FLOAT_X8X24_TYPELESS = 21,
  X32_TYPELESS_G8X24_UINT = 22,
  R10G10B10A2_TYPELESS = 23,
  R10G10B10A2_UNORM = 24,
  R10G10B10A2_UINT = 25,
  R11G11B10_FLOAT = 26,
  R8G8B8A8_TYPELESS = 27,
  R8G8B8A8_UNORM = 28,
  R8G8B8A8_UNORM_SRGB = 29,
  R8G8B8A8_UINT = 30,
  R8G8B8A8_SNORM = 31,
  R8G8B8A8_SINT = 32,
  R16G16_TYPELESS = 33,
  R16G16_FLOAT = 34,
  R16G16_UNORM = 35,
  R16G16_UINT = 36,
  R16G16_SNORM = 37,
  R16G16_SINT = 38,
  R32_TYPELESS = 39,
  D32_FLOAT = 40,
  R32_FLOAT = 41,
  R32_UINT = 42,
  R32_SINT = 43,
  R24G8_TYPELESS = 44,
  D24_UNORM_S8_UINT = 45,
  R24_UNORM_X8_TYPELESS = 46,
  X24_TYPELESS_G8_UINT = 47,
  R8G8_TYPELESS = 48,
  R8G8_UNORM = 49,
  R8G8_UINT = 50,
  R8G8_SNORM = 51,
  R8G8_SINT = 52,
  R16_TYPELESS = 53,
  R16_FLOAT = 54,
  D16_UNORM = 55,
  R16_UNORM = 56,
  R16_UINT = 57,
  R16_SNORM = 58,
  R16_SINT = 59,
  R8_TYPELESS = 60,
  R8_UNORM = 61,
  R8_UINT = 62,
  R8_SNORM = 63,
  R8_SINT = 64,
  A8_UNORM = 65,
  R1_UNORM = 66,
  R9G9B9E5_SHAREDEXP = 67,
  R8G8_B8G8_UNORM = 68,
  G8R8_G8B8_UNORM = 69,
  BC1_TYPELESS = 70,
  BC1_UNORM = 71,
  BC1_UNORM_SRGB = 72,
  BC2_TYPELESS = 73,
  BC2_UNORM = 74,
  BC2_UNORM_SRGB = 75,
  BC3_TYPELESS = 76,
  BC3_UNORM = 77,
  BC3_UNORM_SRGB = 78,
  BC4_TYPELESS = 79,
  BC4_UNORM = 80,
  BC4_SNORM = 81,
  BC5_TYPELESS = 82,
  BC5_UNORM = 83,
  BC5_SNORM = 84,
  B5G6R5_UNORM = 85,
  B5G5R5A1_UNORM = 86,
  B8G8R8A8_UNORM = 87,
  B8G8R8X8_UNORM = 88,
  R10G10B10_XR_BIAS_A2_UNORM = 89,
  B8G8R8A8_TYPELESS = 90,
  B8G8R8A8_UNORM_SRGB = 91,
  B8G8R8X8_TYPELESS = 92,
  B8G8R8X8_UNORM_SRGB = 93,
  BC6H_TYPELESS = 94,
  BC6H_UF16 = 95,
  BC6H_SF16 = 96,
  BC7_TYPELESS = 97,
  BC7_UNORM = 98,
  BC7_UNORM_SRGB = 99,
  AYUV = 100,
  Y410 = 101,
  Y416 = 102,
  NV12 = 103,
  P010 = 104,
  P016 = 105,
  _420_OPAQUE = 106,
  YUY2 = 107,
  Y210 = 108,
  Y216 = 109,
  NV11 = 110,
  AI44 = 111,
  IA44 = 112,
  P8 = 113,
  A8P8 = 114,
  B4G4R4A4_UNORM = 115,
  P208 = 130,
  V208 = 131,
  V408 = 132,
  SAMPLER_FEEDBACK_MIN_MIP_OPAQUE = 189,
  SAMPLER_FEEDBACK_MIP_REGION_USED_OPAQUE = 190,
  A4B4G4R4_UNORM = 191,
}

use DxgiFormat::*;

const FOUR_CHANNELS: &[DxgiFormat] = &[
  R32G32B32A32_TYPELESS,
  R32G32B32A32_FLOAT,
  R32G32B32A32_UINT,
  R32G32B32A32_SINT,
  R16G16B16A16_TYPELESS,
  R16G16B16A16_FLOAT,
  R16G16B16A16_UNORM,
  R16G16B16A16_UINT,
  R16G16B16A16_SNORM,
  R16G16B16A16_SINT,
  R10G10B10A2_TYPELESS,
  R10G10B10A2_UNORM,
  R10G10B10A2_UINT,
  R8G8B8A8_TYPELESS,
  R8G8B8A8_UNORM,
  R8G8B8A8_UNORM_SRGB,
  R8G8B8A8_UINT,
  R8G8B8A8_SNORM,
  R8G8B8A8_SINT,
  BC1_TYPELESS,
  BC1_UNORM,
  BC1_UNORM_SRGB,
  BC2_TYPELESS,
  BC2_UNORM,
  BC2_UNORM_SRGB,
  BC3_TYPELESS,
  BC3_UNORM,
  BC3_UNORM_SRGB,
  B5G5R5A1_UNORM,
  B8G8R8A8_UNORM,
  B8G8R8A8_TYPELESS,
  B8G8R8A8_UNORM_SRGB,
  BC7_TYPELESS,
  BC7_UNORM,
  BC7_UNORM_SRGB,
  R10G10B10_XR_BIAS_A2_UNORM,
  B4G4R4A4_UNORM,
];

const THREE_CHANNELS: &[DxgiFormat] = &[
  R32G32B32_TYPELESS,
  R32G32B32_FLOAT,
  R32G32B32_UINT,
  R32G32B32_SINT,
  R11G11B10_FLOAT,
  R9G9B9E5_SHAREDEXP,
  B5G6R5_UNORM,
  B8G8R8X8_UNORM,
  B8G8R8X8_TYPELESS,
  B8G8R8X8_UNORM_SRGB,
  BC6H_TYPELESS,
  BC6H_UF16,
  BC6H_SF16,
  R8G8_B8G8_UNORM,
  G8R8_G8B8_UNORM,
  AYUV,
  Y410,
  Y416,
  NV12,
  P010,
  P016,
  _420_OPAQUE,
  YUY2,
  Y210,
  Y216,
  NV11,
  AI44,
  IA44,
  P8,
  A8P8,
  P208,
  V208,
  V408,
];

const TWO_CHANNELS: &[DxgiFormat] = &[
  R32G32_TYPELESS,
  R32G32_FLOAT,
  R32G32_UINT,
  R32G32_SINT,
  R32G8X24_TYPELESS,
  R16G16_TYPELESS,
  R16G16_FLOAT,
  R16G16_UNORM,
  R16G16_UINT,
  R16G16_SNORM,
  R16G16_SINT,
  R24G8_TYPELESS,
  R8G8_TYPELESS,
  R8G8_UNORM,
  R8G8_UINT,
  R8G8_SNORM,
  R8G8_SINT,
  BC5_TYPELESS,
  BC5_UNORM,
  BC5_SNORM,
  D32_FLOAT_S8X24_UINT,
  D24_UNORM_S8_UINT,
];

const ONE_CHANNEL: &[DxgiFormat] = &[
  R32_TYPELESS,
  D32_FLOAT,
  R32_FLOAT,
  R32_UINT,
  R32_SINT,
  R16_TYPELESS,
  R16_FLOAT,
  D16_UNORM,
  R16_UNORM,
  R16_UINT,
  R16_SNORM,
  R16_SINT,
  R8_TYPELESS,
  R8_UNORM,
  R8_UINT,
  R8_SNORM,
  R8_SINT,
  A8_UNORM,
  R1_UNORM,
  BC4_TYPELESS,
  BC4_UNORM,
  BC4_SNORM,
  R32_FLOAT_X8X24_TYPELESS,
  R24_UNORM_X8_TYPELESS,
  X32_TYPELESS_G8X24_UINT,
  X24_TYPELESS_G8_UINT,
];

/// Output channel count per native format. Formats missing here are unsupported.
const CHANNEL_COUNT_TABLE: [(usize, &[DxgiFormat]); 4] = [(4, FOUR_CHANNELS), (3, THREE_CHANNELS), (2, TWO_CHANNELS), (1, ONE_CHANNEL)];

/// Channel count for a raw format value as stored in a container header,
/// 0 for unknown values.
pub fn classify_raw(value: u32) -> usize {
  DxgiFormat::n(value).map(DxgiFormat::channel_count).unwrap_or(0)
}

impl DxgiFormat {
  /// Number of channels the decoded image gets, 0 if the format can't be decoded.
  pub fn channel_count(self) -> usize {
    CHANNEL_COUNT_TABLE
      .iter()
      .find(|(_, formats)| formats.contains(&self))
      .map(|(count, _)| *count)
      .unwrap_or(0)
  }

  /// Float format with `count` channels, the target of all conversions.
  pub fn float_target(count: usize) -> Option<Self> {
    match count {
      4 => Some(R32G32B32A32_FLOAT),
      3 => Some(R32G32B32_FLOAT),
      2 => Some(R32G32_FLOAT),
      1 => Some(R32_FLOAT),
      _ => None,
    }
  }

  pub fn name(self) -> String {
    format!("DXGI_FORMAT_{}", format!("{:?}", self).trim_start_matches('_'))
  }

  pub fn bits_per_pixel(self) -> usize {
    match self {
      R32G32B32A32_TYPELESS | R32G32B32A32_FLOAT | R32G32B32A32_UINT | R32G32B32A32_SINT => 128,
      R32G32B32_TYPELESS | R32G32B32_FLOAT | R32G32B32_UINT | R32G32B32_SINT => 96,
      R16G16B16A16_TYPELESS | R16G16B16A16_FLOAT | R16G16B16A16_UNORM | R16G16B16A16_UINT | R16G16B16A16_SNORM | R16G16B16A16_SINT
      | R32G32_TYPELESS | R32G32_FLOAT | R32G32_UINT | R32G32_SINT | R32G8X24_TYPELESS | D32_FLOAT_S8X24_UINT | R32_FLOAT_X8X24_TYPELESS
      | X32_TYPELESS_G8X24_UINT | Y416 | Y210 | Y216 => 64,
      R10G10B10A2_TYPELESS | R10G10B10A2_UNORM | R10G10B10A2_UINT | R11G11B10_FLOAT | R8G8B8A8_TYPELESS | R8G8B8A8_UNORM
      | R8G8B8A8_UNORM_SRGB | R8G8B8A8_UINT | R8G8B8A8_SNORM | R8G8B8A8_SINT | R16G16_TYPELESS | R16G16_FLOAT | R16G16_UNORM
      | R16G16_UINT | R16G16_SNORM | R16G16_SINT | R32_TYPELESS | D32_FLOAT | R32_FLOAT | R32_UINT | R32_SINT | R24G8_TYPELESS
      | D24_UNORM_S8_UINT | R24_UNORM_X8_TYPELESS | X24_TYPELESS_G8_UINT | R9G9B9E5_SHAREDEXP | R8G8_B8G8_UNORM | G8R8_G8B8_UNORM
      | B8G8R8A8_UNORM | B8G8R8X8_UNORM | R10G10B10_XR_BIAS_A2_UNORM | B8G8R8A8_TYPELESS | B8G8R8A8_UNORM_SRGB | B8G8R8X8_TYPELESS
      | B8G8R8X8_UNORM_SRGB | AYUV | Y410 | YUY2 => 32,
      P010 | P016 | V408 => 24,
      R8G8_TYPELESS | R8G8_UNORM | R8G8_UINT | R8G8_SNORM | R8G8_SINT | R16_TYPELESS | R16_FLOAT | D16_UNORM | R16_UNORM | R16_UINT
      | R16_SNORM | R16_SINT | B5G6R5_UNORM | B5G5R5A1_UNORM | A8P8 | B4G4R4A4_UNORM | P208 | V208 | A4B4G4R4_UNORM => 16,
      NV12 | _420_OPAQUE | NV11 => 12,
      R8_TYPELESS | R8_UNORM | R8_UINT | R8_SNORM | R8_SINT | A8_UNORM | AI44 | IA44 | P8 => 8,
      R1_UNORM => 1,
      BC1_TYPELESS | BC1_UNORM | BC1_UNORM_SRGB | BC4_TYPELESS | BC4_UNORM | BC4_SNORM => 4,
      BC2_TYPELESS | BC2_UNORM | BC2_UNORM_SRGB | BC3_TYPELESS | BC3_UNORM | BC3_UNORM_SRGB | BC5_TYPELESS | BC5_UNORM | BC5_SNORM
      | BC6H_TYPELESS | BC6H_UF16 | BC6H_SF16 | BC7_TYPELESS | BC7_UNORM | BC7_UNORM_SRGB => 8,
      UNKNOWN | SAMPLER_FEEDBACK_MIN_MIP_OPAQUE | SAMPLER_FEEDBACK_MIP_REGION_USED_OPAQUE => 0,
    }
  }

  pub fn is_compressed(self) -> bool {
    matches!(
      self,
      BC1_TYPELESS
        | BC1_UNORM
        | BC1_UNORM_SRGB
        | BC2_TYPELESS
        | BC2_UNORM
        | BC2_UNORM_SRGB
        | BC3_TYPELESS
        | BC3_UNORM
        | BC3_UNORM_SRGB
        | BC4_TYPELESS
        | BC4_UNORM
        | BC4_SNORM
        | BC5_TYPELESS
        | BC5_UNORM
        | BC5_SNORM
        | BC6H_TYPELESS
        | BC6H_UF16
        | BC6H_SF16
        | BC7_TYPELESS
        | BC7_UNORM
        | BC7_UNORM_SRGB
    )
  }

  /// Bytes per 4x4 block for block compressed formats
  pub fn block_bytes(self) -> Option<usize> {
    if !self.is_compressed() {
      None
    } else if self.bits_per_pixel() == 4 {
      Some(8)
    } else {
      Some(16)
    }
  }

  /// Two pixels share one packed element
  pub fn is_packed(self) -> bool {
    matches!(self, R8G8_B8G8_UNORM | G8R8_G8B8_UNORM | YUY2 | Y210 | Y216)
  }

  pub fn is_planar(self) -> bool {
    matches!(self, NV12 | P010 | P016 | _420_OPAQUE | NV11 | P208 | V208 | V408)
  }

  pub fn is_palettized(self) -> bool {
    matches!(self, AI44 | IA44 | P8 | A8P8)
  }

  pub fn is_srgb(self) -> bool {
    matches!(
      self,
      R8G8B8A8_UNORM_SRGB | BC1_UNORM_SRGB | BC2_UNORM_SRGB | BC3_UNORM_SRGB | B8G8R8A8_UNORM_SRGB | B8G8R8X8_UNORM_SRGB | BC7_UNORM_SRGB
    )
  }

  pub fn is_typeless(self) -> bool {
    format!("{:?}", self).contains("TYPELESS")
  }

  /// Row and slice pitch in bytes for an image of the given extent,
  /// `None` on arithmetic overflow or for formats without a memory layout.
  pub fn compute_pitch(self, width: usize, height: usize) -> Option<(usize, usize)> {
    let (w, h) = (width as u64, height as u64);
    let (row, slice) = if let Some(block) = self.block_bytes() {
      let nbw = w.div_ceil(4).max(1);
      let nbh = h.div_ceil(4).max(1);
      let row = nbw.checked_mul(block as u64)?;
      (row, row.checked_mul(nbh)?)
    } else {
      match self {
        R8G8_B8G8_UNORM | G8R8_G8B8_UNORM | YUY2 => {
          let row = w.div_ceil(2).checked_mul(4)?;
          (row, row.checked_mul(h)?)
        }
        Y210 | Y216 => {
          let row = w.div_ceil(2).checked_mul(8)?;
          (row, row.checked_mul(h)?)
        }
        NV11 => {
          let row = w.div_ceil(4).checked_mul(4)?;
          (row, row.checked_mul(h)?.checked_mul(2)?)
        }
        NV12 | _420_OPAQUE => {
          let row = w.div_ceil(2).checked_mul(2)?;
          (row, row.checked_mul(h + h.div_ceil(2))?)
        }
        P010 | P016 => {
          let row = w.div_ceil(2).checked_mul(4)?;
          (row, row.checked_mul(h + h.div_ceil(2))?)
        }
        P208 => {
          let row = w.div_ceil(2).checked_mul(2)?;
          (row, row.checked_mul(h)?.checked_mul(2)?)
        }
        V208 => (w, w.checked_mul(h + h.div_ceil(2) * 2)?),
        V408 => (w, w.checked_mul(h + (h / 2) * 4)?),
        _ => {
          let bpp = self.bits_per_pixel() as u64;
          if bpp == 0 {
            return None;
          }
          let row = w.checked_mul(bpp)?.div_ceil(8);
          (row, row.checked_mul(h)?)
        }
      }
    };
    Some((usize::try_from(row).ok()?, usize::try_from(slice).ok()?))
  }
}

impl fmt::Display for DxgiFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.name())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classifier_is_total_and_bounded() {
    for value in 0..=256_u32 {
      let count = classify_raw(value);
      assert!(count <= 4, "value {} maps to {}", value, count);
      assert_eq!(count, classify_raw(value));
    }
    assert_eq!(classify_raw(0xFFFF_FFFF), 0);
  }

  #[test]
  fn classifier_table_has_no_duplicates() {
    let mut seen = std::collections::HashSet::new();
    for (_, formats) in CHANNEL_COUNT_TABLE.iter() {
      for format in formats.iter() {
        assert!(seen.insert(*format), "{} listed twice", format);
      }
    }
    let unmapped: Vec<DxgiFormat> = (0..=256).filter_map(DxgiFormat::n).filter(|f| !seen.contains(f)).collect();
    assert_eq!(
      unmapped,
      [UNKNOWN, SAMPLER_FEEDBACK_MIN_MIP_OPAQUE, SAMPLER_FEEDBACK_MIP_REGION_USED_OPAQUE, A4B4G4R4_UNORM]
    );
  }

  #[test]
  fn same_width_different_semantics() {
    // All 32 bits per pixel, yet different channel layouts
    assert_eq!(R8G8B8A8_UNORM.channel_count(), 4);
    assert_eq!(B8G8R8X8_UNORM.channel_count(), 3);
    assert_eq!(R16G16_FLOAT.channel_count(), 2);
    assert_eq!(R32_FLOAT.channel_count(), 1);
    assert_eq!(BC5_UNORM.channel_count(), 2);
    assert_eq!(BC4_SNORM.channel_count(), 1);
  }

  #[test]
  fn format_names() {
    assert_eq!(BC7_UNORM_SRGB.name(), "DXGI_FORMAT_BC7_UNORM_SRGB");
    assert_eq!(_420_OPAQUE.name(), "DXGI_FORMAT_420_OPAQUE");
    assert!(BC7_UNORM_SRGB.is_srgb());
    assert!(!BC7_UNORM.is_srgb());
    assert!(R24G8_TYPELESS.is_typeless());
  }

  #[test]
  fn pitch_for_blocks_and_bits() {
    assert_eq!(BC1_UNORM.compute_pitch(5, 5), Some((16, 32)));
    assert_eq!(BC7_UNORM.compute_pitch(1, 1), Some((16, 16)));
    assert_eq!(R8G8B8A8_UNORM.compute_pitch(3, 2), Some((12, 24)));
    assert_eq!(R1_UNORM.compute_pitch(9, 2), Some((2, 4)));
    assert_eq!(YUY2.compute_pitch(3, 1), Some((8, 8)));
    assert_eq!(UNKNOWN.compute_pitch(4, 4), None);
  }
}
