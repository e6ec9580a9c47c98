use super::dxgi::DxgiFormat::{self, *};

pub const DDPF_ALPHAPIXELS: u32 = 0x1;
pub const DDPF_ALPHA: u32 = 0x2;
pub const DDPF_FOURCC: u32 = 0x4;
pub const DDPF_RGB: u32 = 0x40;
pub const DDPF_LUMINANCE: u32 = 0x2_0000;
pub const DDPF_BUMPDUDV: u32 = 0x8_0000;

/// Pixel format block of a DDS header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelFormatDesc {
  pub flags: u32,
  pub four_cc: u32,
  pub rgb_bit_count: u32,
  pub r_mask: u32,
  pub g_mask: u32,
  pub b_mask: u32,
  pub a_mask: u32,
}

/// Result of mapping a pre-DX10 description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyFormat {
  pub format: DxgiFormat,
  pub premultiplied: bool,
}

pub const fn four_cc(code: &[u8; 4]) -> u32 {
  u32::from_le_bytes(*code)
}

const FOURCC_TABLE: &[(u32, DxgiFormat, bool)] = &[
  (four_cc(b"DXT1"), BC1_UNORM, false),
  (four_cc(b"DXT2"), BC2_UNORM, true),
  (four_cc(b"DXT3"), BC2_UNORM, false),
  (four_cc(b"DXT4"), BC3_UNORM, true),
  (four_cc(b"DXT5"), BC3_UNORM, false),
  (four_cc(b"ATI1"), BC4_UNORM, false),
  (four_cc(b"BC4U"), BC4_UNORM, false),
  (four_cc(b"BC4S"), BC4_SNORM, false),
  (four_cc(b"ATI2"), BC5_UNORM, false),
  (four_cc(b"BC5U"), BC5_UNORM, false),
  (four_cc(b"BC5S"), BC5_SNORM, false),
  (four_cc(b"RGBG"), R8G8_B8G8_UNORM, false),
  (four_cc(b"GRGB"), G8R8_G8B8_UNORM, false),
  (four_cc(b"YUY2"), YUY2, false),
  // D3DFMT codes stored in place of a FourCC
  (36, R16G16B16A16_UNORM, false),
  (110, R16G16B16A16_SNORM, false),
  (111, R16_FLOAT, false),
  (112, R16G16_FLOAT, false),
  (113, R16G16B16A16_FLOAT, false),
  (114, R32_FLOAT, false),
  (115, R32G32_FLOAT, false),
  (116, R32G32B32A32_FLOAT, false),
];

struct MaskLayout {
  flags: u32,
  bits: u32,
  masks: [u32; 4],
  format: DxgiFormat,
}

const MASK_TABLE: &[MaskLayout] = &[
  MaskLayout { flags: DDPF_RGB, bits: 32, masks: [0xff, 0xff00, 0xff_0000, 0xff00_0000], format: R8G8B8A8_UNORM },
  MaskLayout { flags: DDPF_RGB, bits: 32, masks: [0xff_0000, 0xff00, 0xff, 0xff00_0000], format: B8G8R8A8_UNORM },
  MaskLayout { flags: DDPF_RGB, bits: 32, masks: [0xff_0000, 0xff00, 0xff, 0], format: B8G8R8X8_UNORM },
  MaskLayout { flags: DDPF_RGB, bits: 32, masks: [0x3ff, 0xffc00, 0x3ff0_0000, 0xc000_0000], format: R10G10B10A2_UNORM },
  MaskLayout { flags: DDPF_RGB, bits: 32, masks: [0xffff, 0xffff_0000, 0, 0], format: R16G16_UNORM },
  MaskLayout { flags: DDPF_RGB, bits: 32, masks: [0xffff_ffff, 0, 0, 0], format: R32_FLOAT },
  MaskLayout { flags: DDPF_RGB, bits: 16, masks: [0x7c00, 0x3e0, 0x1f, 0x8000], format: B5G5R5A1_UNORM },
  MaskLayout { flags: DDPF_RGB, bits: 16, masks: [0xf800, 0x7e0, 0x1f, 0], format: B5G6R5_UNORM },
  MaskLayout { flags: DDPF_RGB, bits: 16, masks: [0xf00, 0xf0, 0xf, 0xf000], format: B4G4R4A4_UNORM },
  MaskLayout { flags: DDPF_LUMINANCE, bits: 8, masks: [0xff, 0, 0, 0], format: R8_UNORM },
  MaskLayout { flags: DDPF_LUMINANCE, bits: 16, masks: [0xffff, 0, 0, 0], format: R16_UNORM },
  MaskLayout { flags: DDPF_LUMINANCE, bits: 16, masks: [0xff, 0, 0, 0xff00], format: R8G8_UNORM },
  MaskLayout { flags: DDPF_ALPHA, bits: 8, masks: [0, 0, 0, 0xff], format: A8_UNORM },
  MaskLayout { flags: DDPF_BUMPDUDV, bits: 16, masks: [0xff, 0xff00, 0, 0], format: R8G8_SNORM },
  MaskLayout { flags: DDPF_BUMPDUDV, bits: 32, masks: [0xff, 0xff00, 0xff_0000, 0xff00_0000], format: R8G8B8A8_SNORM },
  MaskLayout { flags: DDPF_BUMPDUDV, bits: 32, masks: [0xffff, 0xffff_0000, 0, 0], format: R16G16_SNORM },
];

/// Map a pre-DX10 pixel format onto its DXGI equivalent.
/// Returns `None` if there is no lossless equivalent (e.g. 24 bit RGB).
pub fn map_legacy_format(pf: &PixelFormatDesc) -> Option<LegacyFormat> {
  if pf.flags & DDPF_FOURCC != 0 {
    return FOURCC_TABLE
      .iter()
      .find(|(code, _, _)| *code == pf.four_cc)
      .map(|(_, format, premultiplied)| LegacyFormat {
        format: *format,
        premultiplied: *premultiplied,
      });
  }
  // Alpha mask only counts if the alpha flag is set
  let a_mask = if pf.flags & (DDPF_ALPHAPIXELS | DDPF_ALPHA) != 0 { pf.a_mask } else { 0 };
  let kind = pf.flags & (DDPF_RGB | DDPF_LUMINANCE | DDPF_ALPHA | DDPF_BUMPDUDV);
  let masks = [pf.r_mask, pf.g_mask, pf.b_mask, a_mask];
  MASK_TABLE
    .iter()
    .find(|layout| kind & layout.flags != 0 && layout.bits == pf.rgb_bit_count && layout.masks == masks)
    .map(|layout| LegacyFormat {
      format: layout.format,
      premultiplied: false,
    })
}

/// Render a FourCC for log and error messages
pub fn four_cc_str(code: u32) -> String {
  let bytes = code.to_le_bytes();
  if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
    String::from_utf8_lossy(&bytes).into_owned()
  } else {
    format!("{}", code)
  }
}
