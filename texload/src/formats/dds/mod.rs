// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

//! DDS container parsing
//!
//! A DDS file is the magic `"DDS "`, a 124 byte header, an optional 20 byte
//! DX10 extension header and the pixel payload. The payload stores every
//! array item with all of its mip levels in sequence. Volume textures store
//! all depth slices of mip 0, then all slices of mip 1 and so on.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;
use serde::Serialize;

use crate::{DecodeError, Result};

pub mod dxgi;
pub mod legacy;

use dxgi::DxgiFormat;
use legacy::{PixelFormatDesc, four_cc, four_cc_str, map_legacy_format};

pub const DDS_MAGIC: &[u8; 4] = b"DDS ";
pub const DDS_HEADER_SIZE: u32 = 124;
pub const DDS_PIXELFORMAT_SIZE: u32 = 32;
pub const DX10_HEADER_SIZE: usize = 20;

pub const DDSD_HEIGHT: u32 = 0x2;
pub const DDSD_DEPTH: u32 = 0x80_0000;
pub const DDSCAPS2_CUBEMAP: u32 = 0x200;
pub const DDSCAPS2_CUBEMAP_ALLFACES: u32 = 0xFC00;
pub const DDSCAPS2_VOLUME: u32 = 0x20_0000;

pub const RESOURCE_MISC_TEXTURECUBE: u32 = 0x4;
pub const ALPHA_MODE_MASK: u32 = 0x7;
pub const ALPHA_MODE_PREMULTIPLIED: u32 = 2;

/// Upper bound for mip levels, enough for 2^32 wide images
const MAX_MIP_LEVELS: usize = 32;

/// Check for the DDS magic
pub fn is_dds(buf: &[u8]) -> bool {
  buf.starts_with(DDS_MAGIC)
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DdsHeader {
  pub size: u32,
  pub flags: u32,
  pub height: u32,
  pub width: u32,
  pub pitch_or_linear_size: u32,
  pub depth: u32,
  pub mip_map_count: u32,
  #[serde(skip)]
  pub pixel_format: PixelFormatDesc,
  pub caps: u32,
  pub caps2: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Dx10Header {
  pub dxgi_format: u32,
  pub resource_dimension: u32,
  pub misc_flag: u32,
  pub array_size: u32,
  pub misc_flags2: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, enumn::N)]
#[repr(u32)]
pub enum ResourceDimension {
  Texture1D = 2,
  Texture2D = 3,
  Texture3D = 4,
}

/// Facts about a container, parsed once and read-only afterwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerMetadata {
  pub width: usize,
  pub height: usize,
  pub depth: usize,
  /// Number of array items, six per cube for cubemaps
  pub array_size: usize,
  pub mip_levels: usize,
  pub dimension: ResourceDimension,
  pub cubemap: bool,
  pub premultiplied_alpha: bool,
  pub format: DxgiFormat,
}

impl ContainerMetadata {
  pub fn is_cubemap(&self) -> bool {
    self.cubemap
  }

  pub fn is_volume(&self) -> bool {
    self.dimension == ResourceDimension::Texture3D
  }

  pub fn mip_extent(&self, mip: usize) -> (usize, usize) {
    ((self.width >> mip).max(1), (self.height >> mip).max(1))
  }

  /// Depth slices present in the given mip level
  pub fn mip_depth(&self, mip: usize) -> usize {
    if self.is_volume() { (self.depth >> mip).max(1) } else { 1 }
  }
}

/// Location of one (array item, mip, depth slice) image in the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubResource {
  pub array_index: usize,
  pub mip: usize,
  pub slice: usize,
  pub width: usize,
  pub height: usize,
  pub row_pitch: usize,
  pub slice_pitch: usize,
  /// Offset from the beginning of the file
  pub offset: usize,
}

pub struct DdsFile<'a> {
  pub header: DdsHeader,
  pub dx10: Option<Dx10Header>,
  pub meta: ContainerMetadata,
  buf: &'a [u8],
  data_offset: usize,
}

impl<'a> DdsFile<'a> {
  pub fn parse(buf: &'a [u8]) -> Result<Self> {
    if !is_dds(buf) {
      return Err(DecodeError::MalformedHeader("DDS magic not found".into()));
    }
    if buf.len() < 4 + DDS_HEADER_SIZE as usize {
      return Err(DecodeError::MalformedHeader(format!("File too short for DDS header: {} bytes", buf.len())));
    }
    let mut stream = Cursor::new(&buf[4..]);
    let header = read_header(&mut stream)?;
    if header.size != DDS_HEADER_SIZE {
      return Err(DecodeError::MalformedHeader(format!("Invalid header size: {}", header.size)));
    }

    let mut data_offset = 4 + DDS_HEADER_SIZE as usize;
    let has_dx10 = header.pixel_format.flags & legacy::DDPF_FOURCC != 0 && header.pixel_format.four_cc == four_cc(b"DX10");

    let (dx10, meta) = if has_dx10 {
      let mut ext = [0_u8; DX10_HEADER_SIZE];
      stream
        .read_exact(&mut ext)
        .map_err(|_| DecodeError::MalformedHeader("File too short for DX10 header".into()))?;
      data_offset += DX10_HEADER_SIZE;
      let dx10 = read_dx10_header(&mut Cursor::new(&ext[..]))?;
      (Some(dx10), dx10_metadata(&header, &dx10)?)
    } else {
      (None, legacy_metadata(&header)?)
    };

    if meta.mip_levels > MAX_MIP_LEVELS {
      return Err(DecodeError::MalformedHeader(format!("Too many mip levels: {}", meta.mip_levels)));
    }

    debug!(
      "DDS {}x{}x{}, {} items, {} mips, cube: {}, format: {}",
      meta.width, meta.height, meta.depth, meta.array_size, meta.mip_levels, meta.cubemap, meta.format
    );

    Ok(Self {
      header,
      dx10,
      meta,
      buf,
      data_offset,
    })
  }

  /// Byte offset of the first payload byte
  pub fn data_offset(&self) -> usize {
    self.data_offset
  }

  /// Build the table of all sub-resources in payload order and check that
  /// the payload covers them. The table only grows by entries that passed
  /// the payload check, header counts never size an allocation.
  pub fn subresources(&self) -> Result<Vec<SubResource>> {
    let meta = &self.meta;
    let mut table = Vec::new();
    let mut offset = self.data_offset;

    let mut push = |array_index: usize, mip: usize, slice: usize, offset: &mut usize| -> Result<()> {
      let (width, height) = meta.mip_extent(mip);
      let (row_pitch, slice_pitch) = meta
        .format
        .compute_pitch(width, height)
        .ok_or_else(|| DecodeError::UnsupportedFormat(format!("No memory layout for {}", meta.format)))?;
      let end = offset
        .checked_add(slice_pitch)
        .ok_or_else(|| DecodeError::MalformedHeader("Sub-resource offset overflow".into()))?;
      if end > self.buf.len() {
        return Err(DecodeError::MalformedHeader(format!(
          "Payload truncated: item {} mip {} slice {} ends at {}, file has {} bytes",
          array_index,
          mip,
          slice,
          end,
          self.buf.len()
        )));
      }
      table.push(SubResource {
        array_index,
        mip,
        slice,
        width,
        height,
        row_pitch,
        slice_pitch,
        offset: *offset,
      });
      *offset = end;
      Ok(())
    };

    if meta.is_volume() {
      for mip in 0..meta.mip_levels {
        for slice in 0..meta.mip_depth(mip) {
          push(0, mip, slice, &mut offset)?;
        }
      }
    } else {
      for item in 0..meta.array_size {
        for mip in 0..meta.mip_levels {
          push(item, mip, 0, &mut offset)?;
        }
      }
    }
    Ok(table)
  }

  /// Pixel bytes of one sub-resource
  pub fn pixels(&self, sub: &SubResource) -> Result<&'a [u8]> {
    sub
      .offset
      .checked_add(sub.slice_pitch)
      .and_then(|end| self.buf.get(sub.offset..end))
      .ok_or_else(|| DecodeError::MalformedHeader(format!("Sub-resource at {}+{} is behind EOF", sub.offset, sub.slice_pitch)))
  }
}

fn read_header(stream: &mut Cursor<&[u8]>) -> Result<DdsHeader> {
  let size = stream.read_u32::<LittleEndian>()?;
  let flags = stream.read_u32::<LittleEndian>()?;
  let height = stream.read_u32::<LittleEndian>()?;
  let width = stream.read_u32::<LittleEndian>()?;
  let pitch_or_linear_size = stream.read_u32::<LittleEndian>()?;
  let depth = stream.read_u32::<LittleEndian>()?;
  let mip_map_count = stream.read_u32::<LittleEndian>()?;
  let mut reserved = [0_u32; 11];
  stream.read_u32_into::<LittleEndian>(&mut reserved)?;

  let pf_size = stream.read_u32::<LittleEndian>()?;
  if pf_size != DDS_PIXELFORMAT_SIZE {
    return Err(DecodeError::MalformedHeader(format!("Invalid pixel format size: {}", pf_size)));
  }
  let pixel_format = PixelFormatDesc {
    flags: stream.read_u32::<LittleEndian>()?,
    four_cc: stream.read_u32::<LittleEndian>()?,
    rgb_bit_count: stream.read_u32::<LittleEndian>()?,
    r_mask: stream.read_u32::<LittleEndian>()?,
    g_mask: stream.read_u32::<LittleEndian>()?,
    b_mask: stream.read_u32::<LittleEndian>()?,
    a_mask: stream.read_u32::<LittleEndian>()?,
  };
  let caps = stream.read_u32::<LittleEndian>()?;
  let caps2 = stream.read_u32::<LittleEndian>()?;
  // caps3, caps4, reserved2
  let mut tail = [0_u32; 3];
  stream.read_u32_into::<LittleEndian>(&mut tail)?;

  Ok(DdsHeader {
    size,
    flags,
    height,
    width,
    pitch_or_linear_size,
    depth,
    mip_map_count,
    pixel_format,
    caps,
    caps2,
  })
}

fn read_dx10_header(stream: &mut Cursor<&[u8]>) -> Result<Dx10Header> {
  Ok(Dx10Header {
    dxgi_format: stream.read_u32::<LittleEndian>()?,
    resource_dimension: stream.read_u32::<LittleEndian>()?,
    misc_flag: stream.read_u32::<LittleEndian>()?,
    array_size: stream.read_u32::<LittleEndian>()?,
    misc_flags2: stream.read_u32::<LittleEndian>()?,
  })
}

fn dx10_metadata(header: &DdsHeader, dx10: &Dx10Header) -> Result<ContainerMetadata> {
  let format = DxgiFormat::n(dx10.dxgi_format)
    .ok_or_else(|| DecodeError::UnsupportedFormat(format!("Unknown DXGI format {}", dx10.dxgi_format)))?;
  if dx10.array_size == 0 {
    return Err(DecodeError::MalformedHeader("DX10 header with zero array size".into()));
  }
  let dimension = ResourceDimension::n(dx10.resource_dimension)
    .ok_or_else(|| DecodeError::MalformedHeader(format!("Invalid resource dimension {}", dx10.resource_dimension)))?;

  let mut meta = ContainerMetadata {
    width: header.width as usize,
    height: header.height as usize,
    depth: 1,
    array_size: dx10.array_size as usize,
    mip_levels: (header.mip_map_count as usize).max(1),
    dimension,
    cubemap: false,
    premultiplied_alpha: dx10.misc_flags2 & ALPHA_MODE_MASK == ALPHA_MODE_PREMULTIPLIED,
    format,
  };

  match dimension {
    ResourceDimension::Texture1D => {
      if header.flags & DDSD_HEIGHT != 0 && header.height != 1 {
        return Err(DecodeError::MalformedHeader(format!("1D texture with height {}", header.height)));
      }
      meta.height = 1;
    }
    ResourceDimension::Texture2D => {
      if dx10.misc_flag & RESOURCE_MISC_TEXTURECUBE != 0 {
        meta.cubemap = true;
        meta.array_size = meta
          .array_size
          .checked_mul(6)
          .ok_or_else(|| DecodeError::MalformedHeader("Cube array size overflow".into()))?;
      }
    }
    ResourceDimension::Texture3D => {
      if header.flags & DDSD_DEPTH == 0 {
        return Err(DecodeError::MalformedHeader("Volume texture without depth flag".into()));
      }
      if dx10.array_size > 1 {
        return Err(DecodeError::MalformedHeader("Volume texture arrays are not allowed".into()));
      }
      meta.depth = (header.depth as usize).max(1);
    }
  }
  Ok(meta)
}

fn legacy_metadata(header: &DdsHeader) -> Result<ContainerMetadata> {
  let mapped = map_legacy_format(&header.pixel_format).ok_or_else(|| {
    let pf = &header.pixel_format;
    if pf.flags & legacy::DDPF_FOURCC != 0 {
      DecodeError::UnsupportedFormat(format!("Legacy FourCC {}", four_cc_str(pf.four_cc)))
    } else {
      DecodeError::UnsupportedFormat(format!(
        "Legacy pixel format: {} bits, masks {:08x} {:08x} {:08x} {:08x}",
        pf.rgb_bit_count, pf.r_mask, pf.g_mask, pf.b_mask, pf.a_mask
      ))
    }
  })?;

  let mut meta = ContainerMetadata {
    width: header.width as usize,
    height: header.height as usize,
    depth: 1,
    array_size: 1,
    mip_levels: (header.mip_map_count as usize).max(1),
    dimension: ResourceDimension::Texture2D,
    cubemap: false,
    premultiplied_alpha: mapped.premultiplied,
    format: mapped.format,
  };

  if header.flags & DDSD_DEPTH != 0 || header.caps2 & DDSCAPS2_VOLUME != 0 {
    meta.dimension = ResourceDimension::Texture3D;
    meta.depth = (header.depth as usize).max(1);
  } else if header.caps2 & DDSCAPS2_CUBEMAP != 0 {
    if header.caps2 & DDSCAPS2_CUBEMAP_ALLFACES != DDSCAPS2_CUBEMAP_ALLFACES {
      return Err(DecodeError::MalformedHeader("Partial cubemaps are not supported".into()));
    }
    meta.array_size = 6;
    meta.cubemap = true;
  }
  Ok(meta)
}
