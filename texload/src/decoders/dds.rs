// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::path::Path;

use log::{debug, trace};

use super::{DecodeParams, Decoder, peek};
use crate::convert::{self, NativeImage};
use crate::formats::dds::dxgi::DxgiFormat;
use crate::formats::dds::{ContainerMetadata, DdsFile, is_dds};
use crate::image::{Channel, Image, make_channels};
use crate::pool::PoolHandle;
use crate::source::Readable;
use crate::{DecodeError, ImageSource, Result};

const CUBE_FACES: [&str; 6] = ["X+", "X-", "Y+", "Y-", "Z+", "Z-"];

/// Decoder for DDS textures. Every (array item, mip, depth slice) becomes
/// its own layer of channels, all allocated at the size of mip 0.
pub struct DdsDecoder {
  pool: PoolHandle,
}

impl DdsDecoder {
  /// Acquires the shared worker pool, fails if it can't be started.
  pub fn new() -> Result<Self> {
    Ok(Self::with_pool(PoolHandle::acquire()?))
  }

  pub fn with_pool(pool: PoolHandle) -> Self {
    Self { pool }
  }

  /// Copy the texels of mip `mip` into full resolution channels. Every
  /// output pixel takes the texel it covers in the mip grid.
  fn scatter(&self, pixels: &[f32], meta: &ContainerMetadata, mip: usize, channels: &mut [Channel], priority: i32) {
    let n = channels.len();
    let width = meta.width;
    let (mip_width, mip_height) = meta.mip_extent(mip);
    let planes: Vec<&mut [f32]> = channels.iter_mut().map(|ch| ch.pixels_mut()).collect();

    self.pool.scatter(planes, priority, |start, parts| {
      let len = parts.first().map(|p| p.len()).unwrap_or(0);
      for j in 0..len {
        let i = start + j;
        let x = ((i % width) >> mip).min(mip_width - 1);
        let y = ((i / width) >> mip).min(mip_height - 1);
        let base = (x + y * mip_width) * n;
        for (c, part) in parts.iter_mut().enumerate() {
          part[j] = pixels[base + c];
        }
      }
    });
  }
}

/// Name prefix of one layer, e.g. `[0].M01.D00.` or `[1]Y-.M00.D00.` for cubemaps
pub fn layer_prefix(cubemap: bool, array_index: usize, mip: usize, slice: usize) -> String {
  if cubemap {
    format!("[{}]{}.M{:02}.D{:02}.", array_index / 6, CUBE_FACES[array_index % 6], mip, slice)
  } else {
    format!("[{}].M{:02}.D{:02}.", array_index, mip, slice)
  }
}

impl Decoder for DdsDecoder {
  fn name(&self) -> &'static str {
    "dds"
  }

  fn can_load(&self, stream: &mut dyn Readable) -> bool {
    match peek(stream, 4) {
      Ok(magic) => is_dds(&magic),
      Err(e) => {
        debug!("DDS sniffing failed: {}", e);
        false
      }
    }
  }

  fn load(&self, stream: &mut dyn Readable, path: &Path, params: &DecodeParams) -> Result<Image> {
    let source = ImageSource::new_from_reader(stream)?.with_path(path);
    let dds = DdsFile::parse(source.buf())?;
    let meta = &dds.meta;

    let n = meta.format.channel_count();
    let target = DxgiFormat::float_target(n)
      .ok_or_else(|| DecodeError::UnsupportedFormat(format!("Unsupported DXGI format: {}", meta.format as u32)))?;
    debug!("Converting {} to {}", meta.format, target);

    if meta.width * meta.height == 0 {
      return Err(DecodeError::EmptyImage);
    }

    let table = dds.subresources()?;
    let mut image = Image {
      channels: Vec::with_capacity(table.len() * n),
      ..Default::default()
    };

    // Payload order is the enumeration order: array item, then mip, then depth slice
    for sub in &table {
      let prefix = layer_prefix(meta.is_cubemap(), sub.array_index, sub.mip, sub.slice);
      trace!("Layer {}: {}x{} at offset {}", prefix, sub.width, sub.height, sub.offset);

      let native = NativeImage {
        format: meta.format,
        data: dds.pixels(sub)?,
        width: sub.width,
        height: sub.height,
        row_pitch: sub.row_pitch,
      };
      let pixels = convert::normalize(&native, &self.pool, params.priority).map_err(|reason| DecodeError::conversion(&prefix, reason))?;

      let mut channels = make_channels(n, meta.width, meta.height, &prefix);
      self.scatter(&pixels, meta, sub.mip, &mut channels, params.priority);
      image.channels.extend(channels);
    }

    image.has_premultiplied_alpha = meta.premultiplied_alpha;
    image.srgb = meta.format.is_srgb();
    image.format = format!(
      "{} - {} Depth - {} Array - {} Mips",
      meta.format.name(),
      meta.depth,
      meta.array_size,
      meta.mip_levels
    );
    debug!("Decoded {} channels from {:?}", image.channels.len(), source.path());
    Ok(image)
  }
}
