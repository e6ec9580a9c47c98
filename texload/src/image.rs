// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

/// Names for the first four channels of a layer
pub const CHANNEL_NAMES: [&str; 4] = ["R", "G", "B", "A"];

/// A named plane of float samples
#[derive(Clone, PartialEq)]
pub struct Channel {
  pub name: String,
  pub width: usize,
  pub height: usize,
  data: Vec<f32>,
}

impl Channel {
  /// Create a zero filled channel, the extent never changes afterwards
  pub fn new(name: impl Into<String>, width: usize, height: usize) -> Self {
    Self {
      name: name.into(),
      width,
      height,
      data: vec![0.0; width * height],
    }
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn pixels(&self) -> &[f32] {
    &self.data
  }

  pub fn pixels_mut(&mut self) -> &mut [f32] {
    &mut self.data
  }

  #[inline(always)]
  pub fn at(&self, index: usize) -> f32 {
    self.data[index]
  }

  #[inline(always)]
  pub fn at_xy(&self, x: usize, y: usize) -> f32 {
    self.data[y * self.width + x]
  }

  /// Layer prefix of the channel name, everything up to the last dot
  pub fn layer(&self) -> &str {
    match self.name.rfind('.') {
      Some(pos) => &self.name[..=pos],
      None => "",
    }
  }

  pub fn into_inner(self) -> Vec<f32> {
    self.data
  }
}

impl std::fmt::Debug for Channel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Channel")
      .field("name", &self.name)
      .field("width", &self.width)
      .field("height", &self.height)
      .finish()
  }
}

/// Result of a single decode
#[derive(Debug, Clone, Default)]
pub struct Image {
  /// All channels, channels of one layer are adjacent
  pub channels: Vec<Channel>,
  /// Color channels are premultiplied with alpha
  pub has_premultiplied_alpha: bool,
  /// Samples are sRGB encoded instead of linear
  pub srgb: bool,
  /// Human readable description of the source encoding
  pub format: String,
}

impl Image {
  pub fn channel(&self, name: &str) -> Option<&Channel> {
    self.channels.iter().find(|ch| ch.name == name)
  }

  /// Distinct layer prefixes in channel order
  pub fn layers(&self) -> Vec<&str> {
    let mut layers: Vec<&str> = Vec::new();
    for ch in &self.channels {
      let layer = ch.layer();
      if layers.last() != Some(&layer) {
        layers.push(layer);
      }
    }
    layers
  }

  /// Width and height shared by all channels
  pub fn size(&self) -> Option<(usize, usize)> {
    self.channels.first().map(|ch| (ch.width, ch.height))
  }
}

/// Build the channels of one layer. A single channel is named `L`,
/// more channels use `R`, `G`, `B`, `A` and numeric names after that.
pub fn make_channels(count: usize, width: usize, height: usize, prefix: &str) -> Vec<Channel> {
  if count > 1 {
    (0..count)
      .map(|c| {
        let name = match CHANNEL_NAMES.get(c) {
          Some(name) => format!("{}{}", prefix, name),
          None => format!("{}{}", prefix, c),
        };
        Channel::new(name, width, height)
      })
      .collect()
  } else {
    vec![Channel::new(format!("{}L", prefix), width, height)]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn channel_naming() {
    let names: Vec<String> = make_channels(4, 2, 2, "[0].M00.D00.").into_iter().map(|c| c.name).collect();
    assert_eq!(names, ["[0].M00.D00.R", "[0].M00.D00.G", "[0].M00.D00.B", "[0].M00.D00.A"]);

    let single = make_channels(1, 2, 2, "");
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].name, "L");

    let many: Vec<String> = make_channels(6, 1, 1, "").into_iter().map(|c| c.name).collect();
    assert_eq!(many, ["R", "G", "B", "A", "4", "5"]);
  }

  #[test]
  fn layers_keep_channel_order() {
    let mut image = Image::default();
    image.channels.extend(make_channels(2, 1, 1, "[1].M00.D00."));
    image.channels.extend(make_channels(1, 1, 1, "[0].M01.D00."));
    assert_eq!(image.layers(), ["[1].M00.D00.", "[0].M01.D00."]);
    assert_eq!(image.channel("[0].M01.D00.L").map(|c| c.len()), Some(1));
  }
}
