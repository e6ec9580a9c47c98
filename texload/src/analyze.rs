use std::{io::Write, path::Path};

use byteorder::{LittleEndian, WriteBytesExt};
use hex::FromHex;
use md5::Digest;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
  Channel, DecodeError, Image, ImageSource, Result,
  decoders::DecodeParams,
  formats::dds::{ContainerMetadata, DdsFile, DdsHeader, Dx10Header},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Md5Digest {
  digest: md5::Digest,
}

impl From<md5::Digest> for Md5Digest {
  fn from(digest: md5::Digest) -> Self {
    Self { digest }
  }
}

impl std::fmt::Display for Md5Digest {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:x}", self.digest)
  }
}

impl Serialize for Md5Digest {
  fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for Md5Digest {
  fn deserialize<D>(deserializer: D) -> std::result::Result<Md5Digest, D::Error>
  where
    D: Deserializer<'de>,
  {
    use serde::de::Error;
    let s = String::deserialize(deserializer)?;
    if s.len() != 32 {
      Err(D::Error::custom(format!("Invalid digest value: {}", s)))
    } else {
      Ok(Md5Digest {
        digest: Digest(<[u8; 16]>::from_hex(s).map_err(D::Error::custom)?),
      })
    }
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
  pub file_size: u64,
  pub file_name: String,
  pub digest: Option<Md5Digest>,
}

/// Statistics of one decoded channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
  pub name: String,
  pub width: usize,
  pub height: usize,
  pub min: f32,
  pub max: f32,
  pub mean: f64,
  pub digest: Md5Digest,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
  pub decoder: String,
  pub format: String,
  pub srgb: bool,
  pub premultiplied_alpha: bool,
  pub layers: Vec<String>,
  pub channels: Vec<ChannelStats>,
}

/// Container structure of a DDS file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DdsDump {
  pub header: DdsHeader,
  pub dx10: Option<Dx10Header>,
  pub metadata: ContainerMetadata,
  pub subresources: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalyzerData {
  Summary(ImageSummary),
  FileStructure(DdsDump),
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerResult {
  pub file: FileMetadata,
  pub data: Option<AnalyzerData>,
}

fn file_metadata<P: AsRef<Path>>(path: P, source: &ImageSource) -> FileMetadata {
  FileMetadata {
    file_name: path
      .as_ref()
      .file_name()
      .map(|name| name.to_string_lossy().to_string())
      .unwrap_or_default(),
    file_size: source.len() as u64,
    digest: Some(source.digest().into()),
  }
}

/// MD5 over the little endian bytes of all samples
pub fn channel_digest(channel: &Channel) -> Md5Digest {
  let mut ctx = md5::Context::new();
  for v in channel.pixels() {
    ctx.consume(v.to_le_bytes());
  }
  ctx.compute().into()
}

pub fn channel_stats(channel: &Channel) -> ChannelStats {
  let (min, max, sum) = channel
    .pixels()
    .iter()
    .fold((f32::INFINITY, f32::NEG_INFINITY, 0.0_f64), |(min, max, sum), v| {
      (min.min(*v), max.max(*v), sum + *v as f64)
    });
  let mean = if channel.is_empty() { 0.0 } else { sum / channel.len() as f64 };
  ChannelStats {
    name: channel.name.clone(),
    width: channel.width,
    height: channel.height,
    min,
    max,
    mean,
    digest: channel_digest(channel),
  }
}

pub fn summarize(image: &Image, decoder: &str) -> ImageSummary {
  ImageSummary {
    decoder: decoder.to_string(),
    format: image.format.clone(),
    srgb: image.srgb,
    premultiplied_alpha: image.has_premultiplied_alpha,
    layers: image.layers().into_iter().map(String::from).collect(),
    channels: image.channels.iter().map(channel_stats).collect(),
  }
}

/// Decode a file and summarize all channels
pub fn analyze_image<P: AsRef<Path>>(path: P, params: &DecodeParams) -> Result<AnalyzerResult> {
  let source = ImageSource::new(path.as_ref()).map_err(|e| DecodeError::with_io_error("analyze_image()", &path, e))?;
  let decoder = crate::get_decoder(&source)?;
  let image = crate::decode(&source, params)?;
  Ok(AnalyzerResult {
    file: file_metadata(&path, &source),
    data: Some(AnalyzerData::Summary(summarize(&image, decoder.name()))),
  })
}

/// Dump the container headers of a DDS file
pub fn analyze_file_structure<P: AsRef<Path>>(path: P) -> Result<AnalyzerResult> {
  let source = ImageSource::new(path.as_ref()).map_err(|e| DecodeError::with_io_error("analyze_file_structure()", &path, e))?;
  let dds = DdsFile::parse(source.buf())?;
  let dump = DdsDump {
    header: dds.header,
    dx10: dds.dx10,
    metadata: dds.meta.clone(),
    subresources: dds.subresources()?.len(),
  };
  Ok(AnalyzerResult {
    file: file_metadata(&path, &source),
    data: Some(AnalyzerData::FileStructure(dump)),
  })
}

/// Write one channel as greyscale PFM, bottom row first
pub fn channel_as_pfm(channel: &Channel, writer: &mut dyn Write) -> std::io::Result<()> {
  let header = format!("Pf\n{} {}\n-1.0\n", channel.width, channel.height);
  writer.write_all(header.as_bytes())?;
  if channel.width == 0 {
    return Ok(());
  }
  for row in channel.pixels().chunks_exact(channel.width).rev() {
    for v in row {
      writer.write_f32::<LittleEndian>(*v)?;
    }
  }
  Ok(())
}
