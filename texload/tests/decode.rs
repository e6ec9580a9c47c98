// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

mod common;

use common::*;
use texload::analyze::{AnalyzerData, analyze_file_structure, analyze_image, summarize};
use texload::decoders::{DecodeParams, Loader};
use texload::formats::dds::dxgi::classify_raw;
use texload::{DecodeError, Image, ImageSource};

fn decode(buf: &[u8]) -> texload::Result<Image> {
  texload::decode(&ImageSource::new_from_slice(buf), &DecodeParams::default())
}

fn names(image: &Image) -> Vec<&str> {
  image.channels.iter().map(|ch| ch.name.as_str()).collect()
}

#[test]
fn rgba_float_fill() -> std::result::Result<(), Box<dyn std::error::Error>> {
  let buf = DdsBuilder::dx10(R32G32B32A32_FLOAT, 4, 4).build(&f32_bytes(&[0.5; 64]));
  let image = decode(&buf)?;
  assert_eq!(names(&image), ["[0].M00.D00.R", "[0].M00.D00.G", "[0].M00.D00.B", "[0].M00.D00.A"]);
  for channel in &image.channels {
    assert_eq!((channel.width, channel.height), (4, 4));
    assert_eq!(channel.pixels(), [0.5; 16]);
  }
  assert_eq!(image.format, "DXGI_FORMAT_R32G32B32A32_FLOAT - 1 Depth - 1 Array - 1 Mips");
  assert!(!image.srgb);
  assert!(!image.has_premultiplied_alpha);
  Ok(())
}

#[test]
fn sniffing_keeps_stream_position() {
  let dds = DdsBuilder::dx10(R8_UNORM, 1, 1).build(&[0]);
  let loader = Loader::new();
  let inputs: [&[u8]; 4] = [&dds, b"DD", b"", b"PF\n"];
  for buf in inputs {
    let source = ImageSource::new_from_slice(buf);
    for decoder in loader.decoders() {
      let mut stream = source.reader();
      decoder.can_load(&mut stream);
      assert_eq!(stream.position(), 0, "{} moved the stream", decoder.name());
    }
  }
}

#[test]
fn dds_wins_over_fallbacks() -> std::result::Result<(), Box<dyn std::error::Error>> {
  let buf = DdsBuilder::dx10(R8_UNORM, 1, 1).build(&[0]);
  let decoder = texload::get_decoder(&ImageSource::new_from_slice(&buf))?;
  assert_eq!(decoder.name(), "dds");
  Ok(())
}

#[test]
fn channel_count_of_mipped_array() -> std::result::Result<(), Box<dyn std::error::Error>> {
  // 8x4, 4x2 and 2x1 with two bytes per texel
  let item = 2 * (32 + 8 + 2);
  let buf = DdsBuilder::dx10(R8G8_UNORM, 8, 4).mips(3).array(3).build(&vec![255; 3 * item]);
  let image = decode(&buf)?;
  assert_eq!(image.channels.len(), 3 * 3 * 2);
  assert!(image.channels.iter().all(|ch| (ch.width, ch.height) == (8, 4)));
  assert_eq!(image.layers()[..4], ["[0].M00.D00.", "[0].M01.D00.", "[0].M02.D00.", "[1].M00.D00."]);
  assert_eq!(image.channel("[2].M02.D00.G").map(|ch| ch.at(31)), Some(1.0));
  assert_eq!(image.format, "DXGI_FORMAT_R8G8_UNORM - 1 Depth - 3 Array - 3 Mips");
  Ok(())
}

#[test]
fn mips_project_onto_full_grid() -> std::result::Result<(), Box<dyn std::error::Error>> {
  let mut texels = Vec::new();
  for mip in 0..4 {
    let size = 8 >> mip;
    for i in 0..size * size {
      texels.push((mip * 1000 + i) as f32);
    }
  }
  let buf = DdsBuilder::dx10(R32_FLOAT, 8, 8).mips(4).build(&f32_bytes(&texels));
  let image = decode(&buf)?;
  assert_eq!(image.channels.len(), 4);

  for mip in 0..4 {
    let size = 8 >> mip;
    let channel = image.channel(&format!("[0].M{:02}.D00.L", mip)).ok_or("missing mip channel")?;
    for y in 0..8 {
      for x in 0..8 {
        let expected = (mip * 1000 + (y >> mip) * size + (x >> mip)) as f32;
        assert_eq!(channel.at_xy(x, y), expected, "mip {} at {},{}", mip, x, y);
      }
    }
  }
  Ok(())
}

#[test]
fn cube_array_naming() -> std::result::Result<(), Box<dyn std::error::Error>> {
  let payload: Vec<u8> = (0..12).collect();
  let buf = DdsBuilder::dx10(R8_UNORM, 1, 1).array(2).cube().build(&payload);
  let image = decode(&buf)?;
  assert_eq!(
    image.layers(),
    [
      "[0]X+.M00.D00.",
      "[0]X-.M00.D00.",
      "[0]Y+.M00.D00.",
      "[0]Y-.M00.D00.",
      "[0]Z+.M00.D00.",
      "[0]Z-.M00.D00.",
      "[1]X+.M00.D00.",
      "[1]X-.M00.D00.",
      "[1]Y+.M00.D00.",
      "[1]Y-.M00.D00.",
      "[1]Z+.M00.D00.",
      "[1]Z-.M00.D00.",
    ]
  );
  // faces keep payload order
  let values: Vec<f32> = image.channels.iter().map(|ch| ch.at(0)).collect();
  let expected: Vec<f32> = (0..12).map(|v| v as f32 / 255.0).collect();
  assert_eq!(values, expected);
  assert_eq!(image.format, "DXGI_FORMAT_R8_UNORM - 1 Depth - 12 Array - 1 Mips");
  Ok(())
}

#[test]
fn volume_slices() -> std::result::Result<(), Box<dyn std::error::Error>> {
  let buf = DdsBuilder::dx10(R8_UNORM, 2, 2).volume(2).build(&[0, 0, 0, 0, 255, 255, 255, 255]);
  let image = decode(&buf)?;
  assert_eq!(names(&image), ["[0].M00.D00.L", "[0].M00.D01.L"]);
  assert_eq!(image.channels[0].pixels(), [0.0; 4]);
  assert_eq!(image.channels[1].pixels(), [1.0; 4]);
  assert_eq!(image.format, "DXGI_FORMAT_R8_UNORM - 2 Depth - 1 Array - 1 Mips");
  Ok(())
}

#[test]
fn volume_mips_halve_depth() -> std::result::Result<(), Box<dyn std::error::Error>> {
  // 4x4x4, 2x2x2 and 1x1x1
  let mut payload = vec![0_u8; 64];
  payload.extend_from_slice(&[50; 4]);
  payload.extend_from_slice(&[200; 4]);
  payload.push(255);
  let buf = DdsBuilder::dx10(R8_UNORM, 4, 4).volume(4).mips(3).build(&payload);
  let image = decode(&buf)?;
  assert_eq!(
    names(&image),
    [
      "[0].M00.D00.L",
      "[0].M00.D01.L",
      "[0].M00.D02.L",
      "[0].M00.D03.L",
      "[0].M01.D00.L",
      "[0].M01.D01.L",
      "[0].M02.D00.L",
    ]
  );
  assert_eq!(image.channel("[0].M01.D00.L").map(|ch| ch.pixels().to_vec()), Some(vec![50.0 / 255.0; 16]));
  assert_eq!(image.channel("[0].M01.D01.L").map(|ch| ch.pixels().to_vec()), Some(vec![200.0 / 255.0; 16]));
  assert_eq!(image.channel("[0].M02.D00.L").map(|ch| ch.pixels().to_vec()), Some(vec![1.0; 16]));
  assert_eq!(image.format, "DXGI_FORMAT_R8_UNORM - 4 Depth - 1 Array - 3 Mips");
  Ok(())
}

#[test]
fn oversized_array_count_is_malformed() {
  let buf = DdsBuilder::dx10(R8_UNORM, 1, 1).array(u32::MAX).mips(32).build(&[]);
  assert!(matches!(decode(&buf), Err(DecodeError::MalformedHeader(_))));
  let buf = DdsBuilder::dx10(R8_UNORM, 1, 1).array(u32::MAX).cube().build(&[0; 64]);
  assert!(matches!(decode(&buf), Err(DecodeError::MalformedHeader(_))));
}

#[test]
fn zero_pixels() {
  let buf = DdsBuilder::dx10(R8_UNORM, 0, 4).build(&[]);
  assert!(matches!(decode(&buf), Err(DecodeError::EmptyImage)));
  let buf = DdsBuilder::dx10(R8_UNORM, 4, 0).build(&[]);
  assert!(matches!(decode(&buf), Err(DecodeError::EmptyImage)));
}

#[test]
fn unclassified_formats_are_unsupported() {
  for value in 0..200 {
    let count = classify_raw(value);
    assert!(count <= 4);
    assert_eq!(count, classify_raw(value));
    if count == 0 {
      let buf = DdsBuilder::dx10(value, 4, 4).build(&[0; 256]);
      let result = decode(&buf);
      assert!(matches!(result, Err(DecodeError::UnsupportedFormat(_))), "format {}: {:?}", value, result);
    }
  }
}

#[test]
fn unknown_format_message() {
  let buf = DdsBuilder::dx10(0, 4, 4).build(&[0; 64]);
  match decode(&buf) {
    Err(DecodeError::UnsupportedFormat(msg)) => assert_eq!(msg, "Unsupported DXGI format: 0"),
    other => panic!("unexpected result: {:?}", other),
  }
}

#[test]
fn truncated_payload() {
  let buf = DdsBuilder::dx10(R32_FLOAT, 4, 4).build(&[0; 60]);
  assert!(matches!(decode(&buf), Err(DecodeError::MalformedHeader(_))));
}

#[test]
fn planar_video_aborts_decode() {
  let buf = DdsBuilder::dx10(NV12, 4, 4).build(&[0; 24]);
  match decode(&buf) {
    Err(DecodeError::Conversion { layer, .. }) => assert_eq!(layer, "[0].M00.D00."),
    other => panic!("unexpected result: {:?}", other),
  }
}

#[test]
fn legacy_dxt1() -> std::result::Result<(), Box<dyn std::error::Error>> {
  // red and blue endpoints, every index selects red
  let block = [0x00, 0xf8, 0x1f, 0x00, 0, 0, 0, 0];
  let buf = DdsBuilder::legacy(LegacyFormat::four_cc(b"DXT1"), 4, 4).build(&block);
  let image = decode(&buf)?;
  assert_eq!(image.format, "DXGI_FORMAT_BC1_UNORM - 1 Depth - 1 Array - 1 Mips");
  let values: Vec<f32> = image.channels.iter().map(|ch| ch.at(5)).collect();
  assert_eq!(values, [1.0, 0.0, 0.0, 1.0]);
  Ok(())
}

#[test]
fn legacy_dxt2_is_premultiplied() -> std::result::Result<(), Box<dyn std::error::Error>> {
  let buf = DdsBuilder::legacy(LegacyFormat::four_cc(b"DXT2"), 4, 4).build(&[0; 16]);
  assert!(decode(&buf)?.has_premultiplied_alpha);
  Ok(())
}

#[test]
fn legacy_rgba_cubemap() -> std::result::Result<(), Box<dyn std::error::Error>> {
  let pf = LegacyFormat {
    flags: DDPF_RGB | DDPF_ALPHAPIXELS,
    four_cc: 0,
    bits: 32,
    masks: [0xff, 0xff00, 0xff_0000, 0xff00_0000],
  };
  let payload: Vec<u8> = (0..6).flat_map(|face| [face * 51, 0, 0, 255]).collect();
  let buf = DdsBuilder::legacy(pf, 1, 1).cube().build(&payload);
  let image = decode(&buf)?;
  assert_eq!(image.channels.len(), 6 * 4);
  assert_eq!(image.channel("[0]Z-.M00.D00.R").map(|ch| ch.at(0)), Some(1.0));
  assert_eq!(image.channel("[0]X+.M00.D00.A").map(|ch| ch.at(0)), Some(1.0));
  Ok(())
}

#[test]
fn srgb_and_alpha_mode_flags() -> std::result::Result<(), Box<dyn std::error::Error>> {
  let texel = [255, 0, 0, 255];
  assert!(decode(&DdsBuilder::dx10(R8G8B8A8_UNORM_SRGB, 1, 1).build(&texel))?.srgb);
  let linear = decode(&DdsBuilder::dx10(R8G8B8A8_UNORM, 1, 1).build(&texel))?;
  assert!(!linear.srgb);
  assert!(!linear.has_premultiplied_alpha);
  let premultiplied = decode(&DdsBuilder::dx10(R8G8B8A8_UNORM, 1, 1).premultiplied().build(&texel))?;
  assert!(premultiplied.has_premultiplied_alpha);
  Ok(())
}

#[test]
fn decoding_is_idempotent() -> std::result::Result<(), Box<dyn std::error::Error>> {
  let payload: Vec<u8> = (0..(16 * 16 + 8 * 8 + 16 + 4 + 1) * 4).map(|i| (i * 7 % 256) as u8).collect();
  let buf = DdsBuilder::dx10(R8G8B8A8_UNORM, 16, 16).mips(5).build(&payload);
  let first = decode(&buf)?;
  let second = decode(&buf)?;
  assert_eq!(first.channels, second.channels);
  assert_eq!(summarize(&first, "dds"), summarize(&second, "dds"));
  Ok(())
}

#[test]
fn analyze_written_file() -> std::result::Result<(), Box<dyn std::error::Error>> {
  let buf = DdsBuilder::dx10(R8G8_UNORM, 2, 2).mips(2).build(&[0; 10]);
  let path = std::env::temp_dir().join(format!("texload-analyze-{}.dds", std::process::id()));
  std::fs::write(&path, &buf)?;

  let summary = analyze_image(&path, &DecodeParams::default());
  let structure = analyze_file_structure(&path);
  std::fs::remove_file(&path)?;

  let summary = summary?;
  assert_eq!(summary.file.file_size, buf.len() as u64);
  match summary.data {
    Some(AnalyzerData::Summary(s)) => {
      assert_eq!(s.decoder, "dds");
      assert_eq!(s.layers, ["[0].M00.D00.", "[0].M01.D00."]);
      assert_eq!(s.channels.len(), 4);
    }
    other => panic!("unexpected data: {:?}", other),
  }
  match structure?.data {
    Some(AnalyzerData::FileStructure(dump)) => {
      assert_eq!(dump.subresources, 2);
      assert_eq!(dump.dx10.map(|h| h.dxgi_format), Some(R8G8_UNORM));
    }
    other => panic!("unexpected data: {:?}", other),
  }
  Ok(())
}

#[test]
fn missing_file() {
  let result = texload::decode_file("/nonexistent/texture.dds");
  assert!(matches!(result, Err(DecodeError::Decoder(_))));
}
