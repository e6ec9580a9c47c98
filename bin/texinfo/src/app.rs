// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, crate_version, value_parser};
use log::debug;
use texload::decoders::DecodeParams;

pub fn create_app() -> Command {
  debug!("Creating CLAP app configuration");
  Command::new("texinfo")
    .version(crate_version!())
    .author("Daniel V. <daniel@chaospixel.com>")
    .about("texinfo - Inspect textures as planar float channels")
    .subcommand_required(true)
    .arg(
      Arg::new("debug")
        .short('d')
        .action(ArgAction::Count)
        .global(true)
        .help("Sets the level of debugging information"),
    )
    .arg(
      Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::SetTrue)
        .global(true)
        .help("Print more messages"),
    )
    .arg(
      Arg::new("priority")
        .long("priority")
        .value_parser(value_parser!(i32))
        .allow_negative_numbers(true)
        .default_value("0")
        .global(true)
        .help("Priority passed to the decoder worker pool"),
    )
    .arg(
      Arg::new("selector")
        .long("selector")
        .global(true)
        .help("Channel selection hint passed to the decoders"),
    )
    .subcommand(
      Command::new("info")
        .about("Decode files and list their channels")
        .arg(Arg::new("json").long("json").action(ArgAction::SetTrue).help("Format summary as JSON"))
        .arg(
          Arg::new("structure")
            .long("structure")
            .action(ArgAction::SetTrue)
            .help("Dump the DDS container headers instead of decoding"),
        )
        .arg(input_files()),
    )
    .subcommand(
      Command::new("digest")
        .about("Print the MD5 digest of every channel")
        .arg(input_file()),
    )
    .subcommand(
      Command::new("dump")
        .about("Write one channel as greyscale PFM")
        .arg(
          Arg::new("channel")
            .short('c')
            .long("channel")
            .required(true)
            .help("Full channel name, e.g. '[0].M00.D00.R'"),
        )
        .arg(
          Arg::new("output")
            .short('o')
            .long("output")
            .value_parser(value_parser!(PathBuf))
            .help("Output file, STDOUT if missing"),
        )
        .arg(input_file()),
    )
}

fn input_file() -> Arg {
  Arg::new("FILE").required(true).value_parser(value_parser!(PathBuf)).help("Input file")
}

fn input_files() -> Arg {
  Arg::new("FILE")
    .required(true)
    .num_args(1..)
    .value_parser(value_parser!(PathBuf))
    .help("Input files")
}

/// Decode parameters from the global switches
pub fn decode_params(options: &clap::ArgMatches) -> DecodeParams {
  DecodeParams {
    channel_selector: options.get_one::<String>("selector").cloned().unwrap_or_default(),
    priority: options.get_one::<i32>("priority").copied().unwrap_or_default(),
  }
}
