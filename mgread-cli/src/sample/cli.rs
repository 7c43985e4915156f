use clap::{Arg, Command, value_parser};
use std::path::PathBuf;

pub const SAMPLE_CMD: &str = "sample";

pub const SAMPLE_COORDS: &str = "coords";
pub const SAMPLE_BIGBED: &str = "bigbed";
pub const SAMPLE_BIGWIG: &str = "bigwig";

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("File to write")
}

pub fn create_sample_cli() -> Command {
    Command::new(SAMPLE_CMD)
        .author("mgread")
        .about("Write sample files with the layout the readers expect")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(SAMPLE_COORDS)
                .about("Write a sample coordinate store (.coords, or .hdf5 with the hdf5 feature)")
                .arg(output_arg())
                .arg(
                    Arg::new("regions")
                        .long("regions")
                        .default_value("10")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("min-rows")
                        .long("min-rows")
                        .default_value("500")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("max-rows")
                        .long("max-rows")
                        .default_value("2000")
                        .value_parser(value_parser!(usize))
                        .help("Largest number of positions per region (inclusive)"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64)),
                ),
        )
        .subcommand(
            Command::new(SAMPLE_BIGBED)
                .about("Write a sample BigBed file")
                .arg(output_arg()),
        )
        .subcommand(
            Command::new(SAMPLE_BIGWIG)
                .about("Write a sample BigWig file")
                .arg(output_arg()),
        )
}
