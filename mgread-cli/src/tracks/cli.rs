use clap::{Arg, Command, value_parser};

use crate::common::source_args;

pub const BIGBED_CMD: &str = "bigbed";
pub const BIGWIG_CMD: &str = "bigwig";

pub const TRACK_CHROMS: &str = "chroms";
pub const TRACK_HEADER: &str = "header";
pub const TRACK_RANGE: &str = "range";

fn create_track_cli(name: &'static str, about: &'static str, default_format: &'static str) -> Command {
    Command::new(name)
        .author("mgread")
        .about(about)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(TRACK_CHROMS)
                .about("List chromosome names and lengths")
                .args(source_args()),
        )
        .subcommand(
            Command::new(TRACK_HEADER)
                .about("Print the file header")
                .args(source_args()),
        )
        .subcommand(
            Command::new(TRACK_RANGE)
                .about("Print the entries overlapping a range")
                .args(source_args())
                .arg(Arg::new("chrom").long("chrom").short('c').required(true))
                .arg(
                    Arg::new("start")
                        .long("start")
                        .short('s')
                        .required(true)
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("end")
                        .long("end")
                        .short('e')
                        .required(true)
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value(default_format)
                        .help("Text lines, or 'list' for JSON rows"),
                ),
        )
}

pub fn create_bigbed_cli() -> Command {
    create_track_cli(BIGBED_CMD, "Read BigBed interval files", "bed")
}

pub fn create_bigwig_cli() -> Command {
    create_track_cli(BIGWIG_CMD, "Read BigWig signal files", "wig")
}
