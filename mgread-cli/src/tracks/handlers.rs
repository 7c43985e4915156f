use anyhow::{Context, Result};
use clap::ArgMatches;

use mgread_tracks::{BigBedReader, BigWigReader, RangeFormat, RangeOutput};

use super::cli::*;
use crate::common::{print_json, reader_config, source};

struct RangeQuery {
    chrom: String,
    start: u32,
    end: u32,
    format: RangeFormat,
}

impl RangeQuery {
    fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let chrom = matches
            .get_one::<String>("chrom")
            .context("--chrom is required")?
            .clone();
        let start = *matches.get_one::<u32>("start").context("--start is required")?;
        let end = *matches.get_one::<u32>("end").context("--end is required")?;
        let format = matches
            .get_one::<String>("format")
            .map(|f| f.parse::<RangeFormat>())
            .transpose()?
            .unwrap_or(RangeFormat::List);
        Ok(RangeQuery {
            chrom,
            start,
            end,
            format,
        })
    }
}

fn print_range(output: RangeOutput) -> Result<()> {
    match output {
        RangeOutput::Text(text) => {
            print!("{}", text);
            Ok(())
        }
        rows => print_json(&rows),
    }
}

///
/// Run a `bigbed` subcommand.
///
pub fn run_bigbed(matches: &ArgMatches) -> Result<()> {
    let (subcmd, matches) = matches
        .subcommand()
        .context("A bigbed subcommand is required")?;
    let config = reader_config(matches)?;
    let (user, file) = source(matches);
    let mut reader = BigBedReader::open_source(&config, user, file)
        .with_context(|| format!("Failed to open bigBed for user '{}'", user))?;

    match subcmd {
        TRACK_CHROMS => print_json(&reader.chroms()),
        TRACK_HEADER => print_json(&reader.header()),
        TRACK_RANGE => {
            let q = RangeQuery::from_matches(matches)?;
            print_range(reader.get_range(&q.chrom, q.start, q.end, q.format))
        }
        _ => unreachable!("Unknown bigbed subcommand: {subcmd}"),
    }
}

///
/// Run a `bigwig` subcommand.
///
pub fn run_bigwig(matches: &ArgMatches) -> Result<()> {
    let (subcmd, matches) = matches
        .subcommand()
        .context("A bigwig subcommand is required")?;
    let config = reader_config(matches)?;
    let (user, file) = source(matches);
    let mut reader = BigWigReader::open_source(&config, user, file)
        .with_context(|| format!("Failed to open bigWig for user '{}'", user))?;

    match subcmd {
        TRACK_CHROMS => print_json(&reader.chroms()),
        TRACK_HEADER => print_json(&reader.header()),
        TRACK_RANGE => {
            let q = RangeQuery::from_matches(matches)?;
            let output = reader.get_range(&q.chrom, q.start, q.end, q.format);
            // wig lines carry no trailing newline
            if let RangeOutput::Text(text) = &output {
                println!("{}", text);
                return Ok(());
            }
            print_range(output)
        }
        _ => unreachable!("Unknown bigwig subcommand: {subcmd}"),
    }
}
