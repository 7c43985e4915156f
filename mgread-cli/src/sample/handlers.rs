use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use clap::ArgMatches;

use mgread_coords::SampleCoords;
use mgread_tracks::{write_sample_bigbed, write_sample_bigwig};

use super::cli::*;

///
/// Run a `sample` subcommand.
///
pub fn run_sample(matches: &ArgMatches) -> Result<()> {
    let (subcmd, matches) = matches
        .subcommand()
        .context("A sample subcommand is required")?;
    let output = matches
        .get_one::<PathBuf>("output")
        .context("--output is required")?;

    match subcmd {
        SAMPLE_COORDS => {
            let get = |name: &str| matches.get_one::<usize>(name).copied().unwrap_or_default();
            let (min_rows, max_rows) = (get("min-rows"), get("max-rows"));
            ensure!(
                min_rows >= 1 && min_rows <= max_rows,
                "--min-rows must be at least 1 and not above --max-rows"
            );
            let seed = matches.get_one::<u64>("seed").copied().unwrap_or(42);

            SampleCoords::new()
                .with_regions(get("regions"))
                .with_rows(min_rows..max_rows + 1)
                .with_seed(seed)
                .write(output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
        }
        SAMPLE_BIGBED => write_sample_bigbed(output)
            .with_context(|| format!("Failed to write {}", output.display()))?,
        SAMPLE_BIGWIG => write_sample_bigwig(output)
            .with_context(|| format!("Failed to write {}", output.display()))?,
        _ => unreachable!("Unknown sample subcommand: {subcmd}"),
    }

    println!("{}", output.display());
    Ok(())
}
