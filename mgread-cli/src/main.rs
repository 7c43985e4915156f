mod catalog;
mod common;
mod coords;
mod sample;
mod tracks;

use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgMatches, Command};
use tracing::debug;

use mgread_core::ReaderError;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "mgread";
    pub const BIN_NAME: &str = "mgread";

    /// Exit code for errors caused by the request (unknown region, bad page...)
    pub const EXIT_CLIENT_ERROR: u8 = 2;
    pub const EXIT_FAILURE: u8 = 1;
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("Multiscale Genomics")
        .about("Read-only access to 3D chromosome models and genome tracks.")
        .subcommand_required(true)
        .arg(common::log_level_arg())
        .subcommand(coords::cli::create_coords_cli())
        .subcommand(tracks::cli::create_bigbed_cli())
        .subcommand(tracks::cli::create_bigwig_cli())
        .subcommand(catalog::cli::create_catalog_cli())
        .subcommand(sample::cli::create_sample_cli())
}

fn run(matches: &ArgMatches) -> Result<()> {
    debug!(command = matches.subcommand_name(), "Running");
    match matches.subcommand() {
        //
        // COORDINATE STORES
        //
        Some((coords::cli::COORDS_CMD, matches)) => coords::handlers::run_coords(matches),

        //
        // TRACKS
        //
        Some((tracks::cli::BIGBED_CMD, matches)) => tracks::handlers::run_bigbed(matches),
        Some((tracks::cli::BIGWIG_CMD, matches)) => tracks::handlers::run_bigwig(matches),

        //
        // CATALOG
        //
        Some((catalog::cli::CATALOG_CMD, matches)) => catalog::handlers::run_catalog(matches),

        //
        // SAMPLE FILES
        //
        Some((sample::cli::SAMPLE_CMD, matches)) => sample::handlers::run_sample(matches),

        _ => unreachable!("Subcommand not found"),
    }
}

/// Client errors map to exit code 2, everything else to 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ReaderError>() {
        Some(e) if e.is_client_error() => consts::EXIT_CLIENT_ERROR,
        _ => consts::EXIT_FAILURE,
    }
}

fn main() -> ExitCode {
    let matches = build_parser().get_matches();

    let level = matches
        .get_one::<String>(common::LOG_LEVEL_ARG)
        .map(String::as_str)
        .unwrap_or("warn");
    common::init_logging(level);

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {:#}", consts::PKG_NAME, err);
            ExitCode::from(exit_code(&err))
        }
    }
}
