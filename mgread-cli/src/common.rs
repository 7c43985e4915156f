//! Arguments and output helpers shared by every subcommand.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, value_parser};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};

use mgread_core::ReaderConfig;
use mgread_core::consts::TEST_USER;

pub const USER_ARG: &str = "user";
pub const FILE_ARG: &str = "file";
pub const CATALOG_ARG: &str = "catalog";
pub const FIXTURE_DIR_ARG: &str = "fixture-dir";
pub const LOG_LEVEL_ARG: &str = "log-level";

/// `--user`, `--file`, `--catalog` and `--fixture-dir`.
pub fn source_args() -> Vec<Arg> {
    vec![
        Arg::new(USER_ARG)
            .long(USER_ARG)
            .short('u')
            .default_value(TEST_USER)
            .help("Owner of the file. 'test' reads a generated sample file"),
        Arg::new(FILE_ARG)
            .long(FILE_ARG)
            .short('f')
            .default_value("")
            .help("Catalog identifier of the file"),
        Arg::new(CATALOG_ARG)
            .long(CATALOG_ARG)
            .value_parser(value_parser!(PathBuf))
            .help("Catalog manifest (YAML, TOML or JSON). Defaults to $MGREAD_CATALOG"),
        Arg::new(FIXTURE_DIR_ARG)
            .long(FIXTURE_DIR_ARG)
            .value_parser(value_parser!(PathBuf))
            .help("Folder for generated sample files. Defaults to $MGREAD_FIXTURE_DIR"),
    ]
}

pub fn log_level_arg() -> Arg {
    Arg::new(LOG_LEVEL_ARG)
        .long(LOG_LEVEL_ARG)
        .global(true)
        .default_value("warn")
        .help("Log level used when RUST_LOG is not set")
}

///
/// Install the tracing subscriber. `RUST_LOG` wins over `--log-level`.
///
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// The `(user, file)` pair of a subcommand.
pub fn source(matches: &ArgMatches) -> (&str, &str) {
    let user = matches
        .get_one::<String>(USER_ARG)
        .map(String::as_str)
        .unwrap_or(TEST_USER);
    let file = matches
        .get_one::<String>(FILE_ARG)
        .map(String::as_str)
        .unwrap_or("");
    (user, file)
}

pub fn reader_config(matches: &ArgMatches) -> Result<ReaderConfig> {
    let mut builder = ReaderConfig::builder();
    // not every subcommand defines both arguments
    if let Some(catalog) = matches.try_get_one::<PathBuf>(CATALOG_ARG).ok().flatten() {
        builder = builder.with_catalog(catalog.clone());
    }
    if let Some(dir) = matches.try_get_one::<PathBuf>(FIXTURE_DIR_ARG).ok().flatten() {
        builder = builder.with_fixture_dir(dir.clone());
    }
    builder.finish().context("Invalid reader configuration")
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}
