use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use serde_json::json;

use mgread_core::Catalog;

use super::cli::*;
use crate::common::{print_json, reader_config, source};

///
/// Run a `catalog` subcommand.
///
pub fn run_catalog(matches: &ArgMatches) -> Result<()> {
    let (subcmd, matches) = matches
        .subcommand()
        .context("A catalog subcommand is required")?;
    let config = reader_config(matches)?;

    match subcmd {
        CATALOG_RESOLVE => {
            let (user, file) = source(matches);
            let fixture = matches
                .get_one::<String>("fixture")
                .map(String::as_str)
                .unwrap_or_default();
            let resolved = config.resolve(user, file, fixture)?;
            print_json(&json!({
                "file_path": resolved.path(),
                "fixture": resolved.is_fixture(),
            }))
        }
        CATALOG_LIST => {
            let user = matches
                .get_one::<String>("user")
                .context("--user is required")?;
            let Some(catalog) = config.load_catalog()? else {
                bail!("No catalog configured, pass --catalog or set MGREAD_CATALOG");
            };
            print_json(&catalog.files_by_user(user)?)
        }
        _ => unreachable!("Unknown catalog subcommand: {subcmd}"),
    }
}
