use clap::{Arg, Command, value_parser};
use std::path::PathBuf;

use mgread_coords::SAMPLE_COORDS_FIXTURE;

use crate::common::{CATALOG_ARG, source_args};

pub const CATALOG_CMD: &str = "catalog";

pub const CATALOG_RESOLVE: &str = "resolve";
pub const CATALOG_LIST: &str = "list";

pub fn create_catalog_cli() -> Command {
    Command::new(CATALOG_CMD)
        .author("mgread")
        .about("Look up files in the catalog")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(CATALOG_RESOLVE)
                .about("Print the path a (user, file) pair resolves to")
                .args(source_args())
                .arg(
                    Arg::new("fixture")
                        .long("fixture")
                        .default_value(SAMPLE_COORDS_FIXTURE)
                        .help("Fixture file name used for the 'test' user"),
                ),
        )
        .subcommand(
            Command::new(CATALOG_LIST)
                .about("List the files registered for a user")
                .arg(Arg::new("user").long("user").short('u').required(true))
                .arg(
                    Arg::new(CATALOG_ARG)
                        .long(CATALOG_ARG)
                        .value_parser(value_parser!(PathBuf))
                        .help("Catalog manifest. Defaults to $MGREAD_CATALOG"),
                ),
        )
}
