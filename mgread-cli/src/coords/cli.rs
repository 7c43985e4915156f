use clap::{Arg, ArgGroup, Command, value_parser};

use crate::common::source_args;

pub const COORDS_CMD: &str = "coords";

pub const COORDS_RESOLUTIONS: &str = "resolutions";
pub const COORDS_CHROMOSOMES: &str = "chromosomes";
pub const COORDS_REGIONS: &str = "regions";
pub const COORDS_ORDER: &str = "order";
pub const COORDS_HEADER: &str = "header";
pub const COORDS_CLUSTERS: &str = "clusters";
pub const COORDS_CENTROIDS: &str = "centroids";
pub const COORDS_MODELS: &str = "models";
pub const COORDS_MODEL: &str = "model";
pub const COORDS_MODEL_COORDS: &str = "coords";

fn resolution_arg() -> Arg {
    Arg::new("resolution")
        .long("resolution")
        .short('r')
        .required(true)
        .value_parser(value_parser!(u32))
        .help("Resolution of the models")
}

fn region_arg() -> Arg {
    Arg::new("region")
        .long("region")
        .required(true)
        .help("Region identifier")
}

fn subcommand(name: &'static str, about: &'static str) -> Command {
    Command::new(name).about(about).args(source_args())
}

pub fn create_coords_cli() -> Command {
    Command::new(COORDS_CMD)
        .author("mgread")
        .about("Query 3D chromosome models stored per resolution")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(subcommand(
            COORDS_RESOLUTIONS,
            "List the resolutions present in the store",
        ))
        .subcommand(
            subcommand(
                COORDS_CHROMOSOMES,
                "List the chromosomes with models at a resolution",
            )
            .arg(resolution_arg()),
        )
        .subcommand(
            subcommand(
                COORDS_REGIONS,
                "List the regions overlapping a chromosome range",
            )
            .arg(resolution_arg())
            .arg(Arg::new("chrom").long("chrom").short('c').required(true))
            .arg(
                Arg::new("start")
                    .long("start")
                    .short('s')
                    .required(true)
                    .value_parser(value_parser!(i64)),
            )
            .arg(
                Arg::new("end")
                    .long("end")
                    .short('e')
                    .required(true)
                    .value_parser(value_parser!(i64)),
            ),
        )
        .subcommand(
            subcommand(
                COORDS_ORDER,
                "Order the regions of a chromosome by start",
            )
            .arg(resolution_arg())
            .arg(Arg::new("chrom").long("chrom").short('c'))
            .arg(Arg::new("region").long("region"))
            .group(
                ArgGroup::new("order-key")
                    .args(["chrom", "region"])
                    .required(true),
            ),
        )
        .subcommand(
            subcommand(COORDS_HEADER, "Print the descriptive header of a region")
                .arg(resolution_arg())
                .arg(region_arg()),
        )
        .subcommand(
            subcommand(COORDS_CLUSTERS, "Print the cluster hierarchy of a region")
                .arg(resolution_arg())
                .arg(region_arg()),
        )
        .subcommand(
            subcommand(COORDS_CENTROIDS, "Print the centroid models of a region")
                .arg(resolution_arg())
                .arg(region_arg()),
        )
        .subcommand(
            subcommand(COORDS_MODELS, "Print the (model, cluster) table of a region")
                .arg(resolution_arg())
                .arg(region_arg()),
        )
        .subcommand(
            subcommand(COORDS_MODEL, "Print one page of models of a region")
                .arg(resolution_arg())
                .arg(region_arg())
                .arg(
                    Arg::new("models")
                        .long("models")
                        .short('m')
                        .default_value("centroids")
                        .help("Comma separated model ids, 'all' or 'centroids'"),
                )
                .arg(
                    Arg::new("page")
                        .long("page")
                        .short('p')
                        .default_value("0")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("page-size")
                        .long("page-size")
                        .value_parser(value_parser!(usize))
                        .help("Models per page, at most 100. Defaults to $MGREAD_PAGE_SIZE or 10"),
                ),
        )
        .subcommand(
            subcommand(
                COORDS_MODEL_COORDS,
                "Print the coordinates of one model as [x, y, z] triples",
            )
            .arg(resolution_arg())
            .arg(region_arg())
            .arg(
                Arg::new("model-id")
                    .long("model-id")
                    .required(true)
                    .value_parser(value_parser!(i64)),
            ),
        )
}
