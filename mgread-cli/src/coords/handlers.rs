use anyhow::{Context, Result};
use clap::ArgMatches;
use serde_json::json;

use mgread_coords::{CoordSession, ModelSelector, RegionOrderKey};

use super::cli::*;
use crate::common::{print_json, reader_config, source};

fn required<'a, T: Clone + Send + Sync + 'static>(
    matches: &'a ArgMatches,
    name: &str,
) -> Result<&'a T> {
    matches
        .get_one::<T>(name)
        .with_context(|| format!("--{} is required", name))
}

/// Open the session behind the subcommand's source args, bound to
/// `--resolution` when the subcommand has one.
fn open_session(matches: &ArgMatches) -> Result<CoordSession> {
    let config = reader_config(matches)?;
    let (user, file) = source(matches);
    let resolution = matches
        .try_get_one::<u32>("resolution")
        .ok()
        .flatten()
        .copied();
    CoordSession::open(&config, user, file, resolution)
        .with_context(|| format!("Failed to open coordinate store for user '{}'", user))
}

///
/// Run a `coords` subcommand and print its result as JSON.
///
/// # Arguments
/// - matches: matched items from CLAP args
pub fn run_coords(matches: &ArgMatches) -> Result<()> {
    let (subcmd, matches) = matches
        .subcommand()
        .context("A coords subcommand is required")?;
    let session = open_session(matches)?;

    match subcmd {
        COORDS_RESOLUTIONS => print_json(&session.list_resolutions()?),
        COORDS_CHROMOSOMES => print_json(&session.bound()?.chromosomes()),
        COORDS_REGIONS => {
            let chrom = required::<String>(matches, "chrom")?;
            let start = *required::<i64>(matches, "start")?;
            let end = *required::<i64>(matches, "end")?;
            print_json(&session.bound()?.regions(chrom, start, end))
        }
        COORDS_ORDER => {
            let key = match matches.get_one::<String>("region") {
                Some(region) => RegionOrderKey::Region(region.clone()),
                None => RegionOrderKey::Chromosome(required::<String>(matches, "chrom")?.clone()),
            };
            print_json(&session.bound()?.region_order(&key)?)
        }
        COORDS_HEADER => {
            let region = required::<String>(matches, "region")?;
            print_json(&session.bound()?.region_header(region)?)
        }
        COORDS_CLUSTERS => {
            let region = required::<String>(matches, "region")?;
            print_json(&session.bound()?.clusters(region)?)
        }
        COORDS_CENTROIDS => {
            let region = required::<String>(matches, "region")?;
            print_json(&session.bound()?.centroids(region)?)
        }
        COORDS_MODELS => {
            let region = required::<String>(matches, "region")?;
            let table = session.bound()?.models(region)?;
            let rows: Vec<[i64; 2]> = table.rows().into_iter().map(|r| [r[0], r[1]]).collect();
            print_json(&rows)
        }
        COORDS_MODEL => {
            let region = required::<String>(matches, "region")?;
            let selector: ModelSelector = required::<String>(matches, "models")?.parse()?;
            let page = *required::<usize>(matches, "page")?;
            let page_size = match matches.get_one::<usize>("page-size") {
                Some(size) => *size,
                None => reader_config(matches)?.page_size,
            };

            let (model_page, meta) =
                session
                    .bound()?
                    .model_page(region, &selector, page, page_size)?;
            print_json(&json!({
                "models": model_page,
                "model_count": meta.model_count,
                "page_count": meta.page_count,
            }))
        }
        COORDS_MODEL_COORDS => {
            let region = required::<String>(matches, "region")?;
            let model_id = *required::<i64>(matches, "model-id")?;
            print_json(&session.bound()?.model_coords(region, model_id)?)
        }
        _ => unreachable!("Unknown coords subcommand: {subcmd}"),
    }
}
