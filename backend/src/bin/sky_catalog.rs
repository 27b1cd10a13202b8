//! Sky catalog command-line front end.
//!
//! # Usage
//!
//! ```bash
//! sky-catalog resolve "Orion"
//! sky-catalog region 266.4 -29.0
//! sky-catalog search nebulae --bbox 80,-10,90,0 --limit 20
//! sky-catalog get INPE-nebulae-3
//! sky-catalog project 10.68 41.27
//! ```
//!
//! # Environment Variables
//!
//! - `CATALOG_CONFIG`: TOML config file (see `CatalogConfig::from_env` for overrides)
//! - `RUST_LOG`: Log level (default: info); logs go to stderr, JSON to stdout

use std::env;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use sky_catalog::adapters::SyntheticAdapter;
use sky_catalog::cache::spawn_sweeper;
use sky_catalog::models::ImagePoint;
use sky_catalog::{
    AdapterRegistry, BoundingBox, CatalogConfig, Category, Projection, QueryResolver,
    RegionResolver, RegistryBuilder, SkyCoordinate,
};

#[derive(Debug, Parser)]
#[command(name = "sky-catalog", version, about = "Query and aggregate sky catalogs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve free text (coordinates, object name or landmark) to a position
    Resolve { text: String },
    /// Name the sky region containing a position
    Region {
        #[arg(allow_negative_numbers = true)]
        ra: f64,
        #[arg(allow_negative_numbers = true)]
        dec: f64,
    },
    /// Search every provider for objects of a category
    Search {
        category: String,
        /// minRA,minDec,maxRA,maxDec in degrees
        #[arg(long, allow_hyphen_values = true)]
        bbox: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Look an object up by id across providers
    Get { id: String },
    /// Project a sky position to image pixels (and back)
    Project {
        #[arg(allow_negative_numbers = true)]
        ra: f64,
        #[arg(allow_negative_numbers = true)]
        dec: f64,
    },
}

#[derive(Serialize)]
struct RegionOutput<'a> {
    name: &'a str,
    description: &'a str,
    context: String,
}

#[derive(Serialize)]
struct ProjectOutput {
    projection: String,
    image: Option<ImagePoint>,
    round_trip: Option<SkyCoordinate>,
}

fn build_registry(config: &CatalogConfig) -> anyhow::Result<AdapterRegistry> {
    #[allow(unused_mut)]
    let mut builder = RegistryBuilder::from_config(config)
        .register(SyntheticAdapter::inpe())
        .register(SyntheticAdapter::csa());

    #[cfg(feature = "mast")]
    if config.mast.enabled {
        let mast = sky_catalog::adapters::MastAdapter::new(
            &config.mast,
            config.registry.adapter_timeout(),
        )?;
        builder = builder.register(mast);
    }

    Ok(builder.build()?)
}

fn build_resolver(config: &CatalogConfig) -> anyhow::Result<QueryResolver> {
    #[allow(unused_mut)]
    let mut resolver = QueryResolver::new(&config.resolver);

    #[cfg(feature = "sesame")]
    if config.sesame.enabled {
        let sesame = sky_catalog::resolve::SesameResolver::new(&config.sesame)?;
        resolver = resolver.with_name_resolver(Arc::new(sesame));
    }

    Ok(resolver)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CatalogConfig::from_env().context("loading configuration")?;

    match cli.command {
        Command::Resolve { text } => {
            let resolver = build_resolver(&config)?;
            match resolver.resolve(&text).await? {
                Some(hit) => print_json(&hit)?,
                None => anyhow::bail!("no match for {:?}", text),
            }
        }
        Command::Region { ra, dec } => {
            let resolver = RegionResolver::milky_way();
            let region = resolver.find_region(ra, dec);
            print_json(&RegionOutput {
                name: &region.name,
                description: &region.description,
                context: region.context(),
            })?;
        }
        Command::Search {
            category,
            bbox,
            page,
            limit,
        } => {
            let registry = Arc::new(build_registry(&config)?);
            let token = CancellationToken::new();
            let sweeper = spawn_sweeper(
                Arc::clone(&registry),
                config.cache.cleanup_interval(),
                token.clone(),
            );

            let category: Category = category.parse()?;
            let mut query = registry.query(category).with_page(page);
            if let Some(limit) = limit {
                query = query.with_limit(limit);
            }
            if let Some(bbox) = bbox {
                query = query.with_bbox(BoundingBox::parse(&bbox)?);
            }

            info!("searching {} across {:?}", category, registry.adapter_ids());
            let result = tokio::select! {
                result = registry.search_with_cancel(&query, &token) => result,
                _ = tokio::signal::ctrl_c() => {
                    token.cancel();
                    anyhow::bail!("interrupted");
                }
            };
            token.cancel();
            if let Err(e) = sweeper.await {
                warn!("cache sweeper task failed: {}", e);
            }
            print_json(&result?)?;
        }
        Command::Get { id } => {
            let registry = build_registry(&config)?;
            print_json(&registry.get_by_id(&id).await?)?;
        }
        Command::Project { ra, dec } => {
            let coord = SkyCoordinate::normalized(ra, dec)?;
            let projection = Projection::new(config.projection.clone())?;
            let image = projection.sky_to_image(&coord);
            let round_trip = image.map(|p| projection.image_to_sky(p));
            print_json(&ProjectOutput {
                projection: projection.kind().to_string(),
                image,
                round_trip,
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_positions_parse() {
        let cli = Cli::try_parse_from(["sky-catalog", "region", "-10", "-5.5"]).unwrap();
        assert!(matches!(cli.command, Command::Region { ra, dec } if ra == -10.0 && dec == -5.5));

        let cli = Cli::try_parse_from(["sky-catalog", "project", "-0.5", "-29"]).unwrap();
        assert!(matches!(cli.command, Command::Project { ra, dec } if ra == -0.5 && dec == -29.0));

        let cli = Cli::try_parse_from(["sky-catalog", "search", "stars", "--bbox", "-10,-5,10,5"])
            .unwrap();
        assert!(matches!(cli.command, Command::Search { bbox: Some(b), .. } if b == "-10,-5,10,5"));
    }

    #[test]
    fn test_resolver_follows_sesame_switch() {
        let mut config = CatalogConfig::default();
        config.sesame.enabled = false;
        let resolver = build_resolver(&config).unwrap();
        assert!(format!("{:?}", resolver).contains("has_name_resolver: false"));

        config.sesame.enabled = true;
        let resolver = build_resolver(&config).unwrap();
        let expected = format!("has_name_resolver: {}", cfg!(feature = "sesame"));
        assert!(format!("{:?}", resolver).contains(&expected));
    }
}
