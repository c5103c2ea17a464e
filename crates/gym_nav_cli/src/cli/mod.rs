pub mod args;
pub mod color;
pub mod commands;
pub mod validate;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

use gym_nav_core::config::NavConfig;
use gym_nav_core::paths::resolve_config_path;

pub fn run() -> Result<()> {
    let cli = args::Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref())?;

    match &cli.cmd {
        args::Commands::Find {
            lat,
            lon,
            radius,
            limit,
        } => {
            validate::validate_coords(*lat, *lon, "find")?;
            validate::validate_limit(*limit)?;
            let config = load_config(&config_path)?;
            let radius = radius.unwrap_or(config.poi.default_radius_m);
            validate::validate_radius(radius)?;
            commands::find::run(&config, *lat, *lon, radius, *limit)
        }

        args::Commands::Route {
            from_lat,
            from_lon,
            to_lat,
            to_lon,
            polyline,
            json,
        } => {
            validate::validate_route_endpoints((*from_lat, *from_lon), (*to_lat, *to_lon))?;
            let config = load_config(&config_path)?;
            commands::route::run(
                &config,
                (*from_lat, *from_lon),
                (*to_lat, *to_lon),
                *polyline,
                *json,
            )
        }

        args::Commands::Navigate {
            track,
            radius,
            pick,
            speed,
            no_permission,
        } => {
            validate::validate_pick(*pick)?;
            validate::validate_speed(*speed)?;
            let config = load_config(&config_path)?;
            let radius = radius.unwrap_or(config.poi.default_radius_m);
            validate::validate_radius(radius)?;
            commands::navigate::run(
                &config,
                commands::navigate::NavigateOptions {
                    track: track.clone(),
                    radius,
                    pick: *pick,
                    speed: *speed,
                    permission_granted: !*no_permission,
                },
            )
        }

        args::Commands::Config { cmd } => commands::config::run(&config_path, cmd),
    }
}

/// Missing file means defaults; the API key env var always wins.
fn load_config(path: &Path) -> Result<NavConfig> {
    let config = NavConfig::load_or_default(path)
        .with_context(|| format!("Loading config from {}", path.display()))?
        .with_env_overrides();
    config.validate()?;
    Ok(config)
}
