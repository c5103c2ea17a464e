use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gym_nav",
    version,
    about = "Find nearby gyms, plan a driving route and follow it"
)]
pub struct Cli {
    /// Path to the JSON config file (defaults to the OS config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List gyms around a coordinate
    Find {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Search radius in meters (defaults to poi.default_radius_m)
        #[arg(long)]
        radius: Option<u32>,

        /// Max rows to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Plan a driving route between two coordinates
    Route {
        #[arg(long, allow_hyphen_values = true)]
        from_lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        from_lon: f64,

        #[arg(long, allow_hyphen_values = true)]
        to_lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        to_lon: f64,

        /// Also print the route path as an encoded polyline
        #[arg(long)]
        polyline: bool,

        /// Print the route as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Replay a recorded GPS track: find gyms around its start, route to one and follow it
    Navigate {
        /// CSV with columns latitude,longitude[,bearing]
        #[arg(long)]
        track: PathBuf,

        /// Search radius in meters (defaults to poi.default_radius_m)
        #[arg(long)]
        radius: Option<u32>,

        /// Which gym to drive to, 1-based, in the order they are listed
        #[arg(long, default_value_t = 1)]
        pick: usize,

        /// Replay speed multiplier
        #[arg(long, default_value_t = 1.0)]
        speed: f64,

        /// Simulate a denied location permission
        #[arg(long)]
        no_permission: bool,
    },

    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Print the effective configuration (API key masked)
    Show,

    /// Print the config file location
    Path,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}
