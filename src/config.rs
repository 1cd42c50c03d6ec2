use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::net::nominatim;
use crate::report::ReportFormat;

pub const DEFAULT_DATASET: &str = "data/wind_zones_india_nbc_2016.geojson";

/// Look up the NBC 2016 basic wind speed zone for a location.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[clap(value_enum, short, long, global = true, ignore_case = true, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Zone polygons (.geojson, .json or .shp) with `zone_name` and `standard` attributes.
    #[clap(short, long, global = true, default_value = DEFAULT_DATASET)]
    pub dataset: PathBuf,

    /// TOML zone table replacing the built-in zone → speed/color mapping.
    #[clap(short, long, global = true)]
    pub zone_table: Option<PathBuf>,

    /// Base URL of a Nominatim-compatible geocoding service.
    #[clap(long, global = true, default_value = nominatim::DEFAULT_BASE_URL)]
    pub geocoder_url: String,

    /// Seconds to wait for the geocoding service.
    #[clap(long, global = true, default_value_t = nominatim::DEFAULT_TIMEOUT.as_secs())]
    pub geocode_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Locate a point as if it were clicked on the map.
    Click {
        #[clap(long, allow_hyphen_values = true)]
        lat: f64,
        #[clap(long, allow_hyphen_values = true)]
        lon: f64,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Locate typed "lat,lon" coordinates.
    Coords {
        #[clap(allow_hyphen_values = true)]
        text: String,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Locate a place by name through the geocoding service.
    Search {
        text: String,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Print the zone legend.
    Legend,
    /// Interactive session reading commands from stdin.
    Shell,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Write a report of the result to this file.
    #[clap(long)]
    pub report: Option<PathBuf>,

    #[clap(value_enum, long, ignore_case = true, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}
