//! Metargram Core Library
//!
//! Shared pieces for the metargram CLI:
//! - METAR text-record parsing into fixed observation structs
//! - Chronologically ordered observation tables
//! - Derived apparent-temperature indices (heat index, wind chill)
//! - Configuration loading (XDG-compliant)

mod config;
mod derive;
mod error;
pub mod fs;
mod observation;
mod parse;
mod table;

pub use config::{find_config_file, load_config, ConfigSource};
pub use derive::{
    celsius_to_fahrenheit, fahrenheit_to_celsius, heat_index_f, relative_humidity_pct,
    wind_chill_f, HEAT_INDEX_MIN_TEMP_F, WIND_CHILL_MAX_TEMP_F, WIND_CHILL_MIN_WIND_KT,
};
pub use error::ParseError;
pub use observation::{CloudCover, CloudLayer, DerivedMetrics, Observation};
pub use parse::{parse_metar, DateContext};
pub use table::{ObservationTable, TableBuilder};

/// Application name used for XDG paths
pub const APP_NAME: &str = "metargram";

/// Station queried when the caller does not provide one
pub const DEFAULT_STATION: &str = "KPIT";

/// Lookback used by the meteogram path when none is given (one day)
pub const DEFAULT_METEOGRAM_LOOKBACK_HOURS: u64 = 24;
