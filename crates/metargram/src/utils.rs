use std::env;
use std::io::{self, BufRead, Write};

use anyhow::{anyhow, Error};
use clap::Parser;
use metargram_core::{find_config_file, load_config, ConfigSource, DEFAULT_STATION};
use slog::{o, Drain, Level, Logger};

use crate::SourceFormat;

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[serde(default)]
#[command(
    author,
    version,
    about = "Fetches METAR observations from the NOAA Aviation Weather Center"
)]
pub struct Cli {
    /// ICAO station identifier (4 characters, e.g. KPIT)
    #[arg(value_name = "STATION")]
    pub station: Option<String>,

    /// Hours to look back; omit for the most recent observation only
    #[arg(value_name = "HOURS")]
    pub hours: Option<u64>,

    /// Path to config file (TOML format)
    /// Searched in order: this flag, $METARGRAM_CONFIG, ./metargram.toml,
    /// $XDG_CONFIG_HOME/metargram/metargram.toml, /etc/metargram/metargram.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "METARGRAM_LEVEL")]
    pub level: Option<String>,

    /// Provider base URL
    #[arg(short, long, env = "METARGRAM_BASE_URL")]
    pub base_url: Option<String>,

    /// Response format to request from the provider
    #[arg(short = 'F', long, env = "METARGRAM_FORMAT", value_enum)]
    pub format: Option<SourceFormat>,

    /// Render a meteogram PNG instead of printing observations
    #[arg(short, long)]
    pub meteogram: bool,

    /// Prompt for station and lookback on stdin
    #[arg(short, long)]
    #[serde(skip)]
    pub interactive: bool,

    /// Collapse observations repeated across overlapping lookback windows
    #[arg(short, long)]
    pub dedup: bool,

    /// Directory the meteogram PNG is written to
    #[arg(short, long, env = "METARGRAM_OUTPUT_DIR")]
    pub output_dir: Option<String>,

    /// HTTP User-Agent header for provider requests
    #[arg(short, long, env = "METARGRAM_USER_AGENT")]
    pub user_agent: Option<String>,
}

impl Cli {
    /// Get the effective configuration value with defaults
    pub fn station(&self) -> String {
        self.station
            .clone()
            .unwrap_or_else(|| DEFAULT_STATION.to_string())
            .to_uppercase()
    }

    pub fn format(&self) -> SourceFormat {
        self.format.unwrap_or(SourceFormat::Raw)
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| "https://aviationweather.gov".to_string())
    }

    pub fn output_dir(&self) -> String {
        self.output_dir
            .clone()
            .unwrap_or_else(|| "imgs/meteogram".to_string())
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("metargram/{}", env!("CARGO_PKG_VERSION")))
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("METARGRAM_CONFIG", "metargram.toml")
    };

    let file_config: Cli = load_config(&source).unwrap_or_default();

    // CLI args override file config (env vars are handled by clap)
    Cli {
        station: cli_args.station.or(file_config.station),
        hours: cli_args.hours.or(file_config.hours),
        config: cli_args.config,
        level: cli_args.level.or(file_config.level),
        base_url: cli_args.base_url.or(file_config.base_url),
        format: cli_args.format.or(file_config.format),
        meteogram: cli_args.meteogram || file_config.meteogram,
        interactive: cli_args.interactive,
        dedup: cli_args.dedup || file_config.dedup,
        output_dir: cli_args.output_dir.or(file_config.output_dir),
        user_agent: cli_args.user_agent.or(file_config.user_agent),
    }
}

pub fn setup_logger(cli: &Cli) -> Logger {
    let level = cli
        .level
        .clone()
        .or_else(|| env::var("RUST_LOG").ok())
        .map(|name| parse_level(&name))
        .unwrap_or(Level::Info);

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = drain.filter_level(level).fuse();
    Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}

fn parse_level(name: &str) -> Level {
    match name.to_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "warn" => Level::Warning,
        "error" => Level::Error,
        _ => Level::Info,
    }
}

/// Interactive variant: ask for both values on stdin.
pub fn prompt_for_inputs() -> Result<(String, Option<u64>), Error> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    print!("Enter ICAO: ");
    io::stdout().flush()?;
    let station = lines
        .next()
        .unwrap_or_else(|| Ok(String::new()))?
        .trim()
        .to_uppercase();
    let station = if station.is_empty() {
        DEFAULT_STATION.to_string()
    } else {
        station
    };

    print!("Enter hours back (leave blank for most recent): ");
    io::stdout().flush()?;
    let hours_input = lines.next().unwrap_or_else(|| Ok(String::new()))?;
    let hours_input = hours_input.trim();
    let hours = if hours_input.is_empty() {
        None
    } else {
        Some(hours_input.parse().map_err(|_| {
            anyhow!("hours must be a non-negative integer, got `{hours_input}`")
        })?)
    };

    Ok((station, hours))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_station_is_kpit() {
        assert_eq!(Cli::default().station(), "KPIT");
    }

    #[test]
    fn station_is_normalized_to_uppercase() {
        let cli = Cli {
            station: Some("kbos".to_string()),
            ..Cli::default()
        };
        assert_eq!(cli.station(), "KBOS");
    }

    #[test]
    fn default_format_is_raw() {
        assert_eq!(Cli::default().format(), SourceFormat::Raw);
    }

    #[test]
    fn default_output_dir_matches_the_meteogram_layout() {
        assert_eq!(Cli::default().output_dir(), "imgs/meteogram");
    }

    #[test]
    fn level_names_map_to_slog_levels() {
        assert_eq!(parse_level("trace"), Level::Trace);
        assert_eq!(parse_level("DEBUG"), Level::Debug);
        assert_eq!(parse_level("warn"), Level::Warning);
        assert_eq!(parse_level("error"), Level::Error);
        assert_eq!(parse_level("anything else"), Level::Info);
    }
}
