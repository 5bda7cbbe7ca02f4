use std::fmt;

use anyhow::{anyhow, Error};
use clap::ValueEnum;
use reqwest::Client;
use slog::{debug, Logger};

/// Response format requested from the provider.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// HTML page carrying one inline-code element per observation
    Raw,
    /// JSON array of observation objects
    Json,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Raw => write!(f, "raw"),
            SourceFormat::Json => write!(f, "json"),
        }
    }
}

/// One-shot METAR fetcher against the Aviation Weather Center.
pub struct MetarFetcher {
    logger: Logger,
    base_url: String,
    user_agent: String,
}

impl MetarFetcher {
    pub fn new(logger: Logger, base_url: String, user_agent: String) -> MetarFetcher {
        Self {
            logger,
            base_url,
            user_agent,
        }
    }

    /// Request URL for a station and lookback window. `hours` of 0 asks the
    /// provider for the most recent observation only.
    pub fn observations_url(&self, station: &str, hours: u64, format: SourceFormat) -> String {
        let path = match format {
            SourceFormat::Raw => "/metar/data",
            SourceFormat::Json => "/api/data/metar",
        };
        format!(
            "{}{}?ids={}&format={}&date=&hours={}&taf=off",
            self.base_url, path, station, format, hours
        )
    }

    /// Issue the single outbound request of a run. No retries; a transport
    /// error or a non-success status surfaces to the caller unchanged.
    pub async fn fetch(
        &self,
        station: &str,
        hours: u64,
        format: SourceFormat,
    ) -> Result<String, Error> {
        let url = self.observations_url(station, hours, format);
        let client = Client::builder().user_agent(&self.user_agent).build()?;

        debug!(self.logger, "requesting: {}", url);
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("error sending request: {}", e))?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "request for {} failed with status {}",
                station,
                response.status()
            ));
        }
        response
            .text()
            .await
            .map_err(|e| anyhow!("error reading body of request: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slog::o;

    fn fetcher() -> MetarFetcher {
        MetarFetcher::new(
            Logger::root(slog::Discard, o!()),
            "https://aviationweather.gov".to_string(),
            "metargram/test".to_string(),
        )
    }

    #[test]
    fn raw_url_carries_station_hours_and_format() {
        let url = fetcher().observations_url("KPIT", 24, SourceFormat::Raw);
        assert_eq!(
            url,
            "https://aviationweather.gov/metar/data?ids=KPIT&format=raw&date=&hours=24&taf=off"
        );
    }

    #[test]
    fn json_url_targets_the_api_path() {
        let url = fetcher().observations_url("KSEA", 0, SourceFormat::Json);
        assert_eq!(
            url,
            "https://aviationweather.gov/api/data/metar?ids=KSEA&format=json&date=&hours=0&taf=off"
        );
    }
}
