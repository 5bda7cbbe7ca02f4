//! Observation retrieval pipeline: fetch, extract, build, report.

use anyhow::Error;
use metargram_core::{DateContext, ObservationTable, TableBuilder};
use slog::{info, warn, Logger};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::{
    extract_json_observations, extract_raw_lines, receipt_context, MetarFetcher, SourceFormat,
};

pub struct ObservationService {
    logger: Logger,
    fetcher: MetarFetcher,
}

impl ObservationService {
    pub fn new(logger: Logger, fetcher: MetarFetcher) -> Self {
        ObservationService { logger, fetcher }
    }

    /// Raw observation lines for a station, most recent first, exactly as
    /// the provider issued them.
    pub async fn latest_raw(&self, station: &str, hours: u64) -> Result<Vec<String>, Error> {
        let body = self.fetcher.fetch(station, hours, SourceFormat::Raw).await?;
        let lines = extract_raw_lines(&body);
        info!(self.logger, "{} observation line(s) for {}", lines.len(), station);
        Ok(lines)
    }

    /// Parsed observation table for a station, sorted ascending by time.
    pub async fn observation_table(
        &self,
        station: &str,
        hours: u64,
        format: SourceFormat,
        dedup: bool,
    ) -> Result<ObservationTable, Error> {
        let body = self.fetcher.fetch(station, hours, format).await?;
        let mut builder = TableBuilder::new().dedup(dedup);

        match format {
            SourceFormat::Raw => {
                // scraped lines carry no receipt timestamp, the clock decides
                let context = DateContext::from_now(OffsetDateTime::now_utc());
                for line in extract_raw_lines(&body) {
                    builder.push_line(&line, &context);
                }
            }
            SourceFormat::Json => {
                for record in extract_json_observations(&body, &self.logger) {
                    match receipt_context(&record.receipt_time) {
                        Ok(context) => builder.push_line(&record.raw_ob, &context),
                        Err(err) => warn!(self.logger, "skipping observation: {}", err),
                    }
                }
            }
        }

        if builder.skipped() > 0 {
            info!(
                self.logger,
                "skipped {} malformed observation line(s)",
                builder.skipped()
            );
        }
        let table = builder.finish();
        info!(self.logger, "observation table rows: {}", table.len());
        Ok(table)
    }
}

/// Per-row text report of an annotated table.
pub fn format_observation_report(table: &ObservationTable, station: &str) -> String {
    let stamp = format_description!("[year]-[month]-[day] [hour]:[minute]Z");
    let mut out = format!("Latest observation(s) from {}:\n", station);
    for row in table.rows() {
        let time = row.observed_at.format(stamp).unwrap_or_default();
        out.push_str(&format!(
            "{}  T {}  Td {}  HI {}  WC {}  {}\n",
            time,
            fmt_degrees(row.derived.temperature_f),
            fmt_degrees(row.derived.dew_point_f),
            fmt_degrees(row.derived.heat_index_f),
            fmt_degrees(row.derived.wind_chill_f),
            row.raw
        ));
    }
    out
}

fn fmt_degrees(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:5.1}F"),
        None => "    -".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn report_carries_station_raw_text_and_masks() {
        let context = DateContext::new(2024, Month::June);
        let mut builder = TableBuilder::new();
        builder.push_line("KPIT 051853Z 28010KT 30/21 A2992", &context);
        let table = builder.finish().annotate();

        let report = format_observation_report(&table, "KPIT");
        assert!(report.starts_with("Latest observation(s) from KPIT:"));
        assert!(report.contains("KPIT 051853Z 28010KT 30/21 A2992"));
        // 30C is 86.0F
        assert!(report.contains("T  86.0F"));
        // too warm for wind chill
        assert!(report.contains("WC     -"));
    }
}
