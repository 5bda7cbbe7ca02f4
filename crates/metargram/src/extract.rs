//! Record extraction from provider responses.

use anyhow::anyhow;
use metargram_core::DateContext;
use scraper::{Html, Selector};
use serde::Deserialize;
use slog::{warn, Logger};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Inline-code observation lines inside the AWC page body.
const OBSERVATION_LINES_SELECTOR: &str = "#awc_main_content_wrap > code";

/// Observation lines from the provider HTML page, in document order (the
/// provider places the most recent first). An absent or empty content
/// container yields no lines, never an error.
pub fn extract_raw_lines(body: &str) -> Vec<String> {
    let document = Html::parse_document(body);
    let Ok(selector) = Selector::parse(OBSERVATION_LINES_SELECTOR) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|element| {
            let text = element.text().collect::<String>();
            let line = text.trim();
            (!line.is_empty()).then(|| line.to_string())
        })
        .collect()
}

/// One record of the provider's JSON response. Fields beyond the raw text
/// and the receipt timestamp are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonObservation {
    pub raw_ob: String,
    pub receipt_time: String,
}

/// Observation records from the provider JSON body, in array order. A body
/// with an unexpected shape is logged and treated as empty.
pub fn extract_json_observations(body: &str, logger: &Logger) -> Vec<JsonObservation> {
    match serde_json::from_str(body) {
        Ok(records) => records,
        Err(err) => {
            warn!(logger, "unexpected response shape, treating as empty: {}", err);
            Vec::new()
        }
    }
}

/// Month/year parsing context from a record's receipt timestamp. The raw
/// METAR text is ambiguous across month and year boundaries, so the receipt
/// time decides.
pub fn receipt_context(receipt_time: &str) -> Result<DateContext, anyhow::Error> {
    let receipt = parse_receipt_time(receipt_time)?;
    Ok(DateContext::from_receipt(receipt))
}

fn parse_receipt_time(receipt_time: &str) -> Result<OffsetDateTime, anyhow::Error> {
    if let Ok(timestamp) = OffsetDateTime::parse(receipt_time, &Rfc3339) {
        return Ok(timestamp);
    }
    let plain = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(receipt_time, plain)
        .map(|timestamp| timestamp.assume_utc())
        .map_err(|e| anyhow!("unparseable receipt time `{}`: {}", receipt_time, e))
}
