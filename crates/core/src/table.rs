//! Chronological observation tables.

use log::warn;
use time::OffsetDateTime;

use crate::derive::{
    celsius_to_fahrenheit, heat_index_f, wind_chill_f, HEAT_INDEX_MIN_TEMP_F,
    WIND_CHILL_MAX_TEMP_F, WIND_CHILL_MIN_WIND_KT,
};
use crate::{parse_metar, DateContext, Observation};

/// Accumulates raw lines into an [`ObservationTable`].
///
/// Lines parse independently in any order; `finish` establishes the
/// chronological ordering every consumer relies on.
#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<Observation>,
    dedup: bool,
    skipped: usize,
}

impl TableBuilder {
    pub fn new() -> Self {
        TableBuilder::default()
    }

    /// Collapse rows repeated across overlapping lookback windows.
    pub fn dedup(mut self, enabled: bool) -> Self {
        self.dedup = enabled;
        self
    }

    /// Parse one raw line into the table. A malformed line is dropped with
    /// a warning and counted; it never aborts the batch.
    pub fn push_line(&mut self, line: &str, context: &DateContext) {
        match parse_metar(line, context) {
            Ok(observation) => self.rows.push(observation),
            Err(err) => {
                warn!("skipping malformed observation line ({err}): {line}");
                self.skipped += 1;
            }
        }
    }

    /// Lines dropped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Sort ascending by observation time and hand over the table.
    pub fn finish(mut self) -> ObservationTable {
        self.rows.sort_by_key(|row| row.observed_at);
        if self.dedup {
            self.rows.dedup_by(|a, b| {
                a.station_id == b.station_id && a.observed_at == b.observed_at && a.raw == b.raw
            });
        }
        ObservationTable { rows: self.rows }
    }
}

/// Observations of one run, sorted ascending by time.
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    rows: Vec<Observation>,
}

impl ObservationTable {
    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Station of the first row; a run only ever holds one station.
    pub fn station_id(&self) -> Option<&str> {
        self.rows.first().map(|row| row.station_id.as_str())
    }

    /// First and last observation times.
    pub fn time_bounds(&self) -> Option<(OffsetDateTime, OffsetDateTime)> {
        Some((self.rows.first()?.observed_at, self.rows.last()?.observed_at))
    }

    /// Add the derived apparent-temperature columns to every row.
    ///
    /// Each index is computed first and masked to `None` afterwards, so the
    /// thresholds stay the single source of validity.
    pub fn annotate(mut self) -> Self {
        for row in &mut self.rows {
            let temperature_f = row.temperature_c.map(celsius_to_fahrenheit);
            let dew_point_f = row.dew_point_c.map(celsius_to_fahrenheit);
            row.derived.temperature_f = temperature_f;
            row.derived.dew_point_f = dew_point_f;

            if let (Some(temperature), Some(dew_point)) = (temperature_f, dew_point_f) {
                let heat_index = heat_index_f(temperature, dew_point);
                row.derived.heat_index_f =
                    (temperature >= HEAT_INDEX_MIN_TEMP_F).then_some(heat_index);
            }
            if let (Some(temperature), Some(wind)) = (temperature_f, row.wind_speed_kt) {
                let wind_chill = wind_chill_f(temperature, wind);
                row.derived.wind_chill_f = (wind > WIND_CHILL_MIN_WIND_KT
                    && temperature <= WIND_CHILL_MAX_TEMP_F)
                    .then_some(wind_chill);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    fn context() -> DateContext {
        DateContext::new(2024, Month::June)
    }

    fn build(lines: &[&str], dedup: bool) -> ObservationTable {
        let mut builder = TableBuilder::new().dedup(dedup);
        for line in lines {
            builder.push_line(line, &context());
        }
        builder.finish()
    }

    #[test]
    fn rows_sort_ascending_regardless_of_input_order() {
        let table = build(
            &[
                "KPIT 052053Z 28016KT 21/16 A2992",
                "KPIT 051853Z 28016KT 21/16 A2992",
                "KPIT 051953Z 28016KT 21/16 A2992",
            ],
            false,
        );
        let times: Vec<_> = table.rows().iter().map(|row| row.observed_at).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let mut builder = TableBuilder::new();
        builder.push_line("KPIT 051853Z 21/16", &context());
        builder.push_line("not a metar at all", &context());
        builder.push_line("KPIT 051953Z 22/16", &context());
        assert_eq!(builder.skipped(), 1);
        assert_eq!(builder.finish().len(), 2);
    }

    #[test]
    fn duplicate_rows_survive_without_dedup() {
        let line = "KPIT 051853Z 28016KT 21/16 A2992";
        assert_eq!(build(&[line, line], false).len(), 2);
    }

    #[test]
    fn dedup_collapses_repeated_observations() {
        let line = "KPIT 051853Z 28016KT 21/16 A2992";
        let other = "KPIT 051953Z 28016KT 22/16 A2992";
        assert_eq!(build(&[line, other, line], true).len(), 2);
    }

    #[test]
    fn station_and_bounds_come_from_the_sorted_rows() {
        let table = build(
            &[
                "KPIT 051953Z 28016KT 21/16 A2992",
                "KPIT 051853Z 28016KT 21/16 A2992",
            ],
            false,
        );
        assert_eq!(table.station_id(), Some("KPIT"));
        let (first, last) = table.time_bounds().unwrap();
        assert!(first < last);
    }

    #[test]
    fn annotate_masks_heat_index_below_eighty() {
        // 30C = 86F, 10C = 50F
        let table = build(
            &[
                "KPIT 051853Z 28010KT 30/21 A2992",
                "KPIT 051953Z 28010KT 10/05 A2992",
            ],
            false,
        )
        .annotate();
        let rows = table.rows();
        assert!(rows[0].derived.heat_index_f.unwrap().is_finite());
        assert_eq!(rows[1].derived.heat_index_f, None);
    }

    #[test]
    fn annotate_masks_wind_chill_outside_its_band() {
        // 4C = 39.2F with 10 kt: reported; 3 kt: too calm; 16C = 60.8F: too warm
        let table = build(
            &[
                "KPIT 051853Z 28010KT 04/M02 A2992",
                "KPIT 051953Z 28003KT 04/M02 A2992",
                "KPIT 052053Z 28010KT 16/08 A2992",
            ],
            false,
        )
        .annotate();
        let rows = table.rows();
        assert!(rows[0].derived.wind_chill_f.unwrap().is_finite());
        assert_eq!(rows[1].derived.wind_chill_f, None);
        assert_eq!(rows[2].derived.wind_chill_f, None);
    }

    #[test]
    fn annotate_converts_units_and_keeps_missing_values_null() {
        let table = build(&["KPIT 051853Z 28010KT 30/ A2992"], false).annotate();
        let row = &table.rows()[0];
        assert_eq!(row.derived.temperature_f, Some(86.0));
        assert_eq!(row.derived.dew_point_f, None);
        // no dew point, no heat index
        assert_eq!(row.derived.heat_index_f, None);
    }

    #[test]
    fn boundary_values_respect_the_masks() {
        // 10C = exactly 50F with 10 kt wind: wind chill still reported
        let table = build(&["KPIT 051853Z 28010KT 10/05 A2992"], false).annotate();
        assert!(table.rows()[0].derived.wind_chill_f.is_some());
    }
}
