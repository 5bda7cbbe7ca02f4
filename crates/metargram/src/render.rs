//! Meteogram rendering.
//!
//! Four vertically stacked panels over a shared time axis: temperature and
//! dew point, wind, altimeter setting, cloud-layer heights.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Error};
use metargram_core::{fs::create_dir_all, Observation, ObservationTable};
use plotters::coord::Shift;
use plotters::prelude::*;
use time::macros::format_description;
use time::{Duration, OffsetDateTime};

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 1500;

const BROWN: RGBColor = RGBColor(139, 69, 19);

/// Compass labels for the wind-direction axis, one per 45 degrees.
const COMPASS: [&str; 9] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW", "N"];

/// Legend names for the reported cloud layers, lowest first.
const CLOUD_LEVELS: [&str; 4] = ["low", "medium", "high", "highest"];

/// Render the 4-panel meteogram and return the path of the saved PNG.
/// An existing file at that path is overwritten.
pub fn render_meteogram(table: &ObservationTable, output_dir: &str) -> Result<PathBuf, Error> {
    let station = table
        .station_id()
        .ok_or_else(|| anyhow!("no observations to plot"))?
        .to_string();
    let (first, last) = table
        .time_bounds()
        .ok_or_else(|| anyhow!("no observations to plot"))?;
    let axis = TimeAxis::new(first, last)?;

    let dir = Path::new(output_dir);
    create_dir_all(dir)?;
    let path = meteogram_path(dir, &station);

    let root = BitMapBackend::new(&path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((4, 1));

    draw_temperature_panel(&panels[0], table, &axis, &station)?;
    draw_wind_panel(&panels[1], table, &axis)?;
    draw_pressure_panel(&panels[2], table, &axis)?;
    draw_cloud_panel(&panels[3], table, &axis)?;

    root.present()?;
    Ok(path.clone())
}

fn meteogram_path(output_dir: &Path, station: &str) -> PathBuf {
    output_dir.join(format!("meteogram_{}.png", station))
}

/// Shared x axis in hours since the first observation's hour, so the 2-hour
/// tick cadence lands on round axis values.
struct TimeAxis {
    origin: OffsetDateTime,
    span_hours: f64,
}

impl TimeAxis {
    fn new(first: OffsetDateTime, last: OffsetDateTime) -> Result<TimeAxis, Error> {
        let origin = first
            .replace_minute(0)
            .and_then(|t| t.replace_second(0))
            .and_then(|t| t.replace_nanosecond(0))
            .map_err(|e| anyhow!("bad axis origin: {}", e))?;
        let whole_hours = ((last - origin).whole_seconds().max(0) as f64 / 3600.0).ceil() as i64;
        // span rounds up to an even hour count so ticks land on 0, 2, 4, ...
        let span_hours = (((whole_hours + 1) / 2) * 2).max(2) as f64;
        Ok(TimeAxis { origin, span_hours })
    }

    fn position(&self, at: OffsetDateTime) -> f64 {
        (at - self.origin).whole_seconds() as f64 / 3600.0
    }

    fn range(&self) -> std::ops::Range<f64> {
        0.0..self.span_hours
    }

    /// Tick positions every 2 hours across the span.
    fn ticks(&self) -> Vec<f64> {
        (0..=self.span_hours as i64)
            .step_by(2)
            .map(|hour| hour as f64)
            .collect()
    }

    /// `MM-DD HHMMZ` label for an axis position.
    fn label(&self, hours: f64) -> String {
        let stamp = format_description!("[month]-[day] [hour][minute]Z");
        let at = self.origin + Duration::seconds((hours * 3600.0).round() as i64);
        at.format(stamp).unwrap_or_default()
    }

    /// `YYYY-MM` caption suffix for the panel title.
    fn month_label(&self) -> String {
        let stamp = format_description!("[year]-[month]");
        self.origin.format(stamp).unwrap_or_default()
    }
}

fn series(
    table: &ObservationTable,
    axis: &TimeAxis,
    value: impl Fn(&Observation) -> Option<f64>,
) -> Vec<(f64, f64)> {
    table
        .rows()
        .iter()
        .filter_map(|row| value(row).map(|v| (axis.position(row.observed_at), v)))
        .collect()
}

fn value_bounds<'a>(
    values: impl Iterator<Item = &'a (f64, f64)>,
    default_low: f64,
    default_high: f64,
    min_pad: f64,
) -> (f64, f64) {
    let mut low = f64::INFINITY;
    let mut high = f64::NEG_INFINITY;
    for (_, value) in values {
        low = low.min(*value);
        high = high.max(*value);
    }
    if low > high {
        return (default_low, default_high);
    }
    let pad = ((high - low) * 0.1).max(min_pad);
    (low - pad, high + pad)
}

fn draw_temperature_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    table: &ObservationTable,
    axis: &TimeAxis,
    station: &str,
) -> Result<(), Error>
where
    DB::ErrorType: 'static,
{
    let temperatures = series(table, axis, |row| row.temperature_c);
    let dew_points = series(table, axis, |row| row.dew_point_c);
    let (low, high) = value_bounds(temperatures.iter().chain(&dew_points), -5.0, 25.0, 1.0);

    let mut chart = ChartBuilder::on(area)
        .caption(
            format!("{} {}", station, axis.month_label()),
            ("sans-serif", 24),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(axis.range(), low..high)?;

    chart
        .configure_mesh()
        .x_labels(axis.ticks().len())
        .x_label_formatter(&|hour| axis.label(*hour))
        .x_desc("Z-Time (MM-DD HH)")
        .y_desc("Temperature (degC)")
        .draw()?;

    chart
        .draw_series(LineSeries::new(temperatures, &RED))?
        .label("T")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], RED));
    chart
        .draw_series(LineSeries::new(dew_points, &GREEN))?
        .label("Td")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], GREEN));
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn draw_wind_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    table: &ObservationTable,
    axis: &TimeAxis,
) -> Result<(), Error>
where
    DB::ErrorType: 'static,
{
    let speeds = series(table, axis, |row| row.wind_speed_kt);
    // right axis in compass index units, one unit per 45 degrees, so the
    // default mesh puts a label on every compass point
    let directions = series(table, axis, |row| {
        row.wind_direction_deg.map(|deg| f64::from(deg) / 45.0)
    });

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .right_y_label_area_size(60)
        .build_cartesian_2d(axis.range(), 0.0..40.0)?
        .set_secondary_coord(axis.range(), -0.25..8.25);

    chart
        .configure_mesh()
        .x_labels(axis.ticks().len())
        .x_label_formatter(&|hour| axis.label(*hour))
        .y_desc("Wind Speed (kts)")
        .draw()?;
    chart
        .configure_secondary_axes()
        .y_desc("Wind Direction")
        .y_label_formatter(&compass_label)
        .draw()?;

    chart.draw_series(LineSeries::new(speeds, &BLUE))?;
    chart.draw_secondary_series(
        directions
            .into_iter()
            .map(|point| Cross::new(point, 4, CYAN.filled())),
    )?;
    Ok(())
}

fn draw_pressure_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    table: &ObservationTable,
    axis: &TimeAxis,
) -> Result<(), Error>
where
    DB::ErrorType: 'static,
{
    let pressures = series(table, axis, |row| row.altimeter_in_hg);
    let (low, high) = value_bounds(pressures.iter(), 29.0, 31.0, 0.05);

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(axis.range(), low..high)?;

    chart
        .configure_mesh()
        .x_labels(axis.ticks().len())
        .x_label_formatter(&|hour| axis.label(*hour))
        .y_desc("Pressure (inHg)")
        .draw()?;

    chart.draw_series(LineSeries::new(pressures, &BROWN))?;
    Ok(())
}

fn draw_cloud_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    table: &ObservationTable,
    axis: &TimeAxis,
) -> Result<(), Error>
where
    DB::ErrorType: 'static,
{
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(axis.range(), 0.0..30.0)?;

    chart
        .configure_mesh()
        .x_labels(axis.ticks().len())
        .x_label_formatter(&|hour| axis.label(*hour))
        .x_desc("Z-Time (MM-DD HH)")
        .y_desc("Cloud Height (kft)")
        .draw()?;

    // layers are independent per-observation readings, markers only
    for (level, name) in CLOUD_LEVELS.iter().enumerate() {
        let points = series(table, axis, move |row| {
            row.cloud_base_ft(level).map(|feet| feet / 1000.0)
        });
        let color = Palette99::pick(level).to_rgba();
        chart
            .draw_series(
                points
                    .into_iter()
                    .map(move |point| TriangleMarker::new(point, 5, color.filled())),
            )?
            .label(*name)
            .legend(move |(x, y)| TriangleMarker::new((x + 9, y), 5, color.filled()));
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn compass_label(index: &f64) -> String {
    if (index - index.round()).abs() > 0.05 {
        return String::new();
    }
    let rounded = index.round();
    if rounded < 0.0 {
        return String::new();
    }
    COMPASS
        .get(rounded as usize)
        .map(|name| name.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use metargram_core::{DateContext, TableBuilder};
    use time::macros::datetime;
    use time::Month;

    fn table(lines: &[&str]) -> ObservationTable {
        let context = DateContext::new(2024, Month::June);
        let mut builder = TableBuilder::new();
        for line in lines {
            builder.push_line(line, &context);
        }
        builder.finish()
    }

    #[test]
    fn axis_origin_floors_to_the_hour() {
        let axis = TimeAxis::new(
            datetime!(2024-06-05 18:53 UTC),
            datetime!(2024-06-06 18:53 UTC),
        )
        .unwrap();
        assert_eq!(axis.origin, datetime!(2024-06-05 18:00 UTC));
        assert_eq!(axis.position(datetime!(2024-06-05 19:00 UTC)), 1.0);
    }

    #[test]
    fn ticks_step_two_hours_across_the_span() {
        let axis = TimeAxis::new(
            datetime!(2024-06-05 18:53 UTC),
            datetime!(2024-06-06 18:53 UTC),
        )
        .unwrap();
        let ticks = axis.ticks();
        assert_eq!(ticks.first(), Some(&0.0));
        assert_eq!(ticks.last(), Some(&26.0));
        assert!(ticks.windows(2).all(|pair| pair[1] - pair[0] == 2.0));
    }

    #[test]
    fn a_single_observation_still_spans_two_hours() {
        let at = datetime!(2024-06-05 18:53 UTC);
        let axis = TimeAxis::new(at, at).unwrap();
        assert_eq!(axis.span_hours, 2.0);
        assert_eq!(axis.ticks(), vec![0.0, 2.0]);
    }

    #[test]
    fn tick_labels_use_month_day_and_zulu_time() {
        let axis = TimeAxis::new(
            datetime!(2024-06-05 18:53 UTC),
            datetime!(2024-06-06 18:53 UTC),
        )
        .unwrap();
        assert_eq!(axis.label(0.0), "06-05 1800Z");
        assert_eq!(axis.label(2.0), "06-05 2000Z");
        assert_eq!(axis.month_label(), "2024-06");
    }

    #[test]
    fn output_path_derives_from_the_station_id() {
        let path = meteogram_path(Path::new("imgs/meteogram"), "KPIT");
        assert_eq!(path, PathBuf::from("imgs/meteogram/meteogram_KPIT.png"));
    }

    #[test]
    fn compass_labels_cover_the_rose() {
        assert_eq!(compass_label(&0.0), "N");
        assert_eq!(compass_label(&2.0), "E");
        assert_eq!(compass_label(&4.0), "S");
        assert_eq!(compass_label(&6.0), "W");
        assert_eq!(compass_label(&8.0), "N");
        // off-grid mesh values stay unlabeled
        assert_eq!(compass_label(&3.4), "");
    }

    #[test]
    fn empty_table_refuses_to_render() {
        let empty = table(&[]);
        assert!(render_meteogram(&empty, "imgs/meteogram").is_err());
    }

    #[test]
    #[ignore = "draws a PNG, needs a usable font for axis text"]
    fn meteogram_file_is_written() {
        let rows = table(&[
            "KPIT 051853Z 28016KT 10SM FEW080 SCT250 21/16 A2992",
            "KPIT 052053Z 29010KT 10SM BKN100 22/15 A2990",
        ]);
        let dir = std::env::temp_dir().join("metargram-render-test");
        let path = render_meteogram(&rows, dir.to_str().unwrap()).unwrap();
        assert!(path.ends_with("meteogram_KPIT.png"));
        let written = std::fs::metadata(&path).unwrap();
        assert!(written.len() > 0);
        std::fs::remove_dir_all(dir).ok();
    }
}
