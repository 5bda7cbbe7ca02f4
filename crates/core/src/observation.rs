//! Fixed observation record produced by the METAR parser.
//!
//! Consumers rely on named fields with explicit nullability instead of
//! probing a dynamic shape; values a report does not carry are `None`.

use time::OffsetDateTime;

/// Cloud cover amount of a single reported layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudCover {
    Few,
    Scattered,
    Broken,
    Overcast,
    /// Sky obscured, `VVxxx` groups.
    VerticalVisibility,
}

/// One reported cloud layer. The base is `None` when the group carries no
/// usable height (`///`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudLayer {
    pub cover: CloudCover,
    pub base_ft: Option<f64>,
}

/// Apparent-temperature columns added by the table annotation step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedMetrics {
    pub temperature_f: Option<f64>,
    pub dew_point_f: Option<f64>,
    /// `None` wherever the 2m temperature is below 80F.
    pub heat_index_f: Option<f64>,
    /// `None` wherever wind is 5kt or less, or the 2m temperature is above 50F.
    pub wind_chill_f: Option<f64>,
}

/// A single parsed METAR observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub station_id: String,
    pub observed_at: OffsetDateTime,
    pub temperature_c: Option<f64>,
    pub dew_point_c: Option<f64>,
    /// Degrees true; `None` for calm or variable winds.
    pub wind_direction_deg: Option<u16>,
    pub wind_speed_kt: Option<f64>,
    pub wind_gust_kt: Option<f64>,
    pub altimeter_in_hg: Option<f64>,
    /// Visibility group as reported (`10SM`, `9999`, ...).
    pub visibility: Option<String>,
    /// Present-weather and other body groups, passed through unchanged.
    pub wx_codes: Vec<String>,
    /// Reported layers, lowest first, at most four retained.
    pub cloud_layers: Vec<CloudLayer>,
    /// Everything after `RMK`, passed through unchanged.
    pub remarks: Option<String>,
    /// The line exactly as issued by the provider.
    pub raw: String,
    pub derived: DerivedMetrics,
}

impl Observation {
    /// Base height of the nth reported layer, feet above ground.
    pub fn cloud_base_ft(&self, level: usize) -> Option<f64> {
        self.cloud_layers.get(level).and_then(|layer| layer.base_ft)
    }
}
