//! METAR text-record parsing.
//!
//! Implements the subset of the METAR grammar that the observation table
//! and the meteogram consume: station, time group, wind, visibility, cloud
//! layers, temperature/dew point, altimeter, remarks. Body groups outside
//! that subset are carried through unchanged in `wx_codes`.

use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

use crate::{CloudCover, CloudLayer, DerivedMetrics, Observation, ParseError};

/// Knots per metre-per-second, for `MPS` wind groups.
const MPS_TO_KT: f64 = 1.943_844_5;

/// Inches of mercury per hectopascal, for `Q` altimeter groups.
const HPA_TO_IN_HG: f64 = 0.029_529_983;

/// Month/year context for resolving the day-of-month stamp in a METAR body.
///
/// Raw METAR text only carries day, hour and minute, so month and year must
/// come from the outside: from the receipt timestamp for JSON-sourced
/// records, or from the current clock for scraped lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateContext {
    year: i32,
    month: Month,
    /// When set, a day-of-month greater than this belongs to the previous
    /// month (scrape path, where only "now" is known).
    rollover_day: Option<u8>,
}

impl DateContext {
    /// Context with an explicitly known month and year.
    pub fn new(year: i32, month: Month) -> Self {
        DateContext {
            year,
            month,
            rollover_day: None,
        }
    }

    /// Context from the receipt timestamp accompanying a raw record.
    pub fn from_receipt(receipt: OffsetDateTime) -> Self {
        Self::new(receipt.year(), receipt.month())
    }

    /// Context from the current clock, for lines with no receipt timestamp.
    /// An observation day ahead of today's resolves into last month.
    pub fn from_now(now: OffsetDateTime) -> Self {
        DateContext {
            year: now.year(),
            month: now.month(),
            rollover_day: Some(now.day()),
        }
    }

    fn resolve(&self, day: u8, hour: u8, minute: u8) -> Result<OffsetDateTime, ParseError> {
        let (mut year, mut month) = (self.year, self.month);
        if let Some(today) = self.rollover_day {
            if day > today {
                month = month.previous();
                if month == Month::December {
                    year -= 1;
                }
            }
        }
        let date =
            Date::from_calendar_date(year, month, day).map_err(|_| ParseError::DayOutOfRange {
                day,
                month: month as u8,
                year,
            })?;
        let time = Time::from_hms(hour, minute, 0)
            .map_err(|_| ParseError::InvalidTime(format!("{day:02}{hour:02}{minute:02}Z")))?;
        Ok(PrimitiveDateTime::new(date, time).assume_utc())
    }
}

/// Parse one raw METAR line into an [`Observation`].
pub fn parse_metar(line: &str, context: &DateContext) -> Result<Observation, ParseError> {
    let raw = line.trim();
    if raw.is_empty() {
        return Err(ParseError::EmptyLine);
    }

    let mut tokens = raw.split_whitespace().peekable();
    if matches!(tokens.peek(), Some(&"METAR") | Some(&"SPECI")) {
        tokens.next();
    }

    let station = tokens.next().ok_or(ParseError::MissingStation)?;
    if station.len() != 4 || !station.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ParseError::InvalidStation(station.to_string()));
    }

    let time_group = tokens.next().ok_or(ParseError::MissingTime)?;
    let observed_at = parse_time_group(time_group, context)?;

    let mut obs = Observation {
        station_id: station.to_string(),
        observed_at,
        temperature_c: None,
        dew_point_c: None,
        wind_direction_deg: None,
        wind_speed_kt: None,
        wind_gust_kt: None,
        altimeter_in_hg: None,
        visibility: None,
        wx_codes: Vec::new(),
        cloud_layers: Vec::new(),
        remarks: None,
        raw: raw.to_string(),
        derived: DerivedMetrics::default(),
    };

    let rest: Vec<&str> = tokens.collect();
    let (body, remark) = match rest.iter().position(|t| *t == "RMK") {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        None => (&rest[..], &rest[..0]),
    };

    let mut i = 0;
    while i < body.len() {
        let token = body[i];
        i += 1;

        // METAR bodies are ASCII; anything else goes through untouched
        if !token.is_ascii() {
            obs.wx_codes.push(token.to_string());
            continue;
        }
        if matches!(token, "AUTO" | "COR" | "NIL") {
            continue;
        }
        if let Some(wind) = parse_wind_group(token) {
            obs.wind_direction_deg = wind.direction_deg;
            obs.wind_speed_kt = wind.speed_kt;
            obs.wind_gust_kt = wind.gust_kt;
            continue;
        }
        if is_direction_variation(token) {
            continue;
        }
        // two-token statute-mile visibility, e.g. `1 1/2SM`
        if is_digits(token) && token.len() <= 2 {
            if let Some(next) = body.get(i) {
                if next.ends_with("SM") && next.contains('/') {
                    obs.visibility = Some(format!("{token} {next}"));
                    i += 1;
                    continue;
                }
            }
        }
        if token == "CAVOK" || is_visibility(token) {
            obs.visibility = Some(token.to_string());
            continue;
        }
        if let Some(layer) = parse_cloud_group(token) {
            if obs.cloud_layers.len() < 4 {
                obs.cloud_layers.push(layer);
            }
            continue;
        }
        if matches!(token, "SKC" | "CLR" | "NSC" | "NCD") {
            continue;
        }
        if let Some((temperature, dew_point)) = parse_temperature_group(token) {
            obs.temperature_c = temperature;
            obs.dew_point_c = dew_point;
            continue;
        }
        if let Some(altimeter) = parse_altimeter_group(token) {
            obs.altimeter_in_hg = Some(altimeter);
            continue;
        }
        obs.wx_codes.push(token.to_string());
    }

    if !remark.is_empty() {
        for token in remark {
            // the T-group repeats temperature and dew point in tenths
            if let Some((temperature, dew_point)) = parse_tenths_group(token) {
                if temperature.is_some() {
                    obs.temperature_c = temperature;
                }
                if dew_point.is_some() {
                    obs.dew_point_c = dew_point;
                }
            }
        }
        obs.remarks = Some(remark.join(" "));
    }

    Ok(obs)
}

fn parse_time_group(token: &str, context: &DateContext) -> Result<OffsetDateTime, ParseError> {
    let invalid = || ParseError::InvalidTime(token.to_string());
    if token.len() != 7 || !token.is_ascii() || !token.ends_with('Z') || !is_digits(&token[..6]) {
        return Err(invalid());
    }
    let day = token[0..2].parse().map_err(|_| invalid())?;
    let hour = token[2..4].parse().map_err(|_| invalid())?;
    let minute = token[4..6].parse().map_err(|_| invalid())?;
    context.resolve(day, hour, minute)
}

struct WindGroup {
    direction_deg: Option<u16>,
    speed_kt: Option<f64>,
    gust_kt: Option<f64>,
}

fn parse_wind_group(token: &str) -> Option<WindGroup> {
    let (group, to_kt) = if let Some(group) = token.strip_suffix("KT") {
        (group, 1.0)
    } else if let Some(group) = token.strip_suffix("MPS") {
        (group, MPS_TO_KT)
    } else {
        return None;
    };

    // direction and speed can each be reported missing
    if !group.is_empty() && group.chars().all(|c| c == '/') {
        return Some(WindGroup {
            direction_deg: None,
            speed_kt: None,
            gust_kt: None,
        });
    }
    if group.len() < 5 {
        return None;
    }

    let (direction_part, rest) = group.split_at(3);
    let (speed_part, gust_part) = match rest.split_once('G') {
        Some((speed, gust)) => (speed, Some(gust)),
        None => (rest, None),
    };

    if !is_digits(speed_part) {
        return None;
    }
    let speed = speed_part.parse::<f64>().ok()? * to_kt;
    let gust = match gust_part {
        Some(gust) if is_digits(gust) => Some(gust.parse::<f64>().ok()? * to_kt),
        Some(_) => return None,
        None => None,
    };

    let direction = if direction_part == "VRB" || direction_part == "///" {
        None
    } else if is_digits(direction_part) {
        let degrees = direction_part.parse::<u16>().ok()?;
        if degrees > 360 {
            return None;
        }
        Some(degrees)
    } else {
        return None;
    };

    // 00000KT reports calm air, which carries no direction
    if direction == Some(0) && speed == 0.0 {
        return Some(WindGroup {
            direction_deg: None,
            speed_kt: Some(0.0),
            gust_kt: gust,
        });
    }

    Some(WindGroup {
        direction_deg: direction,
        speed_kt: Some(speed),
        gust_kt: gust,
    })
}

fn is_direction_variation(token: &str) -> bool {
    token.len() == 7
        && token.as_bytes()[3] == b'V'
        && is_digits(&token[..3])
        && is_digits(&token[4..])
}

fn is_visibility(token: &str) -> bool {
    // metres, `9999` meaning 10 km or more
    if is_digits(token) && token.len() == 4 {
        return true;
    }
    if let Some(prefix) = token.strip_suffix("SM") {
        return !prefix.is_empty()
            && prefix
                .chars()
                .all(|c| c.is_ascii_digit() || c == '/' || c == 'M' || c == '.');
    }
    false
}

fn parse_cloud_group(token: &str) -> Option<CloudLayer> {
    let (cover, rest) = if let Some(rest) = token.strip_prefix("FEW") {
        (CloudCover::Few, rest)
    } else if let Some(rest) = token.strip_prefix("SCT") {
        (CloudCover::Scattered, rest)
    } else if let Some(rest) = token.strip_prefix("BKN") {
        (CloudCover::Broken, rest)
    } else if let Some(rest) = token.strip_prefix("OVC") {
        (CloudCover::Overcast, rest)
    } else if let Some(rest) = token.strip_prefix("VV") {
        (CloudCover::VerticalVisibility, rest)
    } else {
        return None;
    };

    let base = rest.get(..3)?;
    if base == "///" {
        return Some(CloudLayer {
            cover,
            base_ft: None,
        });
    }
    if !is_digits(base) {
        return None;
    }
    let hundreds: f64 = base.parse().ok()?;
    Some(CloudLayer {
        cover,
        base_ft: Some(hundreds * 100.0),
    })
}

fn parse_temperature_group(token: &str) -> Option<(Option<f64>, Option<f64>)> {
    let (temperature_part, dew_point_part) = token.split_once('/')?;
    let temperature = parse_signed_whole(temperature_part);
    let dew_point = parse_signed_whole(dew_point_part);
    if temperature.is_none() && dew_point.is_none() {
        return None;
    }
    Some((temperature, dew_point))
}

fn parse_signed_whole(part: &str) -> Option<f64> {
    if part.is_empty() || part.chars().all(|c| c == '/') {
        return None;
    }
    let (negative, digits) = match part.strip_prefix('M') {
        Some(rest) => (true, rest),
        None => (false, part),
    };
    if digits.len() != 2 || !is_digits(digits) {
        return None;
    }
    let value: f64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

fn parse_altimeter_group(token: &str) -> Option<f64> {
    if let Some(digits) = token.strip_prefix('A') {
        if digits.len() == 4 && is_digits(digits) {
            return Some(digits.parse::<f64>().ok()? / 100.0);
        }
    }
    if let Some(digits) = token.strip_prefix('Q') {
        if digits.len() == 4 && is_digits(digits) {
            return Some(digits.parse::<f64>().ok()? * HPA_TO_IN_HG);
        }
    }
    None
}

fn parse_tenths_group(token: &str) -> Option<(Option<f64>, Option<f64>)> {
    let digits = token.strip_prefix('T')?;
    if digits.len() != 8 || !is_digits(digits) {
        return None;
    }
    Some((tenths_value(&digits[0..4]), tenths_value(&digits[4..8])))
}

fn tenths_value(part: &str) -> Option<f64> {
    let sign = match &part[..1] {
        "0" => 1.0,
        "1" => -1.0,
        _ => return None,
    };
    let tenths: f64 = part[1..].parse().ok()?;
    Some(sign * tenths / 10.0)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
