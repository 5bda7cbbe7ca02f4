//! Derived apparent-temperature quantities.
//!
//! The formulas are unmasked; the table annotation step computes first and
//! nulls the result outside each index's validity band afterwards.

/// Heat index is only reported from this 2m temperature upwards.
pub const HEAT_INDEX_MIN_TEMP_F: f64 = 80.0;

/// Wind chill is only reported up to this 2m temperature...
pub const WIND_CHILL_MAX_TEMP_F: f64 = 50.0;

/// ...and above this wind speed.
pub const WIND_CHILL_MIN_WIND_KT: f64 = 5.0;

/// Miles per hour per knot; the wind-chill regression expects mph.
const KT_TO_MPH: f64 = 1.150_779_4;

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Relative humidity in percent from 2m temperature and dew point (both F),
/// via the Magnus vapor-pressure ratio, clamped to 0..=100.
pub fn relative_humidity_pct(temperature_f: f64, dew_point_f: f64) -> f64 {
    let temperature = fahrenheit_to_celsius(temperature_f);
    let dew_point = fahrenheit_to_celsius(dew_point_f);
    let vapor = |c: f64| (17.625 * c / (243.04 + c)).exp();
    (100.0 * vapor(dew_point) / vapor(temperature)).clamp(0.0, 100.0)
}

/// Rothfusz heat-index regression over 2m temperature (F) and dew point (F),
/// including the NWS low- and high-humidity adjustment terms.
pub fn heat_index_f(temperature_f: f64, dew_point_f: f64) -> f64 {
    let t = temperature_f;
    let rh = relative_humidity_pct(temperature_f, dew_point_f);

    let mut heat_index = -42.379 + 2.049_015_23 * t + 10.143_331_27 * rh
        - 0.224_755_41 * t * rh
        - 6.837_83e-3 * t * t
        - 5.481_717e-2 * rh * rh
        + 1.228_74e-3 * t * t * rh
        + 8.528_2e-4 * t * rh * rh
        - 1.99e-6 * t * t * rh * rh;

    if rh < 13.0 && (80.0..=112.0).contains(&t) {
        let spread = ((17.0 - (t - 95.0).abs()) / 17.0).max(0.0);
        heat_index -= (13.0 - rh) / 4.0 * spread.sqrt();
    } else if rh > 85.0 && (80.0..=87.0).contains(&t) {
        heat_index += (rh - 85.0) / 10.0 * ((87.0 - t) / 5.0);
    }
    heat_index
}

/// NWS wind-chill regression over 2m temperature (F) and wind speed (kt).
pub fn wind_chill_f(temperature_f: f64, wind_speed_kt: f64) -> f64 {
    let wind = (wind_speed_kt * KT_TO_MPH).powf(0.16);
    35.74 + 0.6215 * temperature_f - 35.75 * wind + 0.4275 * temperature_f * wind
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fahrenheit_round_trips_through_celsius() {
        for value in [-40.0, 0.0, 32.0, 71.6, 100.0] {
            let round_tripped = celsius_to_fahrenheit(fahrenheit_to_celsius(value));
            assert!((round_tripped - value).abs() < 1e-9);
        }
    }

    #[test]
    fn minus_forty_is_its_own_conversion() {
        assert!((celsius_to_fahrenheit(-40.0) + 40.0).abs() < 1e-9);
    }

    #[test]
    fn saturated_air_is_full_humidity() {
        assert!((relative_humidity_pct(70.0, 70.0) - 100.0).abs() < 1e-6);
    }

    #[test]
    fn drier_air_is_less_humid() {
        let humid = relative_humidity_pct(85.0, 75.0);
        let dry = relative_humidity_pct(85.0, 55.0);
        assert!(humid > dry);
        assert!(dry > 0.0);
    }

    #[test]
    fn heat_index_is_finite_and_exceeds_air_temperature_when_muggy() {
        let heat_index = heat_index_f(85.0, 70.0);
        assert!(heat_index.is_finite());
        assert!(heat_index > 85.0);
    }

    #[test]
    fn heat_index_is_finite_below_the_mask_threshold() {
        // masking is the caller's job; the regression itself still evaluates
        assert!(heat_index_f(70.0, 60.0).is_finite());
    }

    #[test]
    fn wind_chill_is_below_air_temperature() {
        let wind_chill = wind_chill_f(40.0, 10.0);
        assert!(wind_chill.is_finite());
        assert!(wind_chill < 40.0);
    }

    #[test]
    fn wind_chill_evaluates_even_for_calm_air() {
        assert!(wind_chill_f(40.0, 0.0).is_finite());
    }
}
