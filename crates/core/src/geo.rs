//! Coordinate parsing and great-circle distance.
//!
//! Numeric validation deliberately accepts exactly two numeral shapes
//! (plain decimal, single-digit exponential like `3e+05`) instead of
//! deferring to the general float parser. Anything else fails closed:
//! the value is rejected rather than guessed at.

use regex::Regex;
use std::sync::LazyLock;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

static PLAIN_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?([0-9]*[.])?[0-9]+$").expect("valid regex"));

static EXPONENTIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]e\+[0-9]{2}$").expect("valid regex"));

/// A geographic coordinate pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Validate and parse a single numeric component.
///
/// Returns None unless the input matches one of the two accepted
/// numeral shapes.
pub fn valid_number(raw: &str) -> Option<f64> {
    if PLAIN_DECIMAL.is_match(raw) || EXPONENTIAL.is_match(raw) {
        raw.parse().ok()
    } else {
        None
    }
}

/// Parse a `"lat,long"` center string into a coordinate.
///
/// The input must be exactly two comma-separated components; each is
/// trimmed and validated with [`valid_number`]. Malformed input yields
/// None, never an error.
pub fn parse_center(raw: &str) -> Option<Coordinate> {
    let mut parts = raw.split(',');
    let lat = valid_number(parts.next()?.trim())?;
    let lon = valid_number(parts.next()?.trim())?;
    if parts.next().is_some() {
        return None;
    }
    Some(Coordinate { lat, lon })
}

/// Great-circle distance between two coordinates in meters (haversine).
pub fn distance_m(origin: Coordinate, dest: Coordinate) -> f64 {
    let dlat = (dest.lat - origin.lat).to_radians();
    let dlon = (dest.lon - origin.lon).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + origin.lat.to_radians().cos() * dest.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_number_accepts_plain_decimals() {
        assert_eq!(valid_number("40.1"), Some(40.1));
        assert_eq!(valid_number("-105"), Some(-105.0));
        assert_eq!(valid_number(".5"), Some(0.5));
        assert_eq!(valid_number("0"), Some(0.0));
    }

    #[test]
    fn valid_number_accepts_single_digit_exponentials() {
        assert_eq!(valid_number("3e+05"), Some(300_000.0));
        assert_eq!(valid_number("-9e+02"), Some(-900.0));
    }

    #[test]
    fn valid_number_rejects_everything_else() {
        assert_eq!(valid_number("abc"), None);
        assert_eq!(valid_number("1.2.3"), None);
        assert_eq!(valid_number("3e+5"), None); // needs two exponent digits
        assert_eq!(valid_number("12e+05"), None); // needs single mantissa digit
        assert_eq!(valid_number("1e10"), None);
        assert_eq!(valid_number(""), None);
        assert_eq!(valid_number("NaN"), None);
    }

    #[test]
    fn parse_center_happy_path() {
        assert_eq!(
            parse_center("40.1,-105.2"),
            Some(Coordinate { lat: 40.1, lon: -105.2 })
        );
        // Whitespace around components is trimmed.
        assert_eq!(
            parse_center(" 40.1 , -105.2 "),
            Some(Coordinate { lat: 40.1, lon: -105.2 })
        );
    }

    #[test]
    fn parse_center_rejects_malformed_input() {
        assert_eq!(parse_center("abc,123"), None);
        assert_eq!(parse_center("1,2,3"), None);
        assert_eq!(parse_center("40.1"), None);
        assert_eq!(parse_center(""), None);
    }

    #[test]
    fn distance_is_symmetric_and_zero_at_identity() {
        let a = Coordinate { lat: 39.7392, lon: -104.9903 };
        let b = Coordinate { lat: 40.0150, lon: -105.2705 };

        assert_eq!(distance_m(a, a), 0.0);
        assert!((distance_m(a, b) - distance_m(b, a)).abs() < 1e-9);
    }

    #[test]
    fn distance_denver_to_boulder_is_plausible() {
        let denver = Coordinate { lat: 39.7392, lon: -104.9903 };
        let boulder = Coordinate { lat: 40.0150, lon: -105.2705 };

        let km = distance_m(denver, boulder) / 1000.0;
        assert!((35.0..43.0).contains(&km), "got {km} km");
    }
}
