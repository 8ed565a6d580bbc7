//! Decimal degree and sexagesimal conversions.
//!
//! Angles are split into degrees (or hours), minutes and seconds on their
//! magnitude; the sign is carried separately so that southern declinations
//! such as -0.5 render as `-00:30:00` instead of losing the sign in the
//! degrees field.

use serde::Serialize;

pub const ARCSEC_PER_DEGREE: f64 = 3600.0;
pub const DEGREES_PER_HOUR: f64 = 15.0;

/// A sexagesimal angle: `[-]degrees:minutes:seconds`.
///
/// When built from an RA divided by 15 the `degrees` field holds hours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dms {
    pub negative: bool,
    pub degrees: i32,
    pub minutes: i32,
    pub seconds: f64,
}

impl Dms {
    /// `[-]DD:MM:SS` with whole seconds truncated toward zero.
    pub fn to_sexagesimal_string(&self) -> String {
        format!(
            "{}{:02}:{:02}:{:02}",
            if self.negative { "-" } else { "" },
            self.degrees,
            self.minutes,
            self.seconds.trunc() as i32
        )
    }
}

/// Split decimal degrees into degrees, minutes and seconds.
///
/// Never fails. NaN or infinite input produces a meaningless but well-formed
/// value (integer fields saturate).
pub fn decimal_degrees_to_dms(dd: f64) -> Dms {
    let total_arcsec = dd.abs() * ARCSEC_PER_DEGREE;
    let seconds = total_arcsec % 60.0;
    let total_minutes = ((total_arcsec - seconds) / 60.0).round();
    let minutes = total_minutes % 60.0;
    let degrees = (total_minutes - minutes) / 60.0;

    Dms {
        negative: dd.is_sign_negative() && total_arcsec > 0.0,
        degrees: degrees.trunc() as i32,
        minutes: minutes.trunc() as i32,
        seconds,
    }
}

pub fn dms_to_decimal_degrees(dms: &Dms) -> f64 {
    let magnitude =
        dms.degrees as f64 + dms.minutes as f64 / 60.0 + dms.seconds / ARCSEC_PER_DEGREE;
    if dms.negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Decimal degrees as `[-]DD:MM:SS`.
pub fn format_sexagesimal(dd: f64) -> String {
    decimal_degrees_to_dms(dd).to_sexagesimal_string()
}

/// Right ascension in degrees as `HH:MM:SS`.
pub fn format_sexagesimal_hours(ra_deg: f64) -> String {
    format_sexagesimal(ra_deg / DEGREES_PER_HOUR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_degrees() {
        let dms = decimal_degrees_to_dms(10.0);
        assert!(!dms.negative);
        assert_eq!(dms.degrees, 10);
        assert_eq!(dms.minutes, 0);
        assert!(dms.seconds.abs() < 1e-9);
    }

    #[test]
    fn test_fractional_degrees() {
        // 83.8221 deg = 83 deg 49 min 19.56 sec
        let dms = decimal_degrees_to_dms(83.8221);
        assert_eq!(dms.degrees, 83);
        assert_eq!(dms.minutes, 49);
        assert!((dms.seconds - 19.56).abs() < 1e-6);
    }

    #[test]
    fn test_negative_declination_keeps_sign() {
        let dms = decimal_degrees_to_dms(-0.5);
        assert!(dms.negative);
        assert_eq!(dms.degrees, 0);
        assert_eq!(dms.minutes, 30);
        assert_eq!(dms.to_sexagesimal_string(), "-00:30:00");

        assert_eq!(format_sexagesimal(-5.391), "-05:23:27");
    }

    #[test]
    fn test_zero_is_not_negative() {
        assert!(!decimal_degrees_to_dms(-0.0).negative);
        assert_eq!(format_sexagesimal(0.0), "00:00:00");
    }

    #[test]
    fn test_round_trip_within_one_arcsecond() {
        for value in [0.0, 0.000_1, 1.5, 20.000_3, 45.123_456, 89.999_9, 180.0, 359.987_65] {
            let back = dms_to_decimal_degrees(&decimal_degrees_to_dms(value));
            assert!(
                (back - value).abs() <= 1.0 / ARCSEC_PER_DEGREE,
                "{} came back as {}",
                value,
                back
            );
        }
    }

    #[test]
    fn test_negative_round_trip() {
        let back = dms_to_decimal_degrees(&decimal_degrees_to_dms(-12.3456));
        assert!((back + 12.3456).abs() < 1e-9);
    }

    #[test]
    fn test_hours_form() {
        // 150 deg = 10h exactly
        assert_eq!(format_sexagesimal_hours(150.0), "10:00:00");
        // 83.8221 deg = 5h 35m 17.3s
        assert_eq!(format_sexagesimal_hours(83.8221), "05:35:17");
    }

    #[test]
    fn test_seconds_truncated_not_rounded() {
        // 10.0005 deg = 10 deg 0 min 1.8 sec
        assert_eq!(format_sexagesimal(10.0005), "10:00:01");
    }

    #[test]
    fn test_nan_does_not_panic() {
        let dms = decimal_degrees_to_dms(f64::NAN);
        let _ = dms.to_sexagesimal_string();
    }
}
