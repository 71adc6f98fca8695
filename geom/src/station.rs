//! Engineering station text: `1234` feet from the reference point is written `12+34`.

use anyhow::Result;

use crate::round_to;

/// Formats a distance as station text, dropping any fractional feet.
pub fn float_to_station(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let digits = (value.abs().trunc() as u64).to_string();
    match digits.len() {
        1 => format!("{}00+0{}", sign, digits),
        2 => format!("{}00+{}", sign, digits),
        n => format!("{}{}+{}", sign, &digits[..n - 2], &digits[n - 2..]),
    }
}

/// Parses station text like `12+34` or `1,012+34.5`. Fractional stations keep 2 decimals; whole
/// stations are rounded to the foot.
pub fn stationing_to_float(station: &str) -> Result<f64> {
    let num: String = station
        .trim()
        .chars()
        .filter(|c| *c != '+' && *c != ',')
        .collect();
    let value: f64 = match num.parse() {
        Ok(x) => x,
        Err(_) => bail!("{} isn't a station", station),
    };
    if num.contains('.') {
        Ok(round_to(value, 2))
    } else {
        Ok(value.round())
    }
}

/// Rounds down to the nearest multiple of `step`.
pub fn round_down(x: f64, step: f64) -> f64 {
    (x / step).floor() * step
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn station_text() {
        for (input, expected) in [
            (0.0, "00+00"),
            (5.0, "00+05"),
            (50.0, "00+50"),
            (1234.0, "12+34"),
            (1234.99, "12+34"),
            (101_200.0, "1012+00"),
            (-75.0, "-00+75"),
        ] {
            assert_eq!(float_to_station(input), expected);
        }
    }

    #[test]
    fn parse_station_text() {
        for (input, expected) in [
            ("12+34", 1234.0),
            ("00+05", 5.0),
            ("1,012+34.567", 101234.57),
            (" 3+00 ", 300.0),
        ] {
            assert_eq!(stationing_to_float(input).unwrap(), expected);
        }
        assert!(stationing_to_float("twelve").is_err());
    }

    #[test]
    fn rounding_down() {
        for (input, step, expected) in [
            (0.0, 50.0, 0.0),
            (49.9, 50.0, 0.0),
            (1234.5, 50.0, 1200.0),
            (150.0, 50.0, 150.0),
        ] {
            assert_eq!(round_down(input, step), expected);
        }
    }
}
