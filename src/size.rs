//! Size notation parsing and formatting
//!
//! Sizes are written as `<integer><unit>` where unit is one of
//! `b`, `Ki`, `Mi`, `Gi`, `Ti`. Despite the binary-prefix-looking unit
//! names, multipliers are **decimal** (base 1000): `1Ki` is exactly
//! 1000 bytes. This convention is a compatibility contract with the
//! tooling that consumes these directories and must not be "corrected"
//! to base 1024.

use crate::error::ConfigError;
use regex::Regex;
use std::sync::LazyLock;

/// Supported unit suffixes, in ascending order of magnitude
pub const UNITS: [&str; 5] = ["b", "Ki", "Mi", "Gi", "Ti"];

/// Decimal base for all unit multipliers
const BASE: u64 = 1000;

/// Regex for size strings like "10Mi" or "500 b"
static SIZE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s*([A-Za-z]+)$").expect("Invalid size regex")
});

/// Parse a size string into a byte count
///
/// Accepts formats like `500b`, `10Ki`, `2Mi`, `1Gi`, `1Ti`.
pub fn parse_size(input: &str) -> Result<u64, ConfigError> {
    let input = input.trim();

    let caps = SIZE_REGEX
        .captures(input)
        .ok_or_else(|| ConfigError::InvalidSize {
            input: input.to_string(),
            reason: format!("expected <integer><unit> with unit in [{}]", UNITS.join(",")),
        })?;

    let number: u64 = caps[1].parse().map_err(|e| ConfigError::InvalidSize {
        input: input.to_string(),
        reason: format!("bad integer: {}", e),
    })?;

    let unit = &caps[2];
    let exponent = UNITS
        .iter()
        .position(|u| *u == unit)
        .ok_or_else(|| ConfigError::InvalidSize {
            input: input.to_string(),
            reason: format!("unsupported unit '{}', expected one of [{}]", unit, UNITS.join(",")),
        })?;

    BASE.checked_pow(exponent as u32)
        .and_then(|multiplier| number.checked_mul(multiplier))
        .ok_or_else(|| ConfigError::InvalidSize {
            input: input.to_string(),
            reason: "size overflows u64".to_string(),
        })
}

/// Format a byte count in the same decimal notation
///
/// Values below 1000 render as `N bytes`; larger values divide by 1000
/// until the mantissa fits and render with two decimals, e.g. `1.50 Mi`.
pub fn to_si(bytes: u64) -> String {
    if bytes < BASE {
        return format!("{} bytes", bytes);
    }

    let mut divisor = BASE;
    let mut exponent = 1;
    let mut scaled = bytes / BASE;
    while scaled >= BASE && exponent < UNITS.len() - 1 {
        divisor *= BASE;
        exponent += 1;
        scaled /= BASE;
    }

    format!("{:.2} {}", bytes as f64 / divisor as f64, UNITS[exponent])
}

/// Format a signed byte delta (net growth or shrinkage)
pub fn to_si_signed(bytes: i64) -> String {
    if bytes < 0 {
        format!("-{}", to_si(bytes.unsigned_abs()))
    } else {
        to_si(bytes as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bytes() {
        assert_eq!(parse_size("0b").unwrap(), 0);
        assert_eq!(parse_size("500b").unwrap(), 500);
        assert_eq!(parse_size("  42 b ").unwrap(), 42);
    }

    #[test]
    fn test_parse_decimal_multipliers() {
        // Base-1000 despite the binary-looking names
        assert_eq!(parse_size("1Ki").unwrap(), 1_000);
        assert_eq!(parse_size("2Mi").unwrap(), 2_000_000);
        assert_eq!(parse_size("3Gi").unwrap(), 3_000_000_000);
        assert_eq!(parse_size("1Ti").unwrap(), 1_000_000_000_000);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_size("").is_err());
        assert!(parse_size("10").is_err());
        assert!(parse_size("Ki").is_err());
        assert!(parse_size("10KB").is_err());
        assert!(parse_size("10kib").is_err());
        assert!(parse_size("-5Ki").is_err());
        assert!(parse_size("1.5Mi").is_err());
    }

    #[test]
    fn test_parse_overflow() {
        assert!(parse_size("99999999Ti").is_err());
    }

    #[test]
    fn test_to_si() {
        assert_eq!(to_si(0), "0 bytes");
        assert_eq!(to_si(999), "999 bytes");
        assert_eq!(to_si(1000), "1.00 Ki");
        assert_eq!(to_si(1500), "1.50 Ki");
        assert_eq!(to_si(1_500_000), "1.50 Mi");
        assert_eq!(to_si(2_000_000_000), "2.00 Gi");
    }

    #[test]
    fn test_to_si_signed() {
        assert_eq!(to_si_signed(500), "500 bytes");
        assert_eq!(to_si_signed(-1500), "-1.50 Ki");
    }

    #[test]
    fn test_round_trip_units() {
        for unit in UNITS {
            assert!(parse_size(&format!("7{}", unit)).is_ok());
        }
    }
}
