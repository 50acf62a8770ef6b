use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use ink_core::Currency;
use ink_core::calculations::round_for_display;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a string cannot be read as a date and time.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid date '{input}': expected RFC 3339, 'YYYY-MM-DD HH:MM' or 'YYYY-MM-DD'")]
pub struct ParseDateError {
    input: String,
}

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parses a date the user typed, reading zone-less input as wall-clock time
/// in `tz`.
///
/// A bare date means midnight. Times that fall in a DST gap are rejected;
/// ambiguous times take the earlier instant.
pub fn parse_datetime_in<Tz: TimeZone>(
    s: &str,
    tz: &Tz,
) -> Result<DateTime<Utc>, ParseDateError> {
    let input = s.trim();
    let fail = || {
        tracing::error!(input = %s, "invalid date");
        ParseDateError {
            input: s.to_string(),
        }
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(fail)?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(fail)
}

/// [`parse_datetime_in`] against the machine's local zone.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ParseDateError> {
    parse_datetime_in(s, &Local)
}

pub fn format_local(date: DateTime<Utc>) -> String {
    date.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Formats an amount for display: currency glyph, two decimal places.
pub fn format_money(
    amount: Decimal,
    currency: Currency,
) -> String {
    format!("{}{:.2}", currency.glyph(), round_for_display(amount))
}

/// Formats an optional string for display, using "-" when `None`.
pub fn opt_display(s: Option<&str>) -> &str {
    s.unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parse_datetime_accepts_rfc3339_with_offset() {
        let parsed = parse_datetime_in("2026-03-14T15:00:00+01:00", &Utc).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 14, 14, 0, 0).unwrap());
    }

    #[test]
    fn parse_datetime_reads_naive_input_in_the_given_zone() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();

        let parsed = parse_datetime_in("2026-03-14 15:00", &plus_two).unwrap();

        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 14, 13, 0, 0).unwrap());
    }

    #[test]
    fn parse_datetime_bare_date_is_midnight() {
        let parsed = parse_datetime_in(" 2026-03-14 ", &Utc).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap());
    }

    #[test]
    fn parse_datetime_rejects_garbage() {
        assert!(parse_datetime_in("next tuesday", &Utc).is_err());
        assert!(parse_datetime_in("2026-02-30", &Utc).is_err());
        assert!(parse_datetime_in("", &Utc).is_err());
    }

    #[test]
    fn format_money_rounds_to_two_places() {
        assert_eq!(format_money(dec!(540), Currency::Sterling), "£540.00");
        assert_eq!(format_money(dec!(12.345), Currency::Euro), "€12.35");
        assert_eq!(format_money(Decimal::ZERO, Currency::Dollar), "$0.00");
    }

    #[test]
    fn opt_display_uses_dash_for_none() {
        assert_eq!(opt_display(None), "-");
        assert_eq!(opt_display(Some("@ami")), "@ami");
    }
}
