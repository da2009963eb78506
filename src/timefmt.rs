//! Elapsed-time and clock strings as printed by network devices.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;

static GO_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d*(?:\.\d*)?(?:ns|us|µs|μs|ms|s|m|h))+$").unwrap()
});
static GO_UNIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d*)(?:\.(\d*))?(ns|us|µs|μs|ms|s|m|h)").unwrap()
});

const NANOS_PER_SEC: u128 = 1_000_000_000;
const SECS_PER_DAY: u64 = 86_400;

/// Abbreviations seen in JUNOS / SROS / Linux clock output, as seconds east
/// of UTC.
const TZ_OFFSETS: &[(&str, i64)] = &[
    ("UTC", 0),
    ("GMT", 0),
    ("AST", -14_400),
    ("EST", -18_000),
    ("EDT", -14_400),
    ("CST", -21_600),
    ("CDT", -18_000),
    ("MST", -25_200),
    ("MDT", -21_600),
    ("PST", -28_800),
    ("PDT", -25_200),
    ("AKST", -32_400),
    ("AKDT", -28_800),
    ("HST", -36_000),
    ("HAST", -36_000),
    ("HADT", -32_400),
    ("SST", -39_600),
    ("SDT", -36_000),
    ("CHST", 36_000),
];

/// Parse `300ms`, `1.5h`, `2h45m` and the like, with an optional leading
/// whole-day count (`3d4h`, `2d`).
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    match s.split_once('d') {
        Some((days, rest)) => {
            let days: u64 = days.parse().ok()?;
            let rest = if rest.is_empty() {
                Duration::ZERO
            } else {
                parse_units(rest)?
            };
            Duration::from_secs(days.checked_mul(SECS_PER_DAY)?).checked_add(rest)
        }
        None => parse_units(s),
    }
}

fn parse_units(s: &str) -> Option<Duration> {
    let s = s.strip_prefix('+').unwrap_or(s);
    if s == "0" {
        return Some(Duration::ZERO);
    }
    if !GO_DURATION_RE.is_match(s) {
        return None;
    }

    let mut nanos: u128 = 0;
    for caps in GO_UNIT_RE.captures_iter(s) {
        let whole = caps.get(1).map_or("", |m| m.as_str());
        let frac = caps.get(2).map_or("", |m| m.as_str());
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        let unit = unit_nanos(&caps[3]);
        let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        nanos = nanos.checked_add(whole.checked_mul(unit)?)?;
        nanos = nanos.checked_add(fraction_nanos(frac, unit)?)?;
    }

    u64::try_from(nanos).ok().map(Duration::from_nanos)
}

fn unit_nanos(unit: &str) -> u128 {
    match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        _ => 3_600 * NANOS_PER_SEC,
    }
}

// Digits past the 18th cannot move the result by a whole nanosecond.
fn fraction_nanos(frac: &str, unit: u128) -> Option<u128> {
    let digits = &frac[..frac.len().min(18)];
    if digits.is_empty() {
        return Some(0);
    }
    let value: u128 = digits.parse().ok()?;
    let scale = 10u128.pow(digits.len() as u32);
    Some(value * unit / scale)
}

/// UTC epoch seconds from a device clock line.
///
/// Accepts `2006-01-02 15:04:05 MST` (JUNOS) and `Mon Jan 2 15:04:05 MST 2006`
/// (SROS, Linux `date`). Zone abbreviations missing from the table count as
/// UTC.
pub fn parse_device_timestamp(s: &str) -> Option<i64> {
    let fields: Vec<&str> = s.split_whitespace().collect();
    let (naive, zone) = match fields.as_slice() {
        [date, time, zone] => (
            NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y-%m-%d %H:%M:%S")
                .ok()?,
            *zone,
        ),
        [weekday, month, day, time, zone, year] => (
            NaiveDateTime::parse_from_str(
                &format!("{} {} {} {} {}", weekday, month, day, time, year),
                "%a %b %d %H:%M:%S %Y",
            )
            .ok()?,
            *zone,
        ),
        _ => return None,
    };
    Some(naive.and_utc().timestamp() - zone_offset(zone))
}

fn zone_offset(zone: &str) -> i64 {
    TZ_OFFSETS
        .iter()
        .find(|(name, _)| *name == zone)
        .map_or(0, |(_, offset)| *offset)
}

/// Epoch seconds in `date` layout, always in UTC.
pub fn format_epoch(secs: i64) -> Option<String> {
    let t = DateTime::from_timestamp(secs, 0)?;
    Some(t.format("%a %b %e %H:%M:%S UTC %Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_style_durations() {
        assert_eq!(parse_duration("300ms"), Some(Duration::from_millis(300)));
        assert_eq!(parse_duration("2h45m"), Some(Duration::from_secs(9_900)));
        assert_eq!(parse_duration("1.5h"), Some(Duration::from_secs(5_400)));
        assert_eq!(parse_duration("1m30s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration(".5s"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("10us"), Some(Duration::from_micros(10)));
        assert_eq!(parse_duration("0"), Some(Duration::ZERO));
    }

    #[test]
    fn day_prefix() {
        assert_eq!(parse_duration("1d2h"), Some(Duration::from_secs(26 * 3_600)));
        assert_eq!(parse_duration("2d"), Some(Duration::from_secs(2 * SECS_PER_DAY)));
        assert_eq!(
            parse_duration("3d04h22m"),
            Some(Duration::from_secs(3 * SECS_PER_DAY + 4 * 3_600 + 22 * 60))
        );
    }

    #[test]
    fn invalid_durations() {
        for s in ["", "abc", "5", "1x", ".s", "-1h", "xd1h", "1d1d"] {
            assert_eq!(parse_duration(s), None, "{s:?} should not parse");
        }
    }

    #[test]
    fn junos_timestamp() {
        assert_eq!(parse_device_timestamp("2020-01-01 00:00:00 UTC"), Some(1_577_836_800));
        assert_eq!(parse_device_timestamp("2020-01-01 00:00:00 EST"), Some(1_577_854_800));
        assert_eq!(parse_device_timestamp("2020-01-01 00:00:00 CHST"), Some(1_577_800_800));
    }

    #[test]
    fn unix_date_timestamp() {
        assert_eq!(
            parse_device_timestamp("Wed Jan  1 00:00:00 PST 2020"),
            Some(1_577_836_800 + 28_800)
        );
    }

    #[test]
    fn unknown_zone_is_utc() {
        assert_eq!(parse_device_timestamp("2020-01-01 00:00:00 XYZ"), Some(1_577_836_800));
    }

    #[test]
    fn bad_timestamps() {
        assert_eq!(parse_device_timestamp("yesterday"), None);
        assert_eq!(parse_device_timestamp("2020-13-01 00:00:00 UTC"), None);
    }

    #[test]
    fn epoch_round_trip() {
        let s = format_epoch(1_577_836_800).unwrap();
        assert_eq!(s, "Wed Jan  1 00:00:00 UTC 2020");
        assert_eq!(parse_device_timestamp(&s), Some(1_577_836_800));
    }
}
