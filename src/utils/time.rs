//! Time zone and timestamp utilities
//!
//! Every timestamp written by the engine and every nightly rotation is
//! computed against an explicit [`Zone`] value instead of mutable global
//! state.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Days, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::sink::SinkError;

/// Pattern used for event timestamps (`yyyy-mm-dd hh:mm:ss`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Pattern used for the date suffix of rolled file names
pub const FILE_DATE_FORMAT: &str = "_%Y-%m-%d";

/// The time zone used for timestamps and midnight boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// Coordinated Universal Time
    #[default]
    Utc,
    /// The operating system's local zone (daylight saving aware)
    Local,
    /// A fixed offset from UTC
    Fixed(FixedOffset),
    /// A zone from the IANA database, e.g. `America/Los_Angeles`
    Named(Tz),
}

impl Zone {
    /// Current instant expressed in this zone
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.convert(Utc::now())
    }

    /// Express a UTC instant in this zone
    pub fn convert(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Zone::Utc => instant.fixed_offset(),
            Zone::Local => instant.with_timezone(&Local).fixed_offset(),
            Zone::Fixed(offset) => instant.with_timezone(offset),
            Zone::Named(tz) => instant.with_timezone(tz).fixed_offset(),
        }
    }

    /// Calendar date of `instant` in this zone
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.convert(instant).date_naive()
    }

    /// Time left from `instant` until the next midnight in this zone
    ///
    /// The first interval after startup is usually shorter than a day; later
    /// ones are about 24h but follow daylight saving shifts in `Local` and
    /// named zones.
    pub fn until_next_midnight(&self, instant: DateTime<Utc>) -> Duration {
        let tomorrow = self
            .date_of(instant)
            .checked_add_days(Days::new(1))
            .and_then(|date| date.and_hms_opt(0, 0, 0));

        let next = tomorrow.and_then(|midnight| self.resolve(midnight));

        match next {
            Some(next) => (next - instant).to_std().unwrap_or(Duration::ZERO),
            // Midnight does not exist in this zone today; fall back to a full day
            None => Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Map a wall-clock time in this zone back to a UTC instant
    fn resolve(&self, wall: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Zone::Utc => Some(Utc.from_utc_datetime(&wall)),
            Zone::Local => Local
                .from_local_datetime(&wall)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            Zone::Fixed(offset) => offset
                .from_local_datetime(&wall)
                .single()
                .map(|dt| dt.with_timezone(&Utc)),
            Zone::Named(tz) => tz
                .from_local_datetime(&wall)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Utc => write!(f, "UTC"),
            Zone::Local => write!(f, "local"),
            Zone::Fixed(offset) => write!(f, "{}", offset),
            Zone::Named(tz) => f.write_str(tz.name()),
        }
    }
}

impl FromStr for Zone {
    type Err = SinkError;

    /// Accepts `UTC`, `local`, an offset such as `+05:30`, `-0800`, `+02`,
    /// or an IANA zone name such as `Europe/Berlin`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "utc" | "z" => return Ok(Zone::Utc),
            "local" => return Ok(Zone::Local),
            _ => {}
        }

        if let Some(offset) = parse_offset(trimmed) {
            return Ok(Zone::Fixed(offset));
        }

        trimmed
            .parse::<Tz>()
            .ok()
            .map(Zone::Named)
            .ok_or_else(|| SinkError::Config(format!("unrecognized time zone: {:?}", s)))
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };

    if minutes >= 60 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Format an instant with the event timestamp pattern
pub fn format_timestamp(instant: &DateTime<FixedOffset>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Date suffix inserted into rolled file names, e.g. `_2024-01-02`
pub fn file_date_suffix(date: NaiveDate) -> String {
    date.format(FILE_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_parse_zones() {
        assert_eq!("UTC".parse::<Zone>().unwrap(), Zone::Utc);
        assert_eq!("Local".parse::<Zone>().unwrap(), Zone::Local);
        assert_eq!(
            "+05:30".parse::<Zone>().unwrap(),
            Zone::Fixed(FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap())
        );
        assert_eq!(
            "-0800".parse::<Zone>().unwrap(),
            Zone::Fixed(FixedOffset::west_opt(8 * 3600).unwrap())
        );
        assert_eq!(
            "+02".parse::<Zone>().unwrap(),
            Zone::Fixed(FixedOffset::east_opt(2 * 3600).unwrap())
        );
        assert_eq!(
            "America/Los_Angeles".parse::<Zone>().unwrap(),
            Zone::Named(Tz::America__Los_Angeles)
        );
        assert!("America/Nowhere".parse::<Zone>().is_err());
        assert!("+0575".parse::<Zone>().is_err());
    }

    #[test]
    fn test_format_timestamp() {
        let instant = utc(2024, 1, 2, 3, 4, 5);
        assert_eq!(
            format_timestamp(&Zone::Utc.convert(instant)),
            "2024-01-02 03:04:05"
        );

        let pacific = Zone::Fixed(FixedOffset::west_opt(8 * 3600).unwrap());
        assert_eq!(
            format_timestamp(&pacific.convert(instant)),
            "2024-01-01 19:04:05"
        );
    }

    #[test]
    fn test_file_date_suffix() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(file_date_suffix(date), "_2024-01-02");
    }

    #[test]
    fn test_until_next_midnight_partial_day() {
        let instant = utc(2024, 1, 2, 18, 0, 0);
        assert_eq!(
            Zone::Utc.until_next_midnight(instant),
            Duration::from_secs(6 * 3600)
        );
    }

    #[test]
    fn test_until_next_midnight_at_midnight_is_full_day() {
        let instant = utc(2024, 1, 2, 0, 0, 0);
        assert_eq!(
            Zone::Utc.until_next_midnight(instant),
            Duration::from_secs(24 * 3600)
        );
    }

    #[test]
    fn test_until_next_midnight_respects_offset() {
        // 18:00 UTC is 10:00 at UTC-8, so local midnight is 14h away
        let instant = utc(2024, 1, 2, 18, 0, 0);
        let pacific = Zone::Fixed(FixedOffset::west_opt(8 * 3600).unwrap());
        assert_eq!(
            pacific.until_next_midnight(instant),
            Duration::from_secs(14 * 3600)
        );
        assert_eq!(
            pacific.date_of(instant),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_named_zone_display_round_trips() {
        let zone: Zone = "Europe/Berlin".parse().unwrap();
        assert_eq!(zone.to_string(), "Europe/Berlin");
        assert_eq!(zone.to_string().parse::<Zone>().unwrap(), zone);
    }

    #[test]
    fn test_named_zone_follows_daylight_saving_date() {
        // 07:30 UTC on July 1st is 00:30 PDT, but still June 30th at a fixed -08:00
        let instant = utc(2024, 7, 1, 7, 30, 0);
        let los_angeles = Zone::Named(Tz::America__Los_Angeles);
        let fixed = Zone::Fixed(FixedOffset::west_opt(8 * 3600).unwrap());

        assert_eq!(los_angeles.date_of(instant), NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(fixed.date_of(instant), NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
    }

    #[test]
    fn test_until_next_midnight_spans_daylight_saving_transitions() {
        let los_angeles = Zone::Named(Tz::America__Los_Angeles);

        // Midnight PST on 2024-03-10; clocks spring forward at 02:00 that night
        let spring = utc(2024, 3, 10, 8, 0, 0);
        assert_eq!(
            los_angeles.until_next_midnight(spring),
            Duration::from_secs(23 * 3600)
        );

        // Midnight PDT on 2024-11-03; clocks fall back at 02:00 that night
        let autumn = utc(2024, 11, 3, 7, 0, 0);
        assert_eq!(
            los_angeles.until_next_midnight(autumn),
            Duration::from_secs(25 * 3600)
        );
    }
}
