//! When scheduled tasks fire.

use chrono::{
    DateTime, Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::errors::SetupError;

const MAX_MINUTES: u32 = 24 * 60;
const MAX_DAY_OF_MONTH: u32 = 28;

/// Firing rule of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Every `n` minutes, `n` in `1..=1440`.
    Minutes(u32),
    /// Once a day at a local time of day.
    Daily {
        /// Local firing time.
        time_of_day: NaiveTime,
    },
    /// Once a month at a local time of day.
    Monthly {
        /// Local firing time.
        time_of_day: NaiveTime,
        /// Day of month, `1..=28` so that every month has it.
        day_of_month: u32,
    },
}

impl Schedule {
    /// Fires every `minutes` minutes.
    ///
    /// # Errors
    ///
    /// Fails when `minutes` is outside `1..=1440`.
    pub fn minutes(minutes: u32) -> Result<Self, SetupError> {
        SetupError::ensure_range(
            "task interval in minutes",
            i64::from(minutes),
            1,
            i64::from(MAX_MINUTES),
        )?;
        Ok(Self::Minutes(minutes))
    }

    /// Fires daily at `time_of_day` (`HH:MM`).
    ///
    /// # Errors
    ///
    /// Fails when the time is not formatted `HH:MM`.
    pub fn daily(time_of_day: &str) -> Result<Self, SetupError> {
        Ok(Self::Daily {
            time_of_day: parse_time_of_day(time_of_day)?,
        })
    }

    /// Fires monthly on `day_of_month` at `time_of_day` (`HH:MM`).
    ///
    /// # Errors
    ///
    /// Fails when the time is not formatted `HH:MM` or the day is outside
    /// `1..=28`.
    pub fn monthly(time_of_day: &str, day_of_month: u32) -> Result<Self, SetupError> {
        let time_of_day = parse_time_of_day(time_of_day)?;
        if !(1..=MAX_DAY_OF_MONTH).contains(&day_of_month) {
            return Err(SetupError::DayOfMonth { day: day_of_month });
        }
        Ok(Self::Monthly {
            time_of_day,
            day_of_month,
        })
    }

    /// First firing instant strictly after `now`.
    ///
    /// Local times that do not exist in `zone` (a daylight saving gap) move
    /// forward one hour; ambiguous ones resolve to the earlier instant.
    #[must_use]
    pub fn next_fire(&self, now: DateTime<Utc>, zone: Tz) -> DateTime<Utc> {
        let local = now.with_timezone(&zone).date_naive();
        let fallback = now + TimeDelta::days(1);
        match *self {
            Self::Minutes(minutes) => now + TimeDelta::minutes(i64::from(minutes)),
            Self::Daily { time_of_day } => local
                .iter_days()
                .take(3)
                .map(|date| resolve(date.and_time(time_of_day), zone))
                .find(|candidate| *candidate > now)
                .unwrap_or(fallback),
            Self::Monthly {
                time_of_day,
                day_of_month,
            } => NaiveDate::from_ymd_opt(local.year(), local.month(), day_of_month)
                .into_iter()
                .flat_map(|first| {
                    (0..3).filter_map(move |offset| first.checked_add_months(Months::new(offset)))
                })
                .map(|date| resolve(date.and_time(time_of_day), zone))
                .find(|candidate| *candidate > now)
                .unwrap_or(fallback),
        }
    }

    /// Human readable interval, e.g. `Every day at 23:57[UTC]`.
    #[must_use]
    pub fn describe(&self, zone: Tz) -> String {
        match *self {
            Self::Minutes(1) => "Every minute".to_owned(),
            Self::Minutes(minutes) => format!("Every {minutes} minutes"),
            Self::Daily { time_of_day } => {
                format!("Every day at {}[{}]", time_of_day.format("%H:%M"), zone.name())
            }
            Self::Monthly {
                time_of_day,
                day_of_month,
            } => format!(
                "Once a month at {} on day of month {day_of_month} in time zone {}",
                time_of_day.format("%H:%M"),
                zone.name()
            ),
        }
    }
}

/// Parses a time zone identifier such as `Europe/Stockholm`.
pub(super) fn parse_zone(zone: &str) -> Result<Tz, SetupError> {
    zone.parse::<Tz>().map_err(|_| SetupError::TimeZone {
        zone: zone.to_owned(),
    })
}

fn parse_time_of_day(value: &str) -> Result<NaiveTime, SetupError> {
    let well_formed = value.len() == 5 && value.as_bytes().get(2) == Some(&b':');
    well_formed
        .then(|| NaiveTime::parse_from_str(value, "%H:%M").ok())
        .flatten()
        .ok_or_else(|| SetupError::TaskTime {
            value: value.to_owned(),
        })
}

fn resolve(local: NaiveDateTime, zone: Tz) -> DateTime<Utc> {
    zone.from_local_datetime(&local)
        .earliest()
        .or_else(|| zone.from_local_datetime(&(local + TimeDelta::hours(1))).earliest())
        .map_or_else(|| Utc.from_utc_datetime(&local), |fire| fire.with_timezone(&Utc))
}
