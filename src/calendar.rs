//! Exhibition-week arithmetic in the theater's local timezone.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{Error, Result};

/// Timezone plus the date considered "today" for one scrape run.
///
/// Every date computation receives one of these explicitly, so tests can pin
/// both the clock and the zone.
#[derive(Debug, Clone, Copy)]
pub struct Calendar {
    tz: Tz,
    today: NaiveDate,
}

impl Calendar {
    pub fn now(tz: Tz) -> Self {
        let today = Utc::now().with_timezone(&tz).date_naive();
        Self { tz, today }
    }

    pub fn fixed(tz: Tz, today: NaiveDate) -> Self {
        Self { tz, today }
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn now_playing_week(&self) -> NowPlayingWeek {
        NowPlayingWeek::containing(self.today)
    }

    /// Start of `today` in the theater's zone.
    pub fn start_of_today(&self) -> Result<DateTime<FixedOffset>> {
        self.at(self.today, NaiveTime::MIN)
    }

    /// Localizes a wall-clock reading. Readings that fall in a DST gap take
    /// the earliest valid instant.
    pub fn at(&self, date: NaiveDate, time: NaiveTime) -> Result<DateTime<FixedOffset>> {
        let local = date.and_time(time);
        self.tz
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.fixed_offset())
            .ok_or_else(|| Error::value("local time", local.to_string()))
    }
}

/// Days from `from` until the next occurrence of `weekday`, in 1..=7.
pub fn days_until_next_weekday(from: NaiveDate, weekday: Weekday) -> u32 {
    let now = from.weekday().num_days_from_sunday();
    let target = weekday.num_days_from_sunday();
    if now < target {
        target - now
    } else {
        target + 7 - now
    }
}

/// Like [`days_until_next_weekday`] but a full week wraps to 0, so the
/// result is a valid index into the week that starts at `from`.
pub fn days_into_week(from: NaiveDate, weekday: Weekday) -> usize {
    (days_until_next_weekday(from, weekday) % 7) as usize
}

/// The Thursday-to-Wednesday exhibition week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NowPlayingWeek {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl NowPlayingWeek {
    /// The week containing `date`. A Wednesday is the last day of its week,
    /// a Thursday the first day of the next.
    pub fn containing(date: NaiveDate) -> Self {
        let weekday = date.weekday().num_days_from_sunday();
        let until_wednesday = if weekday < 4 { 3 - weekday } else { 10 - weekday };
        let end = date + Days::new(u64::from(until_wednesday));
        let start = end - Days::new(6);
        Self { start, end }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..7u64).map(|d| self.start + Days::new(d))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Date inside this week that falls on `weekday`.
    pub fn date_of(&self, weekday: Weekday) -> NaiveDate {
        self.start + Days::new(days_into_week(self.start, weekday) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_spans_thursday_to_wednesday() {
        let mut day = date(2019, 1, 1);
        for _ in 0..400 {
            let week = NowPlayingWeek::containing(day);
            assert_eq!(week.start.weekday(), Weekday::Thu);
            assert_eq!(week.end.weekday(), Weekday::Wed);
            assert_eq!((week.end - week.start).num_days(), 6);
            assert_eq!(week.days().count(), 7);
            assert!(week.contains(day));
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_consecutive_days_share_week_unless_crossing_wednesday() {
        let mut day = date(2019, 12, 20);
        for _ in 0..60 {
            let next = day.succ_opt().unwrap();
            let same = NowPlayingWeek::containing(day) == NowPlayingWeek::containing(next);
            assert_eq!(same, day.weekday() != Weekday::Wed, "day {day}");
            day = next;
        }
    }

    #[test]
    fn test_wednesday_thursday_boundary() {
        let wednesday = NowPlayingWeek::containing(date(2019, 2, 20));
        assert_eq!(wednesday.start, date(2019, 2, 14));
        assert_eq!(wednesday.end, date(2019, 2, 20));

        let thursday = NowPlayingWeek::containing(date(2019, 2, 21));
        assert_eq!(thursday.start, date(2019, 2, 21));
        assert_eq!(thursday.end, date(2019, 2, 27));
    }

    #[test]
    fn test_week_across_new_year() {
        let week = NowPlayingWeek::containing(date(2019, 12, 31));
        assert_eq!(week.start, date(2019, 12, 26));
        assert_eq!(week.end, date(2020, 1, 1));
    }

    #[test]
    fn test_date_of() {
        let week = NowPlayingWeek::containing(date(2019, 2, 14));
        assert_eq!(week.date_of(Weekday::Thu), date(2019, 2, 14));
        assert_eq!(week.date_of(Weekday::Sat), date(2019, 2, 16));
        assert_eq!(week.date_of(Weekday::Wed), date(2019, 2, 20));
    }

    #[test]
    fn test_at_uses_theater_offset() {
        let cal = Calendar::fixed(chrono_tz::America::Sao_Paulo, date(2024, 5, 2));
        let dt = cal.at(date(2024, 5, 2), NaiveTime::from_hms_opt(19, 30, 0).unwrap()).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-05-02T19:30:00-03:00");
    }
}
