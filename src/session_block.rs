//! Per-movie session lists, as published on movie detail pages:
//!
//! ```text
//! <h4>Sala 2 - 3D - Dublado</h4>
//! <ul>
//!   <li><i class="fa fa-clock-o"></i> Horários</li>
//!   <li>Quinta a domingo - 14:00 - 16:30</li>
//!   <li>Segunda, terça e quarta - 19:00</li>
//!   <li>Sábado 16/02 - 21:00</li>
//! </ul>
//! ```

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::{debug, warn};

use crate::calendar::{Calendar, NowPlayingWeek, days_into_week};
use crate::dom::{next_element, text_trimmed};
use crate::error::{Error, Result};
use crate::model::{Auditorium, Format, MovieRef, RawSession, Version};
use crate::schedule::SessionSet;
use crate::text::{date_from_text, month_from_text, parse_clock, parse_day};

lazy_static! {
    static ref ROOM_RE: Regex = Regex::new(r"sala\s*(\d+)").expect("room regex");
    static ref DATE_RE: Regex = Regex::new(r"\d{2}/\d{2}").expect("date regex");
    static ref TIME_RE: Regex = Regex::new(r"\d{1,2}:\d{2}").expect("time regex");
    static ref PREMIERE_RE: Regex =
        Regex::new(r"(\d{1,2}) de ([a-zç]+)").expect("premiere regex");
    static ref LI: Selector = Selector::parse("li").expect("selector");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub room: u32,
    pub version: Version,
    pub format: Format,
}

/// Reads room, version and projection from a block heading. All three are
/// required.
pub fn parse_block_header(text: &str) -> Result<BlockHeader> {
    let lower = text.to_lowercase();

    let room = ROOM_RE
        .captures(&lower)
        .and_then(|c| c[1].parse::<u32>().ok())
        .filter(|r| *r != 0);
    let version = if lower.contains("dublado") {
        Some(Version::Dubbed)
    } else if lower.contains("legendado") {
        Some(Version::Subtitled)
    } else if lower.contains("nacional") {
        Some(Version::National)
    } else {
        None
    };
    let format = if lower.contains("3d") {
        Some(Format::ThreeD)
    } else if lower.contains("2d") {
        Some(Format::TwoD)
    } else {
        None
    };

    match (room, version, format) {
        (Some(room), Some(version), Some(format)) => Ok(BlockHeader {
            room,
            version,
            format,
        }),
        _ => Err(Error::structure(format!("incomplete session heading '{text}'"))),
    }
}

/// One list entry, resolved to concrete days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    pub dates: Vec<NaiveDate>,
    pub except: Option<NaiveDate>,
    pub times: Vec<NaiveTime>,
}

impl SessionEntry {
    pub fn occurrences(&self) -> impl Iterator<Item = (NaiveDate, NaiveTime)> + '_ {
        self.times.iter().flat_map(move |t| {
            self.dates
                .iter()
                .filter(move |d| Some(**d) != self.except)
                .map(move |d| (*d, *t))
        })
    }
}

/// Parses one list entry. Entries without start times yield `None`.
///
/// Day selection, in order: an explicit date, a premiere date written out
/// ("estreia dia 21 de fevereiro"), a weekday range ("quinta a domingo"), a
/// weekday list ("segunda, terça e sábado"), a single weekday, and finally
/// the whole week.
pub fn parse_entry(text: &str, week: &NowPlayingWeek) -> Option<SessionEntry> {
    let text = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let times: Vec<NaiveTime> = TIME_RE
        .find_iter(&text)
        .filter_map(|m| parse_clock(m.as_str(), ':').ok())
        .collect();
    if times.is_empty() {
        warn!(text, "no start times in session entry");
        return None;
    }

    // Dates are sometimes written DD-MM. Times go first so "14:00-16:30"
    // isn't read as a date.
    let without_times = TIME_RE.replace_all(&text, " ").replace('-', "/");
    let date = DATE_RE
        .find(&without_times)
        .and_then(|m| match date_from_text(m.as_str(), '/', week.start.year()) {
            Ok(d) => Some(in_week_year(d, week)),
            Err(e) => {
                warn!(text, error = %e, "bad date in session entry");
                None
            }
        });
    let is_except = text.contains("exceto");
    let (single, except) = match date {
        Some(d) if is_except => (None, Some(d)),
        Some(d) => (Some(d), None),
        None => (None, None),
    };

    let days_text = DATE_RE.replace_all(&without_times, " ").into_owned();

    let dates = if let Some(d) = single {
        vec![d]
    } else if text.contains("estreia") {
        premiere_date(&text, week).into_iter().collect()
    } else if let Some((from, to)) = days_text.split_once(" a ") {
        weekday_range(from, to, week)
    } else if days_text.contains(',') || days_text.contains(" e ") {
        days_text
            .replace(" e ", ",")
            .split(',')
            .filter_map(first_weekday)
            .map(|w| week.date_of(w))
            .collect()
    } else if let Some(w) = first_weekday(&days_text) {
        vec![week.date_of(w)]
    } else {
        week.days().collect()
    };

    if dates.is_empty() {
        debug!(text, "session entry resolved to no days");
    }

    Some(SessionEntry {
        dates,
        except,
        times,
    })
}

fn first_weekday(text: &str) -> Option<Weekday> {
    text.split(|c: char| c.is_whitespace() || c == '/')
        .find(|t| !t.is_empty())
        .and_then(parse_day)
}

fn weekday_range(from: &str, to: &str, week: &NowPlayingWeek) -> Vec<NaiveDate> {
    let start = from.split_whitespace().last().and_then(parse_day);
    let end = first_weekday(to);
    let (Some(start), Some(end)) = (start, end) else {
        warn!(from, to, "couldn't read weekday range");
        return Vec::new();
    };

    let first = days_into_week(week.start, start);
    let last = days_into_week(week.start, end);
    week.days()
        .enumerate()
        .filter(|(i, _)| first <= *i && *i <= last)
        .map(|(_, d)| d)
        .collect()
}

/// "estreia dia 21 de fevereiro"
fn premiere_date(text: &str, week: &NowPlayingWeek) -> Option<NaiveDate> {
    let caps = PREMIERE_RE.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = month_from_text(&caps[2]).ok()?;
    let date = NaiveDate::from_ymd_opt(week.start.year(), month, day)?;
    Some(in_week_year(date, week))
}

fn in_week_year(date: NaiveDate, week: &NowPlayingWeek) -> NaiveDate {
    if week.contains(date) {
        return date;
    }
    date.with_year(week.end.year())
        .filter(|d| week.contains(*d))
        .unwrap_or(date)
}

/// Expands the list that follows `heading` into sessions of `movie`.
pub fn expand_block(
    heading: ElementRef<'_>,
    movie: &MovieRef,
    calendar: &Calendar,
    sessions: &mut SessionSet,
) -> Result<()> {
    let header = parse_block_header(&text_trimmed(heading))?;
    let Some(list) = next_element(heading) else {
        return Err(Error::structure("session heading without a list"));
    };

    let week = calendar.now_playing_week();
    for li in list.select(&LI).skip(1) {
        let Some(entry) = parse_entry(&text_trimmed(li), &week) else {
            continue;
        };
        for (date, time) in entry.occurrences() {
            sessions.insert(RawSession {
                movie: movie.clone(),
                room: header.room,
                format: header.format,
                version: header.version,
                auditorium: Auditorium::default(),
                start_time: calendar.at(date, time)?,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week() -> NowPlayingWeek {
        NowPlayingWeek::containing(NaiveDate::from_ymd_opt(2019, 2, 14).unwrap())
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, m, d).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_block_header() {
        let h = parse_block_header("Sala 2 - 3D - Dublado").unwrap();
        assert_eq!(
            h,
            BlockHeader {
                room: 2,
                version: Version::Dubbed,
                format: Format::ThreeD
            }
        );
        let h = parse_block_header("SALA 1 2D LEGENDADO").unwrap();
        assert_eq!(h.version, Version::Subtitled);
        assert_eq!(h.format, Format::TwoD);

        assert!(parse_block_header("Sala 2 - Dublado").is_err());
        assert!(parse_block_header("3D - Dublado").is_err());
        assert!(parse_block_header("Sala 2 - 2D").is_err());
    }

    #[test]
    fn test_range_entry() {
        let e = parse_entry("Quinta a Domingo - 14:00 - 16:30", &week()).unwrap();
        assert_eq!(e.times, vec![hm(14, 0), hm(16, 30)]);
        assert_eq!(e.dates, vec![date(2, 14), date(2, 15), date(2, 16), date(2, 17)]);
        assert_eq!(e.occurrences().count(), 8);
    }

    #[test]
    fn test_list_entry() {
        let e = parse_entry("Segunda, Terça e Quarta - 19:00", &week()).unwrap();
        assert_eq!(e.dates, vec![date(2, 18), date(2, 19), date(2, 20)]);
    }

    #[test]
    fn test_single_weekday_and_every_day() {
        let e = parse_entry("Sábado - 21:00", &week()).unwrap();
        assert_eq!(e.dates, vec![date(2, 16)]);

        let e = parse_entry("Horários: 20:30", &week()).unwrap();
        assert_eq!(e.dates.len(), 7);
    }

    #[test]
    fn test_dates() {
        let e = parse_entry("Sábado 16-02 - 21:00", &week()).unwrap();
        assert_eq!(e.dates, vec![date(2, 16)]);
        assert_eq!(e.except, None);

        let e = parse_entry("Todos os dias exceto 17/02 - 19:00", &week()).unwrap();
        assert_eq!(e.except, Some(date(2, 17)));
        assert_eq!(e.occurrences().count(), 6);
    }

    #[test]
    fn test_premiere_entry() {
        let e = parse_entry("Pré-estreia dia 16 de fevereiro - 22:00", &week()).unwrap();
        assert_eq!(e.dates, vec![date(2, 16)]);
    }

    #[test]
    fn test_entry_without_times() {
        assert!(parse_entry("Em breve", &week()).is_none());
    }
}
