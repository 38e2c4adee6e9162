//! Lettered schedule footnotes, e.g.
//!
//! ```text
//! A - Somente sábado (16/02)(16/02), domingo (17/02)(17/02)
//! B - Exceto qua.(20/02)
//! ```

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::calendar::NowPlayingWeek;
use crate::error::{Error, Result};
use crate::model::{DisclaimerEntry, Period, Rule};
use crate::text::{break_by_spaces, break_by_token, date_from_text, lines, parse_day};

lazy_static! {
    static ref PERIOD_RE: Regex =
        Regex::new(r"\((\d{2}/\d{2})\)(?:\((\d{2}/\d{2})\))?").expect("period regex");
}

pub type Disclaimer = HashMap<char, DisclaimerEntry>;

/// Parses a footnote block, one footnote per line. Lines that do not start
/// with "<letter> - " are ignored; a footnote that does but cannot be parsed
/// fails the whole block.
pub fn parse_disclaimer(text: &str, week: &NowPlayingWeek) -> Result<Disclaimer> {
    let mut disclaimer = Disclaimer::new();

    for line in lines(text) {
        let parts: Vec<&str> = line.split(" - ").collect();
        if parts.len() < 2 {
            continue;
        }

        let mut key = parts[0].trim().chars();
        let (Some(letter), None) = (key.next(), key.next()) else {
            continue;
        };
        if !letter.is_alphabetic() {
            continue;
        }

        let (rule, weekdays, periods) = parse_rule(parts[1], week)?;
        debug!(%letter, ?rule, periods = periods.len(), "parsed footnote");
        disclaimer.insert(
            letter,
            DisclaimerEntry {
                letter,
                rule,
                weekdays,
                periods,
                text: line.to_string(),
            },
        );
    }

    Ok(disclaimer)
}

type ParsedRule = (Rule, Vec<chrono::Weekday>, Vec<Period>);

/// Parses "somente|exceto <day> <dates>[, <day> <dates>...]".
pub fn parse_rule(text: &str, week: &NowPlayingWeek) -> Result<ParsedRule> {
    let lower = text.to_lowercase();
    let (kind, rest) = break_by_spaces(&lower);
    let rule = match kind {
        "somente" => Rule::Only,
        "exceto" => Rule::Except,
        "" => return Err(Error::structure(format!("empty footnote rule: {text}"))),
        _ => return Err(Error::value("footnote rule", text)),
    };

    // "qua.(15/05)" and "quarta (15/05)" are both in use
    let mut rest = rest.replace('.', " ");
    let mut weekdays = Vec::new();
    let mut periods = Vec::new();

    while !rest.trim().is_empty() {
        let (day, after_day) = break_by_spaces(&rest);
        let weekday = parse_day(day).ok_or_else(|| Error::value("footnote weekday", day))?;
        weekdays.push(weekday);

        if after_day.trim().is_empty() {
            return Err(Error::structure(format!("footnote day '{day}' without a date: {text}")));
        }
        let (date, remainder) = break_by_spaces(after_day);
        if let Some(period) = parse_period(date, week)? {
            periods.push(period);
        } else {
            debug!(date, "footnote day without a recognizable date");
        }
        rest = remainder.to_string();
    }

    Ok((rule, weekdays, periods))
}

/// "(DD/MM)(DD/MM)", "(DD/MM)" or a looser "(DD/MM-DD/MM)".
fn parse_period(token: &str, week: &NowPlayingWeek) -> Result<Option<Period>> {
    if let Some(caps) = PERIOD_RE.captures(token) {
        let start = week_date(&caps[1], week)?;
        let end = match caps.get(2) {
            Some(m) => week_date(m.as_str(), week)?,
            None => start,
        };
        return Ok(Some(Period { start, end }));
    }

    if !token.contains('/') {
        return Ok(None);
    }

    let inner = token.trim_matches(|c: char| c == ',' || c.is_whitespace());
    let inner = inner.strip_prefix('(').unwrap_or(inner);
    let (inner, _) = break_by_token(inner, ')');
    let (start, end) = break_by_token(inner, '-');
    match (week_date(start, week), week_date(end, week)) {
        (Ok(start), Ok(end)) => Ok(Some(Period { start, end })),
        (Ok(start), Err(_)) if end.is_empty() => Ok(Some(Period::single(start))),
        _ => {
            warn!(token, "couldn't read footnote period");
            Ok(None)
        }
    }
}

/// Dates in footnotes carry no year; pick the one that lands inside the
/// exhibition week, which only differs from the start year around new year.
fn week_date(text: &str, week: &NowPlayingWeek) -> Result<NaiveDate> {
    let date = date_from_text(text, '/', week.start.year())?;
    if week.contains(date) || week.start.year() == week.end.year() {
        return Ok(date);
    }
    let alternative = date_from_text(text, '/', week.end.year())?;
    Ok(if week.contains(alternative) { alternative } else { date })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn week() -> NowPlayingWeek {
        NowPlayingWeek::containing(NaiveDate::from_ymd_opt(2019, 2, 14).unwrap())
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, m, d).unwrap()
    }

    #[test]
    fn test_only_with_explicit_periods() {
        let text = "A - Somente sábado (16/02)(16/02), domingo (17/02)(17/02)\n\
                    B - Somente sábado (16/02)(16/02), domingo (17/02)(17/02), quarta (20/02)(20/02)";
        let d = parse_disclaimer(text, &week()).unwrap();
        assert_eq!(d.len(), 2);

        let a = &d[&'A'];
        assert_eq!(a.rule, Rule::Only);
        assert_eq!(a.weekdays, vec![Weekday::Sat, Weekday::Sun]);
        assert_eq!(a.periods, vec![Period::single(date(2, 16)), Period::single(date(2, 17))]);
        assert!(a.text.starts_with("A - Somente"));

        assert_eq!(d[&'B'].periods.len(), 3);
    }

    #[test]
    fn test_except_with_abbreviated_day() {
        let d = parse_disclaimer("C - Exceto qua.(20/02)", &week()).unwrap();
        let c = &d[&'C'];
        assert_eq!(c.rule, Rule::Except);
        assert_eq!(c.weekdays, vec![Weekday::Wed]);
        assert_eq!(c.periods, vec![Period::single(date(2, 20))]);
    }

    #[test]
    fn test_range_period() {
        let d = parse_disclaimer("A - Somente sábado (16/02)(17/02)", &week()).unwrap();
        assert_eq!(
            d[&'A'].periods,
            vec![Period {
                start: date(2, 16),
                end: date(2, 17)
            }]
        );

        let d = parse_disclaimer("A - Somente sábado (16/02-17/02)", &week()).unwrap();
        assert_eq!(d[&'A'].periods[0].end, date(2, 17));
    }

    #[test]
    fn test_trailing_notes_are_ignored() {
        let d = parse_disclaimer("A - Somente terça (19/02) - CINEMATERNA", &week()).unwrap();
        assert_eq!(d[&'A'].periods, vec![Period::single(date(2, 19))]);
    }

    #[test]
    fn test_non_footnote_lines_are_skipped() {
        let text = "Programação sujeita a alterações\n3D - Sessões especiais\nA - Somente sábado (16/02)";
        let d = parse_disclaimer(text, &week()).unwrap();
        assert_eq!(d.keys().copied().collect::<Vec<_>>(), vec!['A']);
    }

    #[test]
    fn test_failures_are_fatal() {
        assert!(parse_disclaimer("A - Apenas sábado (16/02)", &week()).is_err());
        assert!(parse_disclaimer("A - Somente feriado (16/02)", &week()).is_err());
        assert!(parse_disclaimer("A - Somente sábado", &week()).is_err());
    }

    #[test]
    fn test_year_follows_week_across_new_year() {
        let week = NowPlayingWeek::containing(NaiveDate::from_ymd_opt(2019, 12, 31).unwrap());
        let d = parse_disclaimer("A - Somente quarta (01/01), sábado (28/12)", &week).unwrap();
        assert_eq!(d[&'A'].periods[0].start, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(d[&'A'].periods[1].start, NaiveDate::from_ymd_opt(2019, 12, 28).unwrap());
    }

    #[test]
    fn test_empty_block() {
        assert!(parse_disclaimer("", &week()).unwrap().is_empty());
    }
}
