//! String scanning helpers shared by every parser.
//!
//! The source pages are Portuguese prose, frequently served with broken
//! encodings, so matching is done on lowercase prefixes rather than on exact
//! words.

use chrono::{NaiveDate, NaiveTime, Weekday};
use regex::Regex;

use crate::error::{Error, Result};

/// Skips leading spaces (only the space character, tabs are content).
pub fn eat_spaces(s: &str) -> &str {
    s.trim_start_matches(' ')
}

/// Splits `s` at the first `tok`, returning the left side and the remainder
/// with leading spaces removed. When `tok` is absent the whole (space
/// trimmed) input is returned as the left side and the remainder is empty.
pub fn break_by_token(s: &str, tok: char) -> (&str, &str) {
    let s = eat_spaces(s);
    match s.find(tok) {
        Some(i) => (&s[..i], eat_spaces(&s[i + tok.len_utf8()..])),
        None => (s, ""),
    }
}

pub fn break_by_spaces(s: &str) -> (&str, &str) {
    break_by_token(s, ' ')
}

/// Removes the first case-insensitive occurrence of `old` from `s`.
pub fn remove_ignore_case(s: &str, old: &str) -> String {
    if s.is_empty() || old.is_empty() {
        return s.to_string();
    }
    match Regex::new(&format!("(?i){}", regex::escape(old))) {
        Ok(re) => re.replacen(s, 1, "").into_owned(),
        Err(_) => s.to_string(),
    }
}

/// Recognizes a Portuguese weekday token: full names, three letter
/// abbreviations, ordinal forms ("2ª".."7ª") and unaccented or mangled
/// spellings of "sábado".
pub fn parse_day(token: &str) -> Option<Weekday> {
    let day = token.trim().to_lowercase();
    if day.is_empty() {
        return None;
    }

    const TABLE: &[(&[&str], Weekday)] = &[
        (&["dom"], Weekday::Sun),
        (&["seg", "2ª"], Weekday::Mon),
        (&["ter", "3ª"], Weekday::Tue),
        (&["qua", "4ª"], Weekday::Wed),
        (&["qui", "5ª"], Weekday::Thu),
        (&["sex", "6ª"], Weekday::Fri),
        (&["sáb", "sab", "sã¡b", "7ª"], Weekday::Sat),
    ];

    TABLE
        .iter()
        .find(|(prefixes, _)| prefixes.iter().any(|p| day.starts_with(p)))
        .map(|(_, weekday)| *weekday)
}

/// Builds a date from "DD<delim>MM[<delim>YY[YY]]".
///
/// A missing year falls back to `default_year`; a two digit year is taken to
/// be in the 2000s. Both rules mirror how the theater sites write dates and
/// stop being right in 2100.
pub fn date_from_text(s: &str, delim: char, default_year: i32) -> Result<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::value("date", s));
    }

    let parts: Vec<&str> = s.split(delim).map(str::trim).collect();
    let number = |p: &str| p.parse::<u32>().map_err(|_| Error::value("date", s));

    let (day, month, year) = match parts.as_slice() {
        [d, m] => (number(d)?, number(m)?, default_year),
        [d, m, y] => {
            let mut year = number(y)? as i32;
            if y.len() == 2 {
                year += 2000;
            }
            (number(d)?, number(m)?, year)
        }
        _ => return Err(Error::value("date", s)),
    };

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| Error::value("date", s))
}

/// Parses a clock reading split by `sep`, e.g. "19h30" with 'h' or "14:00"
/// with ':'.
pub fn parse_clock(text: &str, sep: char) -> Result<NaiveTime> {
    let (h, m) = break_by_token(text.trim(), sep);
    let h = h.trim();
    let m = m.trim();
    if h.is_empty() || m.is_empty() {
        return Err(Error::value("time", text));
    }
    let hours: u32 = h.parse().map_err(|_| Error::value("time", text))?;
    let minutes: u32 = m.parse().map_err(|_| Error::value("time", text))?;
    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(|| Error::value("time", text))
}

/// Month number from a Portuguese month name ("fevereiro", "Fev", ...).
pub fn month_from_text(s: &str) -> Result<u32> {
    let lc = s.trim().to_lowercase();
    let start: String = lc.chars().take(3).collect();
    let month = match start.as_str() {
        "jan" => 1,
        "fev" => 2,
        "mar" => 3,
        "abr" => 4,
        "mai" => 5,
        "jun" => 6,
        "jul" => 7,
        "ago" => 8,
        "set" => 9,
        "out" => 10,
        "nov" => 11,
        "dez" => 12,
        _ => return Err(Error::value("month", s)),
    };
    Ok(month)
}

pub fn split_trimmed(s: &str, sep: &str) -> Vec<String> {
    s.split(sep).map(|p| p.trim().to_string()).collect()
}

/// Non-blank lines, trimmed.
pub fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Keeps only the ASCII digits of `s` and parses them.
pub fn digits(s: &str) -> Option<u32> {
    let d: String = s.chars().filter(char::is_ascii_digit).collect();
    d.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_by_token() {
        assert_eq!(break_by_token("  Dub. - 19h30, 21h45", '-'), ("Dub. ", "19h30, 21h45"));
        assert_eq!(break_by_token("19h30", ','), ("19h30", ""));
        assert_eq!(break_by_spaces("somente sábado (16/02)"), ("somente", "sábado (16/02)"));
        assert_eq!(break_by_token("", ','), ("", ""));
    }

    #[test]
    fn test_parse_day_canonical_tokens() {
        let cases = [
            ("domingo", Weekday::Sun),
            ("dom", Weekday::Sun),
            ("Segunda", Weekday::Mon),
            ("seg", Weekday::Mon),
            ("2ª", Weekday::Mon),
            ("terça", Weekday::Tue),
            ("ter", Weekday::Tue),
            ("3ª", Weekday::Tue),
            ("quarta", Weekday::Wed),
            ("qua", Weekday::Wed),
            ("4ª", Weekday::Wed),
            ("quinta", Weekday::Thu),
            ("qui", Weekday::Thu),
            ("5ª", Weekday::Thu),
            ("sexta", Weekday::Fri),
            ("sex", Weekday::Fri),
            ("6ª", Weekday::Fri),
            ("sábado", Weekday::Sat),
            ("SÁB", Weekday::Sat),
            ("sab", Weekday::Sat),
            ("7ª", Weekday::Sat),
            ("  quinta,", Weekday::Thu),
        ];
        for (token, expected) in cases {
            assert_eq!(parse_day(token), Some(expected), "token {token}");
        }
    }

    #[test]
    fn test_parse_day_rejects_other_tokens() {
        for token in ["", "a", "e", "feriados", "(16/02)", "19h30", "exceto"] {
            assert_eq!(parse_day(token), None, "token {token}");
        }
    }

    #[test]
    fn test_date_from_text() {
        assert_eq!(
            date_from_text("16/02", '/', 2019).unwrap(),
            NaiveDate::from_ymd_opt(2019, 2, 16).unwrap()
        );
        assert_eq!(
            date_from_text("05/03/21", '/', 2019).unwrap(),
            NaiveDate::from_ymd_opt(2021, 3, 5).unwrap()
        );
        assert_eq!(
            date_from_text("05-03-2018", '-', 2019).unwrap(),
            NaiveDate::from_ymd_opt(2018, 3, 5).unwrap()
        );
        assert!(date_from_text("", '/', 2019).is_err());
        assert!(date_from_text("16", '/', 2019).is_err());
        assert!(date_from_text("1/2/3/4", '/', 2019).is_err());
        assert!(date_from_text("31/02", '/', 2019).is_err());
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("19h30", 'h').unwrap(), NaiveTime::from_hms_opt(19, 30, 0).unwrap());
        assert_eq!(parse_clock("14:05", ':').unwrap(), NaiveTime::from_hms_opt(14, 5, 0).unwrap());
        assert!(parse_clock("19h", 'h').is_err());
        assert!(parse_clock("xxhyy", 'h').is_err());
    }

    #[test]
    fn test_remove_ignore_case() {
        assert_eq!(remove_ignore_case("Pré-Estreia Coringa", "pré-estreia"), " Coringa");
        assert_eq!(remove_ignore_case("Coringa", "pré-venda"), "Coringa");
    }

    #[test]
    fn test_month_from_text() {
        assert_eq!(month_from_text("Fevereiro").unwrap(), 2);
        assert_eq!(month_from_text(" dez ").unwrap(), 12);
        assert!(month_from_text("xy").is_err());
    }
}
