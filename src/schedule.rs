//! Weekly schedule tables and their expansion into dated sessions.
//!
//! A table row lists a room, a movie, a rating icon and a times cell such as
//! "Leg. - 19h30, 21h45A". Times without a footnote letter run every day of
//! the exhibition week; lettered times follow the matching footnote rule.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use scraper::{ElementRef, Selector};
use tracing::{debug, trace};

use crate::calendar::{Calendar, NowPlayingWeek};
use crate::disclaimer::{Disclaimer, parse_disclaimer};
use crate::dom::{attr, child_elements, file_name, query_param, text_trimmed, text_with_breaks};
use crate::error::{Error, Result};
use crate::model::{Auditorium, Format, MovieId, MovieRef, Rating, RawSession, Rule, Version};
use crate::text::{break_by_token, parse_clock};

lazy_static! {
    static ref DISCLAIMER: Selector = Selector::parse("div.disclaimer").expect("selector");
    static ref ROWS: Selector = Selector::parse("table > tbody > tr").expect("selector");
    static ref ANCHOR: Selector = Selector::parse("a").expect("selector");
    static ref IMG: Selector = Selector::parse("img").expect("selector");
}

/// A start time from a times cell, with its optional footnote letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub time: NaiveTime,
    pub footnote: Option<char>,
}

/// Sessions in insertion order, without duplicates.
///
/// Two sessions are the same when movie id, format, auditorium flags, room,
/// start instant and version all match.
#[derive(Debug, Default)]
pub struct SessionSet {
    sessions: Vec<RawSession>,
    seen: HashSet<SessionKey>,
}

type SessionKey = (MovieId, Format, Auditorium, u32, DateTime<FixedOffset>, Version);

impl SessionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when an equal session was already present.
    pub fn insert(&mut self, session: RawSession) -> bool {
        let key = (
            session.movie.id.clone(),
            session.format,
            session.auditorium,
            session.room,
            session.start_time,
            session.version,
        );
        if !self.seen.insert(key) {
            trace!(room = session.room, start = %session.start_time, "duplicate session");
            return false;
        }
        self.sessions.push(session);
        true
    }

    pub fn extend(&mut self, sessions: impl IntoIterator<Item = RawSession>) {
        for s in sessions {
            self.insert(s);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn into_vec(self) -> Vec<RawSession> {
        self.sessions
    }
}

/// Splits a times cell into its version and time slots.
///
/// "Dub." and "Leg." prefixes mark dubbed and subtitled sessions; a cell
/// without a '-' separator is a national production.
pub fn parse_times(cell: &str) -> Result<(Version, Vec<TimeSlot>)> {
    let (prefix, rest) = break_by_token(cell, '-');
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Err(Error::structure(format!("empty times cell: '{cell}'")));
    }

    let (version, times) = match prefix {
        "Dub." => (Version::Dubbed, rest),
        "Leg." => (Version::Subtitled, rest),
        _ if rest.is_empty() => (Version::National, prefix),
        _ => return Err(Error::value("session version", prefix)),
    };

    let slots = times
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(parse_slot)
        .collect::<Result<Vec<_>>>()?;
    Ok((version, slots))
}

/// "21h45A" is 21:45 with footnote A.
fn parse_slot(token: &str) -> Result<TimeSlot> {
    let mut time = token;
    let mut footnote = None;
    if let Some(last) = token.chars().last()
        && last.is_alphabetic()
    {
        footnote = Some(last);
        time = &token[..token.len() - last.len_utf8()];
    }
    Ok(TimeSlot {
        time: parse_clock(time, 'h')?,
        footnote,
    })
}

/// Days on which a slot runs.
///
/// `only` footnotes yield one day per period start, `except` footnotes every
/// week day whose day and month match no period start.
pub fn slot_dates(
    footnote: Option<char>,
    disclaimer: &Disclaimer,
    week: &NowPlayingWeek,
) -> Result<Vec<NaiveDate>> {
    let Some(letter) = footnote else {
        return Ok(week.days().collect());
    };
    let entry = disclaimer
        .get(&letter)
        .ok_or(Error::UndefinedFootnote(letter))?;

    let dates = match entry.rule {
        Rule::Only => entry.periods.iter().map(|p| p.start).collect(),
        Rule::Except => week
            .days()
            .filter(|day| {
                !entry
                    .periods
                    .iter()
                    .any(|p| p.start.day() == day.day() && p.start.month() == day.month())
            })
            .collect(),
    };
    Ok(dates)
}

/// Rating from a schedule or detail page icon, by file name first and then
/// by `alt`/`title` text.
pub fn rating_from_icon(img: ElementRef<'_>) -> Result<Rating> {
    let src = attr(img, "src").unwrap_or_default();
    let rating = match file_name(src) {
        "ICO_LIV_programacao.png" | "ICO_LIV_programacao_GR.png" => Some(Rating::Free),
        "ICO_10A_programacao.png" | "ICO_10_programacao_GR.png" => Some(Rating::Age10),
        "ICO_12A_programacao.png" | "ICO_12_programacao_GR.png" => Some(Rating::Age12),
        "ICO_14A_programacao.png" | "ICO_14_programacao_GR.png" => Some(Rating::Age14),
        "ICO_16A_programacao.png" | "ICO_16_programacao_GR.png" => Some(Rating::Age16),
        "ICO_18A_programacao.png" | "ICO_18_programacao_GR.png" => Some(Rating::Age18),
        _ => None,
    };
    if let Some(rating) = rating {
        return Ok(rating);
    }

    let label = attr(img, "alt")
        .or_else(|| attr(img, "title"))
        .unwrap_or_default()
        .to_lowercase();
    if label.contains("livre") {
        return Ok(Rating::Free);
    }
    crate::text::digits(&label)
        .and_then(Rating::from_age)
        .ok_or_else(|| Error::value("rating icon", src))
}

fn apply_icon(img: ElementRef<'_>, format: &mut Format, auditorium: &mut Auditorium) {
    if let Some(title) = attr(img, "title") {
        match title {
            "Em 3D" => *format = Format::ThreeD,
            "Magic D" => auditorium.magic_d = true,
            "Vip" | "VIP" => auditorium.vip = true,
            _ => debug!(title, "unknown session icon title"),
        }
        return;
    }

    let name = file_name(attr(img, "src").unwrap_or_default());
    if name.contains("ICO_3d_programacao") {
        *format = Format::ThreeD;
    } else if name.contains("magic") {
        auditorium.magic_d = true;
    } else if name.contains("vip") {
        auditorium.vip = true;
    } else if !name.is_empty() {
        debug!(name, "unknown session icon");
    }
}

fn parse_movie_cell(cell: ElementRef<'_>) -> Result<(MovieId, String)> {
    let anchor = cell
        .select(&ANCHOR)
        .next()
        .ok_or_else(|| Error::structure("session row without movie link"))?;
    let title = text_trimmed(anchor);
    let href = attr(anchor, "href").unwrap_or_default();
    let id: u32 = query_param(href, "cf")
        .and_then(|cf| cf.trim().parse().ok())
        .ok_or_else(|| Error::value("movie id", href))?;
    if id == 0 || title.is_empty() {
        return Err(Error::structure(format!("incomplete movie link '{href}'")));
    }
    Ok((MovieId::Numeric(id), title))
}

/// Footnotes of one schedule container; empty when it has none.
pub fn container_disclaimer(container: ElementRef<'_>, week: &NowPlayingWeek) -> Result<Disclaimer> {
    match container.select(&DISCLAIMER).next() {
        Some(block) => parse_disclaimer(&text_with_breaks(block), week),
        None => Ok(Disclaimer::new()),
    }
}

/// Walks one schedule container: its footnote block and every table row
/// after the header. Any row failure fails the whole container.
pub fn extract_table(
    container: ElementRef<'_>,
    calendar: &Calendar,
    sessions: &mut SessionSet,
) -> Result<()> {
    let week = calendar.now_playing_week();
    let disclaimer = container_disclaimer(container, &week)?;

    for row in container.select(&ROWS).skip(1) {
        let cells: Vec<ElementRef> = child_elements(row)
            .filter(|c| c.value().name() == "td")
            .collect();
        let [room_cell, movie_cell, rating_cell, times_cell, ..] = cells.as_slice() else {
            return Err(Error::structure(format!(
                "schedule row with {} cells",
                cells.len()
            )));
        };

        let room_text = text_trimmed(*room_cell);
        let room: u32 = room_text
            .parse()
            .map_err(|_| Error::value("room", room_text.as_str()))?;

        let (id, title) = parse_movie_cell(*movie_cell)?;
        let rating_img = rating_cell
            .select(&IMG)
            .next()
            .ok_or_else(|| Error::structure("session row without rating icon"))?;
        let movie = MovieRef {
            id,
            title,
            rating: rating_from_icon(rating_img)?,
        };

        let mut format = Format::TwoD;
        let mut auditorium = Auditorium::default();
        for img in movie_cell.select(&IMG) {
            apply_icon(img, &mut format, &mut auditorium);
        }

        let (version, slots) = parse_times(&text_trimmed(*times_cell))?;
        for slot in slots {
            for date in slot_dates(slot.footnote, &disclaimer, &week)? {
                sessions.insert(RawSession {
                    movie: movie.clone(),
                    room,
                    format,
                    version,
                    auditorium,
                    start_time: calendar.at(date, slot.time)?,
                });
            }
        }
    }

    Ok(())
}
