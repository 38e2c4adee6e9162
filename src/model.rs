//! Provider-facing records, built fresh on every scrape and handed to the
//! normalizers afterwards.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Weekday};
use serde::Serialize;

use crate::calendar::NowPlayingWeek;

/// Identifier a provider uses for a movie: Cinemais pages carry numeric
/// ids, Ibicinemas only has title slugs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum MovieId {
    Numeric(u32),
    Slug(String),
}

impl Default for MovieId {
    fn default() -> Self {
        MovieId::Slug(String::new())
    }
}

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovieId::Numeric(id) => write!(f, "{id}"),
            MovieId::Slug(slug) => f.write_str(slug),
        }
    }
}

/// Brazilian content rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "i32")]
pub enum Rating {
    Free,
    Age10,
    Age12,
    Age14,
    Age16,
    Age18,
    #[default]
    Unrated,
}

impl Rating {
    pub fn from_age(age: u32) -> Option<Self> {
        match age {
            10 => Some(Rating::Age10),
            12 => Some(Rating::Age12),
            14 => Some(Rating::Age14),
            16 => Some(Rating::Age16),
            18 => Some(Rating::Age18),
            _ => None,
        }
    }
}

impl From<Rating> for i32 {
    fn from(r: Rating) -> i32 {
        match r {
            Rating::Free => -1,
            Rating::Age10 => 10,
            Rating::Age12 => 12,
            Rating::Age14 => 14,
            Rating::Age16 => 16,
            Rating::Age18 => 18,
            Rating::Unrated => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub enum Format {
    #[default]
    #[serde(rename = "2D")]
    TwoD,
    #[serde(rename = "3D")]
    ThreeD,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::TwoD => "2D",
            Format::ThreeD => "3D",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Version {
    Dubbed,
    Subtitled,
    National,
}

/// Opt-in premium room features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct Auditorium {
    pub magic_d: bool,
    pub vip: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trailer {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosterSize {
    Small = 0,
    Medium = 1,
    Large = 2,
}

/// Poster locations by scheme, each indexed by [`PosterSize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PosterUrls {
    pub http: [String; 3],
    pub https: [String; 3],
}

impl PosterUrls {
    pub fn get(&self, size: PosterSize, secure: bool) -> &str {
        let urls = if secure { &self.https } else { &self.http };
        &urls[size as usize]
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RawMovie {
    pub id: MovieId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cast: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub screenplay: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub executive_production: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub production: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub direction: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    pub rating: Rating,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_urls: Option<PosterUrls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer: Option<Trailer>,
}

/// The part of a movie a session row carries with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MovieRef {
    pub id: MovieId,
    pub title: String,
    pub rating: Rating,
}

/// One dated screening. `start_time` is always a concrete instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawSession {
    pub movie: MovieRef,
    pub room: u32,
    pub format: Format,
    pub version: Version,
    pub auditorium: Auditorium,
    pub start_time: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Schedule {
    pub week: NowPlayingWeek,
    pub sessions: Vec<RawSession>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Price {
    pub label: String,
    pub attributes: Vec<String>,
    pub weekdays: Vec<Weekday>,
    pub includes_holidays: bool,
    pub except_holidays: bool,
    pub includes_previews: bool,
    pub except_previews: bool,
    pub full: f32,
    pub half: f32,
    /// Sort priority from the attribute lookup table; 0 is unrecognized.
    pub weight: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rule {
    Only,
    Except,
}

/// Day/month pair range; the year always comes from the scrape calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisclaimerEntry {
    pub letter: char,
    pub rule: Rule,
    pub weekdays: Vec<Weekday>,
    pub periods: Vec<Period>,
    /// Raw footnote line.
    pub text: String,
}

const FEDERATIVE_UNITS: [&str; 27] = [
    "AC", "AL", "AM", "AP", "BA", "CE", "DF", "ES", "GO", "MA", "MG", "MS", "MT", "PA", "PB", "PE",
    "PI", "PR", "RJ", "RN", "RO", "RR", "RS", "SC", "SE", "SP", "TO",
];

pub fn is_federative_unit(s: &str) -> bool {
    FEDERATIVE_UNITS.contains(&s)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct City {
    pub name: String,
    pub federative_unit: String,
}

impl City {
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && is_federative_unit(&self.federative_unit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Theater {
    pub id: u32,
    pub name: String,
    pub city: City,
}

impl Theater {
    pub fn is_valid(&self) -> bool {
        self.id != 0 && !self.name.is_empty() && self.city.is_valid()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Promotion {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub limited: bool,
}

impl Promotion {
    pub fn is_valid(&self) -> bool {
        self.id != 0 && !self.name.is_empty() && !self.description.is_empty()
    }
}

/// Any record a provider can emit.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    Movie(RawMovie),
    Session(RawSession),
    Price(Price),
    Disclaimer(DisclaimerEntry),
    Theater(Theater),
    City(City),
    Promotion(Promotion),
}

impl Record {
    /// One-line description used in logs.
    pub fn summary(&self) -> String {
        match self {
            Record::Movie(m) => format!("movie {} '{}'", m.id, m.title),
            Record::Session(s) => format!(
                "session '{}' room {} {} {:?} at {}",
                s.movie.title,
                s.room,
                s.format.as_str(),
                s.version,
                s.start_time.to_rfc3339()
            ),
            Record::Price(p) => format!("price '{}' R$ {:.2}", p.label, p.full),
            Record::Disclaimer(d) => format!("disclaimer {} {:?}", d.letter, d.rule),
            Record::Theater(t) => format!("theater {} '{}'", t.id, t.name),
            Record::City(c) => format!("city {} - {}", c.name, c.federative_unit),
            Record::Promotion(p) => format!("promotion {} '{}'", p.id, p.name),
        }
    }
}
