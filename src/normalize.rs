//! Mapping of provider records into the shapes the rest of the system
//! stores: slugs, title clean-up, poster templating and price weights.

use chrono::{DateTime, FixedOffset, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::model::{
    Auditorium, Format, MovieId, PosterSize, PosterUrls, Price, RawMovie, RawSession, Rating, Version,
};
use crate::text::remove_ignore_case;

lazy_static! {
    static ref RELEASE_DATE_RE: Regex = Regex::new(r"\d{2}/\d{2}/\d{4}").expect("date regex");
    static ref ALT_DATE_RE: Regex = Regex::new(r"\d{1,}/\d{1,}/\d{2,}").expect("date regex");
    static ref ALT_DASH_DATE_RE: Regex = Regex::new(r"\d{1,}-\d{1,}-\d{2,}").expect("date regex");
    static ref TITLE_PERIOD_RE: Regex =
        Regex::new(r"(?i),*\s*(?:do)*\sdia\s\d{2}/\d{2}\sao*\s\d{2}/\d{2}").expect("period regex");
    static ref SHOWTIME_DATE_RE: Regex = Regex::new(
        r"(?i)dia*\s*\d{1,}\sde*\s*(?:janeiro|fevereiro|março|abril|maio|junho|julho|agosto|setembro|outubro|novembro|dezembro)"
    )
    .expect("showtime date regex");
}

const PREPOSITIONS: &[&str] = &[
    "e", "o", "os", "a", "as", "à", "às", "um", "uns", "uma", "umas", "de", "do", "dos", "da",
    "das", "dum", "duns", "duma", "dumas", "em", "no", "nos", "na", "nas", "num", "nuns", "numa",
    "numas", "por", "pelo", "pelos", "pela", "pelas",
];

const PREVIEW_MARKERS: &[&str] = &["pré-estreia", "pre-estreia", "pré-venda", "pre-venda"];

/// Lowercase ASCII letters and digits, words joined by single hyphens.
/// Anything else (accented letters included) is dropped.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.trim().chars() {
        if c.is_whitespace() {
            if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        } else if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        }
    }
    slug
}

/// Like [`generate_slug`] without separators.
pub fn compact_slug(title: &str) -> String {
    title
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Title case, keeping Portuguese prepositions and articles lowercase unless
/// they open the title or follow a word ending in ':' or '-'.
pub fn cap_title(title: &str) -> String {
    let words: Vec<String> = title.split(' ').map(str::to_lowercase).collect();
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let keep_lower = i > 0
                && PREPOSITIONS.contains(&word.as_str())
                && !words[i - 1].ends_with(':')
                && !words[i - 1].ends_with('-');
            if keep_lower {
                word.clone()
            } else {
                capitalize(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Removes release dates, preview periods and "pré-estreia"/"pré-venda"
/// markers that theaters append to titles.
pub fn trim_extra_title_text(title: &str) -> String {
    let mut result = title.to_string();

    for re in [&*RELEASE_DATE_RE, &*ALT_DATE_RE, &*ALT_DASH_DATE_RE, &*TITLE_PERIOD_RE] {
        if re.is_match(&result) {
            result = re.replace_all(&result, "").into_owned();
            break;
        }
    }

    let lower = result.to_lowercase();
    if lower.contains("estreia") || lower.contains("pré-venda") || lower.contains("pre-venda") {
        result = SHOWTIME_DATE_RE.replace_all(&result, "").into_owned();
    }

    for marker in PREVIEW_MARKERS {
        result = remove_ignore_case(&result, marker);
    }

    result
        .trim_matches(|c: char| c == ',' || c == '-' || c.is_whitespace())
        .to_string()
}

pub fn fix_title(title: &str) -> String {
    cap_title(&trim_extra_title_text(title))
}

const CLAQUETE_POSTERS: &str = "www.claquete.com/fotos/filmes/poster";

pub fn poster_urls(id: u32) -> PosterUrls {
    let url = |scheme: &str, size: &str| format!("{scheme}://{CLAQUETE_POSTERS}/{id}_{size}.jpg");
    PosterUrls {
        http: [url("http", "pequeno"), url("http", "medio"), url("http", "grande")],
        https: [url("https", "pequeno"), url("https", "medio"), url("https", "grande")],
    }
}

/// Sort weight of a price's attribute combination. 0 means unknown.
pub fn price_weight<S: AsRef<str>>(attributes: &[S]) -> u32 {
    const TABLE: &[(&[&str], u32)] = &[
        (&["2D"], 1),
        (&["3D"], 2),
        (&["2D", "Magic D", "Poltrona Tradicional"], 3),
        (&["3D", "Magic D", "Poltrona Tradicional"], 4),
        (&["2D", "3D", "Magic D", "Poltrona VIP"], 5),
    ];
    TABLE
        .iter()
        .find(|(attrs, _)| {
            attrs.len() == attributes.len()
                && attrs.iter().zip(attributes).all(|(a, b)| *a == b.as_ref())
        })
        .map(|(_, weight)| *weight)
        .unwrap_or(0)
}

/// Drops prices whose attribute combination has no weight.
pub fn weigh_prices(prices: Vec<Price>) -> Vec<Price> {
    prices
        .into_iter()
        .map(|mut p| {
            p.weight = price_weight(&p.attributes);
            p
        })
        .filter(|p| p.weight != 0)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movie {
    /// Store identifier, once resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claquete_id: Option<u32>,
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cast: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    pub rating: Rating,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_id: Option<String>,
    pub movie_slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claquete_id: Option<u32>,
    pub theater_id: String,
    pub format: Format,
    pub version: Version,
    #[serde(flatten)]
    pub auditorium: Auditorium,
    pub room: u32,
    pub time_zone: String,
    pub start_time: DateTime<FixedOffset>,
}

/// Normalizes records scraped for one theater.
#[derive(Debug, Clone)]
pub struct Normalizer {
    theater_id: String,
    time_zone: String,
}

impl Normalizer {
    pub fn new(theater_id: impl Into<String>, time_zone: impl Into<String>) -> Self {
        Self {
            theater_id: theater_id.into(),
            time_zone: time_zone.into(),
        }
    }

    pub fn theater_id(&self) -> &str {
        &self.theater_id
    }

    pub fn movie(&self, raw: &RawMovie) -> Movie {
        let poster_url = raw
            .poster_urls
            .as_ref()
            .map(|p| p.get(PosterSize::Large, true).to_string())
            .or_else(|| raw.poster_url.clone());
        Movie {
            id: None,
            claquete_id: claquete_id(&raw.id),
            slug: generate_slug(&raw.title),
            title: raw.title.clone(),
            original_title: raw.original_title.clone(),
            cast: raw.cast.clone(),
            poster_url,
            synopsis: raw.synopsis.clone(),
            trailer: raw.trailer.as_ref().map(|t| t.id.clone()),
            genres: raw.genres.clone(),
            rating: raw.rating,
            runtime: raw.runtime,
            distributor: raw.distributor.clone(),
            release_date: raw.release_date,
        }
    }

    pub fn session(&self, raw: &RawSession) -> Session {
        Session {
            movie_id: None,
            movie_slug: generate_slug(&raw.movie.title),
            claquete_id: claquete_id(&raw.movie.id),
            theater_id: self.theater_id.clone(),
            format: raw.format,
            version: raw.version,
            auditorium: raw.auditorium,
            room: raw.room,
            time_zone: self.time_zone.clone(),
            start_time: raw.start_time,
        }
    }
}

fn claquete_id(id: &MovieId) -> Option<u32> {
    match id {
        MovieId::Numeric(n) if *n != 0 => Some(*n),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("  Homem-Aranha: Longe de Casa "), "homemaranha-longe-de-casa");
        assert_eq!(generate_slug("Vingadores   Ultimato"), "vingadores-ultimato");
        assert_eq!(generate_slug("Ágatha"), "gatha");
        assert_eq!(generate_slug(""), "");
    }

    #[test]
    fn test_compact_slug() {
        assert_eq!(compact_slug("Como Treinar o Seu Dragão 3"), "comotreinaroseudrago3");
    }

    #[test]
    fn test_cap_title() {
        assert_eq!(cap_title("O REI DA SELVA"), "O Rei da Selva");
        assert_eq!(cap_title("alita: o anjo de combate"), "Alita: O Anjo de Combate");
        assert_eq!(cap_title("uma aventura - a volta"), "Uma Aventura - A Volta");
        assert_eq!(cap_title(""), "");
    }

    #[test]
    fn test_trim_extra_title_text() {
        assert_eq!(trim_extra_title_text("Capitã Marvel - 07/03/2019"), "Capitã Marvel");
        assert_eq!(trim_extra_title_text("PRÉ-ESTREIA Shazam!"), "Shazam!");
        assert_eq!(
            trim_extra_title_text("Dumbo - Pré-estreia dia 27 de março"),
            "Dumbo"
        );
        assert_eq!(trim_extra_title_text("Nós, pré-venda"), "Nós");
    }

    #[test]
    fn test_fix_title() {
        assert_eq!(fix_title("PRÉ-ESTREIA COMO TREINAR O SEU DRAGÃO 3"), "Como Treinar o Seu Dragão 3");
    }

    #[test]
    fn test_price_weight() {
        assert_eq!(price_weight(&["2D"]), 1);
        assert_eq!(price_weight(&["3D"]), 2);
        assert_eq!(price_weight(&["2D", "Magic D", "Poltrona Tradicional"]), 3);
        assert_eq!(price_weight(&["3D", "Magic D", "Poltrona Tradicional"]), 4);
        assert_eq!(price_weight(&["2D", "3D", "Magic D", "Poltrona VIP"]), 5);
        assert_eq!(price_weight(&["3D", "2D"]), 0);
        assert_eq!(price_weight::<&str>(&[]), 0);
    }

    #[test]
    fn test_poster_urls() {
        let urls = poster_urls(123);
        assert_eq!(
            urls.get(PosterSize::Large, true),
            "https://www.claquete.com/fotos/filmes/poster/123_grande.jpg"
        );
        assert_eq!(
            urls.get(PosterSize::Small, false),
            "http://www.claquete.com/fotos/filmes/poster/123_pequeno.jpg"
        );
    }
}
