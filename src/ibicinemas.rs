use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::calendar::Calendar;
use crate::dom::{attr, child_elements, first, has_class, resolve_url, text_trimmed};
use crate::error::{Error, Result};
use crate::fetch::{PageSource, fan_out};
use crate::model::{MovieId, MovieRef, Price, Rating, RawMovie, RawSession, Schedule, Trailer};
use crate::normalize::{compact_slug, fix_title, weigh_prices};
use crate::price::parse_price_table;
use crate::schedule::SessionSet;
use crate::session_block::expand_block;
use crate::text::digits;
use crate::Provider;

pub const BASE_URL: &str = "http://www.ibicinemas.com.br";

const UPCOMING_PAGE: &str = "ibicinemas-proximos-lancamentos-7.html";
const PRICES_PAGE: &str = "ibicinemas-tabela-de-precos-4.html";

const RATING_IMAGES: &[(&str, Rating)] = &[
    ("images/censura/ibicinemas-censura-livre-1.jpg", Rating::Free),
    ("images/censura/ibicinemas-censura-10-anos-2.jpg", Rating::Age10),
    ("images/censura/ibicinemas-censura-12-anos-3.jpg", Rating::Age12),
    ("images/censura/ibicinemas-censura-14-anos-4.jpg", Rating::Age14),
    ("images/censura/ibicinemas-censura-16-anos-5.jpg", Rating::Age16),
    ("images/censura/ibicinemas-censura-18-anos-6.jpg", Rating::Age18),
];

lazy_static! {
    static ref PLAYING: Selector = Selector::parse(
        "body > div:nth-child(6) > div > div.panel.panel-default > div > div"
    )
    .expect("selector");
    static ref UPCOMING: Selector = Selector::parse(".proxfilm").expect("selector");
    static ref DETAIL: Selector =
        Selector::parse("body > div:nth-child(4) > div > div").expect("selector");
    static ref SIDEBAR: Selector =
        Selector::parse("div.panel-body > div > div.col-sm-4.col-md-3").expect("selector");
    static ref SYNOPSIS: Selector =
        Selector::parse("div.video-description > p").expect("selector");
    static ref TRAILER: Selector =
        Selector::parse("div.video-container > iframe").expect("selector");
    static ref PRICE_ROWS: Selector = Selector::parse("div.panel-body > table tr").expect("selector");
    static ref THUMB_TITLE: Selector = Selector::parse(".film-thumb-info").expect("selector");
    static ref A: Selector = Selector::parse("a").expect("selector");
    static ref H2: Selector = Selector::parse("h2").expect("selector");
    static ref IMG: Selector = Selector::parse("img").expect("selector");
    static ref LI: Selector = Selector::parse("li").expect("selector");
    static ref I: Selector = Selector::parse("i").expect("selector");
    static ref TD: Selector = Selector::parse("td").expect("selector");
}

/// Scraper for the single Ibicinemas theater. Movies have no numeric ids
/// there; the compact slug of the cleaned title stands in for one.
pub struct IbicinemasScraper {
    base_url: String,
    concurrency: usize,
}

impl Default for IbicinemasScraper {
    fn default() -> Self {
        Self::new()
    }
}

impl IbicinemasScraper {
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            concurrency: 8,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Upper bound on detail pages fetched at once while building a schedule.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_url(&self, page: &str) -> String {
        format!("{}/{page}", self.base_url)
    }

    pub fn movie_url(&self, id: &str) -> String {
        format!("{}/{id}.html", self.base_url)
    }

    async fn movie_sessions(
        &self,
        pages: &dyn PageSource,
        movie: RawMovie,
        calendar: &Calendar,
    ) -> Result<Vec<RawSession>> {
        let url = match &movie.detail_url {
            Some(url) => url.clone(),
            None => self.movie_url(&movie.id.to_string()),
        };
        let body = pages.fetch(&url).await?;
        let sessions = parse_movie_sessions(&body, &movie, calendar)?;
        debug!(title = %movie.title, sessions = sessions.len(), "movie sessions");
        Ok(sessions)
    }
}

#[async_trait::async_trait]
impl Provider for IbicinemasScraper {
    fn name(&self) -> &'static str {
        "ibicinemas"
    }

    #[tracing::instrument(skip_all, fields(provider = "ibicinemas"))]
    async fn now_playing(&self, pages: &dyn PageSource) -> Result<Vec<RawMovie>> {
        let url = self.page_url("");
        let body = pages.fetch(&url).await?;
        let movies = parse_slider(&body, &PLAYING, &url)?;
        info!(count = movies.len(), "now playing");
        Ok(movies)
    }

    #[tracing::instrument(skip_all, fields(provider = "ibicinemas"))]
    async fn upcoming(&self, pages: &dyn PageSource) -> Result<Vec<RawMovie>> {
        let url = self.page_url(UPCOMING_PAGE);
        let body = pages.fetch(&url).await?;
        let movies = parse_slider(&body, &UPCOMING, &url)?;
        info!(count = movies.len(), "upcoming");
        Ok(movies)
    }

    #[tracing::instrument(skip_all, fields(provider = "ibicinemas"))]
    async fn schedule(&self, pages: &dyn PageSource, calendar: &Calendar) -> Result<Schedule> {
        let movies = self.now_playing(pages).await?;
        if movies.is_empty() {
            return Err(Error::NotFound("now playing movies".into()));
        }

        let per_movie = fan_out(movies, self.concurrency, |movie| {
            self.movie_sessions(pages, movie, calendar)
        })
        .await?;

        let mut sessions = SessionSet::new();
        for batch in per_movie {
            sessions.extend(batch);
        }
        info!(sessions = sessions.len(), "schedule extracted");
        Ok(Schedule {
            week: calendar.now_playing_week(),
            sessions: sessions.into_vec(),
        })
    }

    #[tracing::instrument(skip_all, fields(provider = "ibicinemas"))]
    async fn prices(&self, pages: &dyn PageSource) -> Result<Vec<Price>> {
        let body = pages.fetch(&self.page_url(PRICES_PAGE)).await?;
        parse_prices(&body)
    }

    #[tracing::instrument(skip_all, fields(provider = "ibicinemas", %id))]
    async fn movie(
        &self,
        pages: &dyn PageSource,
        _calendar: &Calendar,
        id: &MovieId,
    ) -> Result<RawMovie> {
        let url = self.movie_url(&id.to_string());
        let body = pages.fetch(&url).await?;
        parse_movie(&body, &url)
    }
}

fn movie_id(title: &str) -> MovieId {
    MovieId::Slug(compact_slug(title))
}

fn poster(scope: ElementRef<'_>, page_url: &str) -> Option<String> {
    let src = scope.select(&IMG).next().and_then(|img| attr(img, "src"))?;
    match resolve_url(page_url, src) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            warn!(src, error = %e, "couldn't resolve poster");
            None
        }
    }
}

/// Movie thumbnails in a slider container. Anchors without a link are
/// skipped.
pub fn parse_slider(html: &str, container: &Selector, page_url: &str) -> Result<Vec<RawMovie>> {
    let doc = Html::parse_document(html);
    let mut movies: Vec<RawMovie> = Vec::new();
    for scope in doc.select(container) {
        for anchor in scope.select(&A) {
            let Some(href) = attr(anchor, "href") else {
                debug!("slider anchor without href");
                continue;
            };
            let title = anchor
                .select(&THUMB_TITLE)
                .next()
                .map(|e| fix_title(&text_trimmed(e)))
                .unwrap_or_default();
            if title.is_empty() {
                debug!(href, "slider anchor without title");
                continue;
            }
            let movie = RawMovie {
                id: movie_id(&title),
                title,
                poster_url: poster(anchor, page_url),
                detail_url: Some(resolve_url(page_url, href)?.to_string()),
                ..RawMovie::default()
            };
            if !movies.iter().any(|m| m.id == movie.id) {
                movies.push(movie);
            }
        }
    }
    Ok(movies)
}

fn rating_from_image(img: ElementRef<'_>) -> Option<Rating> {
    let src = attr(img, "src")?;
    RATING_IMAGES
        .iter()
        .find(|(path, _)| src.trim_start_matches('/').ends_with(path))
        .map(|(_, rating)| *rating)
}

fn sidebar_rating(sidebar: ElementRef<'_>) -> Rating {
    sidebar
        .select(&IMG)
        .find_map(rating_from_image)
        .unwrap_or_default()
}

/// YouTube id between "embed/" and the query string.
fn trailer_from_embed(src: &str) -> Option<Trailer> {
    let start = src.find("embed/")? + "embed/".len();
    let end = src[start..].find('?').map_or(src.len(), |i| start + i);
    let id = &src[start..end];
    if id.is_empty() {
        return None;
    }
    Some(Trailer {
        id: id.to_string(),
        url: format!("https://www.youtube.com/watch?v={id}"),
    })
}

pub fn parse_movie(html: &str, url: &str) -> Result<RawMovie> {
    let doc = Html::parse_document(html);
    let root = first(doc.root_element(), &DETAIL, "movie detail container")?;

    let title = root.select(&H2).next().map(|h| fix_title(&text_trimmed(h))).unwrap_or_default();
    if title.is_empty() {
        return Err(Error::structure("couldn't find movie title"));
    }

    let mut movie = RawMovie {
        id: movie_id(&title),
        title,
        synopsis: root
            .select(&SYNOPSIS)
            .next()
            .map(text_trimmed)
            .filter(|s| !s.is_empty()),
        detail_url: Some(url.to_string()),
        ..RawMovie::default()
    };

    if let Some(sidebar) = root.select(&SIDEBAR).next() {
        for (i, child) in child_elements(sidebar).enumerate() {
            if i == 0 {
                movie.poster_url = poster(child, url);
                continue;
            }
            if movie.rating == Rating::Unrated
                && let Some(rating) = child.select(&IMG).find_map(rating_from_image)
            {
                movie.rating = rating;
            }
            if child.value().name() == "ul" {
                for li in child.select(&LI) {
                    read_fact(li, &mut movie);
                }
            }
        }
    }

    movie.trailer = root
        .select(&TRAILER)
        .next()
        .and_then(|iframe| attr(iframe, "src"))
        .and_then(trailer_from_embed);
    Ok(movie)
}

/// Sidebar facts are told apart by their icon.
fn read_fact(li: ElementRef<'_>, movie: &mut RawMovie) {
    let content = text_trimmed(li);
    if content.is_empty() {
        return;
    }
    let Some(icon) = li.select(&I).next() else {
        return;
    };
    if has_class(icon, "fa-check-square-o") {
        movie.genres.push(content);
    } else if has_class(icon, "fa-clock-o") {
        match digits(&content) {
            Some(runtime) => movie.runtime = Some(runtime),
            None => warn!(content, "couldn't read runtime"),
        }
    } else if has_class(icon, "fa-university") {
        movie.distributor = Some(content);
    }
}

/// Sessions of one movie from its detail page: every sidebar `h4` heads a
/// session list. Headings that can't be read are skipped.
pub fn parse_movie_sessions(
    html: &str,
    movie: &RawMovie,
    calendar: &Calendar,
) -> Result<Vec<RawSession>> {
    let doc = Html::parse_document(html);
    let mut sessions = SessionSet::new();
    let Some(sidebar) = doc.select(&SIDEBAR).next() else {
        warn!(title = %movie.title, "detail page without sidebar");
        return Ok(Vec::new());
    };

    let movie_ref = MovieRef {
        id: movie.id.clone(),
        title: movie.title.clone(),
        rating: match movie.rating {
            Rating::Unrated => sidebar_rating(sidebar),
            rating => rating,
        },
    };

    for heading in child_elements(sidebar).filter(|e| e.value().name() == "h4") {
        match expand_block(heading, &movie_ref, calendar, &mut sessions) {
            Ok(()) => {}
            Err(Error::UnexpectedStructure(reason)) => {
                warn!(title = %movie.title, reason, "skipping session block");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(sessions.into_vec())
}

pub fn parse_prices(html: &str) -> Result<Vec<Price>> {
    let doc = Html::parse_document(html);
    let rows: Vec<Vec<String>> = doc
        .select(&PRICE_ROWS)
        .map(|tr| tr.select(&TD).map(text_trimmed).collect())
        .collect();
    if rows.is_empty() {
        return Err(Error::structure("price table not found"));
    }
    Ok(weigh_prices(parse_price_table(&rows)))
}
