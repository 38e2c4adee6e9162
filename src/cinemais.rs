use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::calendar::Calendar;
use crate::dom::{
    attr, child_elements, first, next_element, query_param, resolve_url, text_trimmed,
    text_with_breaks, text_without_scripts,
};
use crate::error::{Error, Result};
use crate::fetch::PageSource;
use crate::model::{
    City, DisclaimerEntry, MovieId, Price, Promotion, RawMovie, Schedule, Theater,
};
use crate::normalize::{poster_urls, weigh_prices};
use crate::price::parse_label_block;
use crate::schedule::{SessionSet, container_disclaimer, extract_table, rating_from_icon};
use crate::text::{date_from_text, digits, month_from_text, split_trimmed};
use crate::Provider;

pub const BASE_URL: &str = "http://www.cinemais.com.br";

lazy_static! {
    static ref PREMIERES: Selector =
        Selector::parse("#indexContainer > div.estreiasContainer > div.estreiasContainerSide a")
            .expect("selector");
    static ref REMAINING: Selector =
        Selector::parse("#indexContainer > div.continuacaoContainer > ul li a").expect("selector");
    static ref UPCOMING: Selector =
        Selector::parse("#LancamentosContainer > div div.Poster").expect("selector");
    static ref DETAIL: Selector = Selector::parse("#filmeContainer").expect("selector");
    static ref SECTIONS: Selector = Selector::parse("#filmesContainer").expect("selector");
    static ref INFO_ROWS: Selector =
        Selector::parse("#filmes_conteudo > table tr").expect("selector");
    static ref SCHEDULE: Selector =
        Selector::parse("#programacaoContainer > div.tableContainer > div").expect("selector");
    static ref THEATERS: Selector =
        Selector::parse("#indexContainer > div.selectSpotProgramacao ul li").expect("selector");
    static ref CITIES: Selector = Selector::parse("#conteudo > div.Prog ul li").expect("selector");
    static ref PROMOTION: Selector = Selector::parse("#promoContainer").expect("selector");
    static ref PROMOTION_ITEMS: Selector =
        Selector::parse("div.promoList > div.promoInfo").expect("selector");
    static ref BODY: Selector = Selector::parse("body").expect("selector");
    static ref A: Selector = Selector::parse("a").expect("selector");
    static ref H1: Selector = Selector::parse("h1").expect("selector");
    static ref H5: Selector = Selector::parse("h5").expect("selector");
    static ref SMALL: Selector = Selector::parse("small").expect("selector");
    static ref TD: Selector = Selector::parse("td").expect("selector");
    static ref IMG: Selector = Selector::parse("img").expect("selector");
    static ref P: Selector = Selector::parse("p").expect("selector");
}

/// Scraper for the Cinemais chain. Schedules and prices belong to a single
/// theater, selected by its cinema code.
pub struct CinemaisScraper {
    base_url: String,
    cinema_code: String,
}

impl CinemaisScraper {
    pub fn new(cinema_code: impl Into<String>) -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            cinema_code: cinema_code.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn code(&self) -> Result<&str> {
        let code = self.cinema_code.trim();
        if code.is_empty() {
            return Err(Error::NoCinemaCode);
        }
        Ok(code)
    }

    pub fn movie_url(&self, id: u32) -> String {
        format!("{}/filmes/filme.php?cf={id}", self.base_url)
    }

    pub fn schedule_url(&self) -> Result<String> {
        Ok(format!("{}/programacao/cinema.php?cc={}", self.base_url, self.code()?))
    }

    pub fn prices_url(&self) -> Result<String> {
        Ok(format!(
            "{}/programacao/ingresso_velox.php?cc={}",
            self.base_url,
            self.code()?
        ))
    }

    #[tracing::instrument(skip_all, fields(provider = "cinemais"))]
    pub async fn theaters(&self, pages: &dyn PageSource) -> Result<Vec<Theater>> {
        let body = pages.fetch(&format!("{}/programacao", self.base_url)).await?;
        parse_theaters(&body)
    }

    /// Footnotes published with this week's schedule.
    #[tracing::instrument(skip_all, fields(provider = "cinemais", cinema_code = %self.cinema_code))]
    pub async fn disclaimers(
        &self,
        pages: &dyn PageSource,
        calendar: &Calendar,
    ) -> Result<Vec<DisclaimerEntry>> {
        let body = pages.fetch(&self.schedule_url()?).await?;
        parse_disclaimers(&body, calendar)
    }

    #[tracing::instrument(skip_all, fields(provider = "cinemais"))]
    pub async fn cities(&self, pages: &dyn PageSource) -> Result<Vec<City>> {
        let body = pages.fetch(&self.base_url).await?;
        parse_cities(&body)
    }

    /// Current promotions, one page fetch per promotion. Pages missing an
    /// id, name or description are skipped.
    #[tracing::instrument(skip_all, fields(provider = "cinemais"))]
    pub async fn promotions(&self, pages: &dyn PageSource) -> Result<Vec<Promotion>> {
        let url = format!("{}/promocoes", self.base_url);
        let body = pages.fetch(&url).await?;

        let mut promotions: Vec<Promotion> = Vec::new();
        for link in parse_promotion_links(&body, &url)? {
            let body = pages.fetch(&link).await?;
            match parse_promotion(&body, &link) {
                Ok(p) => {
                    if !promotions.iter().any(|e| e.id == p.id && e.name == p.name) {
                        promotions.push(p);
                    }
                }
                Err(e) => warn!(url = %link, error = %e, "skipping promotion"),
            }
        }
        info!(count = promotions.len(), "promotions");
        Ok(promotions)
    }
}

#[async_trait::async_trait]
impl Provider for CinemaisScraper {
    fn name(&self) -> &'static str {
        "cinemais"
    }

    #[tracing::instrument(skip_all, fields(provider = "cinemais"))]
    async fn now_playing(&self, pages: &dyn PageSource) -> Result<Vec<RawMovie>> {
        let url = format!("{}/programacao", self.base_url);
        let body = pages.fetch(&url).await?;
        let movies = parse_now_playing(&body, &url)?;
        info!(count = movies.len(), "now playing");
        Ok(movies)
    }

    #[tracing::instrument(skip_all, fields(provider = "cinemais"))]
    async fn upcoming(&self, pages: &dyn PageSource) -> Result<Vec<RawMovie>> {
        let url = format!("{}/proximos_lancamentos", self.base_url);
        let body = pages.fetch(&url).await?;
        let movies = parse_upcoming(&body, &url)?;
        info!(count = movies.len(), "upcoming");
        Ok(movies)
    }

    #[tracing::instrument(skip_all, fields(provider = "cinemais", cinema_code = %self.cinema_code))]
    async fn schedule(&self, pages: &dyn PageSource, calendar: &Calendar) -> Result<Schedule> {
        let url = self.schedule_url()?;
        let body = pages.fetch(&url).await?;
        let schedule = parse_schedule(&body, calendar)?;
        info!(sessions = schedule.sessions.len(), "schedule extracted");
        Ok(schedule)
    }

    #[tracing::instrument(skip_all, fields(provider = "cinemais", cinema_code = %self.cinema_code))]
    async fn prices(&self, pages: &dyn PageSource) -> Result<Vec<Price>> {
        let url = self.prices_url()?;
        let body = pages.fetch(&url).await?;
        parse_prices(&body)
    }

    #[tracing::instrument(skip_all, fields(provider = "cinemais", %id))]
    async fn movie(
        &self,
        pages: &dyn PageSource,
        calendar: &Calendar,
        id: &MovieId,
    ) -> Result<RawMovie> {
        let MovieId::Numeric(id) = id else {
            return Err(Error::value("cinemais movie id", id.to_string()));
        };
        let url = self.movie_url(*id);
        let body = pages.fetch(&url).await?;
        parse_movie(&body, *id, &url, calendar.today().year())
    }
}

/// Listing anchors carry the id in `?cf=` and the title in `title`.
fn listing_movie(anchor: ElementRef<'_>, page_url: &str) -> Result<RawMovie> {
    let href = attr(anchor, "href").ok_or_else(|| Error::structure("movie link without href"))?;
    let id: u32 = query_param(href, "cf")
        .and_then(|cf| cf.trim().parse().ok())
        .ok_or_else(|| Error::value("movie id", href))?;
    let title = attr(anchor, "title")
        .map(str::to_string)
        .or_else(|| Some(text_trimmed(anchor)).filter(|t| !t.is_empty()))
        .ok_or_else(|| Error::structure(format!("movie link '{href}' without title")))?;

    Ok(RawMovie {
        id: MovieId::Numeric(id),
        title,
        detail_url: Some(resolve_url(page_url, href)?.to_string()),
        poster_urls: Some(poster_urls(id)),
        ..RawMovie::default()
    })
}

fn push_unique(movies: &mut Vec<RawMovie>, movie: RawMovie) {
    if !movies.iter().any(|m| m.id == movie.id) {
        movies.push(movie);
    }
}

pub fn parse_now_playing(html: &str, page_url: &str) -> Result<Vec<RawMovie>> {
    let doc = Html::parse_document(html);
    let mut movies = Vec::new();
    for anchor in doc.select(&PREMIERES).chain(doc.select(&REMAINING)) {
        push_unique(&mut movies, listing_movie(anchor, page_url)?);
    }
    Ok(movies)
}

pub fn parse_upcoming(html: &str, page_url: &str) -> Result<Vec<RawMovie>> {
    let doc = Html::parse_document(html);
    let mut movies = Vec::new();
    for item in doc.select(&UPCOMING) {
        let anchor = first(item, &A, "upcoming movie link")?;
        let mut movie = listing_movie(anchor, page_url)?;
        if let Some(h5) = item.select(&H5).next() {
            let title = text_trimmed(h5);
            if !title.is_empty() {
                movie.title = title;
            }
        }
        let release = item.select(&SMALL).next().map(text_trimmed).unwrap_or_default();
        movie.release_date = Some(parse_upcoming_date(&release)?);
        push_unique(&mut movies, movie);
    }
    Ok(movies)
}

/// "21 de fevereiro de 2019"
pub fn parse_upcoming_date(text: &str) -> Result<NaiveDate> {
    let parts: Vec<&str> = text.split(" de ").map(str::trim).collect();
    let [day, month, year] = parts.as_slice() else {
        return Err(Error::value("release date", text));
    };
    let day: u32 = day.parse().map_err(|_| Error::value("release day", text))?;
    let year: i32 = year.parse().map_err(|_| Error::value("release year", text))?;
    NaiveDate::from_ymd_opt(year, month_from_text(month)?, day)
        .ok_or_else(|| Error::value("release date", text))
}

pub fn parse_movie(html: &str, id: u32, url: &str, year: i32) -> Result<RawMovie> {
    let doc = Html::parse_document(html);
    let root = first(doc.root_element(), &DETAIL, "movie detail container")?;

    let title = text_trimmed(first(root, &H1, "movie title")?);
    if title.is_empty() {
        return Err(Error::structure("empty movie title"));
    }

    // "(Original Title, 2019)"
    let small = text_trimmed(first(root, &SMALL, "original title")?);
    let original_title = small
        .strip_prefix('(')
        .and_then(|s| s.rfind(',').map(|end| s[..end].trim().to_string()))
        .ok_or_else(|| Error::value("original title", small.as_str()))?;

    let mut movie = RawMovie {
        id: MovieId::Numeric(id),
        title,
        original_title: Some(original_title),
        detail_url: Some(url.to_string()),
        poster_urls: Some(poster_urls(id)),
        ..RawMovie::default()
    };

    if let Some(sections) = root.select(&SECTIONS).next() {
        for h3 in child_elements(sections).filter(|e| e.value().name() == "h3") {
            let label = text_trimmed(h3).to_lowercase();
            let content = next_element(h3).map(text_trimmed).unwrap_or_default();
            if label == "sinopse" {
                movie.synopsis = Some(content).filter(|c| !c.is_empty());
                continue;
            }
            let names = people(&content);
            match label.as_str() {
                "elenco" => movie.cast = names,
                "roteiro" => movie.screenplay = names,
                "produção executiva" => movie.executive_production = names,
                "produção" => movie.production = names,
                "direção" => movie.direction = names,
                _ => debug!(label, "unknown movie section"),
            }
        }
    }

    parse_info_table(root, &mut movie, year);
    Ok(movie)
}

fn people(content: &str) -> Vec<String> {
    let content = content
        .replace("Vozes de:", "")
        .replace('\n', " ");
    let content = content.trim_matches(|c: char| c.is_whitespace() || c == ',');
    if content.is_empty() {
        return Vec::new();
    }
    split_trimmed(content, ", ")
}

/// The info table has a label row and a value row. A rating icon cell may
/// span both rows, shifting the values one column left.
fn parse_info_table(root: ElementRef<'_>, movie: &mut RawMovie, year: i32) {
    let rows: Vec<ElementRef> = root.select(&INFO_ROWS).collect();
    let (Some(labels), Some(values)) = (rows.first(), rows.last()) else {
        return;
    };
    let labels: Vec<ElementRef> = labels.select(&TD).collect();
    let values: Vec<String> = values.select(&TD).map(text_trimmed).collect();
    let offset = labels.len().saturating_sub(values.len());

    for (i, cell) in labels.iter().enumerate() {
        let label = text_trimmed(*cell);
        let value = i
            .checked_sub(offset)
            .and_then(|j| values.get(j))
            .cloned()
            .unwrap_or_default();
        match label.as_str() {
            "País" => movie.country = Some(value).filter(|v| !v.is_empty()),
            "Gênero" => movie.genres = split_trimmed(&value, ", "),
            "Duração" => match digits(&value) {
                Some(runtime) => movie.runtime = Some(runtime),
                None => warn!(value, "couldn't read runtime"),
            },
            "Lançamento Nacional" if !value.is_empty() => {
                match date_from_text(&value, '/', year) {
                    Ok(date) => movie.release_date = Some(date),
                    Err(e) => warn!(value, error = %e, "couldn't read release date"),
                }
            }
            "Distribuição" => movie.distributor = Some(value).filter(|v| !v.is_empty()),
            _ => {
                if let Some(img) = cell.select(&IMG).next() {
                    match rating_from_icon(img) {
                        Ok(rating) => movie.rating = rating,
                        Err(e) => warn!(error = %e, "couldn't read rating"),
                    }
                }
            }
        }
    }
}

pub fn parse_schedule(html: &str, calendar: &Calendar) -> Result<Schedule> {
    let doc = Html::parse_document(html);
    let mut sessions = SessionSet::new();
    let mut containers = 0;
    for container in doc.select(&SCHEDULE) {
        extract_table(container, calendar, &mut sessions)?;
        containers += 1;
    }
    if containers == 0 {
        return Err(Error::structure("schedule container not found"));
    }
    Ok(Schedule {
        week: calendar.now_playing_week(),
        sessions: sessions.into_vec(),
    })
}

/// Footnotes of every schedule container, ordered by letter.
pub fn parse_disclaimers(html: &str, calendar: &Calendar) -> Result<Vec<DisclaimerEntry>> {
    let doc = Html::parse_document(html);
    let week = calendar.now_playing_week();
    let mut entries: Vec<DisclaimerEntry> = Vec::new();
    for container in doc.select(&SCHEDULE) {
        for (_, entry) in container_disclaimer(container, &week)? {
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        }
    }
    entries.sort_by_key(|e| e.letter);
    Ok(entries)
}

pub fn parse_prices(html: &str) -> Result<Vec<Price>> {
    let doc = Html::parse_document(html);
    let body = first(doc.root_element(), &BODY, "price page body")?;
    Ok(weigh_prices(parse_label_block(&text_with_breaks(body))?))
}

/// "<name> - <UF>" or "<label> - <city> - <UF>".
fn split_city(text: &str) -> Option<City> {
    let parts: Vec<&str> = text.split(" - ").map(str::trim).collect();
    let (name, uf) = match parts.as_slice() {
        [name, uf] => (*name, *uf),
        [_, name, uf] => (*name, *uf),
        _ => return None,
    };
    let city = City {
        name: name.to_string(),
        federative_unit: uf.to_string(),
    };
    city.is_valid().then_some(city)
}

pub fn parse_theaters(html: &str) -> Result<Vec<Theater>> {
    let doc = Html::parse_document(html);
    let mut theaters: Vec<Theater> = Vec::new();
    for li in doc.select(&THEATERS) {
        let id = attr(li, "id").ok_or_else(|| Error::NotFound("theater id".into()))?;
        let id: u32 = id.parse().map_err(|_| Error::value("theater id", id))?;

        let text = text_without_scripts(li);
        let label = text.split(" - ").next().unwrap_or_default().trim();
        let theater = split_city(&text).map(|city| Theater {
            id,
            name: format!("Cinemais {label}"),
            city,
        });
        match theater {
            Some(t) if t.is_valid() => {
                if !theaters.contains(&t) {
                    theaters.push(t);
                }
            }
            _ => return Err(Error::NotFound(format!("theater information in '{text}'"))),
        }
    }
    Ok(theaters)
}

pub fn parse_cities(html: &str) -> Result<Vec<City>> {
    let doc = Html::parse_document(html);
    let mut cities: Vec<City> = Vec::new();
    for li in doc.select(&CITIES) {
        let text = text_without_scripts(li);
        let city = split_city(&text)
            .ok_or_else(|| Error::NotFound(format!("city information in '{text}'")))?;
        if !cities.contains(&city) {
            cities.push(city);
        }
    }
    Ok(cities)
}

pub fn parse_promotion_links(html: &str, page_url: &str) -> Result<Vec<String>> {
    let doc = Html::parse_document(html);
    let container = first(doc.root_element(), &PROMOTION, "promotion container")?;
    let mut links = Vec::new();
    for item in container.select(&PROMOTION_ITEMS) {
        let Some(href) = item.select(&A).next().and_then(|a| attr(a, "href")) else {
            debug!("promotion without link");
            continue;
        };
        let link = resolve_url(page_url, href)?.to_string();
        if !links.contains(&link) {
            links.push(link);
        }
    }
    Ok(links)
}

/// The id comes from the `cp` parameter of the page URL. The name is quoted
/// inside the heading.
pub fn parse_promotion(html: &str, url: &str) -> Result<Promotion> {
    let doc = Html::parse_document(html);
    let root = first(doc.root_element(), &PROMOTION, "promotion container")?;
    let id: u32 = query_param(url, "cp")
        .and_then(|cp| cp.trim().parse().ok())
        .ok_or_else(|| Error::value("promotion id", url))?;

    let heading = root.select(&H1).next().map(text_trimmed).unwrap_or_default();
    let name = match heading.split('"').collect::<Vec<_>>().as_slice() {
        [_, quoted, _] => quoted.trim().to_string(),
        _ => {
            debug!(heading, "promotion name without quotes");
            heading.clone()
        }
    };

    let image = root
        .select(&IMG)
        .next()
        .and_then(|img| attr(img, "src"))
        .and_then(|src| resolve_url(url, src).ok())
        .map(|u| u.to_string());

    let paragraphs: Vec<String> = root
        .select(&P)
        .filter(|p| attr(*p, "style").is_none())
        .map(text_trimmed)
        .filter(|t| !t.is_empty())
        .collect();
    let limited = paragraphs
        .iter()
        .any(|t| t.contains("é válida por tempo indeterminado"));

    let promotion = Promotion {
        id,
        name,
        description: paragraphs.join("\n"),
        image,
        limited,
    };
    if !promotion.is_valid() {
        return Err(Error::NotFound(format!("promotion information on {url}")));
    }
    Ok(promotion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rating;

    #[test]
    fn test_now_playing_dedups_by_id() {
        let html = r#"<html><body><div id="indexContainer">
            <div class="estreiasContainer"><div class="estreiasContainerSide">
              <a href="filmes/filme.php?cf=10" title="Capitã Marvel"><img src="p.jpg"></a>
              <a href="filmes/filme.php?cf=11" title="Alita"><img src="p.jpg"></a>
            </div></div>
            <div class="continuacaoContainer"><ul>
              <li><a href="filmes/filme.php?cf=11" title="Alita">Alita</a></li>
              <li><a href="filmes/filme.php?cf=12" title="Dumbo">Dumbo</a></li>
            </ul></div>
        </div></body></html>"#;
        let movies = parse_now_playing(html, "http://www.cinemais.com.br/programacao").unwrap();
        let ids: Vec<_> = movies.iter().map(|m| m.id.clone()).collect();
        assert_eq!(
            ids,
            vec![MovieId::Numeric(10), MovieId::Numeric(11), MovieId::Numeric(12)]
        );
        assert_eq!(
            movies[0].detail_url.as_deref(),
            Some("http://www.cinemais.com.br/filmes/filme.php?cf=10")
        );
        assert!(movies[0].poster_urls.is_some());
    }

    #[test]
    fn test_upcoming_date() {
        assert_eq!(
            parse_upcoming_date("21 de Fevereiro de 2019").unwrap(),
            NaiveDate::from_ymd_opt(2019, 2, 21).unwrap()
        );
        assert!(parse_upcoming_date("Em breve").is_err());
    }

    #[test]
    fn test_movie_detail() {
        let html = r#"<html><body><div id="filmeContainer">
            <h1>Como Treinar o Seu Dragão 3</h1>
            <small>(How to Train Your Dragon: The Hidden World, 2019)</small>
            <div id="filmesContainer">
              <h3>Sinopse</h3><p>Soluço e Banguela.</p>
              <h3>Elenco</h3><p>Vozes de: Jay Baruchel, America Ferrera, </p>
              <h3>Direção</h3><p>Dean DeBlois</p>
            </div>
            <div id="filmes_conteudo"><table>
              <tr><td rowspan="2"><img src="/img/ICO_LIV_programacao_GR.png"></td><td>País</td><td>Gênero</td><td>Duração</td><td>Lançamento Nacional</td><td>Distribuição</td></tr>
              <tr><td>EUA</td><td>Animação, Aventura</td><td>104 min</td><td>17/01/2019</td><td>Universal</td></tr>
            </table></div>
        </div></body></html>"#;
        let movie = parse_movie(html, 7, "http://x/filmes/filme.php?cf=7", 2019).unwrap();
        assert_eq!(movie.title, "Como Treinar o Seu Dragão 3");
        assert_eq!(
            movie.original_title.as_deref(),
            Some("How to Train Your Dragon: The Hidden World")
        );
        assert_eq!(movie.synopsis.as_deref(), Some("Soluço e Banguela."));
        assert_eq!(movie.cast, vec!["Jay Baruchel", "America Ferrera"]);
        assert_eq!(movie.direction, vec!["Dean DeBlois"]);
        assert_eq!(movie.country.as_deref(), Some("EUA"));
        assert_eq!(movie.genres, vec!["Animação", "Aventura"]);
        assert_eq!(movie.runtime, Some(104));
        assert_eq!(movie.release_date, NaiveDate::from_ymd_opt(2019, 1, 17));
        assert_eq!(movie.distributor.as_deref(), Some("Universal"));
        assert_eq!(movie.rating, Rating::Free);

        let short = html.replace("17/01/2019", "21/03");
        let movie = parse_movie(&short, 7, "http://x/filmes/filme.php?cf=7", 2024).unwrap();
        assert_eq!(movie.release_date, NaiveDate::from_ymd_opt(2024, 3, 21));
    }

    #[test]
    fn test_theaters_and_cities() {
        let html = r#"<html><body><div id="indexContainer"><div class="selectSpotProgramacao"><ul>
            <li id="34">Montes Claros - MG<script>x()</script></li>
            <li id="12">Shopping - Uberaba - MG</li>
        </ul></div></div></body></html>"#;
        let theaters = parse_theaters(html).unwrap();
        assert_eq!(theaters.len(), 2);
        assert_eq!(theaters[0].name, "Cinemais Montes Claros");
        assert_eq!(theaters[0].city.federative_unit, "MG");
        assert_eq!(theaters[1].name, "Cinemais Shopping");
        assert_eq!(theaters[1].city.name, "Uberaba");

        let bad = r#"<div id="indexContainer"><div class="selectSpotProgramacao"><ul>
            <li id="1">Lugar - XX</li></ul></div></div>"#;
        assert!(matches!(parse_theaters(bad), Err(Error::NotFound(_))));

        let cities = r#"<div id="conteudo"><div class="Prog"><ul>
            <li>Patos de Minas - MG</li><li>Patos de Minas - MG</li><li>Anápolis - GO</li>
        </ul></div></div>"#;
        let cities = parse_cities(cities).unwrap();
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[1].name, "Anápolis");
    }

    #[test]
    fn test_missing_cinema_code() {
        let scraper = CinemaisScraper::new(" ");
        assert!(matches!(scraper.schedule_url(), Err(Error::NoCinemaCode)));
        assert!(matches!(scraper.prices_url(), Err(Error::NoCinemaCode)));
    }
}
