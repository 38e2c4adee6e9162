use std::ops::RangeInclusive;

use chrono::{DateTime, FixedOffset, NaiveDate};
use showtime_scrape::extractor::{
    MemoryStore, MovieFilter, RunOutcome, ScheduleExtractor, SessionStore,
};
use showtime_scrape::model::{Auditorium, Format, MovieId, Version};
use showtime_scrape::normalize::{Movie, Normalizer, Session};
use showtime_scrape::{Calendar, CinemaisScraper, Error, RawMovie, Result, StaticPages};

const SCHEDULE_URL: &str = "http://cinemais.test/programacao/cinema.php?cc=34";

const PAGE: &str = r#"<html><body><div id="programacaoContainer"><div class="tableContainer"><div>
    <div class="disclaimer">A - Somente sábado (16/02)</div>
    <table>
      <tr><th>Sala</th><th>Filme</th><th>Censura</th><th>Horários</th></tr>
      <tr>
        <td>3</td>
        <td><a href="/filmes/filme.php?cf=123">Example</a></td>
        <td><img src="/img/ICO_12A_programacao.png"></td>
        <td>Dub. - 19h30,21h45A</td>
      </tr>
      <tr>
        <td>1</td>
        <td><a href="/filmes/filme.php?cf=456">Unknown Movie</a></td>
        <td><img src="/img/ICO_LIV_programacao.png"></td>
        <td>Leg. - 15h00</td>
      </tr>
    </table>
</div></div></div></body></html>"#;

fn calendar() -> Calendar {
    Calendar::fixed(
        chrono_tz::America::Sao_Paulo,
        NaiveDate::from_ymd_opt(2019, 2, 14).unwrap(),
    )
}

fn normalizer() -> Normalizer {
    Normalizer::new("cinemais-34", "America/Sao_Paulo")
}

fn stored(theater: &str, start: &str) -> Session {
    Session {
        movie_id: Some("old".into()),
        movie_slug: "old".into(),
        claquete_id: None,
        theater_id: theater.into(),
        format: Format::TwoD,
        version: Version::Dubbed,
        auditorium: Auditorium::default(),
        room: 9,
        time_zone: "America/Sao_Paulo".into(),
        start_time: DateTime::parse_from_rfc3339(start).unwrap(),
    }
}

async fn store() -> MemoryStore {
    let store = MemoryStore::new();
    let mut movie = normalizer().movie(&RawMovie {
        id: MovieId::Numeric(123),
        title: "Example".into(),
        ..RawMovie::default()
    });
    movie.id = Some("movie-123".into());
    store.add_movie(movie).await;

    store
        .insert_sessions(&[
            stored("cinemais-34", "2019-02-15T10:00:00-02:00"),
            stored("cinemais-34", "2019-03-01T10:00:00-03:00"),
            stored("ibicinemas", "2019-02-15T10:00:00-02:00"),
        ])
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn success_replaces_sessions_in_range() {
    let store = store().await;
    let scraper = CinemaisScraper::new("34").with_base_url("http://cinemais.test");
    let pages = StaticPages::new().with(SCHEDULE_URL, PAGE);
    let calendar = calendar();

    let mut extractor = ScheduleExtractor::new(&scraper, &store, normalizer());
    extractor.execute(&pages, &calendar).await.unwrap();
    assert_eq!(extractor.extracted_count(), 15);

    let resolved: Vec<_> = extractor
        .sessions()
        .iter()
        .filter(|s| s.movie_id.as_deref() == Some("movie-123"))
        .collect();
    assert_eq!(resolved.len(), 8);
    assert!(
        extractor
            .sessions()
            .iter()
            .filter(|s| s.claquete_id == Some(456))
            .all(|s| s.movie_id.is_none())
    );

    let hash = extractor.extracted_hash().unwrap();
    let outcome = RunOutcome::compare(Some("something else"), &hash);
    assert_eq!(outcome, RunOutcome::Success);

    let deleted = extractor
        .complete(outcome, calendar.start_of_today().unwrap())
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    let sessions = store.sessions().await;
    assert_eq!(sessions.len(), 17);
    assert_eq!(
        sessions.iter().filter(|s| s.theater_id == "cinemais-34").count(),
        16
    );
}

#[tokio::test]
async fn equal_hash_leaves_store_untouched() {
    let store = store().await;
    let scraper = CinemaisScraper::new("34").with_base_url("http://cinemais.test");
    let pages = StaticPages::new().with(SCHEDULE_URL, PAGE);
    let calendar = calendar();

    let mut first = ScheduleExtractor::new(&scraper, &store, normalizer());
    first.execute(&pages, &calendar).await.unwrap();
    let previous = first.extracted_hash().unwrap();

    let mut second = ScheduleExtractor::new(&scraper, &store, normalizer());
    second.execute(&pages, &calendar).await.unwrap();
    let hash = second.extracted_hash().unwrap();
    assert_eq!(hash, previous);
    assert_eq!(hash.len(), 64);

    let outcome = RunOutcome::compare(Some(&previous), &hash);
    assert_eq!(outcome, RunOutcome::NotModified);
    let deleted = second
        .complete(outcome, calendar.start_of_today().unwrap())
        .await
        .unwrap();
    assert_eq!(deleted, 0);
    assert_eq!(store.sessions().await.len(), 3);
}

/// Refuses inserts larger than `max` sessions.
struct CappedStore {
    inner: MemoryStore,
    max: usize,
}

#[async_trait::async_trait]
impl SessionStore for CappedStore {
    async fn insert_sessions(&self, sessions: &[Session]) -> Result<()> {
        if sessions.len() > self.max {
            return Err(Error::Store(format!("{} sessions over limit", sessions.len())));
        }
        self.inner.insert_sessions(sessions).await
    }

    async fn sessions_in(
        &self,
        theater_id: &str,
        range: RangeInclusive<DateTime<FixedOffset>>,
    ) -> Result<Vec<Session>> {
        self.inner.sessions_in(theater_id, range).await
    }

    async fn delete_sessions(
        &self,
        theater_id: &str,
        range: RangeInclusive<DateTime<FixedOffset>>,
    ) -> Result<u64> {
        self.inner.delete_sessions(theater_id, range).await
    }

    async fn get_movies(&self, filter: MovieFilter) -> Result<Vec<Movie>> {
        self.inner.get_movies(filter).await
    }
}

#[tokio::test]
async fn failed_insert_restores_previous_sessions() {
    let store = CappedStore {
        inner: store().await,
        max: 5,
    };
    let scraper = CinemaisScraper::new("34").with_base_url("http://cinemais.test");
    let pages = StaticPages::new().with(SCHEDULE_URL, PAGE);
    let calendar = calendar();

    let mut extractor = ScheduleExtractor::new(&scraper, &store, normalizer());
    extractor.execute(&pages, &calendar).await.unwrap();
    let err = extractor
        .complete(RunOutcome::Success, calendar.start_of_today().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Store(_)));

    let sessions = store.inner.sessions().await;
    assert_eq!(sessions.len(), 3);
    assert!(sessions.iter().all(|s| s.movie_slug == "old"));
}
