//! Runs a provider's schedule, resolves movies against the store and
//! replaces the theater's stored sessions.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use chrono::{DateTime, FixedOffset};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::calendar::Calendar;
use crate::error::{Error, Result};
use crate::fetch::PageSource;
use crate::normalize::{Movie, Normalizer, Session};
use crate::Provider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieFilter {
    ClaqueteIds(Vec<u32>),
    Slugs(Vec<String>),
}

impl MovieFilter {
    pub fn matches(&self, movie: &Movie) -> bool {
        match self {
            MovieFilter::ClaqueteIds(ids) => movie.claquete_id.is_some_and(|id| ids.contains(&id)),
            MovieFilter::Slugs(slugs) => slugs.contains(&movie.slug),
        }
    }
}

/// Where extracted sessions end up.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_sessions(&self, sessions: &[Session]) -> Result<()>;

    /// The theater's sessions starting within `range`.
    async fn sessions_in(
        &self,
        theater_id: &str,
        range: RangeInclusive<DateTime<FixedOffset>>,
    ) -> Result<Vec<Session>>;

    /// Deletes the theater's sessions starting within `range`, returning how
    /// many were removed.
    async fn delete_sessions(
        &self,
        theater_id: &str,
        range: RangeInclusive<DateTime<FixedOffset>>,
    ) -> Result<u64>;

    async fn get_movies(&self, filter: MovieFilter) -> Result<Vec<Movie>>;
}

/// A [`SessionStore`] kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<Vec<Session>>,
    movies: RwLock<Vec<Movie>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_movie(&self, movie: Movie) {
        self.movies.write().await.push(movie);
    }

    pub async fn sessions(&self) -> Vec<Session> {
        self.sessions.read().await.clone()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemoryStore {
    async fn insert_sessions(&self, sessions: &[Session]) -> Result<()> {
        self.sessions.write().await.extend_from_slice(sessions);
        Ok(())
    }

    async fn sessions_in(
        &self,
        theater_id: &str,
        range: RangeInclusive<DateTime<FixedOffset>>,
    ) -> Result<Vec<Session>> {
        Ok(self
            .sessions
            .read()
            .await
            .iter()
            .filter(|s| s.theater_id == theater_id && range.contains(&s.start_time))
            .cloned()
            .collect())
    }

    async fn delete_sessions(
        &self,
        theater_id: &str,
        range: RangeInclusive<DateTime<FixedOffset>>,
    ) -> Result<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| !(s.theater_id == theater_id && range.contains(&s.start_time)));
        Ok((before - sessions.len()) as u64)
    }

    async fn get_movies(&self, filter: MovieFilter) -> Result<Vec<Movie>> {
        Ok(self
            .movies
            .read()
            .await
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect())
    }
}

/// How a run compares with the previous one of the same theater.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    NotModified,
}

impl RunOutcome {
    pub fn compare(previous_hash: Option<&str>, hash: &str) -> Self {
        match previous_hash {
            Some(previous) if previous == hash => RunOutcome::NotModified,
            _ => RunOutcome::Success,
        }
    }
}

pub struct ScheduleExtractor<'a> {
    provider: &'a dyn Provider,
    store: &'a dyn SessionStore,
    normalizer: Normalizer,
    sessions: Vec<Session>,
}

impl<'a> ScheduleExtractor<'a> {
    pub fn new(provider: &'a dyn Provider, store: &'a dyn SessionStore, normalizer: Normalizer) -> Self {
        Self {
            provider,
            store,
            normalizer,
            sessions: Vec::new(),
        }
    }

    /// Scrapes the schedule and keeps it normalized, with movie ids resolved
    /// where the store knows the movie.
    #[tracing::instrument(skip_all, fields(provider = self.provider.name()))]
    pub async fn execute(&mut self, pages: &dyn PageSource, calendar: &Calendar) -> Result<()> {
        let schedule = self.provider.schedule(pages, calendar).await?;
        let mut sessions: Vec<Session> = schedule
            .sessions
            .iter()
            .map(|s| self.normalizer.session(s))
            .collect();

        let ids = self.lookup_movies(&sessions).await;
        for session in &mut sessions {
            session.movie_id = ids.get(&session.movie_slug).cloned();
        }
        debug!(
            resolved = sessions.iter().filter(|s| s.movie_id.is_some()).count(),
            total = sessions.len(),
            "movies resolved"
        );
        self.sessions = sessions;
        Ok(())
    }

    /// Store ids by movie slug, looked up by claquete id when the provider
    /// has one and by slug otherwise. Lookup failures leave movies
    /// unresolved.
    async fn lookup_movies(&self, sessions: &[Session]) -> HashMap<String, String> {
        let mut claquete: HashMap<u32, String> = HashMap::new();
        let mut slugs: Vec<String> = Vec::new();
        for s in sessions {
            match s.claquete_id {
                Some(id) => {
                    claquete.entry(id).or_insert_with(|| s.movie_slug.clone());
                }
                None if !s.movie_slug.is_empty() && !slugs.contains(&s.movie_slug) => {
                    slugs.push(s.movie_slug.clone());
                }
                None => {}
            }
        }

        let mut found = Vec::new();
        if !claquete.is_empty() {
            let filter = MovieFilter::ClaqueteIds(claquete.keys().copied().collect());
            match self.store.get_movies(filter).await {
                Ok(movies) => found.extend(movies),
                Err(e) => warn!(error = %e, "movie lookup by claquete id failed"),
            }
        }
        if !slugs.is_empty() {
            match self.store.get_movies(MovieFilter::Slugs(slugs)).await {
                Ok(movies) => found.extend(movies),
                Err(e) => warn!(error = %e, "movie lookup by slug failed"),
            }
        }

        let mut ids = HashMap::new();
        for movie in found {
            let Some(id) = movie.id else {
                continue;
            };
            // Sessions carry the slug of the scraped title, which may differ
            // from the stored one.
            let slug = movie
                .claquete_id
                .and_then(|c| claquete.get(&c).cloned())
                .unwrap_or(movie.slug);
            ids.insert(slug, id);
        }
        ids
    }

    /// Persists the extracted sessions on success: stored sessions of the
    /// theater between `now` (or the earliest start) and the latest start are
    /// replaced. Returns how many stored sessions were deleted.
    ///
    /// The range is read before deleting. If the insert fails, the old
    /// sessions are put back and the insert error is returned.
    pub async fn complete(&self, outcome: RunOutcome, now: DateTime<FixedOffset>) -> Result<u64> {
        if outcome == RunOutcome::NotModified {
            info!("schedule not modified");
            return Ok(0);
        }

        let (start, end) = self
            .sessions
            .iter()
            .fold((now, now), |(start, end), s| {
                (start.min(s.start_time), end.max(s.start_time))
            });
        let theater_id = self.normalizer.theater_id();
        let previous = self.store.sessions_in(theater_id, start..=end).await?;
        let deleted = self.store.delete_sessions(theater_id, start..=end).await?;
        if let Err(e) = self.store.insert_sessions(&self.sessions).await {
            warn!(error = %e, restored = previous.len(), "insert failed, restoring sessions");
            self.store.insert_sessions(&previous).await?;
            return Err(e);
        }
        info!(deleted, inserted = self.sessions.len(), "sessions replaced");
        Ok(deleted)
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Hex SHA-256 over the sessions' JSON, sorted so extraction order
    /// doesn't matter.
    pub fn extracted_hash(&self) -> Result<String> {
        let mut lines = self
            .sessions
            .iter()
            .map(|s| serde_json::to_string(s).map_err(|e| Error::Store(e.to_string())))
            .collect::<Result<Vec<_>>>()?;
        lines.sort();

        let mut hasher = Sha256::new();
        for line in &lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        Ok(hex::encode(hasher.finalize()))
    }

    pub fn extracted_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_outcome() {
        assert_eq!(RunOutcome::compare(None, "abc"), RunOutcome::Success);
        assert_eq!(RunOutcome::compare(Some("abd"), "abc"), RunOutcome::Success);
        assert_eq!(RunOutcome::compare(Some("abc"), "abc"), RunOutcome::NotModified);
    }

    #[tokio::test]
    async fn test_memory_store_delete_range() {
        use crate::model::{Auditorium, Format, Version};

        let at = |h: u32| {
            DateTime::parse_from_rfc3339(&format!("2019-02-14T{h:02}:00:00-02:00")).unwrap()
        };
        let session = |theater: &str, h: u32| Session {
            movie_id: None,
            movie_slug: "example".into(),
            claquete_id: Some(1),
            theater_id: theater.into(),
            format: Format::TwoD,
            version: Version::Dubbed,
            auditorium: Auditorium::default(),
            room: 1,
            time_zone: "America/Sao_Paulo".into(),
            start_time: at(h),
        };

        let store = MemoryStore::new();
        store
            .insert_sessions(&[session("a", 10), session("a", 14), session("a", 20), session("b", 14)])
            .await
            .unwrap();
        assert_eq!(store.sessions_in("a", at(12)..=at(20)).await.unwrap().len(), 2);
        let deleted = store.delete_sessions("a", at(12)..=at(20)).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.sessions().await.len(), 2);
    }
}
