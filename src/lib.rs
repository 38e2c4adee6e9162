//! Showtime scraping for Brazilian theater chains.
//!
//! Providers turn chain web pages into movies, dated sessions and ticket
//! prices. Parsing is synchronous over fetched page bodies; fetching goes
//! through a [`PageSource`] so providers run the same against live pages or
//! canned fixtures.

pub mod calendar;
pub mod cinemais;
pub mod config;
pub mod disclaimer;
pub mod dom;
pub mod error;
pub mod extractor;
pub mod fetch;
pub mod ibicinemas;
pub mod model;
pub mod normalize;
pub mod price;
pub mod schedule;
pub mod session_block;
pub mod text;

use tracing::warn;

pub use calendar::{Calendar, NowPlayingWeek};
pub use cinemais::CinemaisScraper;
pub use error::{Error, Result};
pub use fetch::{HttpPages, PageSource, StaticPages};
pub use ibicinemas::IbicinemasScraper;
pub use model::{MovieId, Price, RawMovie, RawSession, Record, Schedule};

/// What every theater chain provides. Each call performs its own fetches.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn now_playing(&self, pages: &dyn PageSource) -> Result<Vec<RawMovie>>;

    async fn upcoming(&self, pages: &dyn PageSource) -> Result<Vec<RawMovie>>;

    /// Sessions of the now-playing week that `calendar` falls in.
    async fn schedule(&self, pages: &dyn PageSource, calendar: &Calendar) -> Result<Schedule>;

    async fn prices(&self, pages: &dyn PageSource) -> Result<Vec<Price>>;

    /// One movie's detail page. Dates printed without a year fall in
    /// `calendar`'s current year.
    async fn movie(
        &self,
        pages: &dyn PageSource,
        calendar: &Calendar,
        id: &MovieId,
    ) -> Result<RawMovie>;
}

/// Replaces listing entries with their detail pages, at most `limit` at a
/// time. A movie whose detail page fails keeps its listing data.
pub async fn fill_details(
    provider: &dyn Provider,
    pages: &dyn PageSource,
    calendar: &Calendar,
    movies: Vec<RawMovie>,
    limit: usize,
) -> Result<Vec<RawMovie>> {
    fetch::fan_out(movies, limit, |listing| async move {
        match provider.movie(pages, calendar, &listing.id).await {
            Ok(mut detail) => {
                if detail.poster_url.is_none() {
                    detail.poster_url = listing.poster_url;
                }
                if detail.poster_urls.is_none() {
                    detail.poster_urls = listing.poster_urls;
                }
                if detail.release_date.is_none() {
                    detail.release_date = listing.release_date;
                }
                Ok(detail)
            }
            Err(e) => {
                warn!(provider = provider.name(), id = %listing.id, error = %e, "keeping listing data");
                Ok(listing)
            }
        }
    })
    .await
}
