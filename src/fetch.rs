//! Page fetching, plus the bounded fan-out used for per-movie requests.

use std::collections::HashMap;
use std::future::Future;

use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode, header};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/143.0.0.0 Safari/537.36";

/// Something that turns a URL into an HTML body.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Live pages over HTTP.
pub struct HttpPages {
    client: Client,
    user_agent: String,
}

impl HttpPages {
    pub fn new(user_agent: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|source| Error::Fetch {
                url: String::new(),
                source,
            })?;
        Ok(Self::with_client(client, user_agent))
    }

    pub fn with_client(client: Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait::async_trait]
impl PageSource for HttpPages {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!(url, "fetching page");
        let fetch_error = |source| Error::Fetch {
            url: url.to_string(),
            source,
        };

        let resp = self
            .client
            .get(url)
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(fetch_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status,
            });
        }

        resp.text().await.map_err(fetch_error)
    }
}

/// Canned pages keyed by URL. Unknown URLs answer 404.
#[derive(Debug, Default, Clone)]
pub struct StaticPages {
    pages: HashMap<String, String>,
}

impl StaticPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(url, body);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<String>) {
        self.pages.insert(url.into(), body.into());
    }
}

#[async_trait::async_trait]
impl PageSource for StaticPages {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.pages.get(url).cloned().ok_or_else(|| Error::Status {
            url: url.to_string(),
            status: StatusCode::NOT_FOUND,
        })
    }
}

/// Runs `task` over `items` with at most `limit` in flight. Results keep the
/// order of `items`. The first error to complete is returned at once and the
/// tasks still running are dropped.
pub async fn fan_out<T, O, F, Fut>(items: Vec<T>, limit: usize, mut task: F) -> Result<Vec<O>>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<O>>,
{
    let mut done: Vec<(usize, O)> = stream::iter(items.into_iter().enumerate())
        .map(|(idx, item)| {
            let fut = task(item);
            async move { fut.await.map(|out| (idx, out)) }
        })
        .buffer_unordered(limit.max(1))
        .try_collect()
        .await?;
    done.sort_by_key(|(idx, _)| *idx);
    Ok(done.into_iter().map(|(_, out)| out).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_static_pages() {
        let pages = StaticPages::new().with("http://a/", "<html></html>");
        assert_eq!(pages.fetch("http://a/").await.unwrap(), "<html></html>");
        let err = pages.fetch("http://b/").await.unwrap_err();
        assert!(err.is_fetch());
    }

    #[tokio::test]
    async fn test_fan_out_keeps_order_and_bounds() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let out = fan_out((0..20u64).collect(), 3, |i| {
            let running = running.clone();
            let peak = peak.clone();
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20 - i)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(i * 2)
            }
        })
        .await
        .unwrap();

        assert_eq!(out, (0..20u64).map(|i| i * 2).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_fan_out_first_error_wins() {
        let result: Result<Vec<u32>> = fan_out(vec![1, 2, 3], 2, |i| async move {
            if i == 2 {
                Err(Error::NotFound(format!("item {i}")))
            } else {
                Ok(i)
            }
        })
        .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_fan_out_error_drops_slower_tasks() {
        let finished = Arc::new(AtomicUsize::new(0));
        let started = std::time::Instant::now();

        let result: Result<Vec<u64>> = fan_out(vec![0u64, 1, 2], 3, |i| {
            let finished = finished.clone();
            async move {
                match i {
                    1 => Err(Error::NotFound("item 1".into())),
                    _ => {
                        let ms = if i == 0 { 300 } else { 100 };
                        tokio::time::sleep(Duration::from_millis(ms)).await;
                        finished.fetch_add(1, Ordering::SeqCst);
                        Ok(i)
                    }
                }
            }
        })
        .await;

        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(started.elapsed() < Duration::from_millis(90));

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }
}
