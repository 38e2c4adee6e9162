use clap::Parser;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use showtime_scrape::config::{Cli, Command, ProviderKind, Settings};
use showtime_scrape::extractor::{MemoryStore, RunOutcome, ScheduleExtractor};
use showtime_scrape::model::Record;
use showtime_scrape::normalize::Normalizer;
use showtime_scrape::{Error, HttpPages, MovieId, PageSource, Provider, Result, fill_details};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    let line = serde_json::to_string(value).map_err(|e| Error::Store(e.to_string()))?;
    println!("{line}");
    Ok(())
}

fn emit_all(records: impl IntoIterator<Item = Record>) -> Result<()> {
    for record in records {
        tracing::debug!(record = %record.summary());
        emit(&record)?;
    }
    Ok(())
}

fn parse_id(provider: ProviderKind, id: &str) -> Result<MovieId> {
    match provider {
        ProviderKind::Cinemais => id
            .trim()
            .parse()
            .map(MovieId::Numeric)
            .map_err(|_| Error::Value {
                what: "cinemais movie id",
                text: id.to_string(),
            }),
        ProviderKind::Ibicinemas => Ok(MovieId::Slug(id.trim().to_string())),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings: Settings = cli.settings;
    let pages = HttpPages::new(settings.user_agent.clone())?;
    let cinemais = settings.cinemais();
    let ibicinemas = settings.ibicinemas();
    let provider: &dyn Provider = match cli.provider {
        ProviderKind::Cinemais => &cinemais,
        ProviderKind::Ibicinemas => &ibicinemas,
    };
    let pages: &dyn PageSource = &pages;

    match cli.command {
        Command::NowPlaying { details } => {
            let mut movies = provider.now_playing(pages).await?;
            if details {
                movies = fill_details(provider, pages, &settings.calendar(), movies, settings.concurrency).await?;
            }
            emit_all(movies.into_iter().map(Record::Movie))
        }
        Command::Upcoming => emit_all(provider.upcoming(pages).await?.into_iter().map(Record::Movie)),
        Command::Movie { id } => {
            let id = parse_id(cli.provider, &id)?;
            let movie = provider.movie(pages, &settings.calendar(), &id).await?;
            emit_all([Record::Movie(movie)])
        }
        Command::Prices => emit_all(provider.prices(pages).await?.into_iter().map(Record::Price)),
        Command::Schedule { previous_hash } => {
            let calendar = settings.calendar();
            let store = MemoryStore::new();
            let normalizer = Normalizer::new(
                settings.theater_id(cli.provider),
                settings.timezone.name(),
            );
            let mut extractor = ScheduleExtractor::new(provider, &store, normalizer);
            extractor.execute(pages, &calendar).await?;

            let hash = extractor.extracted_hash()?;
            info!(hash, count = extractor.extracted_count(), "schedule extracted");
            // Nothing is persisted here; an unchanged hash prints nothing.
            match RunOutcome::compare(previous_hash.as_deref(), &hash) {
                RunOutcome::NotModified => info!("schedule not modified"),
                RunOutcome::Success => {
                    for session in extractor.sessions() {
                        emit(session)?;
                    }
                }
            }
            Ok(())
        }
        Command::Theaters | Command::Cities | Command::Disclaimers | Command::Promotions
            if cli.provider != ProviderKind::Cinemais =>
        {
            Err(Error::NotFound(format!("command not available for {}", provider.name())))
        }
        Command::Theaters => emit_all(cinemais.theaters(pages).await?.into_iter().map(Record::Theater)),
        Command::Cities => emit_all(cinemais.cities(pages).await?.into_iter().map(Record::City)),
        Command::Disclaimers => {
            let entries = cinemais.disclaimers(pages, &settings.calendar()).await?;
            emit_all(entries.into_iter().map(Record::Disclaimer))
        }
        Command::Promotions => emit_all(cinemais.promotions(pages).await?.into_iter().map(Record::Promotion)),
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!(error = %e, "scrape failed");
        std::process::exit(1);
    }
}
