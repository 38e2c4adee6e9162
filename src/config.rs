//! Command line and environment configuration.

use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::calendar::Calendar;
use crate::fetch::DEFAULT_USER_AGENT;
use crate::{CinemaisScraper, IbicinemasScraper, cinemais, ibicinemas};

#[derive(Debug, Parser)]
#[command(name = "showtime-scrape", version, about = "Scrapes Brazilian theater showtimes")]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[arg(value_enum)]
    pub provider: ProviderKind,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// IANA time zone the theaters publish local times in
    #[arg(long, global = true, env = "SHOWTIME_TIMEZONE", default_value = "America/Sao_Paulo", value_parser = parse_tz)]
    pub timezone: Tz,

    /// Detail pages fetched at once
    #[arg(long, global = true, env = "SHOWTIME_CONCURRENCY", default_value_t = 8)]
    pub concurrency: usize,

    #[arg(long, global = true, env = "SHOWTIME_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    #[arg(long, global = true, env = "SHOWTIME_CINEMAIS_URL", default_value = cinemais::BASE_URL)]
    pub cinemais_url: String,

    /// Cinemais theater whose schedule and prices are scraped
    #[arg(long, global = true, env = "SHOWTIME_CINEMA_CODE", default_value = "34")]
    pub cinema_code: String,

    #[arg(long, global = true, env = "SHOWTIME_IBICINEMAS_URL", default_value = ibicinemas::BASE_URL)]
    pub ibicinemas_url: String,
}

fn parse_tz(s: &str) -> Result<Tz, String> {
    s.parse::<Tz>().map_err(|e| format!("unknown time zone '{s}': {e}"))
}

impl Settings {
    pub fn calendar(&self) -> Calendar {
        Calendar::now(self.timezone)
    }

    pub fn cinemais(&self) -> CinemaisScraper {
        CinemaisScraper::new(self.cinema_code.clone()).with_base_url(self.cinemais_url.clone())
    }

    pub fn ibicinemas(&self) -> IbicinemasScraper {
        IbicinemasScraper::new()
            .with_base_url(self.ibicinemas_url.clone())
            .with_concurrency(self.concurrency)
    }

    /// Theater the normalized sessions are stored under.
    pub fn theater_id(&self, provider: ProviderKind) -> String {
        match provider {
            ProviderKind::Cinemais => format!("cinemais-{}", self.cinema_code.trim()),
            ProviderKind::Ibicinemas => "ibicinemas".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    Cinemais,
    Ibicinemas,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Movies playing this week
    NowPlaying {
        /// Also fetch every movie's detail page
        #[arg(long)]
        details: bool,
    },
    Upcoming,
    /// One movie's detail page
    Movie { id: String },
    /// Sessions of the current now-playing week
    Schedule {
        /// Hash of the previous run; an equal hash skips storing
        #[arg(long)]
        previous_hash: Option<String>,
    },
    Prices,
    /// Cinemais theaters
    Theaters,
    /// Cinemais cities
    Cities,
    /// Footnotes of the Cinemais schedule
    Disclaimers,
    /// Cinemais promotions
    Promotions,
}
