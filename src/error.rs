use reqwest::StatusCode;

/// Everything that can go wrong while fetching or parsing a provider page.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} for {url}")]
    Status { url: String, status: StatusCode },

    #[error("unexpected DOM structure: {0}")]
    UnexpectedStructure(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("cinema code was not defined")]
    NoCinemaCode,

    #[error("couldn't parse {what} from '{text}'")]
    Value { what: &'static str, text: String },

    #[error("session references undefined footnote '{0}'")]
    UndefinedFootnote(char),

    #[error("store error: {0}")]
    Store(String),
}

impl Error {
    pub(crate) fn structure(msg: impl Into<String>) -> Self {
        Error::UnexpectedStructure(msg.into())
    }

    pub(crate) fn value(what: &'static str, text: impl Into<String>) -> Self {
        Error::Value {
            what,
            text: text.into(),
        }
    }

    /// True for failures that happened before any parsing took place.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Error::Fetch { .. } | Error::Status { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
