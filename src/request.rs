use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_OUTPUT_PATH: &str = "output.csv";

/// Largest listing count a single page load can deliver.
pub const MAX_LIMIT: usize = 30;

/// Longest request timeout accepted, in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 600;

/// Raw, unvalidated input as it arrives from the command line.
#[derive(Default, Debug, Clone)]
pub struct RawArgs {
    pub url: Option<String>,
    pub searchstring: Option<String>,
    pub limit: Option<String>,
    pub write: Option<String>,
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    Keyword(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    pub source: Source,
    pub limit: Option<usize>,
    pub output_path: PathBuf,
    pub timeout: Option<Duration>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no source specified: provide either --url or --searchstring")]
    NoSource,

    #[error("ambiguous source: provide only one of --url or --searchstring, not both")]
    AmbiguousSource,

    #[error("invalid limit {found:?}: expected a whole number between 0 and {max}")]
    InvalidLimit { found: String, max: usize },

    #[error("invalid output path: --write must not be empty")]
    EmptyOutputPath,

    #[error("invalid timeout {found}: expected between 1 and {max} seconds")]
    InvalidTimeout { found: u64, max: u64 },
}

impl ScrapeRequest {
    pub fn resolve(args: RawArgs) -> Result<ScrapeRequest, ValidationError> {
        let source = match (args.url, args.searchstring) {
            (None, None) => return Err(ValidationError::NoSource),
            (Some(_), Some(_)) => return Err(ValidationError::AmbiguousSource),
            (Some(url), None) => Source::Url(url),
            (None, Some(keyword)) => Source::Keyword(keyword),
        };

        let limit = match args.limit {
            Some(raw) => Some(parse_limit(&raw)?),
            None => None,
        };

        let output_path = match args.write {
            Some(path) if path.is_empty() => return Err(ValidationError::EmptyOutputPath),
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_OUTPUT_PATH),
        };

        let timeout = match args.timeout {
            Some(secs) if secs == 0 || secs > MAX_TIMEOUT_SECS => {
                return Err(ValidationError::InvalidTimeout {
                    found: secs,
                    max: MAX_TIMEOUT_SECS,
                })
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        Ok(ScrapeRequest {
            source,
            limit,
            output_path,
            timeout,
        })
    }
}

fn parse_limit(raw: &str) -> Result<usize, ValidationError> {
    let invalid = || ValidationError::InvalidLimit {
        found: raw.to_string(),
        max: MAX_LIMIT,
    };

    // usize parsing accepts a leading '+', which is not a plain count
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    match raw.parse::<usize>() {
        Ok(limit) if limit <= MAX_LIMIT => Ok(limit),
        _ => Err(invalid()),
    }
}
