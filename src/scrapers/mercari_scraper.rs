use crate::request::{ScrapeRequest, Source};
use log::{info, warn};
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use std::time::Duration;
use thiserror::Error;

pub const SEARCH_BASE_URL: &str = "https://www.mercari.com/search/?keyword=";

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.4 Safari/605.1.15";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Unable to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} could not be completed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn html(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// One outbound GET. A non-2xx status is returned, not raised.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<HttpFetcher, FetchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(FetchError::Client)?;
        Ok(HttpFetcher { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let to_fetch_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, DESKTOP_USER_AGENT)
            .send()
            .map_err(to_fetch_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().map_err(to_fetch_error)?.to_vec();

        Ok(FetchedPage { status, body })
    }
}

pub fn build_search_url(keyword: &str) -> String {
    format!("{}{}", SEARCH_BASE_URL, urlencoding::encode(keyword))
}

pub fn target_url(request: &ScrapeRequest) -> String {
    match &request.source {
        Source::Url(url) => url.clone(),
        Source::Keyword(keyword) => build_search_url(keyword),
    }
}

pub fn fetch_listing_page(
    fetcher: &dyn PageFetcher,
    request: &ScrapeRequest,
) -> Result<FetchedPage, FetchError> {
    let url = target_url(request);
    info!("Fetching {}", url);

    let page = fetcher.fetch(&url)?;
    if page.is_success() {
        info!("Received {} ({} bytes)", page.status, page.body.len());
    } else {
        warn!(
            "{} responded with status {}, parsing the body anyway",
            url, page.status
        );
    }

    Ok(page)
}
