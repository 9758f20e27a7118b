use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

mod parsers;
mod request;
mod scrapers;
mod writers;

use parsers::mercari_parser::{parse_listings, MarkupSignature};
use request::{RawArgs, ScrapeRequest};
use scrapers::mercari_scraper::{fetch_listing_page, FetchError, HttpFetcher, PageFetcher};
use writers::csv_writer::write_records;

/// Collect data on Mercari products by providing a URL or search string.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The url of the Mercari search results to parse
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,

    /// The search string to enter into Mercari's search bar
    #[arg(short, long, value_name = "KEYWORDS")]
    searchstring: Option<String>,

    /// The upper limit on how many entries should be collected (0-30)
    #[arg(short, long, value_name = "COUNT", allow_hyphen_values = true)]
    limit: Option<String>,

    /// The file to write results to
    #[arg(short, long, value_name = "FILE PATH")]
    write: Option<String>,

    /// Give up on the request after this many seconds (1-600)
    #[arg(short, long, value_name = "SECONDS")]
    timeout: Option<u64>,
}

impl From<Args> for RawArgs {
    fn from(args: Args) -> Self {
        RawArgs {
            url: args.url,
            searchstring: args.searchstring,
            limit: args.limit,
            write: args.write,
            timeout: args.timeout,
        }
    }
}

#[derive(Debug)]
struct RunSummary {
    status: u16,
    matched: usize,
    written: usize,
    output_path: PathBuf,
}

fn run<F, C>(args: RawArgs, connect: C) -> Result<RunSummary>
where
    F: PageFetcher,
    C: FnOnce(&ScrapeRequest) -> Result<F, FetchError>,
{
    let request = ScrapeRequest::resolve(args).context("Invalid arguments")?;
    info!("Validated request: {:?}", request);

    let fetcher = connect(&request)?;
    let page = fetch_listing_page(&fetcher, &request)?;

    let extracted = parse_listings(&page.html(), request.limit, &MarkupSignature::mercari());
    info!(
        "Extracted {} of {} matched listings ({} skipped)",
        extracted.records.len(),
        extracted.matched,
        extracted.skipped
    );

    write_records(&extracted.records, &request.output_path)?;

    Ok(RunSummary {
        status: page.status,
        matched: extracted.matched,
        written: extracted.records.len(),
        output_path: request.output_path,
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let summary = run(args.into(), |request| HttpFetcher::new(request.timeout))?;

    info!(
        "Wrote {} listings to {} (status {}, {} matched on page)",
        summary.written,
        summary.output_path.display(),
        summary.status,
        summary.matched
    );

    Ok(())
}
