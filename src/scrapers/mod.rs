pub mod mercari_scraper;
