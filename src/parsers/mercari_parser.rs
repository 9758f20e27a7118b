use log::{debug, warn};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use thiserror::Error;

pub const SITE_DOMAIN: &str = "https://www.mercari.com";

// Selector table for the current Mercari search results markup. The class
// names are generated by the site's styling pipeline and change whenever the
// frontend is redeployed; re-derive them from a fresh page when nothing matches.
const LISTING_SELECTOR: &str = "a.Text__LinkText-sc-1e98qiv-0-a.Link__StyledAnchor-dkjuk2-0.fiIUU.Link__StyledPlainLink-dkjuk2-3.beSDvJ";
const NAME_SELECTOR: &str = r#"[data-testid="ItemName"]"#;
const PRICE_SELECTOR: &str = r#"[data-testid="ItemPrice"]"#;
const DISCOUNT_PRICE_SELECTOR: &str = ".withMetaInfo__DiscountPrice-sc-1j2k5ln-10.TPGYL";
const ORIGINAL_PRICE_SELECTOR: &str = ".withMetaInfo__OriginalPrice-sc-1j2k5ln-12.dRCDAZ";
const SIZE_SELECTOR: &str = r#"[data-testid="ItemSize"]"#;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRecord {
    #[serde(rename = "Item Name")]
    pub name: Option<String>,
    #[serde(rename = "Item Price")]
    pub price: Option<String>,
    #[serde(rename = "Discount Price (if applicable)")]
    pub discounted_price: Option<String>,
    #[serde(rename = "Size")]
    pub size: Option<String>,
    #[serde(rename = "URL")]
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSlot {
    Name,
    Price,
    DiscountPrice,
    OriginalPrice,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MercariHTMLDataFormatError {
    #[error("Listing {index} has no {slot:?} element matching the markup signature")]
    MissingSlot { index: usize, slot: ListingSlot },

    #[error("Listing {index} anchor has no href attribute")]
    MissingHref { index: usize },
}

pub struct MarkupSignature {
    pub listing: Selector,
    pub name: Selector,
    pub price: Selector,
    pub discount_price: Selector,
    pub original_price: Selector,
    pub size: Selector,
}

impl MarkupSignature {
    pub fn mercari() -> MarkupSignature {
        MarkupSignature {
            listing: Selector::parse(LISTING_SELECTOR).unwrap(),
            name: Selector::parse(NAME_SELECTOR).unwrap(),
            price: Selector::parse(PRICE_SELECTOR).unwrap(),
            discount_price: Selector::parse(DISCOUNT_PRICE_SELECTOR).unwrap(),
            original_price: Selector::parse(ORIGINAL_PRICE_SELECTOR).unwrap(),
            size: Selector::parse(SIZE_SELECTOR).unwrap(),
        }
    }
}

#[derive(Default, Debug)]
pub struct ExtractedListings {
    /// Anchors on the page that matched the listing selector.
    pub matched: usize,
    /// Listings dropped because their markup did not fit the signature.
    pub skipped: usize,
    pub records: Vec<ItemRecord>,
}

/// Extracts up to `limit` listings, in document order.
///
/// A listing that does not fit the signature is logged and skipped, so the
/// result can be shorter than the effective count.
pub fn parse_listings(
    raw_html: &str,
    limit: Option<usize>,
    signature: &MarkupSignature,
) -> ExtractedListings {
    let document = Html::parse_document(raw_html);
    let anchors: Vec<ElementRef> = document.select(&signature.listing).collect();

    let count = limit.map_or(anchors.len(), |limit| limit.min(anchors.len()));
    debug!(
        "Matched {} listing anchors, extracting {}",
        anchors.len(),
        count
    );

    let mut extracted = ExtractedListings {
        matched: anchors.len(),
        ..ExtractedListings::default()
    };

    for (index, anchor) in anchors.into_iter().take(count).enumerate() {
        match parse_listing(index, anchor, signature) {
            Ok(record) => extracted.records.push(record),
            Err(err) => {
                warn!("Skipping listing: {}", err);
                extracted.skipped += 1;
            }
        }
    }

    extracted
}

fn parse_listing(
    index: usize,
    anchor: ElementRef,
    signature: &MarkupSignature,
) -> Result<ItemRecord, MercariHTMLDataFormatError> {
    let name_el = anchor
        .select(&signature.name)
        .next()
        .ok_or(MercariHTMLDataFormatError::MissingSlot {
            index,
            slot: ListingSlot::Name,
        })?;

    let href = anchor
        .value()
        .attr("href")
        .ok_or(MercariHTMLDataFormatError::MissingHref { index })?;

    let price_el = anchor
        .select(&signature.price)
        .next()
        .ok_or(MercariHTMLDataFormatError::MissingSlot {
            index,
            slot: ListingSlot::Price,
        })?;

    let discount_el = price_el.select(&signature.discount_price).next();
    let original_el = price_el.select(&signature.original_price).next();

    let (price, discounted_price) = match (discount_el, original_el) {
        _ if has_direct_text(price_el) => (element_text(price_el), None),
        (Some(discount_el), Some(original_el)) => {
            (element_text(original_el), element_text(discount_el))
        }
        (Some(_), None) => {
            return Err(MercariHTMLDataFormatError::MissingSlot {
                index,
                slot: ListingSlot::OriginalPrice,
            })
        }
        (None, Some(_)) => {
            return Err(MercariHTMLDataFormatError::MissingSlot {
                index,
                slot: ListingSlot::DiscountPrice,
            })
        }
        // a lone wrapper around the price text
        (None, None) => (element_text(price_el), None),
    };

    let size = anchor.select(&signature.size).next().and_then(element_text);

    Ok(ItemRecord {
        name: element_text(name_el),
        price,
        discounted_price,
        size,
        url: absolute_item_url(href),
    })
}

/// Prefixes a domain-relative href with the site domain.
pub fn absolute_item_url(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", SITE_DOMAIN, href)
    } else {
        format!("{}/{}", SITE_DOMAIN, href)
    }
}

fn has_direct_text(el: ElementRef) -> bool {
    el.children()
        .filter_map(|node| node.value().as_text())
        .any(|text| !text.trim().is_empty())
}

fn element_text(el: ElementRef) -> Option<String> {
    let text = el.text().collect::<String>().trim().to_owned();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
