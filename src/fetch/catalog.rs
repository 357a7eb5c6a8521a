//! Paginated HTML catalog source.
//!
//! Walks a product-listing URL page by page (`?p=N`) with a fixed
//! inter-request delay, stopping on the first page without product anchors
//! or at the explicit page ceiling. Extraction is best-effort: a product
//! with no SKU, VAT note or price still yields a row with empty cells.

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::SourceError;
use crate::fetch::RecordSource;
use crate::table::{RawCell, RawTable};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; tabscraper/0.1)";
const DEFAULT_DELAY: Duration = Duration::from_secs(1);
/// Hard ceiling on the pagination loop; the stop condition alone would leave
/// it unbounded if the site keeps serving non-empty pages.
const DEFAULT_MAX_PAGES: usize = 500;
/// How many ancestor containers to climb when looking for the product's SKU
/// and price nodes.
const ANCESTOR_DEPTH: usize = 6;

pub const COLUMNS: &[&str] = &["page", "sku", "name", "url", "vat_info", "price"];

pub struct CatalogSource {
    client: Client,
    base_url: Url,
    delay: Duration,
    max_pages: usize,
    anchor_sel: Selector,
    sku_sel: Selector,
    span_sel: Selector,
    vat_sel: Selector,
    price_sel: Selector,
}

impl CatalogSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()
            .context("building catalog HTTP client")?;
        Ok(Self {
            client,
            base_url: Url::parse(base_url).context("parsing catalog base URL")?,
            delay: DEFAULT_DELAY,
            max_pages: DEFAULT_MAX_PAGES,
            anchor_sel: Selector::parse("a.product-item-link")
                .expect("product anchor selector is valid"),
            sku_sel: Selector::parse("div.product-sku-plp").expect("sku selector is valid"),
            span_sel: Selector::parse("span").expect("span selector is valid"),
            vat_sel: Selector::parse("span.vat-info").expect("vat selector is valid"),
            price_sel: Selector::parse("span.price").expect("price selector is valid"),
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    fn get_page(&self, page: usize) -> Result<String> {
        let resp = self
            .client
            .get(self.base_url.clone())
            .query(&[("p", page.to_string())])
            .send()
            .with_context(|| format!("requesting catalog page {page}"))?
            .error_for_status()
            .with_context(|| format!("catalog page {page} returned an error status"))?;
        resp.text().context("decoding catalog page body")
    }

    /// Pull every product anchor on the page into `table`; returns how many
    /// were found.
    fn extract_products(&self, html: &Html, page: usize, table: &mut RawTable) -> usize {
        let mut count = 0;
        for anchor in html.select(&self.anchor_sel) {
            let name = element_text(anchor);
            let href = anchor.value().attr("href").unwrap_or_default();
            let url = self
                .base_url
                .join(href)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.to_string());

            // The anchor sits somewhere inside the product tile; climb a few
            // ancestors until one contains the SKU node.
            let mut container = None;
            let mut sku = String::new();
            for ancestor in anchor.ancestors().take(ANCESTOR_DEPTH) {
                let Some(element) = ElementRef::wrap(ancestor) else {
                    continue;
                };
                if matches!(element.value().name(), "body" | "html") {
                    break;
                }
                if let Some(div) = element.select(&self.sku_sel).next() {
                    // The SKU text usually lives in a nested span; fall back
                    // to the whole node when it does not.
                    sku = div
                        .select(&self.span_sel)
                        .next()
                        .map(element_text)
                        .unwrap_or_else(|| element_text(div));
                    container = Some(element);
                    break;
                }
            }

            let vat = container
                .and_then(|c| c.select(&self.vat_sel).next())
                .or_else(|| html.select(&self.vat_sel).next())
                .map(element_text)
                .unwrap_or_default();
            let price = container
                .and_then(|c| c.select(&self.price_sel).next())
                .map(element_text)
                .unwrap_or_default();

            table.push_row(vec![
                RawCell::Number(page as f64),
                sku.into(),
                name.into(),
                url.into(),
                vat.into(),
                price.into(),
            ]);
            count += 1;
        }
        count
    }
}

impl RecordSource for CatalogSource {
    fn fetch(&mut self) -> Result<RawTable, SourceError> {
        let mut table = RawTable::new();
        table.push_row(COLUMNS.iter().map(|&c| c.into()).collect());

        let mut total = 0;
        let mut page = 1;
        loop {
            if page > self.max_pages {
                warn!(
                    max_pages = self.max_pages,
                    "page ceiling reached; stopping pagination"
                );
                break;
            }
            let body = match self.get_page(page) {
                Ok(body) => body,
                // A dead first page means the catalog is unreachable; later
                // failures keep whatever was already collected.
                Err(e) if total == 0 => return Err(SourceError::Unavailable(e)),
                Err(e) => {
                    warn!(page, error = %format!("{e:#}"), "page fetch failed; keeping partial results");
                    break;
                }
            };

            let html = Html::parse_document(&body);
            let found = self.extract_products(&html, page, &mut table);
            if found == 0 {
                debug!(page, "no product anchors; stopping pagination");
                break;
            }
            info!(page, products = found, "scraped catalog page");
            total += found;
            page += 1;
            thread::sleep(self.delay);
        }

        if total == 0 {
            return Err(SourceError::Empty);
        }
        Ok(table)
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
