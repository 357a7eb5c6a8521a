//! Retail-catalog run: paginate the product listing and export one workbook
//! of products (delimited fallback).

use anyhow::Result;
use std::time::Duration;
use tabscraper::{
    export::OutputTarget,
    fetch::catalog::CatalogSource,
    normalize::{ColumnSpec, NormalizationRules},
    pipeline,
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const CATALOG_URL: &str = "https://www.tiendatecnored.cl/materiales-electricos";
const PAGE_DELAY: Duration = Duration::from_secs(1);
const MAX_PAGES: usize = 500;
const OUT_STEM: &str = "catalog_products";

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!(url = CATALOG_URL, "startup");

    let mut source = CatalogSource::new(CATALOG_URL)?
        .with_delay(PAGE_DELAY)
        .with_max_pages(MAX_PAGES);
    let rules = NormalizationRules {
        numeric_columns: vec![ColumnSpec::name("page"), ColumnSpec::name("price")],
        ..Default::default()
    };
    let target = OutputTarget::xlsx(OUT_STEM);

    let summary = pipeline::run(&mut source, &rules, &target)?;
    info!(
        products = summary.rows,
        path = %summary.path.display(),
        "catalog exported"
    );
    Ok(())
}
