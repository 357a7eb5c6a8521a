//! HTTP source for a ZIP archive of delimited sheet entries.
//!
//! The archive is small enough to buffer whole; each matching entry becomes
//! one `RawTable`, in archive order. A sheet that fails to parse is skipped
//! with a warning so the remaining sheets still make it through.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use reqwest::blocking::Client;
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::SourceError;
use crate::fetch::RecordSource;
use crate::table::RawTable;

const SHEET_EXTENSIONS: &[&str] = &[".csv"];

/// Download `url` and return the raw archive bytes. Any transport or HTTP
/// status failure means the feed is unreachable.
pub fn download_archive(client: &Client, url: &str) -> Result<Vec<u8>, SourceError> {
    let fetch = || -> Result<Vec<u8>> {
        let resp = client
            .get(url)
            .send()
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .context("archive endpoint returned an error status")?;
        let bytes = resp.bytes().context("reading archive body")?;
        Ok(bytes.to_vec())
    };
    fetch().map_err(SourceError::Unavailable)
}

/// Open the buffered archive and parse every sheet entry into a `RawTable`,
/// keyed by entry name. Zero matching entries is an empty map, not an error.
pub fn sheets_from_archive(bytes: &[u8]) -> Result<BTreeMap<String, RawTable>, SourceError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| SourceError::unavailable(anyhow::Error::new(e).context("reading archive")))?;

    // Buffer matching entries first, in archive order.
    let mut buffers: Vec<(String, Vec<u8>)> = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(index = i, error = %e, "skipping unreadable archive entry");
                continue;
            }
        };
        let name = entry.name().to_string();
        if !entry.is_file() || !is_sheet_entry(&name) {
            debug!(name = %name, "ignoring non-sheet entry");
            continue;
        }
        let mut buf = Vec::with_capacity(entry.size() as usize);
        if let Err(e) = entry.read_to_end(&mut buf) {
            warn!(name = %name, error = %e, "skipping sheet entry that failed to read");
            continue;
        }
        buffers.push((name, buf));
    }

    let mut tables = BTreeMap::new();
    for (name, data) in buffers {
        match parse_sheet(&data) {
            Ok(table) => {
                debug!(name = %name, rows = table.rows.len(), "parsed sheet entry");
                tables.insert(name, table);
            }
            Err(e) => {
                warn!(name = %name, error = %format!("{e:#}"), "skipping unparsable sheet entry")
            }
        }
    }
    Ok(tables)
}

fn is_sheet_entry(name: &str) -> bool {
    let lower = name.to_lowercase();
    SHEET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn parse_sheet(data: &[u8]) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(data));

    let mut table = RawTable::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("sheet parse error at record {idx}"))?;
        table.push_row(record.iter().map(Into::into).collect());
    }
    Ok(table)
}

/// Filesystem-safe output stem for an entry path: base name without the
/// extension, anything outside `[A-Za-z0-9_-]` replaced.
pub fn entry_stem(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let base = base.rsplit_once('.').map_or(base, |(stem, _)| stem);
    let stem: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "sheet".to_string()
    } else {
        stem
    }
}

/// Adapts a single archive entry to the `RecordSource` contract: download,
/// unpack, hand back the named entry (or the first one in archive order).
pub struct ArchiveSource {
    client: Client,
    url: String,
    entry: Option<String>,
}

impl ArchiveSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            entry: None,
        }
    }

    /// Pick a specific entry instead of the first one.
    pub fn with_entry(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }
}

impl RecordSource for ArchiveSource {
    fn fetch(&mut self) -> Result<RawTable, SourceError> {
        let bytes = download_archive(&self.client, &self.url)?;
        let sheets = sheets_from_archive(&bytes)?;
        pick_sheet(sheets, self.entry.as_deref())
    }
}

fn pick_sheet(
    mut sheets: BTreeMap<String, RawTable>,
    entry: Option<&str>,
) -> Result<RawTable, SourceError> {
    match entry {
        Some(name) => sheets.remove(name).ok_or(SourceError::Empty),
        None => sheets
            .into_iter()
            .next()
            .map(|(_, table)| table)
            .ok_or(SourceError::Empty),
    }
}
