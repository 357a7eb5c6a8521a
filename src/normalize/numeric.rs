//! Locale-tolerant number parsing for price-like columns.
//!
//! The separator rule is a best-effort heuristic, not a locale parser: with
//! both `.` and `,` present, whichever appears last is the decimal point and
//! the other is grouping; with a single kind, the rightmost occurrence counts
//! as decimal only when followed by exactly 1-2 digits.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\d,.\-]").expect("junk-stripping pattern is valid"));

/// Parse a raw cell into an `f64`, tolerating currency symbols, grouping
/// separators and either decimal convention. `None` when nothing numeric
/// survives the cleanup.
pub fn parse_number(raw: &str) -> Option<f64> {
    let stripped = NON_NUMERIC.replace_all(raw.trim(), "");
    if stripped.is_empty() {
        return None;
    }

    let has_comma = stripped.contains(',');
    let has_dot = stripped.contains('.');

    let canonical = match (has_comma, has_dot) {
        (true, true) => {
            // Last separator wins as the decimal point; the other kind is
            // grouping and is discarded entirely.
            let (decimal, grouping) =
                if stripped.rfind(',') > stripped.rfind('.') {
                    (',', '.')
                } else {
                    ('.', ',')
                };
            let degrouped: String = stripped.chars().filter(|&c| c != grouping).collect();
            replace_last(&degrouped, decimal)
        }
        (true, false) => single_separator(&stripped, ','),
        (false, true) => single_separator(&stripped, '.'),
        (false, false) => stripped.into_owned(),
    };

    canonical.parse::<f64>().ok()
}

/// Only one separator kind present: the rightmost occurrence is decimal when
/// it is followed by 1-2 digits, otherwise every occurrence is grouping.
fn single_separator(s: &str, sep: char) -> String {
    let last = s.rfind(sep).expect("separator present");
    let frac = &s[last + sep.len_utf8()..];
    if (1..=2).contains(&frac.len()) && frac.bytes().all(|b| b.is_ascii_digit()) {
        replace_last(s, sep)
    } else {
        s.chars().filter(|&c| c != sep).collect()
    }
}

/// Keep only the last occurrence of `sep`, rewritten as `.`; earlier
/// occurrences are grouping noise.
fn replace_last(s: &str, sep: char) -> String {
    let last = s.rfind(sep).expect("separator present");
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        if c == sep {
            if i == last {
                out.push('.');
            }
        } else {
            out.push(c);
        }
    }
    out
}
