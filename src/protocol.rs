//! Report Response Decoding
//!
//! This module decodes the response metadata a report download depends on:
//! the suggested filename, the expected size and the content type. It also
//! holds the progress arithmetic shared by the downloader.

use percent_encoding::percent_decode_str;
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};

/// Extracts the filename from a `Content-Disposition` value
///
/// Accepts `filename=name.pdf`, `filename="name.pdf"` and `filename='name.pdf'`;
/// a quoted value runs to its closing quote and may contain `;`. The RFC 5987
/// form `filename*=UTF-8''name.pdf` is percent-decoded and wins over a plain
/// `filename` when both are present. Returns `None` when no usable name is
/// present.
pub fn parse_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut rest = value;

    while !rest.is_empty() {
        let (param, tail) = split_param(rest);
        rest = tail;

        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                if let Some(name) = decode_extended(raw.trim()) {
                    return Some(name);
                }
            }
            "filename" if plain.is_none() => plain = unquote(raw.trim()),
            _ => {}
        }
    }
    plain
}

/// Splits off the first parameter, keeping `;` inside a quoted value
fn split_param(input: &str) -> (&str, &str) {
    let mut quote = None;
    let mut value_start = false;

    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                ';' => return (&input[..i], &input[i + 1..]),
                '=' => {
                    value_start = true;
                    continue;
                }
                '"' | '\'' if value_start => quote = Some(c),
                c if c.is_whitespace() && value_start => continue,
                _ => {}
            },
        }
        value_start = false;
    }
    (input, "")
}

/// Reads a bare value, or a quoted one up to its closing quote
fn unquote(raw: &str) -> Option<String> {
    let name = match raw.chars().next() {
        Some(q @ ('"' | '\'')) => {
            let inner = &raw[1..];
            match inner.find(q) {
                Some(end) => &inner[..end],
                None => inner,
            }
        }
        _ => raw,
    };
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Decodes `charset'language'percent-encoded-name`
fn decode_extended(raw: &str) -> Option<String> {
    let encoded = raw.splitn(3, '\'').nth(2).unwrap_or(raw);
    let encoded = encoded.trim_matches('"');
    let name = percent_decode_str(encoded).decode_utf8_lossy();
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Resolves the report filename from response headers
pub fn filename_from_headers(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_disposition)
        .unwrap_or_else(|| fallback.to_string())
}

/// Expected body size from `Content-Length`
///
/// Absent, unparsable or zero lengths all mean "unknown".
pub fn content_length_from_headers(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|len| *len > 0)
}

/// Content type of the report, or the configured default
pub fn content_type_from_headers(headers: &HeaderMap, default: &str) -> String {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Rounded download percentage
///
/// Reports 100 only once `received` reaches `total`; a nearly complete
/// download stays at 99.
pub fn progress_percent(received: u64, total: u64) -> u8 {
    if total == 0 || received >= total {
        return 100;
    }
    let rounded = (received as u128 * 200 + total as u128) / (total as u128 * 2);
    rounded.min(99) as u8
}
