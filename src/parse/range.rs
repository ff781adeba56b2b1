//! `Range: entries=...` parsing.

use crate::error::GatewayError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RangeSpec {
    pub cursor: Option<String>,
    pub n_skip: i64,
    pub n_entries: Option<u64>,
}

/// Parses a raw `Range` header value. Returns `Ok(None)` if the header
/// doesn't start with `entries=` — that's treated as if no `Range`
/// header were present, not an error.
pub fn parse_range(header_value: &str) -> Result<Option<RangeSpec>, GatewayError> {
    let Some(remainder) = header_value.strip_prefix("entries=") else {
        return Ok(None);
    };
    let remainder = remainder.trim_start();

    let Some(first_colon) = remainder.find(':') else {
        let cursor = normalize_cursor(remainder);
        return Ok(Some(RangeSpec { cursor, n_skip: 0, n_entries: None }));
    };

    let cursor_raw = &remainder[..first_colon];
    let after_first = &remainder[first_colon + 1..];

    let (n_skip, n_entries_raw) = match after_first.find(':') {
        Some(second_colon) => {
            let skip_raw = &after_first[..second_colon];
            let n_skip = skip_raw
                .parse::<i64>()
                .map_err(|_| GatewayError::BadRequest("malformed Range n_skip".to_owned()))?;
            (n_skip, &after_first[second_colon + 1..])
        }
        None => (0, after_first),
    };

    let n_entries = if n_entries_raw.is_empty() {
        None
    } else {
        Some(parse_n_entries(n_entries_raw)?)
    };

    Ok(Some(RangeSpec {
        cursor: normalize_cursor(cursor_raw),
        n_skip,
        n_entries,
    }))
}

fn normalize_cursor(raw: &str) -> Option<String> {
    let trimmed = raw.trim_end();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn parse_n_entries(raw: &str) -> Result<u64, GatewayError> {
    let n = raw
        .parse::<u64>()
        .map_err(|_| GatewayError::BadRequest("malformed Range n_entries".to_owned()))?;
    if n == 0 {
        return Err(GatewayError::BadRequest("Range n_entries must be >= 1".to_owned()));
    }
    Ok(n)
}
