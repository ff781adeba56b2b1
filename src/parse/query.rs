//! Query-parameter parsing. Three reserved keys (`follow`, `discrete`,
//! `boot`) are handled specially; everything else becomes a journal
//! match `K=V`.

use crate::error::GatewayError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryArgs {
    pub follow: bool,
    pub discrete: bool,
    pub matches: Vec<(String, String)>,
}

pub fn parse_query(raw_query: Option<&str>) -> Result<QueryArgs, GatewayError> {
    let mut out = QueryArgs::default();
    let Some(raw_query) = raw_query else {
        return Ok(out);
    };

    for (key, value) in form_urlencoded::parse(raw_query.as_bytes()) {
        if key.is_empty() {
            return Err(GatewayError::BadRequest("empty query key".to_owned()));
        }
        match key.as_ref() {
            "follow" => out.follow = parse_bool(&value)?,
            "discrete" => out.discrete = parse_bool(&value)?,
            "boot" => {
                if parse_bool(&value)? {
                    out.matches
                        .push(("_BOOT_ID".to_owned(), journal_core::process_boot_id().to_owned()));
                }
            }
            other => out.matches.push((other.to_owned(), value.into_owned())),
        }
    }

    Ok(out)
}

/// Accepts the handful of spellings `parse_boolean(3)` accepts upstream,
/// plus an empty value meaning `true`.
fn parse_bool(value: &str) -> Result<bool, GatewayError> {
    match value {
        "" | "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(GatewayError::BadRequest(format!("invalid boolean: {other}"))),
    }
}
