//! Formats a single journal record in the negotiated [`OutputMode`]. The
//! synthetic `__CURSOR`/`__REALTIME_TIMESTAMP`/`__MONOTONIC_TIMESTAMP`/
//! `_BOOT_ID` fields mirror what a real journal entry exposes alongside
//! its own `KEY=VALUE` fields.

use crate::error::GatewayError;
use crate::output_mode::OutputMode;
use chrono::{TimeZone, Utc};
use journal_core::Entry;
use serde_json::{json, Map, Value};

/// Ceiling on a single serialized record. No real journal record
/// approaches this size — tripping it means something is pathological (a
/// single field holding tens of megabytes), not normal operation.
pub const MAX_RECORD_BYTES: usize = 64 * 1024 * 1024;

/// A serialized record over the size ceiling fails the stream rather
/// than growing the spill buffer unboundedly.
pub fn check_spill_ceiling(bytes: &[u8]) -> Result<(), GatewayError> {
    if bytes.len() > MAX_RECORD_BYTES {
        return Err(GatewayError::OutOfMemory);
    }
    Ok(())
}

pub fn serialize_entry(mode: OutputMode, entry: &Entry) -> Vec<u8> {
    match mode {
        OutputMode::Short => format_short(entry).into_bytes(),
        OutputMode::Json => format_json(entry).into_bytes(),
        OutputMode::JsonSse => format_json_sse(entry).into_bytes(),
        OutputMode::Export => format_export(entry),
    }
}

fn format_short(entry: &Entry) -> String {
    let ts = Utc
        .timestamp_micros(entry.realtime_usec as i64)
        .single()
        .map(|dt| dt.format("%b %d %H:%M:%S").to_string())
        .unwrap_or_else(|| entry.realtime_usec.to_string());
    let body = entry
        .fields
        .iter()
        .find(|(k, _)| k == "MESSAGE")
        .map(|(_, v)| v.clone())
        .unwrap_or_else(|| {
            entry
                .fields
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(" ")
        });
    format!("{ts} {body}\n")
}

fn as_json_object(entry: &Entry) -> Value {
    let mut map = Map::with_capacity(entry.fields.len() + 4);
    map.insert("__CURSOR".to_owned(), json!(entry.cursor));
    map.insert(
        "__REALTIME_TIMESTAMP".to_owned(),
        json!(entry.realtime_usec.to_string()),
    );
    map.insert(
        "__MONOTONIC_TIMESTAMP".to_owned(),
        json!(entry.monotonic_usec.to_string()),
    );
    map.insert("_BOOT_ID".to_owned(), json!(entry.boot_id));
    for (k, v) in &entry.fields {
        map.insert(k.clone(), json!(v));
    }
    Value::Object(map)
}

fn format_json(entry: &Entry) -> String {
    format!("{}\n", as_json_object(entry))
}

fn format_json_sse(entry: &Entry) -> String {
    format!("data: {}\n\n", as_json_object(entry))
}

/// The systemd Journal Export Format: one `KEY=VALUE\n` line per field,
/// a length-prefixed binary-safe form for values containing a newline,
/// terminated by a blank line.
fn format_export(entry: &Entry) -> Vec<u8> {
    let mut out = Vec::new();
    write_export_field(&mut out, "__CURSOR", &entry.cursor);
    write_export_field(&mut out, "__REALTIME_TIMESTAMP", &entry.realtime_usec.to_string());
    write_export_field(&mut out, "__MONOTONIC_TIMESTAMP", &entry.monotonic_usec.to_string());
    write_export_field(&mut out, "_BOOT_ID", &entry.boot_id);
    for (k, v) in &entry.fields {
        write_export_field(&mut out, k, v);
    }
    out.push(b'\n');
    out
}

fn write_export_field(out: &mut Vec<u8>, key: &str, value: &str) {
    if value.contains('\n') {
        out.extend_from_slice(key.as_bytes());
        out.push(b'\n');
        out.extend_from_slice(&(value.len() as u64).to_le_bytes());
        out.extend_from_slice(value.as_bytes());
        out.push(b'\n');
    } else {
        out.extend_from_slice(key.as_bytes());
        out.push(b'=');
        out.extend_from_slice(value.as_bytes());
        out.push(b'\n');
    }
}

/// Formats one `/fields/<NAME>` result by splitting a `NAME=VALUE`
/// `enumerate_unique` result on the first `=`. A value with no `=` is an
/// internal error — `query_unique`/`enumerate_unique` are only ever
/// called with our own `FIELD=value` encoding (see
/// `journal_core::Journal::enumerate_unique`).
pub fn serialize_field_value(mode: OutputMode, raw: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(raw).ok()?;
    let (name, value) = text.split_once('=')?;
    Some(match mode {
        OutputMode::Json => format!("{}\n", json!({ name: value })).into_bytes(),
        _ => format!("{value}\n").into_bytes(),
    })
}
