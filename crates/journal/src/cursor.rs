//! Cursor formatting.
//!
//! A cursor is treated as opaque by every caller of this crate, but it
//! still needs a concrete on-wire shape. We follow the field-list style
//! of a real systemd journal cursor (`s=...;i=...;b=...;m=...;t=...;x=...`)
//! closely enough that it *looks* like the real thing, without claiming
//! bit-for-bit compatibility.

pub fn format_cursor(seq: i64, boot_id: &str, monotonic_usec: u64, realtime_usec: u64) -> String {
    format!("s={seq};i={seq:x};b={boot_id};m={monotonic_usec:x};t={realtime_usec:x}")
}
