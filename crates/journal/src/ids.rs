//! Machine/boot identity primitives.
//!
//! Real `sd_id128_get_machine`/`sd_id128_get_boot` read `/etc/machine-id`
//! and a kernel-exposed per-boot random ID respectively. This crate has no
//! single well-known host file to read, so it treats the machine ID as a
//! property of the journal store itself (persisted in the `machine` table,
//! generated once on first open) and the boot ID as a property of the
//! current process (generated once per process, since there is no
//! meaningful notion of "boot" inside this crate's sandbox).

use std::sync::OnceLock;
use uuid::Uuid;

/// Format a fresh 128-bit ID the way `sd_id128_to_string` does: 32
/// lowercase hex characters, no separators.
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

static PROCESS_BOOT_ID: OnceLock<String> = OnceLock::new();

/// The boot ID for this process's lifetime. Stable for as long as the
/// process runs, regenerated on every restart — mirroring the real
/// kernel-assigned boot ID's scope (one per boot).
pub fn process_boot_id() -> &'static str {
    PROCESS_BOOT_ID.get_or_init(generate_id)
}
