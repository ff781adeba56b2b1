//! HTTP handlers — one module per endpoint the gateway exposes.

pub mod entries;
pub mod fields;
pub mod machine;

pub use entries::get_entries;
pub use fields::get_fields;
pub use machine::get_machine;
