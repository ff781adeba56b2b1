pub mod entries;
pub mod fields;

pub use entries::{entry_pump, EntryPumpConfig};
pub use fields::field_pump;
