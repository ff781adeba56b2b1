pub mod query;
pub mod range;

pub use query::{parse_query, QueryArgs};
pub use range::{parse_range, RangeSpec};
