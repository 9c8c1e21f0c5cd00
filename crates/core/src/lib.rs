// crates/core/src/lib.rs
//! Domain types and live-session aggregation for the back-office service.

pub mod dates;
pub mod duration;
pub mod error;
pub mod live;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod types;

pub use dates::*;
pub use duration::*;
pub use error::*;
pub use live::{AggregatorOptions, LiveSessionAggregator, LookupPolicy};
pub use store::*;
pub use types::*;
