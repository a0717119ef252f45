//! Configuration aggregation for uccm builds.
//!
//! `append(TARGET) = "TEXT"` fragments from every active header are merged
//! per target in resolved order. Identical fragments fold into one; distinct
//! fragments defining the same symbol are a hard conflict.

pub mod context;
pub mod error;
pub mod key;

pub use context::{aggregate, Aggregated, AggregationContext, Fragment, TargetOutput};
pub use error::AggregateError;
pub use key::{DefineKey, NoKey, SymbolKey};
