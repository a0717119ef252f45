//! Leg/pin binding validation.
//!
//! Leg usages travel as `leg(NAME, CLASS[, OPTION...])` parameters on
//! `require` directives. [`validate_bindings`] checks every usage of a
//! resolved build against the board's leg table and produces the
//! [`BindingTable`] consumed by peripheral backends.

pub mod error;
pub mod peripheral;
pub mod table;
pub mod usage;
pub mod validate;

pub use error::BindError;
pub use peripheral::{
    backend_for_family, render_legs_header, AnalogInputOps, DigitalInputOps, DigitalOutputOps,
    LlGpioBackend, PeripheralBackend, LEGS_HEADER,
};
pub use table::{BindingEntry, BindingTable, Claimant, BINDINGS_FILE};
pub use usage::LegUsage;
pub use validate::validate_bindings;
