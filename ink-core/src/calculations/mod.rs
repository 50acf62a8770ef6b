//! Money calculations over appointment prices.
//!
//! Everything here is pure: callers hand in the appointments and the tip
//! percentage, nothing is read from storage or preferences.

pub mod cost;

pub use cost::{round_for_display, tip_multiplier, total_cost};
