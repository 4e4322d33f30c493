//! Control signal mapping and delivery.
//!
//! OS transport actions are mapped to [`ControlSignal`]s and handed to the
//! [`ControlEventBus`], which forwards them to the single registered listener.

mod bus;
mod signal;

pub use bus::ControlEventBus;
pub use signal::ControlSignal;
