//! The three-step booking flow: pick seats, confirm payment details, get
//! tickets.
//!
//! The flow is a reducer over [`BookingState`]. User interactions and
//! completed side effects both arrive as [`BookingAction`] values; all I/O
//! is returned as effects and executed by the store runtime. Phases move
//! strictly forward (seat selection, then payment entry, then confirmed)
//! and every guard failure lands in [`BookingState::error`] without
//! changing phase.

mod actions;
mod environment;
mod reducer;
mod state;

pub use actions::BookingAction;
pub use environment::BookingEnvironment;
pub use reducer::BookingReducer;
pub use state::{BookingConfirmation, BookingError, BookingPhase, BookingState};
