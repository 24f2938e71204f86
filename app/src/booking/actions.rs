//! Booking flow actions: user commands plus the events completed effects
//! feed back.

use super::state::BookingError;
use crate::types::{Match, MatchId, Money, SeatNumber, Ticket};

/// Everything the booking reducer can receive.
#[derive(Clone, Debug)]
pub enum BookingAction {
    /// Load a fixture and its booked seats.
    LoadMatch {
        /// The fixture to book.
        match_id: MatchId,
    },

    /// Fixture and booked set arrived.
    MatchLoaded {
        /// The loaded fixture.
        match_info: Box<Match>,
        /// Seats held by non-cancelled tickets.
        booked: Vec<SeatNumber>,
    },

    /// The fixture could not be loaded.
    LoadFailed {
        /// What the data boundary reported.
        message: String,
    },

    /// Select or deselect a seat on the map.
    ToggleSeat {
        /// The seat's label.
        number: SeatNumber,
    },

    /// Move from seat selection to payment entry.
    ProceedToPayment,

    /// Submit the booking with the phone number as typed.
    SubmitPayment {
        /// Raw form input; validated by the reducer.
        phone_input: String,
    },

    /// All tickets were written and the payment prompt went out.
    TicketsIssued {
        /// The issued tickets, in seat-map order.
        tickets: Vec<Ticket>,
        /// Amount requested in the prompt.
        total: Money,
    },

    /// The submission failed; any written tickets were cancelled.
    BookingFailed {
        /// Why the submission failed.
        error: BookingError,
        /// Tickets written before the failure (all since cancelled).
        tickets_written: usize,
    },
}
