//! Booking flow state.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::format;
use crate::pricing;
use crate::types::{Match, Money, Seat, SeatNumber, Ticket};

/// Where the customer is in the flow. Transitions are strictly forward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BookingPhase {
    /// Choosing seats on the map.
    #[default]
    SelectingSeats,
    /// Entering the M-Pesa number and reviewing the total.
    EnteringPayment,
    /// Tickets issued.
    Confirmed,
}

/// Why a booking step was refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BookingError {
    /// Booking requires a signed-in session.
    #[error("sign in to book tickets")]
    NotAuthenticated,

    /// The customer has not picked any seats.
    #[error("select at least one seat")]
    NoSeatsSelected,

    /// The M-Pesa number did not validate.
    #[error("enter a valid M-Pesa phone number")]
    InvalidPhoneNumber,

    /// Submission arrived before the fixture finished loading.
    #[error("match details are still loading")]
    MatchNotLoaded,

    /// The data boundary refused the submission.
    #[error("booking failed: {0}")]
    Data(String),
}

/// The receipt for a completed booking.
#[derive(Clone, Debug, PartialEq)]
pub struct BookingConfirmation {
    /// The issued tickets, in seat-map order.
    pub tickets: Vec<Ticket>,
    /// Amount requested in the payment prompt.
    pub total: Money,
    /// When the confirmation was recorded.
    pub confirmed_at: DateTime<Utc>,
}

impl BookingConfirmation {
    /// One-line receipt text for the confirmation screen, e.g.
    /// `2 seats (A1, C1) for KSh 2,500, confirmed Sun 01 Jun 2025, 15:00`.
    #[must_use]
    pub fn summary(&self) -> String {
        let seats: Vec<&str> = self
            .tickets
            .iter()
            .map(|t| t.seat_number.as_str())
            .collect();
        let plural = if self.tickets.len() == 1 { "" } else { "s" };
        format!(
            "{} seat{plural} ({}) for {}, confirmed {}",
            self.tickets.len(),
            seats.join(", "),
            format::format_currency(self.total),
            format::format_date(self.confirmed_at),
        )
    }
}

/// Full state of one customer's booking flow.
#[derive(Clone, Debug, Default)]
pub struct BookingState {
    /// Current phase.
    pub phase: BookingPhase,
    /// The fixture being booked, once loaded.
    pub match_info: Option<Match>,
    /// Generated seat map for the fixture.
    pub seats: Vec<Seat>,
    /// Labels of the seats the customer has picked.
    pub selected: BTreeSet<SeatNumber>,
    /// Most recent guard or submission failure, if any.
    pub error: Option<BookingError>,
    /// Receipt, present once the phase is [`BookingPhase::Confirmed`].
    pub confirmation: Option<BookingConfirmation>,
}

impl BookingState {
    /// The selected seats in seat-map order.
    #[must_use]
    pub fn selected_seats(&self) -> Vec<&Seat> {
        self.seats
            .iter()
            .filter(|seat| self.selected.contains(&seat.number))
            .collect()
    }

    /// Checkout total: sum of per-seat rounded prices. Zero until a fixture
    /// is loaded.
    #[must_use]
    pub fn total(&self) -> Money {
        let Some(fixture) = &self.match_info else {
            return Money::ZERO;
        };
        pricing::selection_total(fixture.ticket_price, self.selected_seats())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::SeatType;
    use chrono::TimeZone;

    fn seat(number: &str, multiplier: f64) -> Seat {
        Seat {
            number: number.into(),
            row: 1,
            index: 1,
            seat_type: SeatType::Standard,
            multiplier,
            available: true,
        }
    }

    #[test]
    fn total_is_zero_before_the_fixture_loads() {
        let mut state = BookingState::default();
        state.selected.insert("A1".into());
        assert_eq!(state.total(), Money::ZERO);
    }

    #[test]
    fn total_sums_selected_seats_in_map_order() {
        let state = BookingState {
            match_info: Some(Match {
                id: crate::types::MatchId::new(),
                home_team: "Gor Mahia".into(),
                away_team: "Tusker".into(),
                match_date: Utc.with_ymd_and_hms(2025, 6, 1, 15, 0, 0).single().unwrap(),
                venue: "Kasarani".into(),
                ticket_price: Money::from_shillings(1_000),
                total_seats: 2,
                available_seats: 2,
            }),
            seats: vec![seat("A1", 1.0), seat("C1", 1.5)],
            selected: ["A1".into(), "C1".into()].into(),
            ..BookingState::default()
        };
        assert_eq!(state.total(), Money::from_shillings(2_500));
        let order: Vec<&str> = state
            .selected_seats()
            .iter()
            .map(|s| s.number.as_str())
            .collect();
        assert_eq!(order, vec!["A1", "C1"]);
    }

    #[test]
    fn confirmation_summary_reads_as_a_receipt() {
        let when = Utc.with_ymd_and_hms(2025, 6, 1, 15, 0, 0).single().unwrap();
        let ticket = |seat: &str, price: u64| Ticket {
            id: crate::types::TicketId::new(),
            match_id: crate::types::MatchId::new(),
            user_id: crate::types::UserId::new(),
            seat_number: seat.into(),
            price: Money::from_shillings(price),
            status: crate::types::TicketStatus::Active,
            phone_number: crate::phone::PhoneNumber::parse("0712345678").unwrap(),
            created_at: when,
        };
        let confirmation = BookingConfirmation {
            tickets: vec![ticket("A1", 1_000), ticket("C1", 1_500)],
            total: Money::from_shillings(2_500),
            confirmed_at: when,
        };
        assert_eq!(
            confirmation.summary(),
            "2 seats (A1, C1) for KSh 2,500, confirmed Sun 01 Jun 2025, 15:00"
        );

        let single = BookingConfirmation {
            tickets: vec![ticket("A1", 1_000)],
            total: Money::from_shillings(1_000),
            confirmed_at: when,
        };
        assert!(single.summary().starts_with("1 seat (A1)"));
    }
}
