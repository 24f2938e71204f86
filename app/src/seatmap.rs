//! Stadium layout and seat map generation.
//!
//! A seat map is generated client-side from the stadium layout, never stored.
//! Seats are labelled `A1`, `A2`, … row by row: the row letter is derived
//! from the 1-based row number (row 1 → `A`), which caps a layout at 26 rows.
//! Tier assignment starts from standard, then applies the premium row set,
//! then the VIP row set, so a row listed in both comes out VIP.

use std::collections::BTreeSet;
use std::collections::HashSet;

use thiserror::Error;

use crate::pricing::SeatMultipliers;
use crate::types::{Seat, SeatNumber, SeatType, Ticket, TicketStatus};

/// Largest row count a letter-labelled layout can hold.
pub const MAX_ROWS: u32 = 26;

/// Returned when a layout cannot be labelled.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// More rows than the alphabet can label.
    #[error("stadium layout has {rows} rows; row letters support at most {MAX_ROWS}")]
    TooManyRows {
        /// The rejected row count.
        rows: u32,
    },
    /// A tier row set references a row outside the layout.
    #[error("tier row {row} is outside the layout ({rows} rows)")]
    TierRowOutOfRange {
        /// The out-of-range row.
        row: u32,
        /// Rows in the layout.
        rows: u32,
    },
}

/// Physical layout of the venue: row count, seats per row, and which rows
/// belong to the premium and VIP tiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StadiumLayout {
    rows: u32,
    seats_per_row: u32,
    premium_rows: BTreeSet<u32>,
    vip_rows: BTreeSet<u32>,
}

impl StadiumLayout {
    /// Build a layout, validating that every row can be labelled and that
    /// tier row sets stay inside the layout.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] for more than 26 rows or a tier row outside
    /// `1..=rows`.
    pub fn new(
        rows: u32,
        seats_per_row: u32,
        premium_rows: impl IntoIterator<Item = u32>,
        vip_rows: impl IntoIterator<Item = u32>,
    ) -> Result<Self, LayoutError> {
        if rows > MAX_ROWS {
            return Err(LayoutError::TooManyRows { rows });
        }
        let premium_rows: BTreeSet<u32> = premium_rows.into_iter().collect();
        let vip_rows: BTreeSet<u32> = vip_rows.into_iter().collect();
        for &row in premium_rows.iter().chain(vip_rows.iter()) {
            if row == 0 || row > rows {
                return Err(LayoutError::TierRowOutOfRange { row, rows });
            }
        }
        Ok(Self {
            rows,
            seats_per_row,
            premium_rows,
            vip_rows,
        })
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Seats in each row.
    #[must_use]
    pub const fn seats_per_row(&self) -> u32 {
        self.seats_per_row
    }

    /// Total seats in the layout.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.rows * self.seats_per_row
    }

    /// Tier of a 1-based row. Premium is applied before VIP, so a row in
    /// both sets resolves to VIP.
    #[must_use]
    pub fn tier_of_row(&self, row: u32) -> SeatType {
        let mut tier = SeatType::Standard;
        if self.premium_rows.contains(&row) {
            tier = SeatType::Premium;
        }
        if self.vip_rows.contains(&row) {
            tier = SeatType::Vip;
        }
        tier
    }
}

impl Default for StadiumLayout {
    /// A 10×20 stand: rows A–B VIP, C–E premium, the rest standard.
    fn default() -> Self {
        Self {
            rows: 10,
            seats_per_row: 20,
            premium_rows: [3, 4, 5].into(),
            vip_rows: [1, 2].into(),
        }
    }
}

/// Row letter for a 1-based row number. Row 1 is `A`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
fn row_letter(row: u32) -> char {
    debug_assert!((1..=MAX_ROWS).contains(&row));
    char::from(b'A' + (row - 1) as u8)
}

/// Generate the full seat map for a fixture.
///
/// Every seat in the layout is emitted in row-major order; seats whose label
/// appears in `booked` are marked unavailable. `total_seats` is the
/// fixture's configured inventory and is expected to match the layout
/// capacity; a mismatch is logged and the layout wins.
#[must_use]
pub fn generate_seat_map(
    total_seats: u32,
    layout: &StadiumLayout,
    multipliers: &SeatMultipliers,
    booked: &HashSet<SeatNumber>,
) -> Vec<Seat> {
    if total_seats != layout.capacity() {
        tracing::warn!(
            total_seats,
            capacity = layout.capacity(),
            "fixture seat count does not match stadium layout; using layout capacity"
        );
    }

    let mut seats = Vec::with_capacity(layout.capacity() as usize);
    for row in 1..=layout.rows() {
        let letter = row_letter(row);
        let seat_type = layout.tier_of_row(row);
        let multiplier = multipliers.get(seat_type);
        for index in 1..=layout.seats_per_row() {
            let number = SeatNumber::from(format!("{letter}{index}"));
            let available = !booked.contains(&number);
            seats.push(Seat {
                number,
                row,
                index,
                seat_type,
                multiplier,
                available,
            });
        }
    }
    seats
}

/// The booked set for a fixture: seat labels held by any non-cancelled
/// ticket. Cancelled tickets release their seat.
#[must_use]
pub fn booked_set(tickets: &[Ticket]) -> HashSet<SeatNumber> {
    tickets
        .iter()
        .filter(|ticket| ticket.status != TicketStatus::Cancelled)
        .map(|ticket| ticket.seat_number.clone())
        .collect()
}
