//! Ticket pricing.
//!
//! Each seat tier carries a price multiplier over the fixture's base price.
//! A per-seat price is the base price times the multiplier, rounded to the
//! nearest whole shilling. Totals are sums of already-rounded per-seat
//! prices, never a rounded sum, so the stored ticket prices always add up to
//! the amount shown at checkout.

use std::collections::HashMap;

use crate::types::{Money, Seat, SeatType};

/// Multiplier applied when a tier has no configured entry.
const FALLBACK_MULTIPLIER: f64 = 1.0;

/// Price multipliers per seat tier.
#[derive(Clone, Debug, PartialEq)]
pub struct SeatMultipliers(HashMap<SeatType, f64>);

impl SeatMultipliers {
    /// Build from explicit tier multipliers.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (SeatType, f64)>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// The multiplier for `seat_type`, falling back to `1.0` for tiers with
    /// no configured entry. A missing entry is a configuration gap, not a
    /// reason to fail a booking.
    #[must_use]
    pub fn get(&self, seat_type: SeatType) -> f64 {
        self.0
            .get(&seat_type)
            .copied()
            .unwrap_or(FALLBACK_MULTIPLIER)
    }
}

impl Default for SeatMultipliers {
    /// Standard tiers: standard ×1.0, premium ×1.25, VIP ×1.5.
    fn default() -> Self {
        Self::new([
            (SeatType::Standard, 1.0),
            (SeatType::Premium, 1.25),
            (SeatType::Vip, 1.5),
        ])
    }
}

/// Price of one seat: `base` times `multiplier`, rounded to the nearest
/// whole shilling.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn price_with_multiplier(base: Money, multiplier: f64) -> Money {
    let scaled = (base.shillings() as f64 * multiplier).round();
    Money::from_shillings(scaled.max(0.0) as u64)
}

/// Price of one seat of tier `seat_type` under the configured multipliers.
#[must_use]
pub fn ticket_price(base: Money, seat_type: SeatType, multipliers: &SeatMultipliers) -> Money {
    price_with_multiplier(base, multipliers.get(seat_type))
}

/// Total for a seat selection: the sum of per-seat rounded prices.
pub fn selection_total<'a>(base: Money, seats: impl IntoIterator<Item = &'a Seat>) -> Money {
    seats
        .into_iter()
        .map(|seat| price_with_multiplier(base, seat.multiplier))
        .sum()
}
