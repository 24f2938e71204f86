//! Domain types shared across the crate.
//!
//! Identifiers are UUID newtypes so a `MatchId` can never be passed where a
//! `TicketId` is expected. Money is a whole-shilling integer; M-Pesa settles
//! in whole Kenyan shillings, so there is no fractional unit to carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::phone::PhoneNumber;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for a fixture.
    MatchId
}

uuid_id! {
    /// Unique identifier for an issued ticket.
    TicketId
}

uuid_id! {
    /// Unique identifier for an account.
    UserId
}

/// An amount in whole Kenyan shillings.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero shillings.
    pub const ZERO: Self = Self(0);

    /// Construct from a whole-shilling amount.
    #[must_use]
    pub const fn from_shillings(amount: u64) -> Self {
        Self(amount)
    }

    /// The amount in whole shillings.
    #[must_use]
    pub const fn shillings(&self) -> u64 {
        self.0
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction, floored at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl std::fmt::Display for Money {
    /// Formats as `KSh 1,234` with thousands separators.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        write!(f, "KSh {grouped}")
    }
}

/// The pricing tier of a seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeatType {
    /// Regular seating.
    Standard,
    /// Mid-tier rows at a price premium.
    Premium,
    /// Top-tier rows.
    Vip,
}

impl std::fmt::Display for SeatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Standard => "STANDARD",
            Self::Premium => "PREMIUM",
            Self::Vip => "VIP",
        };
        write!(f, "{label}")
    }
}

/// A seat label such as `C14`: row letter followed by the 1-based seat index.
///
/// Within one match the label is the join key between the generated seat map
/// and issued tickets.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatNumber(String);

impl SeatNumber {
    /// The label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SeatNumber {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl From<&str> for SeatNumber {
    fn from(label: &str) -> Self {
        Self(label.to_owned())
    }
}

impl std::fmt::Display for SeatNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One seat in a generated seat map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    /// Row letter plus seat index, e.g. `A1`.
    pub number: SeatNumber,
    /// 1-based row.
    pub row: u32,
    /// 1-based position within the row.
    pub index: u32,
    /// Pricing tier.
    pub seat_type: SeatType,
    /// Price multiplier resolved for the tier.
    pub multiplier: f64,
    /// Whether the seat can still be selected.
    pub available: bool,
}

impl Seat {
    /// Whether a non-cancelled ticket already holds this seat.
    #[must_use]
    pub const fn is_booked(&self) -> bool {
        !self.available
    }
}

/// A scheduled fixture with its ticket inventory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Identifier assigned by the backend.
    pub id: MatchId,
    /// Home side.
    pub home_team: String,
    /// Away side.
    pub away_team: String,
    /// Kick-off, in UTC.
    pub match_date: DateTime<Utc>,
    /// Stadium name.
    pub venue: String,
    /// Base price for a standard seat.
    pub ticket_price: Money,
    /// Seats in the venue configuration for this fixture.
    pub total_seats: u32,
    /// Seats not yet sold. Maintained server-side.
    pub available_seats: u32,
}

/// Fields for creating a fixture; the backend assigns the identifier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchDraft {
    /// Home side.
    pub home_team: String,
    /// Away side.
    pub away_team: String,
    /// Kick-off, in UTC.
    pub match_date: DateTime<Utc>,
    /// Stadium name.
    pub venue: String,
    /// Base price for a standard seat.
    pub ticket_price: Money,
    /// Seats put on sale. New fixtures start fully available.
    pub total_seats: u32,
}

/// Partial update for a fixture. `None` fields are left unchanged.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MatchUpdate {
    /// New home side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_team: Option<String>,
    /// New away side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_team: Option<String>,
    /// New kick-off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_date: Option<DateTime<Utc>>,
    /// New venue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    /// New base price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_price: Option<Money>,
    /// New seat count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_seats: Option<u32>,
    /// Corrected availability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_seats: Option<u32>,
}

/// Lifecycle of an issued ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Valid for entry.
    Active,
    /// Scanned at the gate.
    Used,
    /// Voided; its seat is free again.
    Cancelled,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Active => "active",
            Self::Used => "used",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{label}")
    }
}

/// An issued ticket for one seat at one fixture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Identifier assigned by the backend.
    pub id: TicketId,
    /// The fixture this ticket admits to.
    pub match_id: MatchId,
    /// The purchasing account.
    pub user_id: UserId,
    /// The seat this ticket covers.
    pub seat_number: SeatNumber,
    /// Price paid, after the tier multiplier.
    pub price: Money,
    /// Lifecycle state.
    pub status: TicketStatus,
    /// M-Pesa number the payment prompt was sent to.
    pub phone_number: PhoneNumber,
    /// When the ticket row was written.
    pub created_at: DateTime<Utc>,
}

/// Fields for issuing a ticket; identifier and timestamp are assigned by the
/// backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewTicket {
    /// The fixture being booked.
    pub match_id: MatchId,
    /// The purchasing account.
    pub user_id: UserId,
    /// The seat being booked.
    pub seat_number: SeatNumber,
    /// Price after the tier multiplier.
    pub price: Money,
    /// Initial lifecycle state, normally [`TicketStatus::Active`].
    pub status: TicketStatus,
    /// M-Pesa number for the payment prompt.
    pub phone_number: PhoneNumber,
}
