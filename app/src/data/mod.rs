//! Data access for fixtures and tickets.
//!
//! [`DataStore`] is the single boundary to persistent state. Production uses
//! [`PostgrestStore`] against a hosted Supabase-style backend over HTTP;
//! tests use [`InMemoryStore`], which implements the same contract including
//! the seat uniqueness constraint and the conditional availability
//! decrement.

mod memory;
mod postgrest;

pub use memory::InMemoryStore;
pub use postgrest::PostgrestStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{
    Match, MatchDraft, MatchId, MatchUpdate, NewTicket, Ticket, TicketId, TicketStatus,
};

/// Errors from the data boundary.
#[derive(Debug, Error)]
pub enum DataError {
    /// No fixture with the given identifier.
    #[error("match {0} not found")]
    MatchNotFound(MatchId),

    /// No ticket with the given identifier.
    #[error("ticket {0} not found")]
    TicketNotFound(TicketId),

    /// A non-cancelled ticket already holds this seat for this fixture.
    #[error("seat {seat} is already booked for match {match_id}")]
    SeatTaken {
        /// The fixture being booked.
        match_id: MatchId,
        /// The contested seat.
        seat: crate::types::SeatNumber,
    },

    /// The conditional decrement would take availability below zero.
    #[error("insufficient seats: requested {requested}, available {available}")]
    InsufficientSeats {
        /// Seats the caller tried to claim.
        requested: u32,
        /// Seats actually available.
        available: u32,
    },

    /// The backend rejected the request.
    #[error("backend error: {0}")]
    Backend(String),

    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The persistence boundary for fixtures and tickets.
///
/// Implementations enforce two server-side rules rather than trusting the
/// client:
///
/// - `create_ticket` rejects a seat already held by a non-cancelled ticket
///   for the same fixture with [`DataError::SeatTaken`]
/// - `decrement_available_seats` is conditional and fails with
///   [`DataError::InsufficientSeats`] instead of going negative
#[async_trait]
pub trait DataStore: Send + Sync {
    /// All fixtures, ordered by kick-off ascending.
    async fn list_matches(&self) -> Result<Vec<Match>, DataError>;

    /// One fixture by identifier.
    async fn get_match(&self, id: MatchId) -> Result<Match, DataError>;

    /// Create a fixture. Availability starts equal to `total_seats`.
    async fn create_match(&self, draft: MatchDraft) -> Result<Match, DataError>;

    /// Apply a partial update to a fixture.
    async fn update_match(&self, id: MatchId, update: MatchUpdate) -> Result<Match, DataError>;

    /// Delete a fixture.
    async fn delete_match(&self, id: MatchId) -> Result<(), DataError>;

    /// Overwrite a fixture's availability. Admin correction only; bookings
    /// go through [`DataStore::decrement_available_seats`].
    async fn update_match_available_seats(&self, id: MatchId, count: u32)
    -> Result<(), DataError>;

    /// Atomically subtract `count` from a fixture's availability, failing
    /// if fewer than `count` seats remain.
    async fn decrement_available_seats(&self, id: MatchId, count: u32) -> Result<(), DataError>;

    /// Tickets for one fixture, any status.
    async fn list_tickets_for_match(&self, id: MatchId) -> Result<Vec<Ticket>, DataError>;

    /// All tickets across fixtures, newest first.
    async fn list_all_tickets(&self) -> Result<Vec<Ticket>, DataError>;

    /// Issue a ticket, enforcing per-fixture seat uniqueness.
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, DataError>;

    /// Move a ticket to a new lifecycle state.
    async fn update_ticket_status(
        &self,
        id: TicketId,
        status: TicketStatus,
    ) -> Result<(), DataError>;
}
