//! In-memory [`DataStore`] for tests and local development.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{DataError, DataStore};
use crate::types::{
    Match, MatchDraft, MatchId, MatchUpdate, NewTicket, Ticket, TicketId, TicketStatus,
};

#[derive(Default)]
struct MemoryInner {
    matches: HashMap<MatchId, Match>,
    tickets: Vec<Ticket>,
}

/// A [`DataStore`] held entirely in memory.
///
/// Enforces the same rules as the hosted backend: per-fixture seat
/// uniqueness on insert and a conditional availability decrement. Cloning
/// shares the underlying storage, so several components can point at the
/// same fake backend.
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
    /// Remaining successful `create_ticket` calls before injected failures;
    /// negative means no injection.
    create_ticket_budget: Arc<AtomicI64>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryInner::default())),
            create_ticket_budget: Arc::new(AtomicI64::new(-1)),
        }
    }

    /// Seed a fixture directly, keeping whatever availability it carries.
    pub async fn seed_match(&self, fixture: Match) {
        let mut inner = self.inner.write().await;
        inner.matches.insert(fixture.id, fixture);
    }

    /// Let the next `successes` ticket inserts succeed, then fail every
    /// subsequent one. Used to exercise the partial-failure path of a
    /// booking submission.
    pub fn fail_create_ticket_after(&self, successes: u32) {
        self.create_ticket_budget
            .store(i64::from(successes), Ordering::SeqCst);
    }

    /// Number of stored tickets, any status.
    pub async fn ticket_count(&self) -> usize {
        self.inner.read().await.tickets.len()
    }
}

#[async_trait]
impl DataStore for InMemoryStore {
    async fn list_matches(&self) -> Result<Vec<Match>, DataError> {
        let inner = self.inner.read().await;
        let mut matches: Vec<Match> = inner.matches.values().cloned().collect();
        matches.sort_by_key(|m| m.match_date);
        Ok(matches)
    }

    async fn get_match(&self, id: MatchId) -> Result<Match, DataError> {
        let inner = self.inner.read().await;
        inner
            .matches
            .get(&id)
            .cloned()
            .ok_or(DataError::MatchNotFound(id))
    }

    async fn create_match(&self, draft: MatchDraft) -> Result<Match, DataError> {
        let fixture = Match {
            id: MatchId::new(),
            home_team: draft.home_team,
            away_team: draft.away_team,
            match_date: draft.match_date,
            venue: draft.venue,
            ticket_price: draft.ticket_price,
            total_seats: draft.total_seats,
            available_seats: draft.total_seats,
        };
        let mut inner = self.inner.write().await;
        inner.matches.insert(fixture.id, fixture.clone());
        Ok(fixture)
    }

    async fn update_match(&self, id: MatchId, update: MatchUpdate) -> Result<Match, DataError> {
        let mut inner = self.inner.write().await;
        let fixture = inner
            .matches
            .get_mut(&id)
            .ok_or(DataError::MatchNotFound(id))?;
        if let Some(home_team) = update.home_team {
            fixture.home_team = home_team;
        }
        if let Some(away_team) = update.away_team {
            fixture.away_team = away_team;
        }
        if let Some(match_date) = update.match_date {
            fixture.match_date = match_date;
        }
        if let Some(venue) = update.venue {
            fixture.venue = venue;
        }
        if let Some(ticket_price) = update.ticket_price {
            fixture.ticket_price = ticket_price;
        }
        if let Some(total_seats) = update.total_seats {
            fixture.total_seats = total_seats;
        }
        if let Some(available_seats) = update.available_seats {
            fixture.available_seats = available_seats;
        }
        Ok(fixture.clone())
    }

    async fn delete_match(&self, id: MatchId) -> Result<(), DataError> {
        let mut inner = self.inner.write().await;
        inner
            .matches
            .remove(&id)
            .map(|_| ())
            .ok_or(DataError::MatchNotFound(id))
    }

    async fn update_match_available_seats(
        &self,
        id: MatchId,
        count: u32,
    ) -> Result<(), DataError> {
        let mut inner = self.inner.write().await;
        let fixture = inner
            .matches
            .get_mut(&id)
            .ok_or(DataError::MatchNotFound(id))?;
        fixture.available_seats = count;
        Ok(())
    }

    async fn decrement_available_seats(&self, id: MatchId, count: u32) -> Result<(), DataError> {
        let mut inner = self.inner.write().await;
        let fixture = inner
            .matches
            .get_mut(&id)
            .ok_or(DataError::MatchNotFound(id))?;
        if fixture.available_seats < count {
            return Err(DataError::InsufficientSeats {
                requested: count,
                available: fixture.available_seats,
            });
        }
        fixture.available_seats -= count;
        Ok(())
    }

    async fn list_tickets_for_match(&self, id: MatchId) -> Result<Vec<Ticket>, DataError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tickets
            .iter()
            .filter(|t| t.match_id == id)
            .cloned()
            .collect())
    }

    async fn list_all_tickets(&self) -> Result<Vec<Ticket>, DataError> {
        let inner = self.inner.read().await;
        let mut tickets = inner.tickets.clone();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets)
    }

    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, DataError> {
        // Check and spend in one atomic step so concurrent inserts cannot
        // both pass on the same remaining budget.
        let spent = self.create_ticket_budget.fetch_update(
            Ordering::SeqCst,
            Ordering::SeqCst,
            |budget| (budget > 0).then_some(budget - 1),
        );
        if spent == Err(0) {
            return Err(DataError::Backend("injected ticket insert failure".into()));
        }

        let mut inner = self.inner.write().await;
        if !inner.matches.contains_key(&ticket.match_id) {
            return Err(DataError::MatchNotFound(ticket.match_id));
        }
        let taken = inner.tickets.iter().any(|t| {
            t.match_id == ticket.match_id
                && t.seat_number == ticket.seat_number
                && t.status != TicketStatus::Cancelled
        });
        if taken {
            return Err(DataError::SeatTaken {
                match_id: ticket.match_id,
                seat: ticket.seat_number,
            });
        }

        let stored = Ticket {
            id: TicketId::new(),
            match_id: ticket.match_id,
            user_id: ticket.user_id,
            seat_number: ticket.seat_number,
            price: ticket.price,
            status: ticket.status,
            phone_number: ticket.phone_number,
            created_at: Utc::now(),
        };
        inner.tickets.push(stored.clone());
        Ok(stored)
    }

    async fn update_ticket_status(
        &self,
        id: TicketId,
        status: TicketStatus,
    ) -> Result<(), DataError> {
        let mut inner = self.inner.write().await;
        let ticket = inner
            .tickets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(DataError::TicketNotFound(id))?;
        ticket.status = status;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::phone::PhoneNumber;
    use crate::types::Money;
    use chrono::TimeZone;

    fn draft(days_out: i64) -> MatchDraft {
        MatchDraft {
            home_team: "Gor Mahia".into(),
            away_team: "AFC Leopards".into(),
            match_date: Utc.with_ymd_and_hms(2025, 6, 1, 15, 0, 0).single().unwrap()
                + chrono::Duration::days(days_out),
            venue: "Kasarani".into(),
            ticket_price: Money::from_shillings(1_000),
            total_seats: 12,
        }
    }

    fn new_ticket(match_id: MatchId, seat: &str) -> NewTicket {
        NewTicket {
            match_id,
            user_id: crate::types::UserId::new(),
            seat_number: seat.into(),
            price: Money::from_shillings(1_000),
            status: TicketStatus::Active,
            phone_number: PhoneNumber::parse("254712345678").unwrap(),
        }
    }

    #[tokio::test]
    async fn matches_are_listed_by_kickoff_ascending() {
        let store = InMemoryStore::new();
        store.create_match(draft(5)).await.unwrap();
        store.create_match(draft(1)).await.unwrap();
        store.create_match(draft(3)).await.unwrap();

        let matches = store.list_matches().await.unwrap();
        assert!(matches.windows(2).all(|w| w[0].match_date <= w[1].match_date));
    }

    #[tokio::test]
    async fn duplicate_seat_is_rejected_until_cancelled() {
        let store = InMemoryStore::new();
        let fixture = store.create_match(draft(0)).await.unwrap();

        let first = store.create_ticket(new_ticket(fixture.id, "A1")).await.unwrap();
        let err = store
            .create_ticket(new_ticket(fixture.id, "A1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::SeatTaken { .. }));

        store
            .update_ticket_status(first.id, TicketStatus::Cancelled)
            .await
            .unwrap();
        store.create_ticket(new_ticket(fixture.id, "A1")).await.unwrap();
    }

    #[tokio::test]
    async fn decrement_is_conditional() {
        let store = InMemoryStore::new();
        let fixture = store.create_match(draft(0)).await.unwrap();

        store.decrement_available_seats(fixture.id, 10).await.unwrap();
        let err = store
            .decrement_available_seats(fixture.id, 3)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DataError::InsufficientSeats {
                requested: 3,
                available: 2
            }
        ));
        let fixture = store.get_match(fixture.id).await.unwrap();
        assert_eq!(fixture.available_seats, 2);
    }

    #[tokio::test]
    async fn fault_injection_fails_after_budget() {
        let store = InMemoryStore::new();
        let fixture = store.create_match(draft(0)).await.unwrap();
        store.fail_create_ticket_after(1);

        store.create_ticket(new_ticket(fixture.id, "A1")).await.unwrap();
        let err = store
            .create_ticket(new_ticket(fixture.id, "A2"))
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::Backend(_)));
    }

    #[tokio::test]
    async fn concurrent_inserts_spend_the_budget_exactly_once() {
        let store = InMemoryStore::new();
        let fixture = store.create_match(draft(0)).await.unwrap();
        store.fail_create_ticket_after(1);

        let (first, second) = tokio::join!(
            store.create_ticket(new_ticket(fixture.id, "A1")),
            store.create_ticket(new_ticket(fixture.id, "A2")),
        );
        assert_eq!(
            usize::from(first.is_ok()) + usize::from(second.is_ok()),
            1,
            "exactly one insert should land within the budget"
        );
        assert_eq!(store.ticket_count().await, 1);
    }

    #[tokio::test]
    async fn tickets_for_unknown_match_are_rejected() {
        let store = InMemoryStore::new();
        let err = store
            .create_ticket(new_ticket(MatchId::new(), "A1"))
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::MatchNotFound(_)));
    }
}
