//! Back-office operations: fixture management, ticket oversight, and the
//! dashboard summary.
//!
//! Every operation re-checks the session role before touching data. The
//! hosted backend enforces the same rule in its row policies; the check
//! here exists so a fan session gets a clean [`AuthError::Forbidden`]
//! instead of a half-applied request.

use std::sync::Arc;

use thiserror::Error;

use crate::auth::{AuthError, Session};
use crate::data::{DataError, DataStore};
use crate::types::{
    Match, MatchDraft, MatchId, MatchUpdate, Money, Ticket, TicketId, TicketStatus,
};

/// Errors from admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The session is not allowed to administer.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The data boundary refused the operation.
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Headline numbers for the admin dashboard.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DashboardSummary {
    /// Fixtures on the books.
    pub total_matches: usize,
    /// Non-cancelled tickets across all fixtures.
    pub tickets_sold: usize,
    /// Sum of non-cancelled ticket prices.
    pub revenue: Money,
}

/// Role-guarded admin operations over the data boundary.
pub struct AdminService {
    data: Arc<dyn DataStore>,
    session: Session,
}

impl AdminService {
    /// Bind the service to a session. The role is checked per operation,
    /// not here, so holding a service value grants nothing.
    #[must_use]
    pub fn new(data: Arc<dyn DataStore>, session: Session) -> Self {
        Self { data, session }
    }

    fn require_admin(&self) -> Result<(), AdminError> {
        if self.session.is_admin() {
            Ok(())
        } else {
            tracing::warn!(user = %self.session.user_id, "admin operation refused");
            Err(AuthError::Forbidden.into())
        }
    }

    /// Create a fixture.
    ///
    /// # Errors
    ///
    /// [`AuthError::Forbidden`] for non-admin sessions, or any data error.
    pub async fn create_match(&self, draft: MatchDraft) -> Result<Match, AdminError> {
        self.require_admin()?;
        Ok(self.data.create_match(draft).await?)
    }

    /// Update fixture details.
    ///
    /// # Errors
    ///
    /// [`AuthError::Forbidden`] for non-admin sessions, or any data error.
    pub async fn update_match(
        &self,
        id: MatchId,
        update: MatchUpdate,
    ) -> Result<Match, AdminError> {
        self.require_admin()?;
        Ok(self.data.update_match(id, update).await?)
    }

    /// Delete a fixture.
    ///
    /// # Errors
    ///
    /// [`AuthError::Forbidden`] for non-admin sessions, or any data error.
    pub async fn delete_match(&self, id: MatchId) -> Result<(), AdminError> {
        self.require_admin()?;
        Ok(self.data.delete_match(id).await?)
    }

    /// Correct a fixture's availability.
    ///
    /// # Errors
    ///
    /// [`AuthError::Forbidden`] for non-admin sessions, or any data error.
    pub async fn set_available_seats(&self, id: MatchId, count: u32) -> Result<(), AdminError> {
        self.require_admin()?;
        Ok(self.data.update_match_available_seats(id, count).await?)
    }

    /// Every ticket across fixtures, newest first.
    ///
    /// # Errors
    ///
    /// [`AuthError::Forbidden`] for non-admin sessions, or any data error.
    pub async fn list_all_tickets(&self) -> Result<Vec<Ticket>, AdminError> {
        self.require_admin()?;
        Ok(self.data.list_all_tickets().await?)
    }

    /// Move a ticket through its lifecycle (gate scan, refund).
    ///
    /// # Errors
    ///
    /// [`AuthError::Forbidden`] for non-admin sessions, or any data error.
    pub async fn update_ticket_status(
        &self,
        id: TicketId,
        status: TicketStatus,
    ) -> Result<(), AdminError> {
        self.require_admin()?;
        Ok(self.data.update_ticket_status(id, status).await?)
    }

    /// Compute the dashboard summary from current data.
    ///
    /// # Errors
    ///
    /// [`AuthError::Forbidden`] for non-admin sessions, or any data error.
    pub async fn dashboard(&self) -> Result<DashboardSummary, AdminError> {
        self.require_admin()?;
        let matches = self.data.list_matches().await?;
        let tickets = self.data.list_all_tickets().await?;

        let sold: Vec<&Ticket> = tickets
            .iter()
            .filter(|t| t.status != TicketStatus::Cancelled)
            .collect();
        let revenue: Money = sold.iter().map(|t| t.price).sum();

        Ok(DashboardSummary {
            total_matches: matches.len(),
            tickets_sold: sold.len(),
            revenue,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::UserRole;
    use crate::data::InMemoryStore;
    use crate::phone::PhoneNumber;
    use crate::types::{NewTicket, UserId};
    use chrono::{TimeZone, Utc};

    fn session(role: UserRole) -> Session {
        Session {
            user_id: UserId::new(),
            email: "ops@matchday.ke".into(),
            role,
            access_token: "token".into(),
        }
    }

    fn draft() -> MatchDraft {
        MatchDraft {
            home_team: "Gor Mahia".into(),
            away_team: "Tusker".into(),
            match_date: Utc.with_ymd_and_hms(2025, 6, 1, 15, 0, 0).single().unwrap(),
            venue: "Kasarani".into(),
            ticket_price: Money::from_shillings(1_000),
            total_seats: 12,
        }
    }

    #[tokio::test]
    async fn fan_sessions_are_refused() {
        let store = Arc::new(InMemoryStore::new());
        let admin = AdminService::new(store, session(UserRole::Fan));
        assert!(matches!(
            admin.create_match(draft()).await,
            Err(AdminError::Auth(AuthError::Forbidden))
        ));
        assert!(matches!(
            admin.dashboard().await,
            Err(AdminError::Auth(AuthError::Forbidden))
        ));
    }

    #[tokio::test]
    async fn admin_sessions_manage_fixtures() {
        let store = Arc::new(InMemoryStore::new());
        let admin = AdminService::new(Arc::clone(&store) as Arc<dyn DataStore>, session(UserRole::Admin));

        let fixture = admin.create_match(draft()).await.unwrap();
        assert_eq!(fixture.available_seats, 12);

        let updated = admin
            .update_match(
                fixture.id,
                MatchUpdate {
                    venue: Some("Nyayo Stadium".into()),
                    ..MatchUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.venue, "Nyayo Stadium");

        admin.delete_match(fixture.id).await.unwrap();
        assert!(store.list_matches().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dashboard_counts_exclude_cancelled_tickets() {
        let store = Arc::new(InMemoryStore::new());
        let admin = AdminService::new(
            Arc::clone(&store) as Arc<dyn DataStore>,
            session(UserRole::Admin),
        );
        let fixture = admin.create_match(draft()).await.unwrap();

        let phone = PhoneNumber::parse("254712345678").unwrap();
        for (seat, price) in [("A1", 1_000), ("A2", 1_250)] {
            store
                .create_ticket(NewTicket {
                    match_id: fixture.id,
                    user_id: UserId::new(),
                    seat_number: seat.into(),
                    price: Money::from_shillings(price),
                    status: TicketStatus::Active,
                    phone_number: phone.clone(),
                })
                .await
                .unwrap();
        }
        let cancelled = store
            .create_ticket(NewTicket {
                match_id: fixture.id,
                user_id: UserId::new(),
                seat_number: "A3".into(),
                price: Money::from_shillings(1_000),
                status: TicketStatus::Active,
                phone_number: phone,
            })
            .await
            .unwrap();
        admin
            .update_ticket_status(cancelled.id, TicketStatus::Cancelled)
            .await
            .unwrap();

        let summary = admin.dashboard().await.unwrap();
        assert_eq!(
            summary,
            DashboardSummary {
                total_matches: 1,
                tickets_sold: 2,
                revenue: Money::from_shillings(2_250),
            }
        );
    }
}
