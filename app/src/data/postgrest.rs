//! [`DataStore`] implementation against a hosted Supabase-style backend.
//!
//! Tables are reached through the PostgREST layer at `/rest/v1/<table>`.
//! Every request carries the project anon key; when a user session is
//! attached its access token replaces the anon key as the bearer so the
//! backend's row-level policies see the real user.
//!
//! Two rules live server-side and surface here only as mapped errors:
//!
//! - a unique index on `(match_id, seat_number)` over non-cancelled tickets
//!   makes duplicate inserts come back as HTTP 409, mapped to
//!   [`DataError::SeatTaken`]
//! - availability is decremented through the `decrement_available_seats`
//!   database function, which raises when the count would go negative;
//!   PostgREST reports that as a conflict, mapped to
//!   [`DataError::InsufficientSeats`]

use async_trait::async_trait;
use reqwest::{Response, StatusCode, header};
use serde::Deserialize;

use super::{DataError, DataStore};
use crate::config::BackendConfig;
use crate::types::{
    Match, MatchDraft, MatchId, MatchUpdate, NewTicket, SeatNumber, Ticket, TicketId, TicketStatus,
};

/// PostgREST media type that unwraps a single row from its array.
const OBJECT_JSON: &str = "application/vnd.pgrst.object+json";

/// Error body PostgREST returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// [`DataStore`] backed by the hosted backend's REST layer.
#[derive(Clone)]
pub struct PostgrestStore {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl PostgrestStore {
    /// Build a store for the configured backend, authenticated as the
    /// anonymous role.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.url.trim_end_matches('/').to_owned(),
            anon_key: config.anon_key.clone(),
            access_token: None,
        }
    }

    /// Attach a signed-in user's access token. Subsequent requests run under
    /// that user's row-level policies.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{function}", self.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        request
            .header("apikey", &self.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {bearer}"))
    }

    /// Read the error body of a failed response and map it to [`DataError`].
    async fn backend_error(response: Response) -> DataError {
        let status = response.status();
        let message = Self::error_message(response).await;
        DataError::Backend(format!("{status}: {message}"))
    }

    async fn error_message(response: Response) -> String {
        match response.json::<BackendErrorBody>().await {
            Ok(body) => body.message.unwrap_or_default(),
            Err(_) => String::new(),
        }
    }
}

/// Extract the remaining-seat count from the decrement function's error
/// message, e.g. `insufficient seats: 2 available`.
fn parse_available(message: &str) -> Option<u32> {
    message
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .next_back()
        .and_then(|digits| digits.parse().ok())
}

#[async_trait]
impl DataStore for PostgrestStore {
    async fn list_matches(&self) -> Result<Vec<Match>, DataError> {
        let response = self
            .authed(self.http.get(self.table_url("matches")))
            .query(&[("select", "*"), ("order", "match_date.asc")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn get_match(&self, id: MatchId) -> Result<Match, DataError> {
        let response = self
            .authed(self.http.get(self.table_url("matches")))
            .query(&[("select", "*".to_owned()), ("id", format!("eq.{id}"))])
            .header(header::ACCEPT, OBJECT_JSON)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_ACCEPTABLE {
            return Err(DataError::MatchNotFound(id));
        }
        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn create_match(&self, draft: MatchDraft) -> Result<Match, DataError> {
        let body = serde_json::json!({
            "home_team": draft.home_team,
            "away_team": draft.away_team,
            "match_date": draft.match_date,
            "venue": draft.venue,
            "ticket_price": draft.ticket_price,
            "total_seats": draft.total_seats,
            "available_seats": draft.total_seats,
        });
        let response = self
            .authed(self.http.post(self.table_url("matches")))
            .header("Prefer", "return=representation")
            .header(header::ACCEPT, OBJECT_JSON)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn update_match(&self, id: MatchId, update: MatchUpdate) -> Result<Match, DataError> {
        let response = self
            .authed(self.http.patch(self.table_url("matches")))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .header(header::ACCEPT, OBJECT_JSON)
            .json(&update)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_ACCEPTABLE {
            return Err(DataError::MatchNotFound(id));
        }
        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn delete_match(&self, id: MatchId) -> Result<(), DataError> {
        let response = self
            .authed(self.http.delete(self.table_url("matches")))
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }
        Ok(())
    }

    async fn update_match_available_seats(
        &self,
        id: MatchId,
        count: u32,
    ) -> Result<(), DataError> {
        let response = self
            .authed(self.http.patch(self.table_url("matches")))
            .query(&[("id", format!("eq.{id}"))])
            .json(&serde_json::json!({ "available_seats": count }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }
        Ok(())
    }

    async fn decrement_available_seats(&self, id: MatchId, count: u32) -> Result<(), DataError> {
        let response = self
            .authed(self.http.post(self.rpc_url("decrement_available_seats")))
            .json(&serde_json::json!({ "p_match_id": id, "p_count": count }))
            .send()
            .await?;
        if response.status() == StatusCode::CONFLICT {
            // The function raises with the remaining count in its message.
            // A conflict body without one is reported verbatim rather than
            // invented.
            let message = Self::error_message(response).await;
            return Err(match parse_available(&message) {
                Some(available) => DataError::InsufficientSeats {
                    requested: count,
                    available,
                },
                None => DataError::Backend(format!("409 Conflict: {message}")),
            });
        }
        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }
        Ok(())
    }

    async fn list_tickets_for_match(&self, id: MatchId) -> Result<Vec<Ticket>, DataError> {
        let response = self
            .authed(self.http.get(self.table_url("tickets")))
            .query(&[
                ("select", "*".to_owned()),
                ("match_id", format!("eq.{id}")),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn list_all_tickets(&self) -> Result<Vec<Ticket>, DataError> {
        let response = self
            .authed(self.http.get(self.table_url("tickets")))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket, DataError> {
        let seat: SeatNumber = ticket.seat_number.clone();
        let match_id = ticket.match_id;
        let response = self
            .authed(self.http.post(self.table_url("tickets")))
            .header("Prefer", "return=representation")
            .header(header::ACCEPT, OBJECT_JSON)
            .json(&ticket)
            .send()
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(DataError::SeatTaken { match_id, seat });
        }
        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn update_ticket_status(
        &self,
        id: TicketId,
        status: TicketStatus,
    ) -> Result<(), DataError> {
        let response = self
            .authed(self.http.patch(self.table_url("tickets")))
            .query(&[("id", format!("eq.{id}"))])
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DataError::TicketNotFound(id));
        }
        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }
        Ok(())
    }
}
