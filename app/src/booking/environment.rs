//! Injected dependencies for the booking reducer.

use std::sync::Arc;

use matchday_core::environment::Clock;

use crate::auth::Session;
use crate::data::DataStore;
use crate::payments::MpesaGateway;
use crate::pricing::SeatMultipliers;
use crate::seatmap::StadiumLayout;

/// Dependencies the booking reducer reads.
///
/// The session is data, not a service: it is attached explicitly when the
/// user signs in, so the reducer's authentication guard is a plain field
/// check.
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Persistence boundary.
    pub data: Arc<dyn DataStore>,
    /// Payment gateway boundary.
    pub payments: Arc<dyn MpesaGateway>,
    /// Time source for confirmation timestamps.
    pub clock: Arc<dyn Clock>,
    /// Venue layout for seat map generation.
    pub layout: StadiumLayout,
    /// Tier price multipliers.
    pub multipliers: SeatMultipliers,
    /// The signed-in session, if any.
    pub session: Option<Session>,
}

impl BookingEnvironment {
    /// Build an environment with no active session.
    #[must_use]
    pub fn new(
        data: Arc<dyn DataStore>,
        payments: Arc<dyn MpesaGateway>,
        clock: Arc<dyn Clock>,
        layout: StadiumLayout,
        multipliers: SeatMultipliers,
    ) -> Self {
        Self {
            data,
            payments,
            clock,
            layout,
            multipliers,
            session: None,
        }
    }

    /// Attach a signed-in session.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }
}
