//! The booking reducer and its submission effect.

use std::collections::HashSet;
use std::sync::Arc;

use matchday_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};

use super::actions::BookingAction;
use super::environment::BookingEnvironment;
use super::state::{BookingConfirmation, BookingError, BookingPhase, BookingState};
use crate::data::DataStore;
use crate::payments::MpesaGateway;
use crate::phone::PhoneNumber;
use crate::pricing;
use crate::seatmap;
use crate::types::{MatchId, Money, NewTicket, SeatNumber, Ticket, TicketStatus};

/// Reducer for the three-step booking flow.
pub struct BookingReducer;

impl Reducer for BookingReducer {
    type State = BookingState;
    type Action = BookingAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut BookingState,
        action: BookingAction,
        env: &BookingEnvironment,
    ) -> SmallVec<[Effect<BookingAction>; 4]> {
        match action {
            BookingAction::LoadMatch { match_id } => {
                state.error = None;
                let data = Arc::clone(&env.data);
                smallvec![Effect::future(load_match(data, match_id))]
            },

            BookingAction::MatchLoaded { match_info, booked } => {
                let booked: HashSet<SeatNumber> = booked.into_iter().collect();
                state.seats = seatmap::generate_seat_map(
                    match_info.total_seats,
                    &env.layout,
                    &env.multipliers,
                    &booked,
                );
                // Seats booked elsewhere since the last load drop out of
                // the selection.
                state.selected.retain(|number| !booked.contains(number));
                state.match_info = Some(*match_info);
                state.error = None;
                SmallVec::new()
            },

            BookingAction::LoadFailed { message } => {
                tracing::warn!(%message, "fixture load failed");
                state.error = Some(BookingError::Data(message));
                SmallVec::new()
            },

            BookingAction::ToggleSeat { number } => {
                if state.phase != BookingPhase::SelectingSeats {
                    return SmallVec::new();
                }
                let Some(seat) = state.seats.iter().find(|s| s.number == number) else {
                    return SmallVec::new();
                };
                if state.selected.contains(&number) {
                    state.selected.remove(&number);
                } else if seat.available {
                    state.selected.insert(number);
                }
                state.error = None;
                SmallVec::new()
            },

            BookingAction::ProceedToPayment => {
                if state.phase != BookingPhase::SelectingSeats {
                    return SmallVec::new();
                }
                if env.session.is_none() {
                    state.error = Some(BookingError::NotAuthenticated);
                    return SmallVec::new();
                }
                if state.selected.is_empty() {
                    state.error = Some(BookingError::NoSeatsSelected);
                    return SmallVec::new();
                }
                state.phase = BookingPhase::EnteringPayment;
                state.error = None;
                SmallVec::new()
            },

            BookingAction::SubmitPayment { phone_input } => {
                if state.phase != BookingPhase::EnteringPayment {
                    return SmallVec::new();
                }
                let Some(session) = &env.session else {
                    state.error = Some(BookingError::NotAuthenticated);
                    return SmallVec::new();
                };
                let Some(fixture) = &state.match_info else {
                    state.error = Some(BookingError::MatchNotLoaded);
                    return SmallVec::new();
                };
                if state.selected.is_empty() {
                    state.error = Some(BookingError::NoSeatsSelected);
                    return SmallVec::new();
                }
                let Ok(phone) = PhoneNumber::parse(&phone_input) else {
                    state.error = Some(BookingError::InvalidPhoneNumber);
                    return SmallVec::new();
                };

                // One draft per selected seat, in seat-map order, each
                // priced individually before summation.
                let drafts: Vec<NewTicket> = state
                    .selected_seats()
                    .into_iter()
                    .map(|seat| NewTicket {
                        match_id: fixture.id,
                        user_id: session.user_id,
                        seat_number: seat.number.clone(),
                        price: pricing::price_with_multiplier(
                            fixture.ticket_price,
                            seat.multiplier,
                        ),
                        status: TicketStatus::Active,
                        phone_number: phone.clone(),
                    })
                    .collect();
                let total: Money = drafts.iter().map(|d| d.price).sum();

                state.error = None;
                let data = Arc::clone(&env.data);
                let payments = Arc::clone(&env.payments);
                let match_id = fixture.id;
                smallvec![Effect::future(submit_booking(
                    data, payments, match_id, drafts, total, phone,
                ))]
            },

            BookingAction::TicketsIssued { tickets, total } => {
                // Confirmed is terminal: a replayed or duplicate terminal
                // action must not touch the receipt or the local counts.
                if state.phase == BookingPhase::Confirmed {
                    return SmallVec::new();
                }
                for ticket in &tickets {
                    if let Some(seat) =
                        state.seats.iter_mut().find(|s| s.number == ticket.seat_number)
                    {
                        seat.available = false;
                    }
                }
                if let Some(fixture) = &mut state.match_info {
                    let sold = u32::try_from(tickets.len()).unwrap_or(u32::MAX);
                    fixture.available_seats = fixture.available_seats.saturating_sub(sold);
                }
                state.selected.clear();
                state.confirmation = Some(BookingConfirmation {
                    tickets,
                    total,
                    confirmed_at: env.clock.now(),
                });
                state.phase = BookingPhase::Confirmed;
                state.error = None;
                SmallVec::new()
            },

            BookingAction::BookingFailed {
                error,
                tickets_written,
            } => {
                if state.phase == BookingPhase::Confirmed {
                    tracing::debug!(%error, "late failure after confirmation; ignored");
                    return SmallVec::new();
                }
                tracing::warn!(%error, tickets_written, "booking submission failed");
                state.error = Some(error);
                SmallVec::new()
            },
        }
    }
}

/// Fetch the fixture and its booked set.
async fn load_match(data: Arc<dyn DataStore>, match_id: MatchId) -> Option<BookingAction> {
    let fixture = match data.get_match(match_id).await {
        Ok(fixture) => fixture,
        Err(error) => {
            return Some(BookingAction::LoadFailed {
                message: error.to_string(),
            });
        },
    };
    let tickets = match data.list_tickets_for_match(match_id).await {
        Ok(tickets) => tickets,
        Err(error) => {
            return Some(BookingAction::LoadFailed {
                message: error.to_string(),
            });
        },
    };
    let booked: Vec<SeatNumber> = seatmap::booked_set(&tickets).into_iter().collect();
    Some(BookingAction::MatchLoaded {
        match_info: Box::new(fixture),
        booked,
    })
}

/// Run a booking submission end to end.
///
/// Ticket rows are written one seat at a time so a failure leaves a known
/// prefix; that prefix is then cancelled, never deleted, and the
/// availability decrement is only issued once every row exists. The payment
/// prompt is initiated last; a prompt that fails to go out does not void
/// issued tickets, it is reconciled by the back office.
async fn submit_booking(
    data: Arc<dyn DataStore>,
    payments: Arc<dyn MpesaGateway>,
    match_id: MatchId,
    drafts: Vec<NewTicket>,
    total: Money,
    phone: PhoneNumber,
) -> Option<BookingAction> {
    let requested = u32::try_from(drafts.len()).unwrap_or(u32::MAX);
    let mut written: Vec<Ticket> = Vec::with_capacity(drafts.len());

    for draft in drafts {
        match data.create_ticket(draft).await {
            Ok(ticket) => written.push(ticket),
            Err(error) => {
                let tickets_written = written.len();
                tracing::error!(
                    %error,
                    tickets_written,
                    "ticket write failed; cancelling the written prefix"
                );
                cancel_written(&data, &written).await;
                metrics::counter!("booking.failures").increment(1);
                return Some(BookingAction::BookingFailed {
                    error: BookingError::Data(error.to_string()),
                    tickets_written,
                });
            },
        }
    }

    if let Err(error) = data.decrement_available_seats(match_id, requested).await {
        let tickets_written = written.len();
        tracing::error!(%error, "availability decrement refused; cancelling tickets");
        cancel_written(&data, &written).await;
        metrics::counter!("booking.failures").increment(1);
        return Some(BookingAction::BookingFailed {
            error: BookingError::Data(error.to_string()),
            tickets_written,
        });
    }

    metrics::counter!("booking.confirmed").increment(1);
    match payments.initiate_stk_push(&phone, total).await {
        Ok(prompt) => {
            tracing::info!(checkout_id = %prompt.checkout_id, "payment prompt sent");
        },
        Err(error) => {
            // Settlement is reconciled out of band; the booking stands.
            tracing::warn!(%error, "payment prompt failed to go out");
        },
    }

    Some(BookingAction::TicketsIssued {
        tickets: written,
        total,
    })
}

/// Cancel every ticket in the written prefix. Failures are logged and left
/// for manual reconciliation.
async fn cancel_written(data: &Arc<dyn DataStore>, written: &[Ticket]) {
    for ticket in written {
        if let Err(error) = data
            .update_ticket_status(ticket.id, TicketStatus::Cancelled)
            .await
        {
            tracing::error!(
                ticket_id = %ticket.id,
                %error,
                "compensating cancel failed; needs manual reconciliation"
            );
        }
    }
}
